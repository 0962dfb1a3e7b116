//! Model layer - centralized state management
//!
//! - `DataStore` - dataset, active tab, request tickets
//! - `Workflow` - upload / processing stage machine
//! - `ParameterForm` - parameter settings working copy
//! - `GridView` - paging, filter and selection for the grid
//! - `ModalStack` - modal overlay management

pub mod dataset;
pub mod export;
pub mod grid;
pub mod modal;
pub mod notice;
pub mod parameter;
pub mod parameter_form;
pub mod store;
pub mod workflow;

// Re-export commonly used types
pub use dataset::Dataset;
pub use export::{ExportFormat, ExportStatus};
pub use grid::GridView;
pub use notice::Notice;
pub use parameter::Parameter;
pub use parameter_form::ParameterForm;
pub use store::{DataStore, RequestSlot, RequestTicket};
pub use workflow::Workflow;
