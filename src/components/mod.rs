//! UI Components
//!
//! Each component encapsulates its own state, event handling, and rendering logic.
//! Components communicate through Actions rather than direct state mutation.

pub mod alert_dialog;
pub mod data_grid;
pub mod export_panel;
pub mod help_dialog;
pub mod home;
pub mod layout;
pub mod parameter_dialog;
pub mod prompt_dialog;
pub mod quit_dialog;

pub use alert_dialog::AlertDialog;
pub use data_grid::DataGrid;
pub use export_panel::ExportPanel;
pub use help_dialog::HelpDialog;
pub use home::{draw_home_screen, HomeComponent, HomeRenderContext};
pub use layout::{calculate_main_layout, centered_popup, inset_popup};
pub use parameter_dialog::ParameterDialog;
pub use prompt_dialog::PromptDialog;
pub use quit_dialog::QuitDialog;
