//! External service interactions
//!
//! - HTTP calls to the processing API
//! - File selection and upload progress
//! - Writing downloads and grid exports to disk
//! - Background request execution

pub mod api;
pub mod download;
pub mod request_runner;
pub mod upload;

pub use api::{HttpApi, ProcessingApi};
pub use request_runner::{RequestEvent, RequestRunner};
pub use upload::select_file;
