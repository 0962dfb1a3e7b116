//! Error types for talking to the processing API and picking files

use std::path::PathBuf;
use thiserror::Error;

/// Message shown when a file with an unsupported extension is picked
pub const INVALID_FILE_NOTICE: &str = "Please upload a valid CSV or Excel file.";

/// Why a picked file cannot be uploaded
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileRejection {
    #[error("{}", INVALID_FILE_NOTICE)]
    UnsupportedExtension { path: PathBuf },
    #[error("File not found: {}", .path.display())]
    NotFound { path: PathBuf },
}

#[derive(Debug, Error)]
pub enum ClientError {
    /// Input refused before any request was made
    #[error(transparent)]
    Validation(#[from] FileRejection),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response; `message` is the server's own explanation if it sent one
    #[error("server responded with {code}: {}", .message.as_deref().unwrap_or("no details"))]
    Status { code: u16, message: Option<String> },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Server-provided explanation attached to a non-2xx response
    pub fn server_message(&self) -> Option<&str> {
        match self {
            ClientError::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}
