//! Processed-results status and export formats

use std::fmt;
use std::path::Path;

/// Status text shown when a status check fails without a usable payload
pub const GENERIC_STATUS_ERROR: &str = "Error occurred";

/// Format a processed file can be exported in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Csv,
    Excel,
}

impl ExportFormat {
    /// Value of the `format` query parameter
    pub fn query_value(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "excel",
        }
    }

    /// Extension of the saved file
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Excel => "xlsx",
        }
    }

    pub fn toggle(&self) -> Self {
        match self {
            ExportFormat::Csv => ExportFormat::Excel,
            ExportFormat::Excel => ExportFormat::Csv,
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.query_value())
    }
}

/// File name a download of `file_name` in `format` is saved under
///
/// `out.data.csv` exported as excel becomes `out.xlsx`. Only the last path
/// component of `file_name` counts, so a server-supplied name can never point
/// outside the download directory. `None` when nothing usable is left.
pub fn download_name(file_name: &str, format: ExportFormat) -> Option<String> {
    let leaf = Path::new(file_name).file_name()?.to_str()?;
    let base = base_name(leaf);
    if base.is_empty() || base == ".." {
        return None;
    }
    Some(format!("{}.{}", base, format.extension()))
}

/// Part of a file name before the first `.`
pub fn base_name(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

/// Result of the last status check for a job folder
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExportStatus {
    /// Folder / job name that was checked
    pub job_name: String,
    /// Server-provided status text; empty before the first check
    pub status: String,
    /// Result files, in server order
    pub files: Vec<String>,
    /// Whether a check is in flight
    pub checking: bool,
}

impl ExportStatus {
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            ..Default::default()
        }
    }

    pub fn apply_success(&mut self, status: String, files: Vec<String>) {
        self.status = status;
        self.files = files;
        self.checking = false;
    }

    /// Record a failed check; the file list is always cleared
    pub fn apply_failure(&mut self, payload_status: Option<String>) {
        self.status = payload_status
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| GENERIC_STATUS_ERROR.to_string());
        self.files.clear();
        self.checking = false;
    }
}
