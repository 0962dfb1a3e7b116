//! Upload → process workflow state machine
//!
//! ```text
//! Idle ─select→ Selected ─upload→ Uploading ─ok→ Uploaded ─trigger→ Processing ─ok→ Processed
//!                  ↑                  │                        ↑            │
//!                  └──────failed──────┘                        └───failed───┘
//! ```
//!
//! Selecting a new file is allowed from any stage and starts over from
//! `Selected`. Processing can only be triggered from `Uploaded`, so one
//! upload can never kick off two processing runs.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowStage {
    #[default]
    Idle,
    Selected,
    Uploading,
    Uploaded,
    Processing,
    Processed,
}

impl WorkflowStage {
    pub fn label(&self) -> &'static str {
        match self {
            WorkflowStage::Idle => "Idle",
            WorkflowStage::Selected => "Selected",
            WorkflowStage::Uploading => "Uploading",
            WorkflowStage::Uploaded => "Uploaded",
            WorkflowStage::Processing => "Processing",
            WorkflowStage::Processed => "Processed",
        }
    }
}

impl fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Transition not allowed from the current stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot {action} while {stage}")]
pub struct InvalidTransition {
    pub stage: WorkflowStage,
    pub action: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadOutcome {
    #[default]
    Pending,
    Success,
    Failure,
}

/// A file that passed extension checks and is ready to upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    /// File name without directories, e.g. `report.xlsx`
    pub file_name: String,
    /// Working folder / job name derived from the file name, e.g. `report`
    pub folder_name: String,
}

/// Transient per-upload state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadJob {
    pub file: SelectedFile,
    /// `Some(0..=100)` when the total size is known, `None` when indeterminate
    pub progress: Option<u8>,
    pub outcome: UploadOutcome,
}

impl UploadJob {
    pub fn new(file: SelectedFile) -> Self {
        Self {
            file,
            progress: Some(0),
            outcome: UploadOutcome::Pending,
        }
    }
}

/// Current stage plus the file and upload it refers to
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    stage: WorkflowStage,
    file: Option<SelectedFile>,
    upload: Option<UploadJob>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn upload(&self) -> Option<&UploadJob> {
        self.upload.as_ref()
    }

    /// Whether the processed-results panel should be offered
    pub fn has_results(&self) -> bool {
        self.stage == WorkflowStage::Processed
    }

    pub fn select(&mut self, file: SelectedFile) {
        self.file = Some(file);
        self.upload = None;
        self.stage = WorkflowStage::Selected;
    }

    pub fn begin_upload(&mut self) -> Result<SelectedFile, InvalidTransition> {
        let file = match (self.stage, &self.file) {
            (WorkflowStage::Selected, Some(file)) => file.clone(),
            _ => return Err(self.refuse("upload")),
        };
        self.upload = Some(UploadJob::new(file.clone()));
        self.stage = WorkflowStage::Uploading;
        Ok(file)
    }

    pub fn set_progress(&mut self, progress: Option<u8>) {
        if let Some(job) = self.upload.as_mut() {
            job.progress = progress.map(|p| p.min(100));
        }
    }

    pub fn upload_succeeded(&mut self) {
        if self.stage != WorkflowStage::Uploading {
            return;
        }
        if let Some(job) = self.upload.as_mut() {
            job.outcome = UploadOutcome::Success;
            job.progress = Some(100);
        }
        self.stage = WorkflowStage::Uploaded;
    }

    pub fn upload_failed(&mut self) {
        if self.stage != WorkflowStage::Uploading {
            return;
        }
        if let Some(job) = self.upload.as_mut() {
            job.outcome = UploadOutcome::Failure;
            job.progress = None;
        }
        self.stage = WorkflowStage::Selected;
    }

    pub fn begin_processing(&mut self) -> Result<SelectedFile, InvalidTransition> {
        let file = match (self.stage, &self.file) {
            (WorkflowStage::Uploaded, Some(file)) => file.clone(),
            _ => return Err(self.refuse("start processing")),
        };
        self.stage = WorkflowStage::Processing;
        Ok(file)
    }

    pub fn processing_succeeded(&mut self) {
        if self.stage == WorkflowStage::Processing {
            self.stage = WorkflowStage::Processed;
        }
    }

    pub fn processing_failed(&mut self) {
        if self.stage == WorkflowStage::Processing {
            self.stage = WorkflowStage::Uploaded;
        }
    }

    fn refuse(&self, action: &'static str) -> InvalidTransition {
        InvalidTransition {
            stage: self.stage,
            action,
        }
    }
}
