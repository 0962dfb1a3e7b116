//! Action enum - All possible application actions
//!
//! Components emit Actions in response to events, and the App processes
//! them to update state.

use std::fmt;

/// All possible actions in the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ─────────────────────────────────────────────────────────────────────────
    // App Lifecycle
    // ─────────────────────────────────────────────────────────────────────────
    /// Regular tick: drain finished requests, expire notices
    Tick,
    /// Terminal was resized
    Resize(u16, u16),
    /// Quit without confirmation
    ForceQuit,

    // ─────────────────────────────────────────────────────────────────────────
    // Tabs & Grid
    // ─────────────────────────────────────────────────────────────────────────
    NextTab,
    PrevTab,
    NextRow,
    PrevRow,
    NextPage,
    PrevPage,
    /// Step through the page size choices
    CyclePageSize,
    ToggleRowSelection,
    SelectAllRows,
    ClearSelection,
    /// Open the quick filter prompt
    OpenGridFilter,
    /// Write selected (or filtered) rows of the active sheet to CSV
    ExportGrid,

    // ─────────────────────────────────────────────────────────────────────────
    // Upload & Processing
    // ─────────────────────────────────────────────────────────────────────────
    /// Open the file path prompt
    OpenFilePrompt,
    /// Select the file at this path and upload it
    SelectFile(String),
    /// Upload the currently selected file again
    UploadFile,
    /// Ask the server to process the uploaded file
    TriggerProcessing,
    /// Open the parameter settings form
    OpenParameters,
    /// Put the focused parameter back to its default
    RestoreDefault,

    // ─────────────────────────────────────────────────────────────────────────
    // Processed Results
    // ─────────────────────────────────────────────────────────────────────────
    /// Open the processed-results panel (checks status)
    OpenExportPanel,
    /// Check the export status again
    RefreshStatus,
    /// Switch between csv and excel
    ToggleExportFormat,
    /// Download the highlighted result file
    ExportSelectedFile,
    /// Load the highlighted result file into the grid
    ViewSelectedFile,

    // ─────────────────────────────────────────────────────────────────────────
    // Modals
    // ─────────────────────────────────────────────────────────────────────────
    OpenQuitDialog,
    OpenHelp,
    /// Close (or cancel) the current modal
    CloseModal,
    /// Confirm the current modal action
    ConfirmModal,
    ModalUp,
    ModalDown,
    /// Type a character into the current modal
    ModalInput(char),
    ModalBackspace,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Tick => write!(f, "Tick"),
            Action::Resize(w, h) => write!(f, "Resize({}, {})", w, h),
            Action::ForceQuit => write!(f, "ForceQuit"),
            Action::NextTab => write!(f, "NextTab"),
            Action::PrevTab => write!(f, "PrevTab"),
            Action::NextRow => write!(f, "NextRow"),
            Action::PrevRow => write!(f, "PrevRow"),
            Action::NextPage => write!(f, "NextPage"),
            Action::PrevPage => write!(f, "PrevPage"),
            Action::CyclePageSize => write!(f, "CyclePageSize"),
            Action::ToggleRowSelection => write!(f, "ToggleRowSelection"),
            Action::SelectAllRows => write!(f, "SelectAllRows"),
            Action::ClearSelection => write!(f, "ClearSelection"),
            Action::OpenGridFilter => write!(f, "OpenGridFilter"),
            Action::ExportGrid => write!(f, "ExportGrid"),
            Action::OpenFilePrompt => write!(f, "OpenFilePrompt"),
            Action::SelectFile(path) => write!(f, "SelectFile({})", path),
            Action::UploadFile => write!(f, "UploadFile"),
            Action::TriggerProcessing => write!(f, "TriggerProcessing"),
            Action::OpenParameters => write!(f, "OpenParameters"),
            Action::RestoreDefault => write!(f, "RestoreDefault"),
            Action::OpenExportPanel => write!(f, "OpenExportPanel"),
            Action::RefreshStatus => write!(f, "RefreshStatus"),
            Action::ToggleExportFormat => write!(f, "ToggleExportFormat"),
            Action::ExportSelectedFile => write!(f, "ExportSelectedFile"),
            Action::ViewSelectedFile => write!(f, "ViewSelectedFile"),
            Action::OpenQuitDialog => write!(f, "OpenQuitDialog"),
            Action::OpenHelp => write!(f, "OpenHelp"),
            Action::CloseModal => write!(f, "CloseModal"),
            Action::ConfirmModal => write!(f, "ConfirmModal"),
            Action::ModalUp => write!(f, "ModalUp"),
            Action::ModalDown => write!(f, "ModalDown"),
            Action::ModalInput(c) => write!(f, "ModalInput('{}')", c),
            Action::ModalBackspace => write!(f, "ModalBackspace"),
        }
    }
}
