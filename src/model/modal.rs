//! Modal stack for managing overlays
//!
//! Only the top modal receives input; the rest are drawn underneath it.

/// Represents a modal overlay that can be displayed on top of the main UI
#[derive(Debug, Clone, PartialEq)]
pub enum Modal {
    /// Quit confirmation dialog
    QuitConfirm,
    /// Path prompt for choosing the file to upload
    SelectFile { input: String },
    /// Parameter settings form
    ParameterSettings,
    /// Processed results: status, file list, export and view
    ExportPanel { selected_index: usize },
    /// Quick filter prompt for the data grid
    GridFilter { input: String },
    /// Blocking message that must be acknowledged
    Alert { message: String },
    /// Help dialog showing all keyboard shortcuts
    Help,
}

/// A stack of modal overlays
///
/// Modals are rendered from bottom to top, with only the top modal
/// receiving input events.
#[derive(Debug, Default)]
pub struct ModalStack {
    stack: Vec<Modal>,
}

impl ModalStack {
    pub fn new() -> Self {
        Self { stack: Vec::new() }
    }

    pub fn push(&mut self, modal: Modal) {
        self.stack.push(modal);
    }

    pub fn pop(&mut self) -> Option<Modal> {
        self.stack.pop()
    }

    pub fn top(&self) -> Option<&Modal> {
        self.stack.last()
    }

    pub fn top_mut(&mut self) -> Option<&mut Modal> {
        self.stack.last_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    /// All modals, bottom first
    pub fn iter(&self) -> impl Iterator<Item = &Modal> {
        self.stack.iter()
    }

    /// Remove every `ParameterSettings` entry, wherever it sits
    pub fn remove_parameter_settings(&mut self) {
        self.stack.retain(|m| *m != Modal::ParameterSettings);
    }
}
