//! Parameter settings form state
//!
//! Holds the working copy of the parameter set while the settings panel is
//! open. Nothing here touches the committed set directly: the caller receives
//! the edited parameters from [`ParameterForm::submit`] and decides what to do
//! with them.

use super::parameter::{is_valid, Parameter};
use thiserror::Error;

/// Notice shown when submit is blocked by invalid fields
pub const FIX_ERRORS_NOTICE: &str = "Please fix the errors before submitting.";

/// Lifecycle of the settings panel
///
/// `Committed` and `Cancelled` are both closed states that remember how the
/// last editing session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormState {
    #[default]
    Closed,
    Editing,
    Committed,
    Cancelled,
}

/// Submit was refused because some fields are out of range
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Please fix the errors before submitting.")]
pub struct InvalidFields {
    /// Indices of the offending fields
    pub fields: Vec<usize>,
}

/// One editable row in the form
#[derive(Debug, Clone, PartialEq)]
pub struct FormField {
    pub parameter: Parameter,
    /// Raw text as typed
    pub input: String,
    pub error: bool,
}

impl FormField {
    fn from_parameter(parameter: &Parameter) -> Self {
        let mut parameter = parameter.clone();
        let value = parameter.effective_value();
        parameter.value = Some(value);
        Self {
            input: format_number(value),
            parameter,
            error: false,
        }
    }

    fn is_within_range(&self) -> bool {
        match self.parameter.value {
            Some(v) => is_valid(v, &self.parameter.range_spec()),
            None => false,
        }
    }
}

/// Working copy of the parameter set
#[derive(Debug, Clone, Default)]
pub struct ParameterForm {
    state: FormState,
    fields: Vec<FormField>,
    /// Focused field index
    pub focus: usize,
}

impl ParameterForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FormState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == FormState::Editing
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    /// Open the form with a fresh working copy of `committed`
    pub fn open(&mut self, committed: &[Parameter]) {
        self.fields = committed.iter().map(FormField::from_parameter).collect();
        self.focus = 0;
        self.state = FormState::Editing;
    }

    /// Replace the text of field `index` and revalidate only that field
    pub fn edit(&mut self, index: usize, input: &str) {
        let Some(field) = self.fields.get_mut(index) else {
            return;
        };
        field.input = input.to_string();
        field.parameter.value = input.trim().parse::<f64>().ok();
        field.error = !field.is_within_range();
    }

    /// Append a character to the focused field
    pub fn push_char(&mut self, c: char) {
        if let Some(field) = self.fields.get(self.focus) {
            let mut input = field.input.clone();
            input.push(c);
            self.edit(self.focus, &input);
        }
    }

    /// Delete the last character of the focused field
    pub fn pop_char(&mut self) {
        if let Some(field) = self.fields.get(self.focus) {
            let mut input = field.input.clone();
            input.pop();
            self.edit(self.focus, &input);
        }
    }

    /// Put the focused field back to its default value
    pub fn restore_default(&mut self) {
        if let Some(field) = self.fields.get(self.focus) {
            let input = format_number(field.parameter.default_value);
            self.edit(self.focus, &input);
        }
    }

    pub fn focus_next(&mut self) {
        if !self.fields.is_empty() {
            self.focus = (self.focus + 1) % self.fields.len();
        }
    }

    pub fn focus_prev(&mut self) {
        if !self.fields.is_empty() {
            self.focus = self.focus.checked_sub(1).unwrap_or(self.fields.len() - 1);
        }
    }

    /// Discard edits and close without committing
    pub fn cancel(&mut self) {
        for field in &mut self.fields {
            field.parameter.value = Some(field.parameter.default_value);
            field.input = format_number(field.parameter.default_value);
            field.error = false;
        }
        self.state = FormState::Cancelled;
        self.close();
    }

    /// Validate every field; on success close and hand back the working copy
    ///
    /// On failure the form stays open and the error flags reflect every
    /// offending field.
    pub fn submit(&mut self) -> Result<Vec<Parameter>, InvalidFields> {
        let mut invalid = Vec::new();
        for (i, field) in self.fields.iter_mut().enumerate() {
            field.error = !field.is_within_range();
            if field.error {
                invalid.push(i);
            }
        }

        if !invalid.is_empty() {
            return Err(InvalidFields { fields: invalid });
        }

        let committed = self.fields.iter().map(|f| f.parameter.clone()).collect();
        self.state = FormState::Committed;
        self.close();
        Ok(committed)
    }

    fn close(&mut self) {
        self.fields.clear();
        self.focus = 0;
    }
}

/// Render a number without a trailing `.0` for integral values
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
