//! Tabular data returned by the processing API
//!
//! A dataset is an ordered list of named sheets. Each sheet is a list of row
//! records keyed by column name; the column set is whatever keys the first
//! row has, in the order the server sent them.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row: column name -> scalar cell value
pub type RowRecord = Map<String, Value>;

/// A named table of rows
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Sheet {
    #[serde(rename = "sheetName")]
    pub name: String,
    #[serde(rename = "sheetContent", default)]
    pub rows: Vec<RowRecord>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, rows: Vec<RowRecord>) -> Self {
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Column names taken from the first row; empty when there are no rows
    pub fn columns(&self) -> Vec<String> {
        self.rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default()
    }
}

/// Ordered collection of sheets with unique names
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Dataset {
    sheets: Vec<Sheet>,
}

impl Dataset {
    /// Build a dataset, renaming duplicate sheet names so every name is unique
    pub fn from_sheets(sheets: Vec<Sheet>) -> Self {
        let mut unique: Vec<Sheet> = Vec::with_capacity(sheets.len());
        for mut sheet in sheets {
            if unique.iter().any(|s| s.name == sheet.name) {
                let base = sheet.name.clone();
                let mut n = 2;
                while unique.iter().any(|s| s.name == format!("{} ({})", base, n)) {
                    n += 1;
                }
                sheet.name = format!("{} ({})", base, n);
            }
            unique.push(sheet);
        }
        Self { sheets: unique }
    }

    pub fn sheets(&self) -> &[Sheet] {
        &self.sheets
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.sheets.iter().position(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name.as_str()).collect()
    }
}

/// Render a cell for display
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> RowRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_columns_follow_first_row_order() {
        let sheet = Sheet::new(
            "s",
            vec![
                row(json!({"zeta": 1, "alpha": 2, "mid": 3})),
                row(json!({"zeta": 4, "alpha": 5, "mid": 6})),
            ],
        );
        assert_eq!(sheet.columns(), vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_empty_sheet_has_no_columns() {
        let sheet = Sheet::new("empty", vec![]);
        assert!(sheet.columns().is_empty());
    }

    #[test]
    fn test_duplicate_sheet_names_are_renamed() {
        let dataset = Dataset::from_sheets(vec![
            Sheet::new("data", vec![]),
            Sheet::new("data", vec![]),
            Sheet::new("data", vec![]),
        ]);
        assert_eq!(dataset.names(), vec!["data", "data (2)", "data (3)"]);
    }

    #[test]
    fn test_sheet_wire_names() {
        let sheet: Sheet =
            serde_json::from_value(json!({"sheetName": "a.csv", "sheetContent": [{"x": 1}]}))
                .unwrap();
        assert_eq!(sheet.name, "a.csv");
        assert_eq!(sheet.rows.len(), 1);
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&Value::Null), "");
        assert_eq!(cell_text(&json!("x")), "x");
        assert_eq!(cell_text(&json!(1.5)), "1.5");
        assert_eq!(cell_text(&json!(true)), "true");
    }
}
