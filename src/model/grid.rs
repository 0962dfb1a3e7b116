//! Presentation state for the data grid
//!
//! Paging, quick filter, and row selection for the active sheet. The view
//! only ever reads the sheet it is given; it holds row indices, never rows.

use super::dataset::{cell_text, Sheet};
use std::collections::BTreeSet;

/// Page sizes offered by the grid
pub const PAGE_SIZE_CHOICES: [usize; 3] = [10, 20, 50];

/// Page size used when nothing else is configured
pub const DEFAULT_PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridView {
    pub page: usize,
    pub page_size: usize,
    /// Case-insensitive substring matched against every cell
    pub filter: String,
    /// Cursor position within the current page
    pub cursor: usize,
    /// Selected rows, as indices into the sheet
    pub selected: BTreeSet<usize>,
}

impl Default for GridView {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl GridView {
    pub fn new(page_size: usize) -> Self {
        let page_size = if PAGE_SIZE_CHOICES.contains(&page_size) {
            page_size
        } else {
            DEFAULT_PAGE_SIZE
        };
        Self {
            page: 0,
            page_size,
            filter: String::new(),
            cursor: 0,
            selected: BTreeSet::new(),
        }
    }

    /// Forget paging, filter, and selection (page size is kept)
    pub fn reset(&mut self) {
        *self = Self::new(self.page_size);
    }

    /// Indices of rows that pass the filter
    pub fn filtered_indices(&self, sheet: &Sheet) -> Vec<usize> {
        if self.filter.is_empty() {
            return (0..sheet.rows.len()).collect();
        }
        let needle = self.filter.to_lowercase();
        sheet
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                row.values()
                    .any(|v| cell_text(v).to_lowercase().contains(&needle))
            })
            .map(|(i, _)| i)
            .collect()
    }

    pub fn page_count(&self, sheet: &Sheet) -> usize {
        let total = self.filtered_indices(sheet).len();
        total.div_ceil(self.page_size).max(1)
    }

    /// Row indices shown on the current page
    pub fn page_indices(&self, sheet: &Sheet) -> Vec<usize> {
        self.filtered_indices(sheet)
            .into_iter()
            .skip(self.page * self.page_size)
            .take(self.page_size)
            .collect()
    }

    /// Sheet index of the row under the cursor
    pub fn cursor_row(&self, sheet: &Sheet) -> Option<usize> {
        self.page_indices(sheet).get(self.cursor).copied()
    }

    pub fn next_page(&mut self, sheet: &Sheet) {
        if self.page + 1 < self.page_count(sheet) {
            self.page += 1;
            self.cursor = 0;
        }
    }

    pub fn prev_page(&mut self) {
        if self.page > 0 {
            self.page -= 1;
            self.cursor = 0;
        }
    }

    pub fn cursor_down(&mut self, sheet: &Sheet) {
        let len = self.page_indices(sheet).len();
        if self.cursor + 1 < len {
            self.cursor += 1;
        } else if self.page + 1 < self.page_count(sheet) {
            self.next_page(sheet);
        }
    }

    pub fn cursor_up(&mut self, sheet: &Sheet) {
        if self.cursor > 0 {
            self.cursor -= 1;
        } else if self.page > 0 {
            self.prev_page();
            self.cursor = self.page_indices(sheet).len().saturating_sub(1);
        }
    }

    /// Step to the next page size choice, keeping the first visible row in view
    pub fn cycle_page_size(&mut self) {
        let first_visible = self.page * self.page_size;
        let idx = PAGE_SIZE_CHOICES
            .iter()
            .position(|&s| s == self.page_size)
            .unwrap_or(0);
        self.page_size = PAGE_SIZE_CHOICES[(idx + 1) % PAGE_SIZE_CHOICES.len()];
        self.page = first_visible / self.page_size;
        self.cursor = 0;
    }

    pub fn set_filter(&mut self, filter: String) {
        self.filter = filter;
        self.page = 0;
        self.cursor = 0;
    }

    pub fn toggle_selected(&mut self, sheet: &Sheet) {
        if let Some(row) = self.cursor_row(sheet) {
            if !self.selected.remove(&row) {
                self.selected.insert(row);
            }
        }
    }

    pub fn select_all_filtered(&mut self, sheet: &Sheet) {
        self.selected.extend(self.filtered_indices(sheet));
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    /// Rows a grid export should write: the selection, or every filtered row
    pub fn export_indices(&self, sheet: &Sheet) -> Vec<usize> {
        if self.selected.is_empty() {
            self.filtered_indices(sheet)
        } else {
            self.selected.iter().copied().collect()
        }
    }
}
