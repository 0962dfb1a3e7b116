//! Data grid for the active sheet
//!
//! Renders one page of rows as a ratatui `Table`. Columns are taken from the
//! sheet's first row on every draw; the grid itself owns no data.

use crate::action::Action;
use crate::component::Component;
use crate::model::dataset::{cell_text, Sheet};
use crate::model::grid::GridView;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const MIN_COLUMN_WIDTH: usize = 3;
const MAX_COLUMN_WIDTH: usize = 40;

/// Truncate `text` to at most `width` display columns, marking cuts with `…`
pub fn fit_width(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w > width - 1 {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Display width for each column, from the header and the visible cells
pub fn column_widths(sheet: &Sheet, columns: &[String], rows: &[usize]) -> Vec<usize> {
    columns
        .iter()
        .map(|col| {
            let cells = rows
                .iter()
                .filter_map(|&i| sheet.rows.get(i))
                .filter_map(|row| row.get(col))
                .map(|v| cell_text(v).width());
            cells
                .chain(std::iter::once(col.width()))
                .max()
                .unwrap_or(0)
                .clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
        })
        .collect()
}

#[derive(Default)]
pub struct DataGrid;

impl DataGrid {
    pub fn draw_sheet(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        sheet: Option<&Sheet>,
        view: &GridView,
    ) -> Result<()> {
        let Some(sheet) = sheet else {
            let hint = Paragraph::new(vec![
                Line::from(""),
                Line::from(Span::styled(
                    "  No data loaded",
                    Style::default().fg(Color::DarkGray).add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    "  Press o to pick a CSV or Excel file to upload",
                    Style::default().fg(Color::DarkGray),
                )),
            ])
            .block(grid_block(" Data ".to_string()));
            frame.render_widget(hint, area);
            return Ok(());
        };

        let columns = sheet.columns();
        let filtered = view.filtered_indices(sheet).len();
        let page_rows = view.page_indices(sheet);

        let mut title = format!(
            " {} | page {}/{} | {} rows ",
            sheet.name,
            view.page + 1,
            view.page_count(sheet),
            filtered
        );
        if filtered != sheet.rows.len() {
            title = format!("{}of {} ", title, sheet.rows.len());
        }
        if !view.selected.is_empty() {
            title = format!("{}[{}✓] ", title, view.selected.len());
        }
        if !view.filter.is_empty() {
            title = format!("{}[filter:{}] ", title, view.filter);
        }
        title = format!("{}[{}/page] ", title, view.page_size);

        if columns.is_empty() {
            let empty = Paragraph::new(Line::from(Span::styled(
                "  Sheet has no rows",
                Style::default().fg(Color::DarkGray),
            )))
            .block(grid_block(title));
            frame.render_widget(empty, area);
            return Ok(());
        }

        let widths = column_widths(sheet, &columns, &page_rows);

        let header = Row::new(
            std::iter::once(Cell::from(""))
                .chain(
                    columns
                        .iter()
                        .zip(&widths)
                        .map(|(col, &w)| Cell::from(fit_width(col, w))),
                )
                .collect::<Vec<_>>(),
        )
        .style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

        let rows: Vec<Row> = page_rows
            .iter()
            .filter_map(|&i| sheet.rows.get(i).map(|row| (i, row)))
            .map(|(i, row)| {
                let selected = view.selected.contains(&i);
                let marker = if selected { "●" } else { " " };
                let cells = std::iter::once(Cell::from(marker))
                    .chain(columns.iter().zip(&widths).map(|(col, &w)| {
                        let text = row.get(col).map(cell_text).unwrap_or_default();
                        Cell::from(fit_width(&text, w))
                    }))
                    .collect::<Vec<_>>();
                let style = if selected {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::White)
                };
                Row::new(cells).style(style)
            })
            .collect();

        let constraints: Vec<Constraint> = std::iter::once(Constraint::Length(1))
            .chain(widths.iter().map(|&w| Constraint::Length(w as u16)))
            .collect();

        let table = Table::new(rows, constraints)
            .header(header)
            .block(grid_block(title))
            .column_spacing(2)
            .highlight_style(
                Style::default()
                    .bg(Color::Blue)
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            );

        let mut state = TableState::default().with_selected(if page_rows.is_empty() {
            None
        } else {
            Some(view.cursor.min(page_rows.len() - 1))
        });
        frame.render_stateful_widget(table, area, &mut state);
        Ok(())
    }
}

fn grid_block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::DarkGray))
}

impl Component for DataGrid {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => Some(Action::NextRow),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::PrevRow),
            KeyCode::Char('n') | KeyCode::PageDown => Some(Action::NextPage),
            KeyCode::Char('b') | KeyCode::PageUp => Some(Action::PrevPage),
            KeyCode::Char('z') => Some(Action::CyclePageSize),
            KeyCode::Char('a') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::SelectAllRows)
            }
            KeyCode::Char(' ') => Some(Action::ToggleRowSelection),
            KeyCode::Esc => Some(Action::ClearSelection),
            KeyCode::Char('/') => Some(Action::OpenGridFilter),
            KeyCode::Char('x') => Some(Action::ExportGrid),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        // Needs the sheet and view; see draw_sheet
        Ok(())
    }
}
