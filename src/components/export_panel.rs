//! Processed results panel
//!
//! Shows the last status check for the job folder and one entry per result
//! file. Each entry can be exported (downloaded) or viewed in the grid.

use crate::action::Action;
use crate::component::Component;
use crate::components::centered_popup;
use crate::model::export::{ExportFormat, ExportStatus, GENERIC_STATUS_ERROR};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

#[derive(Default)]
pub struct ExportPanel;

fn status_color(status: &ExportStatus) -> Color {
    let lower = status.status.to_lowercase();
    if status.checking {
        Color::Yellow
    } else if lower == "success" || lower == "done" {
        Color::Green
    } else if status.status == GENERIC_STATUS_ERROR || lower.contains("fail") || lower.contains("not found") {
        Color::Red
    } else {
        Color::Yellow
    }
}

fn format_switch(format: ExportFormat) -> Line<'static> {
    let chip = |f: ExportFormat| {
        if f == format {
            Span::styled(
                format!(" {} ", f.query_value()),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::styled(
                format!(" {} ", f.query_value()),
                Style::default().fg(Color::DarkGray),
            )
        }
    };
    Line::from(vec![
        Span::styled(" Format: ", Style::default().fg(Color::DarkGray)),
        chip(ExportFormat::Csv),
        Span::raw(" "),
        chip(ExportFormat::Excel),
    ])
}

impl ExportPanel {
    pub fn draw_status(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        status: &ExportStatus,
        format: ExportFormat,
        selected_index: usize,
    ) -> Result<()> {
        let popup_area = centered_popup(area, 64, 18);
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(format!(" Processed Results: {} ", status.job_name))
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2),
                Constraint::Length(2),
                Constraint::Min(1),
                Constraint::Length(1),
            ])
            .split(inner);

        let status_text = if status.checking {
            "Checking status…".to_string()
        } else if status.status.is_empty() {
            "Not checked yet".to_string()
        } else {
            status.status.clone()
        };
        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(" Status: ", Style::default().fg(Color::DarkGray)),
                Span::styled(
                    status_text,
                    Style::default()
                        .fg(status_color(status))
                        .add_modifier(Modifier::BOLD),
                ),
            ])),
            chunks[0],
        );
        frame.render_widget(Paragraph::new(format_switch(format)), chunks[1]);

        if status.files.is_empty() {
            frame.render_widget(
                Paragraph::new(Line::from(Span::styled(
                    " No result files",
                    Style::default().fg(Color::DarkGray),
                ))),
                chunks[2],
            );
        } else {
            let items: Vec<ListItem> = status
                .files
                .iter()
                .map(|name| {
                    ListItem::new(Line::from(vec![
                        Span::styled(name.clone(), Style::default().fg(Color::White)),
                        Span::styled("   e export  v view", Style::default().fg(Color::DarkGray)),
                    ]))
                })
                .collect();
            let list = List::new(items)
                .highlight_style(
                    Style::default()
                        .bg(Color::Blue)
                        .fg(Color::White)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("▶ ");
            let mut state =
                ListState::default().with_selected(Some(selected_index.min(status.files.len() - 1)));
            frame.render_stateful_widget(list, chunks[2], &mut state);
        }

        frame.render_widget(
            Paragraph::new(Line::from(vec![
                Span::styled(" e/Enter ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::raw("Export "),
                Span::styled(" v ", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
                Span::raw("View "),
                Span::styled(" f ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::raw("Format "),
                Span::styled(" r ", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                Span::raw("Refresh "),
                Span::styled(" Esc ", Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)),
                Span::raw("Close"),
            ])),
            chunks[3],
        );
        Ok(())
    }
}

impl Component for ExportPanel {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc | KeyCode::Char('q') => Some(Action::CloseModal),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::ModalDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::ModalUp),
            KeyCode::Char('e') | KeyCode::Enter => Some(Action::ExportSelectedFile),
            KeyCode::Char('v') => Some(Action::ViewSelectedFile),
            KeyCode::Char('f') => Some(Action::ToggleExportFormat),
            KeyCode::Char('r') => Some(Action::RefreshStatus),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        // Needs the status; see draw_status
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use ratatui::{backend::TestBackend, Terminal};

    fn render(status: &ExportStatus) -> Vec<String> {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal
            .draw(|f| {
                ExportPanel
                    .draw_status(f, f.area(), status, ExportFormat::Csv, 0)
                    .unwrap()
            })
            .unwrap();
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        let symbols: Vec<&str> = buffer.content().iter().map(|c| c.symbol()).collect();
        symbols.chunks(width).map(|row| row.concat()).collect()
    }

    #[test]
    fn test_single_file_renders_one_entry_with_actions() {
        let mut status = ExportStatus::new("report");
        status.apply_success("success".to_string(), vec!["out.csv".to_string()]);

        let rows = render(&status);
        let entries: Vec<&String> = rows.iter().filter(|r| r.contains("out.csv")).collect();
        assert_eq!(entries.len(), 1, "{:#?}", rows);
        assert_eq!(entries[0].matches("out.csv").count(), 1);
        assert!(entries[0].contains("▶ out.csv"));
        assert!(entries[0].contains("e export"));
        assert!(entries[0].contains("v view"));
        assert!(rows.iter().any(|r| r.contains("Processed Results: report")));
        assert!(rows.iter().any(|r| r.contains("Status: success")));
        assert!(!rows.iter().any(|r| r.contains("No result files")));
    }

    #[test]
    fn test_empty_file_list_renders_placeholder() {
        let mut status = ExportStatus::new("report");
        status.apply_failure(Some("Folder not found".to_string()));

        let rows = render(&status);
        assert!(rows.iter().any(|r| r.contains("No result files")));
        assert!(rows.iter().any(|r| r.contains("Status: Folder not found")));
        assert!(!rows.iter().any(|r| r.contains("e export")));
    }

    #[test]
    fn test_status_colors() {
        let mut status = ExportStatus::new("report");
        status.apply_success("success".to_string(), vec!["out.csv".to_string()]);
        assert_eq!(status_color(&status), Color::Green);

        status.apply_failure(None);
        assert_eq!(status_color(&status), Color::Red);

        status.apply_success("Report generation is still in progress".to_string(), vec![]);
        assert_eq!(status_color(&status), Color::Yellow);
    }

    #[test]
    fn test_entry_actions() {
        let mut panel = ExportPanel;
        let press = |c| KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE);
        assert_eq!(panel.handle_key_event(press('e')).unwrap(), Some(Action::ExportSelectedFile));
        assert_eq!(panel.handle_key_event(press('v')).unwrap(), Some(Action::ViewSelectedFile));
        assert_eq!(panel.handle_key_event(press('f')).unwrap(), Some(Action::ToggleExportFormat));
    }
}
