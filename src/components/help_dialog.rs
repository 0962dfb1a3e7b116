//! Help dialog component
//!
//! Lists every keyboard shortcut, grouped by where it applies.

use crate::action::Action;
use crate::component::Component;
use crate::components::inset_popup;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
    Frame,
};

const SHORTCUTS: &[(&str, &[(&str, &str)])] = &[
    (
        "Workflow",
        &[
            ("o", "Pick a CSV / Excel file and upload it"),
            ("u", "Upload the selected file again"),
            ("s", "Parameter settings"),
            ("p", "Start processing the uploaded file"),
            ("R", "Processed results (status, export, view)"),
        ],
    ),
    (
        "Sheets & Grid",
        &[
            ("Tab / l", "Next sheet"),
            ("Shift+Tab / h", "Previous sheet"),
            ("j / ↓", "Next row"),
            ("k / ↑", "Previous row"),
            ("n / PgDn", "Next page"),
            ("b / PgUp", "Previous page"),
            ("z", "Cycle page size (10 / 20 / 50)"),
            ("/", "Filter rows"),
            ("Space", "Toggle row selection"),
            ("Ctrl+a", "Select all filtered rows"),
            ("Esc", "Clear selection"),
            ("x", "Export selected rows to CSV"),
        ],
    ),
    (
        "Processed Results",
        &[
            ("j / k", "Move between files"),
            ("e / Enter", "Export file in the chosen format"),
            ("v", "View file in the grid"),
            ("f", "Switch csv / excel"),
            ("r", "Check status again"),
        ],
    ),
    (
        "Parameter Settings",
        &[
            ("j / k", "Move between parameters"),
            ("0-9 . -", "Edit value"),
            ("Ctrl+r", "Restore default"),
            ("Enter", "Submit"),
            ("Esc", "Cancel"),
        ],
    ),
    ("General", &[("?", "Show this help"), ("q", "Quit")]),
];

/// Help dialog showing all keyboard shortcuts
#[derive(Default)]
pub struct HelpDialog {
    pub scroll_offset: usize,
}

impl Component for HelpDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => Some(Action::CloseModal),
            KeyCode::Char('j') | KeyCode::Down => Some(Action::ModalDown),
            KeyCode::Char('k') | KeyCode::Up => Some(Action::ModalUp),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::ModalDown => self.scroll_offset = self.scroll_offset.saturating_add(1),
            Action::ModalUp => self.scroll_offset = self.scroll_offset.saturating_sub(1),
            Action::CloseModal => self.scroll_offset = 0,
            _ => {}
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        let dialog_area = inset_popup(area, 3);
        frame.render_widget(Clear, dialog_area);

        let content = help_lines();
        let total = content.len();
        let visible_height = dialog_area.height.saturating_sub(2) as usize;
        let max_scroll = total.saturating_sub(visible_height);
        self.scroll_offset = self.scroll_offset.min(max_scroll);

        let paragraph = Paragraph::new(content)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" Keyboard Shortcuts ")
                    .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .scroll((self.scroll_offset as u16, 0));
        frame.render_widget(paragraph, dialog_area);

        if total > visible_height {
            let mut scrollbar_state = ScrollbarState::new(max_scroll).position(self.scroll_offset);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(Some("↑"))
                    .end_symbol(Some("↓")),
                dialog_area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }

        Ok(())
    }
}

fn help_lines() -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (section, keys) in SHORTCUTS {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {} ", section),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        lines.push(Line::from(Span::styled(
            format!("  {}", "─".repeat(section.len() + 2)),
            Style::default().fg(Color::DarkGray),
        )));
        for (key, description) in keys.iter() {
            lines.push(Line::from(vec![
                Span::styled(
                    format!("  {:16}", key),
                    Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                ),
                Span::styled(description.to_string(), Style::default().fg(Color::White)),
            ]));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "  Press q, Esc, or ? to close",
        Style::default().fg(Color::DarkGray),
    )));
    lines
}
