//! Single-line text prompt, used for the file path and the grid filter

use crate::action::Action;
use crate::component::Component;
use crate::components::centered_popup;
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

#[derive(Default)]
pub struct PromptDialog;

impl PromptDialog {
    pub fn draw_prompt(
        &mut self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        hint: &str,
        input: &str,
    ) -> Result<()> {
        let popup_area = centered_popup(area, 70, 7);
        frame.render_widget(Clear, popup_area);

        // Keep the end of long input visible
        let room = popup_area.width.saturating_sub(6) as usize;
        let shown: String = if input.chars().count() > room {
            let skip = input.chars().count() - room;
            input.chars().skip(skip).collect()
        } else {
            input.to_string()
        };

        let content = vec![
            Line::from(Span::styled(
                format!(" {}", hint),
                Style::default().fg(Color::DarkGray),
            )),
            Line::from(""),
            Line::from(vec![
                Span::styled(" > ", Style::default().fg(Color::Cyan)),
                Span::styled(shown, Style::default().fg(Color::White)),
                Span::styled("▏", Style::default().fg(Color::Cyan)),
            ]),
            Line::from(""),
            Line::from(vec![
                Span::styled(
                    " Enter ",
                    Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                ),
                Span::raw("Confirm  "),
                Span::styled(
                    " Esc ",
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                ),
                Span::raw("Cancel"),
            ]),
        ];

        let paragraph = Paragraph::new(content).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(format!(" {} ", title))
                .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
        );
        frame.render_widget(paragraph, popup_area);
        Ok(())
    }
}

impl Component for PromptDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc => Some(Action::CloseModal),
            KeyCode::Enter => Some(Action::ConfirmModal),
            KeyCode::Backspace => Some(Action::ModalBackspace),
            KeyCode::Char(c) => Some(Action::ModalInput(c)),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        // Needs the input text; see draw_prompt
        Ok(())
    }
}
