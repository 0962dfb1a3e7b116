//! Parameter settings dialog component
//!
//! Renders the working copy held by `ParameterForm` and turns keys into
//! modal actions; the App applies them to the form.

use crate::action::Action;
use crate::component::Component;
use crate::components::centered_popup;
use crate::model::parameter_form::{FormField, ParameterForm};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    layout::{Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{
        Block, Borders, Clear, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState,
    },
    Frame,
};

/// Rendered lines per form field (header, description, range, spacer)
const LINES_PER_FIELD: usize = 4;

#[derive(Default)]
pub struct ParameterDialog {
    /// First visible line of the form body
    pub scroll_offset: usize,
}

impl ParameterDialog {
    pub fn draw_form(&mut self, frame: &mut Frame, area: Rect, form: &ParameterForm) -> Result<()> {
        let fields = form.fields();
        let height = (fields.len() as u16 * LINES_PER_FIELD as u16 + 5).min(area.height);
        let popup_area = centered_popup(area, 72, height);
        frame.render_widget(Clear, popup_area);

        let mut lines = vec![Line::from("")];
        for (i, field) in fields.iter().enumerate() {
            lines.extend(field_lines(field, i == form.focus));
        }
        lines.push(Line::from(vec![
            Span::styled(
                " Enter ",
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            ),
            Span::raw("Submit  "),
            Span::styled(
                " Esc ",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ),
            Span::raw("Cancel  "),
            Span::styled(
                " j/k ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("Move  "),
            Span::styled(
                " Ctrl+r ",
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::raw("Default"),
        ]));

        let total = lines.len();
        let visible_height = popup_area.height.saturating_sub(2) as usize;
        let max_scroll = total.saturating_sub(visible_height);
        // Leading blank line sits above the first field
        let focus_top = form.focus * LINES_PER_FIELD;
        let focus_bottom = focus_top + LINES_PER_FIELD;
        self.scroll_offset =
            scroll_to_show(self.scroll_offset, focus_top, focus_bottom, visible_height)
                .min(max_scroll);

        let has_errors = fields.iter().any(|f| f.error);
        let border = if has_errors { Color::Red } else { Color::Cyan };
        let paragraph = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border))
                    .title(" Parameter Settings ")
                    .title_style(Style::default().fg(border).add_modifier(Modifier::BOLD)),
            )
            .scroll((self.scroll_offset as u16, 0));
        frame.render_widget(paragraph, popup_area);

        if total > visible_height {
            let mut scrollbar_state = ScrollbarState::new(max_scroll).position(self.scroll_offset);
            frame.render_stateful_widget(
                Scrollbar::new(ScrollbarOrientation::VerticalRight)
                    .begin_symbol(Some("↑"))
                    .end_symbol(Some("↓")),
                popup_area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
        Ok(())
    }
}

/// Smallest change to `offset` that brings lines `top..bottom` into a window
/// of `visible` lines; the top wins when the range is taller than the window
fn scroll_to_show(offset: usize, top: usize, bottom: usize, visible: usize) -> usize {
    if top < offset {
        top
    } else if bottom > offset + visible {
        bottom.saturating_sub(visible).min(top)
    } else {
        offset
    }
}

fn field_lines(field: &FormField, focused: bool) -> Vec<Line<'static>> {
    let spec = field.parameter.range_spec();
    let marker = if focused { "▶ " } else { "  " };
    let input_style = match (focused, field.error) {
        (_, true) => Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        (true, false) => Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        (false, false) => Style::default().fg(Color::White),
    };
    let cursor = if focused { "▏" } else { " " };

    let helper = if field.error {
        Span::styled(
            format!("    Value must be within {}", spec.describe()),
            Style::default().fg(Color::Red),
        )
    } else {
        Span::styled(
            format!("    Range: {}", field.parameter.range),
            Style::default().fg(Color::DarkGray),
        )
    };

    vec![
        Line::from(vec![
            Span::styled(marker, Style::default().fg(Color::Cyan)),
            Span::styled(
                format!("{:<16}", field.parameter.name),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!(" {}{} ", field.input, cursor), input_style),
            Span::styled(
                format!("  ({})", field.parameter.variable_key),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(Span::styled(
            format!("    {}", field.parameter.description),
            Style::default().fg(Color::Gray),
        )),
        Line::from(helper),
        Line::from(""),
    ]
}

impl Component for ParameterDialog {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Esc => Some(Action::CloseModal),
            KeyCode::Enter => Some(Action::ConfirmModal),
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                Some(Action::RestoreDefault)
            }
            KeyCode::Char('j') | KeyCode::Down | KeyCode::Tab => Some(Action::ModalDown),
            KeyCode::Char('k') | KeyCode::Up | KeyCode::BackTab => Some(Action::ModalUp),
            KeyCode::Backspace => Some(Action::ModalBackspace),
            KeyCode::Char(c) => Some(Action::ModalInput(c)),
            _ => None,
        };
        Ok(action)
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        // Needs the form; see draw_form
        Ok(())
    }
}
