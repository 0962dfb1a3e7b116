//! Home component - Main application screen
//!
//! Workflow panel, sheet tabs, the data grid, a status line for notices
//! and the help bar.

use crate::action::Action;
use crate::component::Component;
use crate::components::{calculate_main_layout, DataGrid};
use crate::model::grid::GridView;
use crate::model::notice::{Notice, Severity};
use crate::model::store::DataStore;
use crate::model::workflow::{UploadOutcome, Workflow, WorkflowStage};
use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Tabs},
    Frame,
};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Home component for the main application view
#[derive(Default)]
pub struct HomeComponent {
    pub grid: DataGrid,
}

impl HomeComponent {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Component for HomeComponent {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let action = match key.code {
            KeyCode::Char('q') => Some(Action::OpenQuitDialog),
            KeyCode::Char('?') => Some(Action::OpenHelp),

            // Workflow
            KeyCode::Char('o') => Some(Action::OpenFilePrompt),
            KeyCode::Char('u') => Some(Action::UploadFile),
            KeyCode::Char('p') => Some(Action::TriggerProcessing),
            KeyCode::Char('s') => Some(Action::OpenParameters),
            KeyCode::Char('R') => Some(Action::OpenExportPanel),

            // Sheets
            KeyCode::Tab | KeyCode::Char('l') => Some(Action::NextTab),
            KeyCode::BackTab | KeyCode::Char('h') => Some(Action::PrevTab),

            _ => return self.grid.handle_key_event(key),
        };
        Ok(action)
    }

    fn draw(&mut self, _frame: &mut Frame, _area: Rect) -> Result<()> {
        // Drawing is done through draw_home_screen which takes full context
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Rendering Functions
// ═══════════════════════════════════════════════════════════════════════════════

/// Context needed for rendering the home screen
pub struct HomeRenderContext<'a> {
    pub store: &'a DataStore,
    pub view: &'a GridView,
    pub workflow: &'a Workflow,
    pub notice: Option<&'a Notice>,
    pub base_url: &'a str,
    pub in_flight: usize,
    pub committed_parameters: usize,
    pub tick: usize,
}

/// Draw the home screen
pub fn draw_home_screen(
    frame: &mut Frame,
    area: Rect,
    home: &mut HomeComponent,
    ctx: &HomeRenderContext,
) -> Result<()> {
    let layout = calculate_main_layout(area);

    render_workflow_panel(frame, layout.workflow, ctx);
    render_tabs(frame, layout.tabs, ctx.store);
    home.grid
        .draw_sheet(frame, layout.grid, ctx.store.active_sheet(), ctx.view)?;
    render_status_bar(frame, layout.status, ctx);
    render_help_bar(frame, layout.help, ctx.workflow.stage());

    Ok(())
}

fn stage_color(stage: WorkflowStage) -> Color {
    match stage {
        WorkflowStage::Idle => Color::DarkGray,
        WorkflowStage::Selected => Color::White,
        WorkflowStage::Uploading | WorkflowStage::Processing => Color::Yellow,
        WorkflowStage::Uploaded => Color::Cyan,
        WorkflowStage::Processed => Color::Green,
    }
}

fn render_workflow_panel(frame: &mut Frame, area: Rect, ctx: &HomeRenderContext) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" sheetflow | {} ", ctx.base_url))
        .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
        .border_style(Style::default().fg(Color::DarkGray));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(1), Constraint::Length(1)])
        .split(inner);

    let stage = ctx.workflow.stage();
    let mut file_spans = vec![Span::styled(" File: ", Style::default().fg(Color::DarkGray))];
    match ctx.workflow.file() {
        Some(file) => {
            file_spans.push(Span::styled(
                file.file_name.clone(),
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
            ));
            file_spans.push(Span::styled("  folder: ", Style::default().fg(Color::DarkGray)));
            file_spans.push(Span::styled(file.folder_name.clone(), Style::default().fg(Color::Cyan)));
        }
        None => file_spans.push(Span::styled(
            "none (press o)",
            Style::default().fg(Color::DarkGray),
        )),
    }
    file_spans.push(Span::raw("  "));
    file_spans.push(Span::styled(
        format!(" {} ", stage),
        Style::default()
            .fg(Color::Black)
            .bg(stage_color(stage))
            .add_modifier(Modifier::BOLD),
    ));
    frame.render_widget(Paragraph::new(Line::from(file_spans)), rows[0]);

    render_upload_progress(frame, rows[1], ctx);

    let mut info = vec![
        Span::styled(" Parameters: ", Style::default().fg(Color::DarkGray)),
        Span::styled(
            format!("{} set", ctx.committed_parameters),
            Style::default().fg(Color::White),
        ),
    ];
    if ctx.in_flight > 0 {
        info.push(Span::styled(
            format!(
                "  {} {} request(s) running",
                SPINNER[ctx.tick % SPINNER.len()],
                ctx.in_flight
            ),
            Style::default().fg(Color::Yellow),
        ));
    }
    if ctx.workflow.has_results() {
        info.push(Span::styled(
            "  results ready (R)",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(info)), rows[2]);
}

fn render_upload_progress(frame: &mut Frame, area: Rect, ctx: &HomeRenderContext) {
    let Some(job) = ctx.workflow.upload() else {
        frame.render_widget(
            Paragraph::new(Span::styled(
                " No upload yet",
                Style::default().fg(Color::DarkGray),
            )),
            area,
        );
        return;
    };

    let (color, label) = match (job.outcome, job.progress) {
        (UploadOutcome::Failure, _) => (Color::Red, "upload failed".to_string()),
        (UploadOutcome::Success, _) => (Color::Green, "uploaded".to_string()),
        (UploadOutcome::Pending, Some(pct)) => (Color::Yellow, format!("{}%", pct)),
        (UploadOutcome::Pending, None) => (
            Color::Yellow,
            format!("uploading {}", SPINNER[ctx.tick % SPINNER.len()]),
        ),
    };

    let ratio = match (job.outcome, job.progress) {
        (UploadOutcome::Success, _) => 1.0,
        (_, Some(pct)) => f64::from(pct) / 100.0,
        (_, None) => 0.0,
    };

    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(color).bg(Color::Black))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(gauge, area);
}

fn render_tabs(frame: &mut Frame, area: Rect, store: &DataStore) {
    let titles = store.dataset().names();
    if titles.is_empty() {
        frame.render_widget(
            Paragraph::new(Span::styled(" (no sheets)", Style::default().fg(Color::DarkGray)))
                .block(Block::default().borders(Borders::BOTTOM)),
            area,
        );
        return;
    }

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::BOTTOM))
        .select(store.active_index().unwrap_or(0))
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        );

    frame.render_widget(tabs, area);
}

fn render_status_bar(frame: &mut Frame, area: Rect, ctx: &HomeRenderContext) {
    let Some(notice) = ctx.notice else {
        return;
    };
    let (badge, color) = match notice.severity {
        Severity::Success => (" OK ", Color::Green),
        Severity::Info => (" INFO ", Color::Cyan),
        Severity::Error => (" ERROR ", Color::Red),
    };
    let line = Line::from(vec![
        Span::styled(
            badge,
            Style::default()
                .fg(Color::Black)
                .bg(color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(notice.display(), Style::default().fg(color)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn key_hint(key: &'static str, color: Color) -> Span<'static> {
    Span::styled(key, Style::default().fg(color).add_modifier(Modifier::BOLD))
}

fn render_help_bar(frame: &mut Frame, area: Rect, stage: WorkflowStage) {
    let mut spans = vec![
        key_hint(" q ", Color::Yellow),
        Span::raw("Quit "),
        key_hint(" o ", Color::Green),
        Span::raw("Open "),
    ];
    match stage {
        WorkflowStage::Selected => {
            spans.push(key_hint(" u ", Color::Green));
            spans.push(Span::raw("Upload "));
        }
        WorkflowStage::Uploaded => {
            spans.push(key_hint(" p ", Color::Green));
            spans.push(Span::raw("Process "));
        }
        WorkflowStage::Processed => {
            spans.push(key_hint(" R ", Color::Green));
            spans.push(Span::raw("Results "));
        }
        _ => {}
    }
    spans.extend([
        key_hint(" s ", Color::Cyan),
        Span::raw("Parameters "),
        key_hint(" Tab ", Color::Cyan),
        Span::raw("Sheet "),
        key_hint(" / ", Color::Cyan),
        Span::raw("Filter "),
        key_hint(" x ", Color::Cyan),
        Span::raw("Export rows "),
        key_hint(" ? ", Color::White),
        Span::raw("Help"),
    ]);

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn press(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    #[test]
    fn test_workflow_keys() {
        let mut home = HomeComponent::new();
        assert_eq!(home.handle_key_event(press('o')).unwrap(), Some(Action::OpenFilePrompt));
        assert_eq!(home.handle_key_event(press('p')).unwrap(), Some(Action::TriggerProcessing));
        assert_eq!(home.handle_key_event(press('R')).unwrap(), Some(Action::OpenExportPanel));
    }

    #[test]
    fn test_grid_keys_fall_through() {
        let mut home = HomeComponent::new();
        assert_eq!(home.handle_key_event(press('j')).unwrap(), Some(Action::NextRow));
        assert_eq!(home.handle_key_event(press('x')).unwrap(), Some(Action::ExportGrid));
        assert_eq!(
            home.handle_key_event(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE))
                .unwrap(),
            Some(Action::NextTab)
        );
    }
}
