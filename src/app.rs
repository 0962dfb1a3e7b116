//! Root application component
//!
//! The App struct implements the Component trait, acting as the root component
//! that delegates event handling and rendering to child components. It owns
//! the shared store, the workflow state machine and the request runner, and is
//! the only place where request completions are applied.

use crate::action::Action;
use crate::component::Component;
use crate::components::{
    draw_home_screen, AlertDialog, ExportPanel, HelpDialog, HomeComponent, HomeRenderContext,
    ParameterDialog, PromptDialog, QuitDialog,
};
use crate::config::Config;
use crate::error::ClientError;
use crate::model::modal::{Modal, ModalStack};
use crate::model::parameter_form::FIX_ERRORS_NOTICE;
use crate::model::{
    DataStore, Dataset, ExportFormat, ExportStatus, GridView, Notice, Parameter, ParameterForm,
    RequestSlot, RequestTicket, Workflow,
};
use crate::services::download::export_grid_csv;
use crate::services::upload::resolve_input_path;
use crate::services::{select_file, ProcessingApi, RequestEvent, RequestRunner};
use anyhow::Result;
use chrono::Local;
use crossterm::event::KeyEvent;
use ratatui::{layout::Rect, Frame};
use std::sync::Arc;
use tracing::{debug, info, warn};

const UPLOAD_FAILED_NOTICE: &str = "Error uploading file. Please try again.";
const TRIGGER_FAILED_NOTICE: &str = "Error processing file. Please try again.";

// ═══════════════════════════════════════════════════════════════════════════════
// App Struct
// ═══════════════════════════════════════════════════════════════════════════════

/// Main application state - coordinates between components
pub struct App {
    pub config: Config,

    /// Dataset, active tab and request tickets
    pub store: DataStore,

    /// Paging, filter and selection for the active sheet
    pub view: GridView,

    /// Store version the view was last reset for
    view_version: u64,

    pub workflow: Workflow,

    /// Last committed parameter set
    pub parameters: Vec<Parameter>,

    /// Working copy while the settings panel is open
    pub form: ParameterForm,

    /// Status of the processed-results folder, once the panel was opened
    pub export_status: Option<ExportStatus>,

    pub export_format: ExportFormat,

    /// Transient message for the status bar
    pub notice: Option<Notice>,

    /// Modal overlay stack
    pub modals: ModalStack,

    /// Background HTTP requests
    pub runner: RequestRunner,

    /// Ticket of the upload the workflow is waiting on
    upload_ticket: Option<RequestTicket>,

    /// Flag to indicate the app should quit
    pub should_quit: bool,

    /// Ticks since start, drives spinners
    pub tick: usize,

    // ─────────────────────────────────────────────────────────────────────────
    // Child Components
    // ─────────────────────────────────────────────────────────────────────────
    pub home: HomeComponent,
    pub quit_dialog: QuitDialog,
    pub help_dialog: HelpDialog,
    pub parameter_dialog: ParameterDialog,
    pub export_panel: ExportPanel,
    pub prompt_dialog: PromptDialog,
    pub alert_dialog: AlertDialog,
}

// ═══════════════════════════════════════════════════════════════════════════════
// App Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl App {
    pub fn new(config: Config, api: Arc<dyn ProcessingApi>, parameters: Vec<Parameter>) -> App {
        let runner = RequestRunner::new(api, config.download_dir.clone());
        let view = GridView::new(config.page_size);
        App {
            config,
            store: DataStore::new(),
            view,
            view_version: 0,
            workflow: Workflow::new(),
            parameters,
            form: ParameterForm::new(),
            export_status: None,
            export_format: ExportFormat::default(),
            notice: None,
            modals: ModalStack::new(),
            runner,
            upload_ticket: None,
            should_quit: false,
            tick: 0,
            home: HomeComponent::new(),
            quit_dialog: QuitDialog::default(),
            help_dialog: HelpDialog::default(),
            parameter_dialog: ParameterDialog::default(),
            export_panel: ExportPanel,
            prompt_dialog: PromptDialog,
            alert_dialog: AlertDialog,
        }
    }

    /// Reset the grid view whenever the data under it changed
    fn sync_view(&mut self) {
        if self.store.version() != self.view_version {
            self.view.reset();
            self.view_version = self.store.version();
        }
    }

    fn notify(&mut self, notice: Notice) {
        self.notice = Some(notice);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Upload & Processing
    // ─────────────────────────────────────────────────────────────────────────

    /// Validate `input` as an upload source and start uploading it
    fn select_and_upload(&mut self, input: &str) {
        let path = resolve_input_path(input);
        match select_file(&path) {
            Ok(file) => {
                info!(file = %file.file_name, folder = %file.folder_name, "file selected");
                self.workflow.select(file);
                self.start_upload();
            }
            Err(rejection) => {
                warn!(path = %path.display(), %rejection, "file rejected");
                self.notify(Notice::error(rejection.to_string()));
            }
        }
    }

    fn start_upload(&mut self) {
        match self.workflow.begin_upload() {
            Ok(file) => {
                let ticket = self.store.issue_ticket(RequestSlot::Dataset);
                self.upload_ticket = Some(ticket);
                info!(file = %file.file_name, "upload started");
                self.notify(Notice::info(format!("Uploading {}...", file.file_name)));
                self.runner.upload(ticket, file);
            }
            Err(err) => self.notify(Notice::info(format!("Nothing to upload: {}", err))),
        }
    }

    fn trigger_processing(&mut self) {
        match self.workflow.begin_processing() {
            Ok(file) => {
                let ticket = self.store.issue_ticket(RequestSlot::Trigger);
                info!(file = %file.file_name, "processing triggered");
                self.runner.trigger(ticket, file.file_name);
            }
            Err(err) => self.notify(Notice::info(format!("Cannot process: {}", err))),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Processed Results
    // ─────────────────────────────────────────────────────────────────────────

    fn open_export_panel(&mut self) {
        let Some(folder) = self.workflow.file().map(|f| f.folder_name.clone()) else {
            self.notify(Notice::info("Upload a file first"));
            return;
        };
        let stale = self
            .export_status
            .as_ref()
            .map_or(true, |status| status.job_name != folder);
        if stale {
            self.export_status = Some(ExportStatus::new(folder));
        }
        self.modals.push(Modal::ExportPanel { selected_index: 0 });
        self.refresh_status();
    }

    fn refresh_status(&mut self) {
        let Some(status) = self.export_status.as_mut() else {
            return;
        };
        status.checking = true;
        let job = status.job_name.clone();
        let ticket = self.store.issue_ticket(RequestSlot::Status);
        self.runner.check_status(ticket, job);
    }

    /// Result file under the export panel's cursor
    fn selected_result(&self) -> Option<(String, String)> {
        let index = match self.modals.top() {
            Some(Modal::ExportPanel { selected_index }) => *selected_index,
            _ => return None,
        };
        let status = self.export_status.as_ref()?;
        let file = status.files.get(index)?;
        Some((file.clone(), status.job_name.clone()))
    }

    fn move_export_cursor(&mut self, down: bool) {
        let count = self.export_status.as_ref().map_or(0, |s| s.files.len());
        if let Some(Modal::ExportPanel { selected_index }) = self.modals.top_mut() {
            if down {
                if *selected_index + 1 < count {
                    *selected_index += 1;
                }
            } else {
                *selected_index = selected_index.saturating_sub(1);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Grid
    // ─────────────────────────────────────────────────────────────────────────

    fn export_grid(&mut self) {
        let Some(sheet) = self.store.active_sheet() else {
            self.notify(Notice::info("No data to export"));
            return;
        };
        let rows = self.view.export_indices(sheet);
        match export_grid_csv(&self.config.download_dir, sheet, &rows, Local::now()) {
            Ok(path) => {
                info!(path = %path.display(), rows = rows.len(), "grid exported");
                self.notify(Notice::success(format!(
                    "Exported {} row(s) to {}",
                    rows.len(),
                    path.display()
                )));
            }
            Err(err) => {
                warn!(%err, "grid export failed");
                self.notify(Notice::error(format!("Export failed: {}", err)));
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request completions
    // ─────────────────────────────────────────────────────────────────────────

    fn handle_request_event(&mut self, event: RequestEvent) {
        match event {
            RequestEvent::UploadProgress { ticket, progress } => {
                if self.upload_ticket == Some(ticket) {
                    self.workflow.set_progress(progress);
                }
            }
            RequestEvent::Uploaded {
                ticket,
                file,
                result,
            } => {
                if self.upload_ticket != Some(ticket) {
                    debug!(?ticket, file = %file.file_name, "discarding stale upload");
                    return;
                }
                self.upload_ticket = None;
                match result {
                    Ok(response) if response.message.is_none() && response.error.is_some() => {
                        let error = response.error.unwrap_or_default();
                        warn!(file = %file.file_name, %error, "upload refused by server");
                        self.workflow.upload_failed();
                        self.notify(Notice::error(error));
                    }
                    Ok(response) => {
                        let sheets = response.data.len();
                        if !self
                            .store
                            .publish(ticket, Dataset::from_sheets(response.data))
                        {
                            debug!(?ticket, "upload data superseded by a newer view");
                        }
                        self.workflow.upload_succeeded();
                        info!(file = %file.file_name, sheets, "upload finished");
                        let message = response
                            .message
                            .unwrap_or_else(|| format!("Uploaded {}", file.file_name));
                        self.notify(Notice::success(message));
                    }
                    Err(ClientError::Validation(rejection)) => {
                        warn!(file = %file.file_name, %rejection, "file gone before upload");
                        self.workflow.upload_failed();
                        self.notify(Notice::error(rejection.to_string()));
                    }
                    Err(err) => {
                        warn!(file = %file.file_name, %err, "upload failed");
                        self.workflow.upload_failed();
                        self.notify(Notice::error(UPLOAD_FAILED_NOTICE));
                    }
                }
            }
            RequestEvent::Triggered {
                ticket,
                file_name,
                result,
            } => {
                if !self.store.is_current(ticket) {
                    debug!(?ticket, file = %file_name, "discarding stale trigger");
                    return;
                }
                match result {
                    Ok(response) => {
                        info!(file = %file_name, message = %response.message, "processing started");
                        self.workflow.processing_succeeded();
                        self.notify(Notice::success(format!(
                            "File processing triggered: {}",
                            response.message
                        )));
                    }
                    Err(err) => {
                        warn!(file = %file_name, %err, "trigger failed");
                        self.workflow.processing_failed();
                        self.notify(Notice::error(TRIGGER_FAILED_NOTICE));
                    }
                }
            }
            RequestEvent::StatusChecked {
                ticket,
                job_name,
                result,
            } => {
                if !self.store.is_current(ticket) {
                    debug!(?ticket, job = %job_name, "discarding stale status");
                    return;
                }
                let Some(status) = self.export_status.as_mut() else {
                    return;
                };
                if status.job_name != job_name {
                    return;
                }
                match result {
                    Ok(response) => {
                        debug!(job = %job_name, status = %response.status, files = response.files.len(), "status checked");
                        status.apply_success(response.status, response.files);
                    }
                    Err(err) => {
                        warn!(job = %job_name, %err, "status check failed");
                        status.apply_failure(err.server_message().map(str::to_string));
                    }
                }
                let count = status.files.len();
                if let Some(Modal::ExportPanel { selected_index }) = self.modals.top_mut() {
                    *selected_index = (*selected_index).min(count.saturating_sub(1));
                }
            }
            RequestEvent::Viewed {
                ticket,
                file_name,
                result,
            } => {
                if !self.store.is_current(ticket) {
                    debug!(?ticket, file = %file_name, "discarding stale view");
                    return;
                }
                match result {
                    Ok(dataset) => {
                        info!(file = %file_name, sheets = dataset.len(), "result file loaded");
                        self.store.publish(ticket, dataset);
                        self.notify(Notice::success(format!("Showing {}", file_name)));
                    }
                    Err(err) => {
                        warn!(file = %file_name, %err, "view failed");
                        self.notify(Notice::error(format!("Could not load {}", file_name)));
                    }
                }
            }
            RequestEvent::Exported {
                file_name,
                format,
                result,
            } => match result {
                Ok(path) => {
                    info!(file = %file_name, %format, path = %path.display(), "export saved");
                    self.notify(Notice::success(format!("Saved {}", path.display())));
                }
                Err(err) => {
                    warn!(file = %file_name, %format, %err, "export failed");
                    self.notify(Notice::error(format!("Error exporting {}", file_name)));
                }
            },
        }
        self.sync_view();
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Modal confirm / input
    // ─────────────────────────────────────────────────────────────────────────

    fn confirm_modal(&mut self) -> Option<Action> {
        let modal = self.modals.top().cloned()?;
        match modal {
            Modal::QuitConfirm => {
                self.should_quit = true;
                None
            }
            Modal::SelectFile { input } => {
                self.modals.pop();
                if input.trim().is_empty() {
                    None
                } else {
                    Some(Action::SelectFile(input))
                }
            }
            Modal::ParameterSettings => {
                match self.form.submit() {
                    Ok(committed) => {
                        info!(count = committed.len(), "parameters committed");
                        self.parameters = committed;
                        self.modals.remove_parameter_settings();
                        self.notify(Notice::success("Parameters saved"));
                    }
                    Err(invalid) => {
                        debug!(fields = ?invalid.fields, "parameter submit refused");
                        self.modals.push(Modal::Alert {
                            message: FIX_ERRORS_NOTICE.to_string(),
                        });
                    }
                }
                None
            }
            Modal::ExportPanel { .. } => Some(Action::ExportSelectedFile),
            Modal::GridFilter { .. } | Modal::Alert { .. } | Modal::Help => {
                self.modals.pop();
                None
            }
        }
    }

    fn close_modal(&mut self) {
        match self.modals.top() {
            Some(Modal::ParameterSettings) => {
                self.form.cancel();
                debug!(state = ?self.form.state(), "parameter form closed");
            }
            Some(Modal::GridFilter { .. }) => self.view.set_filter(String::new()),
            Some(Modal::Help) => self.help_dialog.scroll_offset = 0,
            _ => {}
        }
        self.modals.pop();
    }

    fn modal_input(&mut self, c: char) {
        match self.modals.top_mut() {
            Some(Modal::SelectFile { input }) => input.push(c),
            Some(Modal::GridFilter { input }) => {
                input.push(c);
                let filter = input.clone();
                self.view.set_filter(filter);
            }
            Some(Modal::ParameterSettings) => self.form.push_char(c),
            _ => {}
        }
    }

    fn modal_backspace(&mut self) {
        match self.modals.top_mut() {
            Some(Modal::SelectFile { input }) => {
                input.pop();
            }
            Some(Modal::GridFilter { input }) => {
                input.pop();
                let filter = input.clone();
                self.view.set_filter(filter);
            }
            Some(Modal::ParameterSettings) => self.form.pop_char(),
            _ => {}
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Component Implementation
// ═══════════════════════════════════════════════════════════════════════════════

impl Component for App {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if let Some(modal) = self.modals.top().cloned() {
            self.handle_modal_key_event(&modal, key)
        } else {
            self.home.handle_key_event(key)
        }
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            // ─────────────────────────────────────────────────────────────────
            // App Lifecycle
            // ─────────────────────────────────────────────────────────────────
            Action::Tick => {
                self.tick = self.tick.wrapping_add(1);
                if self.notice.as_ref().is_some_and(Notice::is_expired) {
                    self.notice = None;
                }
                for event in self.runner.poll() {
                    self.handle_request_event(event);
                }
                self.sync_view();
            }
            Action::Resize(_, _) => {}
            Action::ForceQuit => {
                info!(in_flight = self.runner.in_flight(), "quitting");
                self.should_quit = true;
            }

            // ─────────────────────────────────────────────────────────────────
            // Tabs & Grid (never touch the dataset)
            // ─────────────────────────────────────────────────────────────────
            Action::NextTab => {
                self.store.next_tab();
                debug!(tab = ?self.store.active_tab(), "tab switched");
                self.sync_view();
            }
            Action::PrevTab => {
                self.store.prev_tab();
                debug!(tab = ?self.store.active_tab(), "tab switched");
                self.sync_view();
            }
            Action::NextRow => {
                if let Some(sheet) = self.store.active_sheet() {
                    self.view.cursor_down(sheet);
                }
            }
            Action::PrevRow => {
                if let Some(sheet) = self.store.active_sheet() {
                    self.view.cursor_up(sheet);
                }
            }
            Action::NextPage => {
                if let Some(sheet) = self.store.active_sheet() {
                    self.view.next_page(sheet);
                }
            }
            Action::PrevPage => self.view.prev_page(),
            Action::CyclePageSize => self.view.cycle_page_size(),
            Action::ToggleRowSelection => {
                if let Some(sheet) = self.store.active_sheet() {
                    self.view.toggle_selected(sheet);
                }
            }
            Action::SelectAllRows => {
                if let Some(sheet) = self.store.active_sheet() {
                    self.view.select_all_filtered(sheet);
                }
            }
            Action::ClearSelection => self.view.clear_selection(),
            Action::OpenGridFilter => {
                self.modals.push(Modal::GridFilter {
                    input: self.view.filter.clone(),
                });
            }
            Action::ExportGrid => self.export_grid(),

            // ─────────────────────────────────────────────────────────────────
            // Upload & Processing
            // ─────────────────────────────────────────────────────────────────
            Action::OpenFilePrompt => {
                let input = self
                    .workflow
                    .file()
                    .map(|f| f.path.display().to_string())
                    .unwrap_or_default();
                self.modals.push(Modal::SelectFile { input });
            }
            Action::SelectFile(input) => self.select_and_upload(&input),
            Action::UploadFile => self.start_upload(),
            Action::TriggerProcessing => self.trigger_processing(),
            Action::OpenParameters => {
                self.form.open(&self.parameters);
                self.modals.push(Modal::ParameterSettings);
            }
            Action::RestoreDefault => {
                if self.form.is_open() {
                    self.form.restore_default();
                }
            }

            // ─────────────────────────────────────────────────────────────────
            // Processed Results
            // ─────────────────────────────────────────────────────────────────
            Action::OpenExportPanel => self.open_export_panel(),
            Action::RefreshStatus => self.refresh_status(),
            Action::ToggleExportFormat => self.export_format = self.export_format.toggle(),
            Action::ExportSelectedFile => match self.selected_result() {
                Some((file_name, folder_name)) => {
                    info!(file = %file_name, format = %self.export_format, "export requested");
                    self.runner.export(file_name, folder_name, self.export_format);
                }
                None => self.notify(Notice::info("No result file selected")),
            },
            Action::ViewSelectedFile => match self.selected_result() {
                Some((file_name, folder_name)) => {
                    let ticket = self.store.issue_ticket(RequestSlot::Dataset);
                    info!(file = %file_name, "view requested");
                    self.runner.view(ticket, file_name, folder_name);
                    self.modals.pop();
                }
                None => self.notify(Notice::info("No result file selected")),
            },

            // ─────────────────────────────────────────────────────────────────
            // Modals
            // ─────────────────────────────────────────────────────────────────
            Action::OpenQuitDialog => self.modals.push(Modal::QuitConfirm),
            Action::OpenHelp => {
                self.help_dialog.scroll_offset = 0;
                self.modals.push(Modal::Help);
            }
            Action::CloseModal => self.close_modal(),
            Action::ConfirmModal => return Ok(self.confirm_modal()),
            Action::ModalUp => match self.modals.top().cloned() {
                Some(Modal::ParameterSettings) => self.form.focus_prev(),
                Some(Modal::ExportPanel { .. }) => self.move_export_cursor(false),
                Some(Modal::Help) => {
                    self.help_dialog.update(Action::ModalUp)?;
                }
                _ => {}
            },
            Action::ModalDown => match self.modals.top().cloned() {
                Some(Modal::ParameterSettings) => self.form.focus_next(),
                Some(Modal::ExportPanel { .. }) => self.move_export_cursor(true),
                Some(Modal::Help) => {
                    self.help_dialog.update(Action::ModalDown)?;
                }
                _ => {}
            },
            Action::ModalInput(c) => self.modal_input(c),
            Action::ModalBackspace => self.modal_backspace(),
        }
        Ok(None)
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect) -> Result<()> {
        self.sync_view();

        let ctx = HomeRenderContext {
            store: &self.store,
            view: &self.view,
            workflow: &self.workflow,
            notice: self.notice.as_ref(),
            base_url: &self.config.api_base_url,
            in_flight: self.runner.in_flight(),
            committed_parameters: self.parameters.len(),
            tick: self.tick,
        };
        draw_home_screen(frame, area, &mut self.home, &ctx)?;

        // Bottom to top, so the focused modal ends up on top
        let modals: Vec<Modal> = self.modals.iter().cloned().collect();
        for modal in &modals {
            self.draw_modal(frame, area, modal)?;
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Helper Methods
// ═══════════════════════════════════════════════════════════════════════════════

impl App {
    fn handle_modal_key_event(&mut self, modal: &Modal, key: KeyEvent) -> Result<Option<Action>> {
        match modal {
            Modal::QuitConfirm => self.quit_dialog.handle_key_event(key),
            Modal::SelectFile { .. } | Modal::GridFilter { .. } => {
                self.prompt_dialog.handle_key_event(key)
            }
            Modal::ParameterSettings => self.parameter_dialog.handle_key_event(key),
            Modal::ExportPanel { .. } => self.export_panel.handle_key_event(key),
            Modal::Alert { .. } => self.alert_dialog.handle_key_event(key),
            Modal::Help => self.help_dialog.handle_key_event(key),
        }
    }

    fn draw_modal(&mut self, frame: &mut Frame, area: Rect, modal: &Modal) -> Result<()> {
        match modal {
            Modal::QuitConfirm => {
                self.quit_dialog.pending_requests = self.runner.in_flight();
                self.quit_dialog.draw(frame, area)?;
            }
            Modal::SelectFile { input } => {
                self.prompt_dialog.draw_prompt(
                    frame,
                    area,
                    " Select File ",
                    "Path to a .csv, .xlsx or .xls file",
                    input,
                )?;
            }
            Modal::GridFilter { input } => {
                self.prompt_dialog.draw_prompt(
                    frame,
                    area,
                    " Filter Rows ",
                    "Matches any cell, case-insensitive",
                    input,
                )?;
            }
            Modal::ParameterSettings => {
                self.parameter_dialog.draw_form(frame, area, &self.form)?;
            }
            Modal::ExportPanel { selected_index } => {
                if let Some(ref status) = self.export_status {
                    self.export_panel.draw_status(
                        frame,
                        area,
                        status,
                        self.export_format,
                        *selected_index,
                    )?;
                }
            }
            Modal::Alert { message } => {
                self.alert_dialog.draw_message(frame, area, message)?;
            }
            Modal::Help => {
                self.help_dialog.draw(frame, area)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::INVALID_FILE_NOTICE;
    use crate::model::dataset::Sheet;
    use crate::model::notice::Severity;
    use crate::model::parameter::default_parameters;
    use crate::model::workflow::WorkflowStage;
    use crate::services::api::StatusResponse;
    use crate::services::request_runner::tests::FakeApi;
    use serde_json::json;
    use std::fs;
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    fn app_with(api: FakeApi, dir: &TempDir) -> (App, Arc<FakeApi>) {
        let api = Arc::new(api);
        let config = Config {
            download_dir: dir.path().join("downloads"),
            ..Config::default()
        };
        let app = App::new(config, api.clone(), default_parameters());
        (app, api)
    }

    /// Tick until every background request has reported back
    fn settle(app: &mut App) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while app.runner.in_flight() > 0 && Instant::now() < deadline {
            app.update(Action::Tick).unwrap();
            thread::sleep(Duration::from_millis(5));
        }
    }

    fn sample_file(dir: &TempDir, name: &str) -> String {
        let path = dir.path().join(name);
        fs::write(&path, b"a,b\n1,x\n").unwrap();
        path.display().to_string()
    }

    fn two_sheets() -> Dataset {
        let row = |v: serde_json::Value| v.as_object().cloned().unwrap();
        Dataset::from_sheets(vec![
            Sheet::new("first", vec![row(json!({"a": 1}))]),
            Sheet::new("second", vec![row(json!({"b": 2}))]),
        ])
    }

    fn upload_and_process(app: &mut App, dir: &TempDir) {
        let path = sample_file(dir, "report.xlsx");
        app.update(Action::SelectFile(path)).unwrap();
        settle(app);
        app.update(Action::TriggerProcessing).unwrap();
        settle(app);
    }

    #[test]
    fn test_unsupported_file_is_rejected_before_any_request() {
        let dir = TempDir::new().unwrap();
        let (mut app, api) = app_with(FakeApi::default(), &dir);
        let path = sample_file(&dir, "notes.txt");

        app.update(Action::SelectFile(path)).unwrap();

        assert!(api.calls().is_empty());
        assert_eq!(app.runner.in_flight(), 0);
        assert!(app.store.dataset().is_empty());
        assert_eq!(app.workflow.stage(), WorkflowStage::Idle);
        let notice = app.notice.as_ref().unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert_eq!(notice.message, INVALID_FILE_NOTICE);
    }

    #[test]
    fn test_rejection_keeps_previous_selection() {
        let dir = TempDir::new().unwrap();
        let (mut app, _api) = app_with(FakeApi::default(), &dir);
        app.update(Action::SelectFile(sample_file(&dir, "report.xlsx")))
            .unwrap();
        settle(&mut app);

        app.update(Action::SelectFile(sample_file(&dir, "notes.txt")))
            .unwrap();
        assert_eq!(app.workflow.file().unwrap().file_name, "report.xlsx");
        assert_eq!(app.workflow.stage(), WorkflowStage::Uploaded);
    }

    #[test]
    fn test_upload_publishes_dataset() {
        let dir = TempDir::new().unwrap();
        let (mut app, api) = app_with(FakeApi::default(), &dir);

        app.update(Action::SelectFile(sample_file(&dir, "report.xlsx")))
            .unwrap();
        assert_eq!(app.workflow.stage(), WorkflowStage::Uploading);
        settle(&mut app);

        assert_eq!(api.calls(), vec!["upload report.xlsx"]);
        assert_eq!(app.workflow.stage(), WorkflowStage::Uploaded);
        assert_eq!(app.workflow.file().unwrap().folder_name, "report");
        assert_eq!(app.store.active_tab(), Some("report.xlsx"));
        assert_eq!(app.store.active_sheet().unwrap().columns(), vec!["a", "b"]);
        assert_eq!(app.notice.as_ref().unwrap().severity, Severity::Success);
    }

    #[test]
    fn test_upload_failure_keeps_dataset() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi {
            fail_upload: true,
            ..FakeApi::default()
        };
        let (mut app, _api) = app_with(api, &dir);

        app.update(Action::SelectFile(sample_file(&dir, "data.csv")))
            .unwrap();
        settle(&mut app);

        assert!(app.store.dataset().is_empty());
        assert_eq!(app.workflow.stage(), WorkflowStage::Selected);
        assert_eq!(app.workflow.upload().unwrap().progress, None);
        assert_eq!(app.notice.as_ref().unwrap().message, UPLOAD_FAILED_NOTICE);
    }

    #[test]
    fn test_file_gone_before_upload_is_reported() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi {
            file_gone: true,
            ..FakeApi::default()
        };
        let (mut app, _api) = app_with(api, &dir);
        let path = sample_file(&dir, "report.xlsx");

        app.update(Action::SelectFile(path)).unwrap();
        settle(&mut app);

        assert_eq!(app.workflow.stage(), WorkflowStage::Selected);
        assert!(app.store.dataset().is_empty());
        let notice = app.notice.as_ref().unwrap();
        assert_eq!(notice.severity, Severity::Error);
        assert!(notice.message.starts_with("File not found: "), "{}", notice.message);
    }

    #[test]
    fn test_trigger_only_once_per_upload() {
        let dir = TempDir::new().unwrap();
        let (mut app, api) = app_with(FakeApi::default(), &dir);

        app.update(Action::TriggerProcessing).unwrap();
        assert!(api.calls().is_empty());

        upload_and_process(&mut app, &dir);
        assert_eq!(app.workflow.stage(), WorkflowStage::Processed);
        assert_eq!(
            app.notice.as_ref().unwrap().message,
            "File processing triggered: File processing started"
        );

        app.update(Action::TriggerProcessing).unwrap();
        settle(&mut app);
        let triggers = api.calls().iter().filter(|c| c.starts_with("trigger")).count();
        assert_eq!(triggers, 1);
    }

    #[test]
    fn test_trigger_failure_allows_retry() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi {
            fail_trigger: true,
            ..FakeApi::default()
        };
        let (mut app, _api) = app_with(api, &dir);

        upload_and_process(&mut app, &dir);
        assert_eq!(app.workflow.stage(), WorkflowStage::Uploaded);
        assert_eq!(app.notice.as_ref().unwrap().message, TRIGGER_FAILED_NOTICE);
    }

    #[test]
    fn test_status_lists_result_files() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi {
            status: Some(StatusResponse {
                status: "done".to_string(),
                files: vec!["out.csv".to_string()],
            }),
            ..FakeApi::default()
        };
        let (mut app, api) = app_with(api, &dir);
        upload_and_process(&mut app, &dir);

        app.update(Action::OpenExportPanel).unwrap();
        assert!(app.export_status.as_ref().unwrap().checking);
        settle(&mut app);

        let status = app.export_status.as_ref().unwrap();
        assert_eq!(status.status, "done");
        assert_eq!(status.files, vec!["out.csv"]);
        assert!(api.calls().contains(&"status report".to_string()));

        app.update(Action::ModalDown).unwrap();
        assert_eq!(
            app.modals.top(),
            Some(&Modal::ExportPanel { selected_index: 0 })
        );

        app.update(Action::ToggleExportFormat).unwrap();
        app.update(Action::ExportSelectedFile).unwrap();
        settle(&mut app);
        assert!(dir.path().join("downloads").join("out.xlsx").exists());
    }

    #[test]
    fn test_status_failure_clears_files() {
        let dir = TempDir::new().unwrap();
        let (mut app, _api) = app_with(FakeApi::default(), &dir);
        upload_and_process(&mut app, &dir);

        app.update(Action::OpenExportPanel).unwrap();
        settle(&mut app);

        let status = app.export_status.as_ref().unwrap();
        assert_eq!(status.status, "Folder not found");
        assert!(status.files.is_empty());
        assert!(!status.checking);
    }

    #[test]
    fn test_export_panel_needs_a_file() {
        let dir = TempDir::new().unwrap();
        let (mut app, api) = app_with(FakeApi::default(), &dir);
        app.update(Action::OpenExportPanel).unwrap();
        assert!(app.modals.is_empty());
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_view_replaces_dataset() {
        let dir = TempDir::new().unwrap();
        let api = FakeApi {
            status: Some(StatusResponse {
                status: "success".to_string(),
                files: vec!["out.csv".to_string()],
            }),
            view: Some(two_sheets()),
            ..FakeApi::default()
        };
        let (mut app, api) = app_with(api, &dir);
        upload_and_process(&mut app, &dir);
        app.update(Action::OpenExportPanel).unwrap();
        settle(&mut app);

        app.update(Action::ViewSelectedFile).unwrap();
        assert!(app.modals.is_empty());
        settle(&mut app);

        assert!(api.calls().contains(&"view report/out.csv".to_string()));
        assert_eq!(app.store.dataset().names(), vec!["first", "second"]);
        assert_eq!(app.store.active_tab(), Some("first"));
    }

    #[test]
    fn test_stale_view_is_discarded() {
        let dir = TempDir::new().unwrap();
        let (mut app, _api) = app_with(FakeApi::default(), &dir);
        let older = app.store.issue_ticket(RequestSlot::Dataset);
        let newer = app.store.issue_ticket(RequestSlot::Dataset);

        app.handle_request_event(RequestEvent::Viewed {
            ticket: older,
            file_name: "old.csv".to_string(),
            result: Ok(two_sheets()),
        });
        assert!(app.store.dataset().is_empty());
        assert!(app.notice.is_none());

        app.handle_request_event(RequestEvent::Viewed {
            ticket: newer,
            file_name: "new.csv".to_string(),
            result: Ok(two_sheets()),
        });
        assert_eq!(app.store.dataset().len(), 2);
    }

    #[test]
    fn test_tab_switch_resets_view_and_keeps_data() {
        let dir = TempDir::new().unwrap();
        let (mut app, _api) = app_with(FakeApi::default(), &dir);
        app.store.replace_dataset(two_sheets());
        app.update(Action::Tick).unwrap();
        let before = app.store.dataset().clone();

        app.update(Action::OpenGridFilter).unwrap();
        app.update(Action::ModalInput('x')).unwrap();
        assert_eq!(app.view.filter, "x");
        app.update(Action::ConfirmModal).unwrap();

        app.update(Action::NextTab).unwrap();
        assert_eq!(app.store.active_tab(), Some("second"));
        assert!(app.view.filter.is_empty());
        app.update(Action::PrevTab).unwrap();
        assert_eq!(app.store.active_sheet().unwrap().columns(), vec!["a"]);
        assert_eq!(app.store.dataset(), &before);
    }

    #[test]
    fn test_cancelled_filter_is_cleared() {
        let dir = TempDir::new().unwrap();
        let (mut app, _api) = app_with(FakeApi::default(), &dir);
        app.update(Action::OpenGridFilter).unwrap();
        app.update(Action::ModalInput('a')).unwrap();
        app.update(Action::CloseModal).unwrap();
        assert!(app.view.filter.is_empty());
        assert!(app.modals.is_empty());
    }

    #[test]
    fn test_parameter_cancel_keeps_committed_set() {
        let dir = TempDir::new().unwrap();
        let (mut app, api) = app_with(FakeApi::default(), &dir);
        let before = app.parameters.clone();

        app.update(Action::OpenParameters).unwrap();
        app.update(Action::ModalBackspace).unwrap();
        app.update(Action::ModalInput('5')).unwrap();
        app.update(Action::CloseModal).unwrap();

        assert_eq!(app.parameters, before);
        assert!(app.modals.is_empty());
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_invalid_parameters_block_submit() {
        let dir = TempDir::new().unwrap();
        let (mut app, _api) = app_with(FakeApi::default(), &dir);
        let before = app.parameters.clone();

        app.update(Action::OpenParameters).unwrap();
        app.update(Action::ModalBackspace).unwrap();
        app.update(Action::ModalBackspace).unwrap();
        app.update(Action::ModalInput('-')).unwrap();
        app.update(Action::ModalInput('1')).unwrap();
        app.update(Action::ConfirmModal).unwrap();

        assert_eq!(
            app.modals.top(),
            Some(&Modal::Alert {
                message: FIX_ERRORS_NOTICE.to_string()
            })
        );
        assert_eq!(app.parameters, before);

        // Acknowledge the alert, fix the field, submit again
        app.update(Action::ConfirmModal).unwrap();
        assert_eq!(app.modals.top(), Some(&Modal::ParameterSettings));
        app.update(Action::RestoreDefault).unwrap();
        app.update(Action::ModalDown).unwrap();
        app.update(Action::ConfirmModal).unwrap();

        assert!(app.modals.is_empty());
        assert_eq!(app.parameters[0].value, Some(70.0));
    }

    #[test]
    fn test_file_prompt_confirm_selects_file() {
        let dir = TempDir::new().unwrap();
        let (mut app, _api) = app_with(FakeApi::default(), &dir);
        app.update(Action::OpenFilePrompt).unwrap();
        for c in "data.csv".chars() {
            app.update(Action::ModalInput(c)).unwrap();
        }
        let next = app.update(Action::ConfirmModal).unwrap();
        assert_eq!(next, Some(Action::SelectFile("data.csv".to_string())));
        assert!(app.modals.is_empty());
    }

    #[test]
    fn test_grid_export_writes_csv() {
        let dir = TempDir::new().unwrap();
        let (mut app, _api) = app_with(FakeApi::default(), &dir);
        app.store.replace_dataset(two_sheets());

        app.update(Action::ExportGrid).unwrap();

        let notice = app.notice.as_ref().unwrap();
        assert_eq!(notice.severity, Severity::Success);
        let written: Vec<_> = fs::read_dir(dir.path().join("downloads"))
            .unwrap()
            .collect();
        assert_eq!(written.len(), 1);
    }

    #[test]
    fn test_quit_confirm() {
        let dir = TempDir::new().unwrap();
        let (mut app, _api) = app_with(FakeApi::default(), &dir);
        app.update(Action::OpenQuitDialog).unwrap();
        app.update(Action::CloseModal).unwrap();
        assert!(!app.should_quit);
        app.update(Action::OpenQuitDialog).unwrap();
        app.update(Action::ConfirmModal).unwrap();
        assert!(app.should_quit);
    }
}
