//! sheetflow - A terminal UI for a spreadsheet processing service
//!
//! Upload a spreadsheet, trigger processing on the server, then browse,
//! view and export the processed results. Uses the Component Architecture
//! pattern from ratatui.

mod action;
mod app;
mod component;
mod components;
mod config;
mod error;
mod model;
mod services;
mod tui;

use crate::action::Action;
use crate::app::App;
use crate::component::Component;
use crate::config::Config;
use crate::model::parameter::{default_parameters, load_preset};
use crate::services::HttpApi;
use crate::tui::Tui;
use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::Event;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "sheetflow", version, about = "Upload, process and browse spreadsheets from the terminal")]
struct Args {
    /// Spreadsheet to select and upload right away
    file: Option<PathBuf>,

    /// Base URL of the processing API
    #[arg(long, env = "SHEETFLOW_API_URL")]
    base_url: Option<String>,

    /// Directory exported files are written to
    #[arg(long)]
    download_dir: Option<PathBuf>,

    /// YAML file with the parameter definitions
    #[arg(long, value_name = "YAML")]
    parameters: Option<PathBuf>,

    /// Log file (defaults to ~/.sheetflow/sheetflow.log)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.clone())?;

    let config = load_config(&args);
    let parameters = match &args.parameters {
        Some(path) => load_preset(path)?,
        None => default_parameters(),
    };
    let api = HttpApi::new(&config.api_base_url, config.request_timeout())
        .context("Failed to build HTTP client")?;
    info!(base_url = %api.base_url(), download_dir = %config.download_dir.display(), "starting");

    // Setup terminal
    let mut tui = Tui::new()?.with_tick_rate(Duration::from_millis(100));
    tui.enter()?;

    // Create app state
    let mut app = App::new(config, Arc::new(api), parameters);
    app.init()?;
    if let Some(file) = args.file {
        app.update(Action::SelectFile(file.display().to_string()))?;
    }

    // Main event loop
    let result = run_app(&mut tui, &mut app);

    // Cleanup terminal
    tui.exit()?;

    // Handle any errors
    if let Err(err) = result {
        error!(?err, "event loop failed");
        eprintln!("Error: {:?}", err);
        std::process::exit(1);
    }

    info!("exited cleanly");
    Ok(())
}

/// Config file, then environment and flags on top; writes defaults on first run
fn load_config(args: &Args) -> Config {
    let first_run = Config::config_path().is_some_and(|path| !path.exists());
    let config = Config::load();
    if first_run {
        if let Err(err) = config.save() {
            error!(%err, "could not write default config");
        }
    }
    config.with_overrides(args.base_url.clone(), args.download_dir.clone())
}

/// Route tracing output to a file; the terminal belongs to the TUI
fn init_logging(log_file: Option<PathBuf>) -> Result<()> {
    let Some(path) = log_file.or_else(Config::log_path) else {
        return Ok(());
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

/// Run the main application loop
fn run_app(tui: &mut Tui, app: &mut App) -> Result<()> {
    while !app.should_quit {
        // Draw the UI
        tui.draw(|frame| {
            if let Err(e) = app.draw(frame, frame.area()) {
                error!(%e, "draw failed");
            }
        })?;

        // Poll for events
        if let Some(event) = tui.next_event()? {
            // Convert event to action
            let action = match event {
                Event::Key(key) => app.handle_key_event(key)?,
                Event::Resize(w, h) => Some(Action::Resize(w, h)),
                _ => None,
            };

            // Action might produce a follow-up action
            let mut current_action = action;
            while let Some(a) = current_action {
                current_action = app.update(a)?;
            }
        } else {
            // No event - send a tick for time-based updates
            app.update(Action::Tick)?;
        }
    }

    Ok(())
}
