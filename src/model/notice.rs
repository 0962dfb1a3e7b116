//! Transient notifications shown in the status bar

use chrono::{DateTime, Local};
use std::time::{Duration, Instant};

/// How long a notice stays visible
pub const NOTICE_TTL: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub raised_at: DateTime<Local>,
    shown_at: Instant,
}

impl Notice {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            raised_at: Local::now(),
            shown_at: Instant::now(),
        }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(Severity::Success, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(Severity::Info, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    pub fn is_expired(&self) -> bool {
        self.shown_at.elapsed() >= NOTICE_TTL
    }

    /// `[HH:MM:SS] message`
    pub fn display(&self) -> String {
        format!("[{}] {}", self.raised_at.format("%H:%M:%S"), self.message)
    }
}
