//! Background request runner
//!
//! Every API call runs on its own thread. Results come back as
//! `RequestEvent`s over a channel that the app drains on each tick.

use crate::error::ClientError;
use crate::model::dataset::Dataset;
use crate::model::export::ExportFormat;
use crate::model::store::RequestTicket;
use crate::model::workflow::SelectedFile;
use crate::services::api::{ProcessingApi, StatusResponse, TriggerResponse, UploadResponse};
use crate::services::download::save_export;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

/// Completion (or progress) of a background request
#[derive(Debug)]
pub enum RequestEvent {
    UploadProgress {
        ticket: RequestTicket,
        progress: Option<u8>,
    },
    Uploaded {
        ticket: RequestTicket,
        file: SelectedFile,
        result: Result<UploadResponse, ClientError>,
    },
    Triggered {
        ticket: RequestTicket,
        file_name: String,
        result: Result<TriggerResponse, ClientError>,
    },
    StatusChecked {
        ticket: RequestTicket,
        job_name: String,
        result: Result<StatusResponse, ClientError>,
    },
    Viewed {
        ticket: RequestTicket,
        file_name: String,
        result: Result<Dataset, ClientError>,
    },
    /// Exports are never superseded, so they carry no ticket
    Exported {
        file_name: String,
        format: ExportFormat,
        result: Result<PathBuf, ClientError>,
    },
}

impl RequestEvent {
    /// Whether this event ends a request (progress updates do not)
    pub fn is_final(&self) -> bool {
        !matches!(self, RequestEvent::UploadProgress { .. })
    }
}

pub struct RequestRunner {
    api: Arc<dyn ProcessingApi>,
    download_dir: PathBuf,
    tx: Sender<RequestEvent>,
    rx: Receiver<RequestEvent>,
    in_flight: usize,
}

impl RequestRunner {
    pub fn new(api: Arc<dyn ProcessingApi>, download_dir: PathBuf) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            api,
            download_dir,
            tx,
            rx,
            in_flight: 0,
        }
    }

    /// Number of requests that have not reported completion yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    fn spawn<F>(&mut self, task: F)
    where
        F: FnOnce(Arc<dyn ProcessingApi>, Sender<RequestEvent>) + Send + 'static,
    {
        let api = Arc::clone(&self.api);
        let tx = self.tx.clone();
        self.in_flight += 1;
        thread::spawn(move || task(api, tx));
    }

    pub fn upload(&mut self, ticket: RequestTicket, file: SelectedFile) {
        debug!(?ticket, file = %file.file_name, "spawning upload");
        self.spawn(move |api, tx| {
            let progress_tx = tx.clone();
            let progress = Box::new(move |progress: Option<u8>| {
                let _ = progress_tx.send(RequestEvent::UploadProgress { ticket, progress });
            });
            let result = api.upload(&file, progress);
            let _ = tx.send(RequestEvent::Uploaded {
                ticket,
                file,
                result,
            });
        });
    }

    pub fn trigger(&mut self, ticket: RequestTicket, file_name: String) {
        debug!(?ticket, file = %file_name, "spawning trigger");
        self.spawn(move |api, tx| {
            let result = api.trigger(&file_name);
            let _ = tx.send(RequestEvent::Triggered {
                ticket,
                file_name,
                result,
            });
        });
    }

    pub fn check_status(&mut self, ticket: RequestTicket, job_name: String) {
        debug!(?ticket, job = %job_name, "spawning status check");
        self.spawn(move |api, tx| {
            let result = api.check_status(&job_name);
            let _ = tx.send(RequestEvent::StatusChecked {
                ticket,
                job_name,
                result,
            });
        });
    }

    pub fn view(&mut self, ticket: RequestTicket, file_name: String, folder_name: String) {
        debug!(?ticket, file = %file_name, "spawning view");
        self.spawn(move |api, tx| {
            let result = api.view_file(&file_name, &folder_name);
            let _ = tx.send(RequestEvent::Viewed {
                ticket,
                file_name,
                result,
            });
        });
    }

    pub fn export(&mut self, file_name: String, folder_name: String, format: ExportFormat) {
        debug!(file = %file_name, %format, "spawning export");
        let dir = self.download_dir.clone();
        self.spawn(move |api, tx| {
            let result = api
                .export_file(&file_name, &folder_name, format)
                .and_then(|bytes| Ok(save_export(&dir, &file_name, format, &bytes)?));
            let _ = tx.send(RequestEvent::Exported {
                file_name,
                format,
                result,
            });
        });
    }

    /// Drain every event that has arrived since the last poll
    pub fn poll(&mut self) -> Vec<RequestEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if event.is_final() {
                        self.in_flight = self.in_flight.saturating_sub(1);
                    }
                    events.push(event);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("request channel disconnected");
                    break;
                }
            }
        }
        events
    }
}
