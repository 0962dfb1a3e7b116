//! HTTP client for the spreadsheet processing API
//!
//! `ProcessingApi` is the seam the rest of the app talks to; `HttpApi` is the
//! reqwest implementation. All calls are blocking and are expected to run on
//! a background thread (see `request_runner`).

use crate::error::ClientError;
use crate::model::dataset::{Dataset, RowRecord, Sheet};
use crate::model::export::ExportFormat;
use crate::model::workflow::SelectedFile;
use crate::services::upload::{select_file, ProgressReader};
use regex::{Captures, Regex};
use reqwest::blocking::{multipart, Client, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fs::File;
use std::sync::LazyLock;
use std::time::Duration;
use tracing::debug;

/// Upload progress callback: `Some(percent)` or `None` when the size is unknown
pub type ProgressFn = Box<dyn FnMut(Option<u8>) + Send>;

/// Matches string literals (kept) and the bare non-JSON number tokens (nulled)
static NON_FINITE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:[^"\\]|\\.)*"|-?Infinity|NaN"#).unwrap()
});

/// Replace `NaN`, `Infinity` and `-Infinity` outside string literals with `null`
pub fn sanitize_json(text: &str) -> Cow<'_, str> {
    NON_FINITE_REGEX.replace_all(text, |caps: &Captures| {
        let m = &caps[0];
        if m.starts_with('"') {
            m.to_string()
        } else {
            "null".to_string()
        }
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub data: Vec<Sheet>,
    pub message: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
struct TriggerRequest<'a> {
    filename: &'a str,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TriggerResponse {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default)]
    pub files: Vec<String>,
}

/// `viewData` returns either a list of sheets or a bare list of rows
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ViewData {
    Sheets(Vec<Sheet>),
    Rows(Vec<RowRecord>),
}

#[derive(Debug, Deserialize)]
struct ViewResponse {
    data: ViewData,
}

/// Body of a non-2xx response
#[derive(Debug, Default, Deserialize)]
struct ErrorPayload {
    error: Option<String>,
    status: Option<String>,
}

/// Which field of an error payload explains the failure
#[derive(Debug, Clone, Copy)]
enum ErrorField {
    /// `error`, falling back to `status`
    ErrorFirst,
    /// `status` only
    Status,
}

impl ErrorPayload {
    fn message(self, field: ErrorField) -> Option<String> {
        match field {
            ErrorField::ErrorFirst => self.error.or(self.status),
            ErrorField::Status => self.status,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// API
// ─────────────────────────────────────────────────────────────────────────────

/// Operations offered by the processing server
pub trait ProcessingApi: Send + Sync {
    /// Upload a file as multipart field `file`
    fn upload(&self, file: &SelectedFile, progress: ProgressFn)
        -> Result<UploadResponse, ClientError>;

    /// Ask the server to start processing an uploaded file
    fn trigger(&self, file_name: &str) -> Result<TriggerResponse, ClientError>;

    /// Status and result files of a job folder
    fn check_status(&self, job_name: &str) -> Result<StatusResponse, ClientError>;

    /// Rows of one processed file, as a dataset
    fn view_file(&self, file_name: &str, folder_name: &str) -> Result<Dataset, ClientError>;

    /// Raw bytes of a processed file converted to `format`
    fn export_file(
        &self,
        file_name: &str,
        folder_name: &str,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ClientError>;
}

pub struct HttpApi {
    client: Client,
    base_url: String,
}

impl HttpApi {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

/// Decode a JSON body, turning non-2xx responses into `ClientError::Status`
fn read_json<T: DeserializeOwned>(response: Response, field: ErrorField) -> Result<T, ClientError> {
    let code = response.status();
    let text = response.text()?;
    let text = sanitize_json(&text);
    if !code.is_success() {
        return Err(status_error(code.as_u16(), &text, field));
    }
    Ok(serde_json::from_str(&text)?)
}

fn status_error(code: u16, body: &str, field: ErrorField) -> ClientError {
    let payload: ErrorPayload = serde_json::from_str(body).unwrap_or_default();
    ClientError::Status {
        code,
        message: payload.message(field),
    }
}

impl ProcessingApi for HttpApi {
    fn upload(
        &self,
        file: &SelectedFile,
        mut progress: ProgressFn,
    ) -> Result<UploadResponse, ClientError> {
        // The file can change between selection and this background call
        select_file(&file.path)?;
        let handle = File::open(&file.path)?;
        let size = handle.metadata().map(|m| m.len()).unwrap_or(0);

        let part = if size > 0 {
            progress(Some(0));
            let reader = ProgressReader::new(handle, size, Box::new(move |pct| progress(Some(pct))));
            multipart::Part::reader_with_length(reader, size)
        } else {
            progress(None);
            multipart::Part::reader(handle)
        };
        let form = multipart::Form::new().part("file", part.file_name(file.file_name.clone()));

        debug!(file = %file.file_name, size, "POST /api/upload");
        let response = self
            .client
            .post(self.url("/api/upload"))
            .multipart(form)
            .send()?;
        read_json(response, ErrorField::ErrorFirst)
    }

    fn trigger(&self, file_name: &str) -> Result<TriggerResponse, ClientError> {
        debug!(file = %file_name, "POST /api/trigger-file-process");
        let response = self
            .client
            .post(self.url("/api/trigger-file-process"))
            .json(&TriggerRequest {
                filename: file_name,
            })
            .send()?;
        read_json(response, ErrorField::ErrorFirst)
    }

    fn check_status(&self, job_name: &str) -> Result<StatusResponse, ClientError> {
        debug!(job = %job_name, "GET /api/checkExportStatus");
        let response = self
            .client
            .get(self.url("/api/checkExportStatus"))
            .query(&[("name", job_name)])
            .send()?;
        read_json(response, ErrorField::Status)
    }

    fn view_file(&self, file_name: &str, folder_name: &str) -> Result<Dataset, ClientError> {
        debug!(file = %file_name, folder = %folder_name, "GET /api/viewData");
        let response = self
            .client
            .get(self.url("/api/viewData"))
            .query(&[("folderName", folder_name), ("fileName", file_name)])
            .send()?;
        let body: ViewResponse = read_json(response, ErrorField::ErrorFirst)?;
        Ok(view_dataset(body.data, file_name))
    }

    fn export_file(
        &self,
        file_name: &str,
        folder_name: &str,
        format: ExportFormat,
    ) -> Result<Vec<u8>, ClientError> {
        debug!(file = %file_name, folder = %folder_name, %format, "GET /process-file");
        let response = self
            .client
            .get(self.url("/process-file"))
            .query(&[
                ("fileName", file_name),
                ("folderName", folder_name),
                ("format", format.query_value()),
            ])
            .send()?;
        let code = response.status();
        if !code.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(status_error(code.as_u16(), &text, ErrorField::ErrorFirst));
        }
        Ok(response.bytes()?.to_vec())
    }
}

fn view_dataset(data: ViewData, file_name: &str) -> Dataset {
    match data {
        ViewData::Sheets(sheets) => Dataset::from_sheets(sheets),
        ViewData::Rows(rows) => Dataset::from_sheets(vec![Sheet::new(file_name, rows)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileRejection;
    use serde_json::json;
    use std::fs;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::sync::{Arc, Mutex};
    use std::thread;
    use tempfile::TempDir;

    #[test]
    fn test_sanitize_replaces_bare_tokens() {
        let raw = r#"{"a": NaN, "b": Infinity, "c": -Infinity, "d": 1}"#;
        let clean = sanitize_json(raw);
        let value: serde_json::Value = serde_json::from_str(&clean).unwrap();
        assert_eq!(value, json!({"a": null, "b": null, "c": null, "d": 1}));
    }

    #[test]
    fn test_sanitize_leaves_strings_alone() {
        let raw = r#"{"note": "NaN and \"Infinity\"", "v": NaN}"#;
        let value: serde_json::Value = serde_json::from_str(&sanitize_json(raw)).unwrap();
        assert_eq!(value["note"], json!("NaN and \"Infinity\""));
        assert_eq!(value["v"], json!(null));
    }

    #[test]
    fn test_upload_response_keeps_column_order() {
        let body = r#"{"message": "ok", "data": [
            {"sheetName": "s", "sheetContent": [{"zeta": 1, "alpha": NaN, "mid": "x"}]}
        ]}"#;
        let resp: UploadResponse = serde_json::from_str(&sanitize_json(body)).unwrap();
        assert_eq!(resp.data[0].columns(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(resp.message.as_deref(), Some("ok"));
        assert!(resp.error.is_none());
    }

    #[test]
    fn test_view_data_accepts_sheets_or_rows() {
        let sheets: ViewResponse = serde_json::from_str(
            r#"{"status": "success", "data": [{"sheetName": "Summary", "sheetContent": [{"a": 1}]}]}"#,
        )
        .unwrap();
        let ds = view_dataset(sheets.data, "out.xlsx");
        assert_eq!(ds.names(), vec!["Summary"]);

        let rows: ViewResponse =
            serde_json::from_str(r#"{"status": "success", "data": [{"a": 1}, {"a": 2}]}"#).unwrap();
        let ds = view_dataset(rows.data, "out.csv");
        assert_eq!(ds.names(), vec!["out.csv"]);
        assert_eq!(ds.sheets()[0].rows.len(), 2);
    }

    #[test]
    fn test_status_error_picks_field() {
        let body = r#"{"status": "Folder not found"}"#;
        let err = status_error(404, body, ErrorField::Status);
        assert_eq!(err.server_message(), Some("Folder not found"));

        let body = r#"{"error": "Folder name is required"}"#;
        let err = status_error(400, body, ErrorField::Status);
        assert_eq!(err.server_message(), None);
        let err = status_error(400, body, ErrorField::ErrorFirst);
        assert_eq!(err.server_message(), Some("Folder name is required"));

        let err = status_error(502, "<html>bad gateway</html>", ErrorField::ErrorFirst);
        assert!(matches!(err, ClientError::Status { code: 502, message: None }));
    }

    /// What the stub server saw of the one request it answered
    struct Recorded {
        request_line: String,
        body: Vec<u8>,
    }

    impl Recorded {
        fn body_text(&self) -> String {
            String::from_utf8_lossy(&self.body).into_owned()
        }
    }

    /// Read a request body sent with `Transfer-Encoding: chunked`
    fn read_chunked(reader: &mut impl BufRead) -> Vec<u8> {
        let mut body = Vec::new();
        loop {
            let mut size_line = String::new();
            reader.read_line(&mut size_line).unwrap();
            let size_hex = size_line.trim().split(';').next().unwrap_or("0");
            let size = usize::from_str_radix(size_hex, 16).unwrap();
            let mut chunk = vec![0u8; size + 2];
            reader.read_exact(&mut chunk).unwrap();
            if size == 0 {
                return body;
            }
            body.extend_from_slice(&chunk[..size]);
        }
    }

    /// Serve exactly one HTTP response and hand back the request it answered
    fn one_shot_server(
        status: &str,
        body: impl Into<Vec<u8>>,
    ) -> (String, thread::JoinHandle<Recorded>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let body: Vec<u8> = body.into();
        let mut response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        )
        .into_bytes();
        response.extend_from_slice(&body);
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut content_length = 0usize;
            let mut chunked = false;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(v) = lower.strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap_or(0);
                }
                if lower.starts_with("transfer-encoding:") && lower.contains("chunked") {
                    chunked = true;
                }
            }
            let body = if chunked {
                read_chunked(&mut reader)
            } else {
                let mut body = vec![0u8; content_length];
                reader.read_exact(&mut body).unwrap();
                body
            };
            stream.write_all(&response).unwrap();
            Recorded {
                request_line: request_line.trim_end().to_string(),
                body,
            }
        });
        (format!("http://{}", addr), handle)
    }

    #[test]
    fn test_check_status_over_http() {
        let (base, server) = one_shot_server(
            "200 OK",
            r#"{"status": "done", "files": ["out.csv"]}"#,
        );
        let api = HttpApi::new(&base, Some(Duration::from_secs(5))).unwrap();
        let status = api.check_status("report").unwrap();
        assert_eq!(status.status, "done");
        assert_eq!(status.files, vec!["out.csv"]);

        let request = server.join().unwrap();
        assert_eq!(
            request.request_line,
            "GET /api/checkExportStatus?name=report HTTP/1.1"
        );
    }

    #[test]
    fn test_check_status_failure_over_http() {
        let (base, server) = one_shot_server("404 NOT FOUND", r#"{"status": "Folder not found"}"#);
        let api = HttpApi::new(&base, Some(Duration::from_secs(5))).unwrap();
        let err = api.check_status("missing").unwrap_err();
        assert_eq!(err.server_message(), Some("Folder not found"));
        server.join().unwrap();
    }

    #[test]
    fn test_trigger_over_http() {
        let (base, server) = one_shot_server(
            "202 ACCEPTED",
            r#"{"status": "Success", "message": "File processing started", "filename": "report.xlsx"}"#,
        );
        let api = HttpApi::new(&format!("{}/", base), None).unwrap();
        let resp = api.trigger("report.xlsx").unwrap();
        assert_eq!(resp.message, "File processing started");

        let request = server.join().unwrap();
        assert_eq!(request.request_line, "POST /api/trigger-file-process HTTP/1.1");
        let sent: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
        assert_eq!(sent, json!({"filename": "report.xlsx"}));
    }

    fn selected(dir: &TempDir, name: &str, contents: &[u8]) -> SelectedFile {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        select_file(&path).unwrap()
    }

    #[test]
    fn test_upload_over_http() {
        let dir = TempDir::new().unwrap();
        let file = selected(&dir, "report.xlsx", b"PK-spreadsheet-bytes");
        let (base, server) = one_shot_server(
            "200 OK",
            r#"{"message": "File uploaded successfully: report.xlsx",
                "data": [{"sheetName": "Sheet1", "sheetContent": [{"id": 1, "score": NaN}]}]}"#,
        );
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let progress: ProgressFn =
            Box::new(move |p: Option<u8>| sink.lock().unwrap().push(p));

        let api = HttpApi::new(&base, Some(Duration::from_secs(5))).unwrap();
        let resp = api.upload(&file, progress).unwrap();
        assert_eq!(
            resp.message.as_deref(),
            Some("File uploaded successfully: report.xlsx")
        );
        assert_eq!(resp.data[0].name, "Sheet1");
        assert_eq!(resp.data[0].rows[0]["score"], json!(null));

        let request = server.join().unwrap();
        assert_eq!(request.request_line, "POST /api/upload HTTP/1.1");
        let body = request.body_text();
        assert!(body.contains(r#"name="file""#), "{}", body);
        assert!(body.contains(r#"filename="report.xlsx""#), "{}", body);
        assert!(body.contains("PK-spreadsheet-bytes"));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.first(), Some(&Some(0)));
        assert_eq!(seen.last(), Some(&Some(100)));
    }

    #[test]
    fn test_upload_rechecks_selected_file() {
        let dir = TempDir::new().unwrap();
        let file = selected(&dir, "report.xlsx", b"PK");
        fs::remove_file(&file.path).unwrap();

        // Nothing listens here; the file check fails before any request
        let api = HttpApi::new("http://127.0.0.1:9", Some(Duration::from_secs(1))).unwrap();
        let err = api.upload(&file, Box::new(|_: Option<u8>| {})).unwrap_err();
        assert!(matches!(
            err,
            ClientError::Validation(FileRejection::NotFound { .. })
        ));
    }

    #[test]
    fn test_view_file_over_http() {
        let (base, server) = one_shot_server(
            "200 OK",
            r#"{"status": "success", "data": [{"item": "a", "value": Infinity}, {"item": "b", "value": 2}]}"#,
        );
        let api = HttpApi::new(&base, Some(Duration::from_secs(5))).unwrap();
        let ds = api.view_file("out.csv", "report").unwrap();
        assert_eq!(ds.names(), vec!["out.csv"]);
        let rows = &ds.sheets()[0].rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["value"], json!(null));
        assert_eq!(rows[1]["value"], json!(2));

        let request = server.join().unwrap();
        assert_eq!(
            request.request_line,
            "GET /api/viewData?folderName=report&fileName=out.csv HTTP/1.1"
        );
    }

    #[test]
    fn test_export_file_over_http() {
        let payload: &[u8] = b"PK\x03\x04\x00\xffbinary";
        let (base, server) = one_shot_server("200 OK", payload);
        let api = HttpApi::new(&base, Some(Duration::from_secs(5))).unwrap();
        let bytes = api
            .export_file("out.csv", "report", ExportFormat::Excel)
            .unwrap();
        assert_eq!(bytes, payload);

        let request = server.join().unwrap();
        assert_eq!(
            request.request_line,
            "GET /process-file?fileName=out.csv&folderName=report&format=excel HTTP/1.1"
        );
    }

    #[test]
    fn test_export_failure_over_http() {
        let (base, server) = one_shot_server(
            "500 INTERNAL SERVER ERROR",
            r#"{"error": "Failed to convert file"}"#,
        );
        let api = HttpApi::new(&base, Some(Duration::from_secs(5))).unwrap();
        let err = api
            .export_file("out.xlsx", "report", ExportFormat::Csv)
            .unwrap_err();
        assert!(matches!(err, ClientError::Status { code: 500, .. }));
        assert_eq!(err.server_message(), Some("Failed to convert file"));

        let request = server.join().unwrap();
        assert_eq!(
            request.request_line,
            "GET /process-file?fileName=out.xlsx&folderName=report&format=csv HTTP/1.1"
        );
    }
}
