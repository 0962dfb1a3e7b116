//! File selection and upload progress tracking

use crate::error::FileRejection;
use crate::model::workflow::SelectedFile;
use std::env;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Extensions the server can read, compared case-insensitively
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

/// Validate a picked path and turn it into a `SelectedFile`
///
/// Nothing is read from the file; only its extension and existence are checked.
pub fn select_file(path: &Path) -> Result<SelectedFile, FileRejection> {
    let accepted = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ACCEPTED_EXTENSIONS
                .iter()
                .any(|ok| ext.eq_ignore_ascii_case(ok))
        })
        .unwrap_or(false);
    if !accepted {
        return Err(FileRejection::UnsupportedExtension {
            path: path.to_path_buf(),
        });
    }

    if !path.is_file() {
        return Err(FileRejection::NotFound {
            path: path.to_path_buf(),
        });
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(SelectedFile {
        path: path.to_path_buf(),
        folder_name: folder_name_for(&file_name).to_string(),
        file_name,
    })
}

/// Turn typed prompt text into a path: trims, strips quotes, expands `~/`
pub fn resolve_input_path(input: &str) -> PathBuf {
    let trimmed = input.trim().trim_matches(|c: char| c == '"' || c == '\'');
    match (trimmed.strip_prefix("~/"), env::var("HOME")) {
        (Some(rest), Ok(home)) => PathBuf::from(home).join(rest),
        _ => PathBuf::from(trimmed),
    }
}

/// Job folder for an uploaded file: the name up to the first `.`
pub fn folder_name_for(file_name: &str) -> &str {
    file_name.split('.').next().unwrap_or(file_name)
}

/// Percentage of `sent` out of `total`, clamped to 0..=100
pub fn percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent.min(total) * 100) / total) as u8
}

/// Reader that reports how much of a known-length body has been consumed
///
/// The callback fires only when the whole-percent value changes.
pub struct ProgressReader<R> {
    inner: R,
    total: u64,
    sent: u64,
    last: Option<u8>,
    on_progress: Box<dyn FnMut(u8) + Send>,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(inner: R, total: u64, on_progress: Box<dyn FnMut(u8) + Send>) -> Self {
        Self {
            inner,
            total,
            sent: 0,
            last: None,
            on_progress,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.sent += n as u64;
        let pct = percent(self.sent, self.total);
        if self.last != Some(pct) {
            self.last = Some(pct);
            (self.on_progress)(pct);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[test]
    fn test_report_xlsx_folder_name() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.xlsx");
        fs::write(&path, b"PK").unwrap();

        let file = select_file(&path).unwrap();
        assert_eq!(file.file_name, "report.xlsx");
        assert_eq!(file.folder_name, "report");
    }

    #[test]
    fn test_txt_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, b"hello").unwrap();

        let err = select_file(&path).unwrap_err();
        assert!(matches!(err, FileRejection::UnsupportedExtension { .. }));
        assert_eq!(err.to_string(), "Please upload a valid CSV or Excel file.");
    }

    #[test]
    fn test_extension_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("DATA.CSV");
        fs::write(&path, b"a,b\n1,2\n").unwrap();
        assert!(select_file(&path).is_ok());
    }

    #[test]
    fn test_extension_must_be_real_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("csv");
        fs::write(&path, b"a").unwrap();
        assert!(select_file(&path).is_err());
    }

    #[test]
    fn test_missing_file() {
        let err = select_file(Path::new("/nonexistent/dir/book.xls")).unwrap_err();
        assert!(matches!(err, FileRejection::NotFound { .. }));
    }

    #[test]
    fn test_resolve_input_path() {
        assert_eq!(resolve_input_path("  'data/report.xlsx' "), PathBuf::from("data/report.xlsx"));
        if let Ok(home) = env::var("HOME") {
            assert_eq!(resolve_input_path("~/a.csv"), PathBuf::from(home).join("a.csv"));
        }
    }

    #[test]
    fn test_folder_name_uses_first_dot() {
        assert_eq!(folder_name_for("q3.final.xlsx"), "q3");
        assert_eq!(folder_name_for("noext"), "noext");
    }

    #[test]
    fn test_progress_reader_reports_percentages() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let data = vec![0u8; 1000];
        let mut reader = ProgressReader::new(
            Cursor::new(data),
            1000,
            Box::new(move |pct| sink.lock().unwrap().push(pct)),
        );

        let mut buf = [0u8; 250];
        while reader.read(&mut buf).unwrap() > 0 {}

        let seen = seen.lock().unwrap();
        assert_eq!(*seen, vec![25, 50, 75, 100]);
    }
}
