//! Writing downloaded and exported files to disk

use crate::model::dataset::{cell_text, Sheet};
use crate::model::export::{download_name, ExportFormat};
use chrono::{DateTime, Local};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Save a processed-file download as `<dir>/<base>.<ext>`, replacing any existing file
///
/// Directory parts of `file_name` are ignored; a name with no usable base is
/// refused with `InvalidInput`.
pub fn save_export(
    dir: &Path,
    file_name: &str,
    format: ExportFormat,
    bytes: &[u8],
) -> io::Result<PathBuf> {
    let name = download_name(file_name, format).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("unusable export file name: {:?}", file_name),
        )
    })?;
    fs::create_dir_all(dir)?;
    let path = dir.join(name);
    fs::write(&path, bytes)?;
    Ok(path)
}

/// File name for a grid export of `sheet_name` taken at `at`
pub fn grid_export_name(sheet_name: &str, at: DateTime<Local>) -> String {
    let safe: String = sheet_name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_{}.csv", safe, at.format("%Y%m%d_%H%M%S"))
}

/// Write the given rows of `sheet` as CSV; header is the sheet's columns
pub fn export_grid_csv(
    dir: &Path,
    sheet: &Sheet,
    rows: &[usize],
    at: DateTime<Local>,
) -> csv::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(grid_export_name(&sheet.name, at));
    let columns = sheet.columns();

    let mut writer = csv::Writer::from_path(&path)?;
    if !columns.is_empty() {
        writer.write_record(&columns)?;
    }
    for row in rows.iter().filter_map(|&i| sheet.rows.get(i)) {
        let record: Vec<String> = columns
            .iter()
            .map(|col| row.get(col).map(cell_text).unwrap_or_default())
            .collect();
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(path)
}
