use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::grid::DEFAULT_PAGE_SIZE;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root of the processing API, without a trailing slash
    pub api_base_url: String,
    /// Where exported files are written
    pub download_dir: PathBuf,
    /// Per-request timeout; `None` leaves the HTTP client's default
    pub request_timeout_secs: Option<u64>,
    /// Initial grid page size (10, 20 or 50)
    pub page_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        let download_dir = env::var("HOME")
            .map(|home| PathBuf::from(home).join("Downloads"))
            .unwrap_or_else(|_| PathBuf::from("downloads"));
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            download_dir,
            request_timeout_secs: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl Config {
    pub fn config_dir() -> Option<PathBuf> {
        let home = env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".sheetflow"))
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("config.json"))
    }

    /// Default location of the log file
    pub fn log_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("sheetflow.log"))
    }

    /// Load `~/.sheetflow/config.json`, falling back to defaults
    pub fn load() -> Config {
        Self::config_path()
            .and_then(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    pub fn load_from(path: &Path) -> Option<Config> {
        if !path.exists() {
            return None;
        }

        let contents = fs::read_to_string(path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    /// Save the config to disk
    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config path"))?;
        self.save_to(&config_path)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(dir) = path.parent() {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    /// Apply command line / environment overrides on top of the file values
    pub fn with_overrides(mut self, base_url: Option<String>, download_dir: Option<PathBuf>) -> Self {
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(dir) = download_dir {
            self.download_dir = dir;
        }
        self.api_base_url = self.api_base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load_from(&dir.path().join("config.json")).is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_base_url": "http://api.internal:8080", "page_size": 50}"#).unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.api_base_url, "http://api.internal:8080");
        assert_eq!(config.page_size, 50);
        assert_eq!(config.request_timeout(), None);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let config = Config {
            request_timeout_secs: Some(30),
            ..Config::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path), Some(config));
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(
            Some("http://example.test/".to_string()),
            Some(PathBuf::from("/tmp/out")),
        );
        assert_eq!(config.api_base_url, "http://example.test");
        assert_eq!(config.download_dir, PathBuf::from("/tmp/out"));

        let config = Config::default().with_overrides(Some("  ".to_string()), None);
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }
}
