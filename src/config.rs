//! User configuration (`config.toml`) and directory layout

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use serde::Deserialize;
use tracing::debug;

const APP_DIR: &str = "heroapps";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Catalog server root, e.g. `http://localhost:5000`
    pub base_url: String,
    /// Path of the endpoint returning the whole collection
    pub all_apps_path: String,
    pub request_timeout_secs: u64,
    /// Delay between the last search keystroke and the request it triggers
    pub search_debounce_ms: u64,
    /// Where the installed list and logs live
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: String::from("http://localhost:5000"),
            all_apps_path: String::from("/all-apps"),
            request_timeout_secs: 10,
            search_debounce_ms: 250,
            data_dir: None,
        }
    }
}

impl Config {
    /// Load from an explicit path, or from the default location if present.
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// file just yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => match config_dir().map(|d| d.join("config.toml")) {
                Some(default) if default.exists() => Self::from_file(&default),
                _ => Ok(Self::default()),
            },
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .wrap_err_with(|| format!("read config {}", path.display()))?;
        let config = Self::from_toml(&raw)
            .wrap_err_with(|| format!("parse config {}", path.display()))?;
        debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    /// Configured data dir, else the XDG default, else the working directory
    pub fn resolved_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(default_data_dir)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.resolved_data_dir().join("logs")
    }
}

/// `$XDG_CONFIG_HOME/heroapps`, falling back to `~/.config/heroapps`
pub fn config_dir() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", &[".config"]).map(|d| d.join(APP_DIR))
}

/// `$XDG_DATA_HOME/heroapps`, falling back to `~/.local/share/heroapps`
pub fn default_data_dir() -> Option<PathBuf> {
    xdg_dir("XDG_DATA_HOME", &[".local", "share"]).map(|d| d.join(APP_DIR))
}

fn xdg_dir(var: &str, home_fallback: &[&str]) -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(var).filter(|v| !v.is_empty()) {
        return Some(PathBuf::from(dir));
    }
    let mut dir = PathBuf::from(std::env::var_os("HOME")?);
    dir.extend(home_fallback);
    Some(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config = Config::from_toml(r#"base_url = "http://catalog.test""#).unwrap();
        assert_eq!(config.base_url, "http://catalog.test");
        assert_eq!(config.all_apps_path, "/all-apps");
        assert_eq!(config.search_debounce(), Duration::from_millis(250));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Config::from_toml("page_size = 30").is_err());
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn loads_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "request_timeout_secs = 3\nsearch_debounce_ms = 0\ndata_dir = \"/tmp/hero\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.request_timeout(), Duration::from_secs(3));
        assert_eq!(config.search_debounce(), Duration::ZERO);
        assert_eq!(config.resolved_data_dir(), PathBuf::from("/tmp/hero"));
        assert_eq!(config.logs_dir(), PathBuf::from("/tmp/hero/logs"));
    }
}
