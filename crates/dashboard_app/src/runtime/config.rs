//! Runtime configuration, read from a RON file.
//!
//! The file is named by `DASHBOARD_CONFIG` and defaults to `./dashboard.ron`.
//! Every field is optional:
//!
//! ```ron
//! (
//!     base_url: "http://localhost:48008",
//!     request_timeout_ms: 30000,
//!     log_destination: Both,
//!     log_level: "debug",
//!     dispatch_id: Some("78525234-72ec-42dc-94a0-f4751707f9cd"),
//!     node_id: Some(0),
//! )
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use dashboard_core::ListContext;
use dashboard_engine::ClientSettings;
use dashboard_logging::LogDestination;
use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_ENV: &str = "DASHBOARD_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "dashboard.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("unknown log level {0:?}")]
    InvalidLevel(String),
    #[error("node_id is set without dispatch_id")]
    NodeWithoutDispatch,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub log_destination: LogDestination,
    pub log_level: String,
    /// Job list to open on start, together with `node_id`.
    pub dispatch_id: Option<String>,
    pub node_id: Option<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let client = ClientSettings::default();
        Self {
            base_url: client.base_url,
            connect_timeout_ms: duration_ms(client.connect_timeout),
            request_timeout_ms: duration_ms(client.request_timeout),
            log_destination: LogDestination::default(),
            log_level: "info".to_string(),
            dispatch_id: None,
            node_id: None,
        }
    }
}

impl AppConfig {
    /// Loads the file named by `DASHBOARD_CONFIG`, or `./dashboard.ron`.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(".").join(DEFAULT_CONFIG_FILE));
        Self::load_from(&path)
    }

    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config: Self = ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        config.level_filter()?;
        config.startup_context()?;
        Ok(config)
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::InvalidLevel(self.log_level.clone()))
    }

    pub fn client_settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.base_url.clone(),
            connect_timeout: Duration::from_millis(self.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    /// The job list to open on start. A dispatch without a node opens node 0.
    pub fn startup_context(&self) -> Result<Option<ListContext>, ConfigError> {
        match (&self.dispatch_id, self.node_id) {
            (Some(dispatch_id), node_id) => Ok(Some(ListContext::new(
                dispatch_id.clone(),
                node_id.unwrap_or(0),
            ))),
            (None, Some(_)) => Err(ConfigError::NodeWithoutDispatch),
            (None, None) => Ok(None),
        }
    }
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write_config(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("dashboard.ron");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::load_from(&dir.path().join("absent.ron")).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.base_url, "http://localhost:48008");
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Info);
        assert_eq!(config.startup_context().unwrap(), None);
    }

    #[test]
    fn partial_file_overrides_named_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"(
                base_url: "http://dashboard.internal:8080",
                request_timeout_ms: 2500,
                log_destination: Both,
                log_level: "debug",
                dispatch_id: Some("abc"),
                node_id: Some(7),
            )"#,
        );

        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.log_destination, LogDestination::Both);
        assert_eq!(config.level_filter().unwrap(), LevelFilter::Debug);

        let client = config.client_settings();
        assert_eq!(client.base_url, "http://dashboard.internal:8080");
        assert_eq!(client.request_timeout, Duration::from_millis(2500));
        assert_eq!(client.connect_timeout, Duration::from_secs(10));

        assert_eq!(
            config.startup_context().unwrap(),
            Some(ListContext::new("abc", 7))
        );
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "(base_url: 42,");

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, r#"(log_level: "chatty")"#);

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLevel(level) if level == "chatty"));
    }

    #[test]
    fn node_needs_a_dispatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "(node_id: Some(3))");

        let err = AppConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::NodeWithoutDispatch));
    }
}
