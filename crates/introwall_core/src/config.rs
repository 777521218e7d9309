//! Runtime configuration resolved from environment variables.
//!
//! # Responsibility
//! - Decide once, at startup, which comment backend is active.
//! - Resolve local storage and logging locations.
//!
//! # Invariants
//! - The remote backend is selected only when both the URL and the anon key
//!   are present and non-blank.
//! - `from_vars` never reads the process environment.

use crate::store::BackendKind;
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const REMOTE_URL_VAR: &str = "INTROWALL_REMOTE_URL";
pub const REMOTE_ANON_KEY_VAR: &str = "INTROWALL_REMOTE_ANON_KEY";
pub const DB_PATH_VAR: &str = "INTROWALL_DB_PATH";
pub const LOG_LEVEL_VAR: &str = "INTROWALL_LOG_LEVEL";
pub const LOG_DIR_VAR: &str = "INTROWALL_LOG_DIR";
pub const POLL_INTERVAL_VAR: &str = "INTROWALL_POLL_INTERVAL_MS";

const DEFAULT_DB_FILE_NAME: &str = "introwall_local.sqlite3";
const DEFAULT_POLL_INTERVAL_MS: u64 = 2_000;
const MIN_POLL_INTERVAL_MS: u64 = 200;

static REMOTE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/?#]+(/[^\s?#]*)?$").expect("valid remote url regex"));

/// Configuration errors. Both are caller mistakes, never runtime faults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidRemoteUrl(String),
    InvalidPollInterval(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidRemoteUrl(value) => {
                write!(f, "{REMOTE_URL_VAR} must be an http(s) url, got `{value}`")
            }
            Self::InvalidPollInterval(value) => write!(
                f,
                "{POLL_INTERVAL_VAR} must be an integer number of milliseconds, got `{value}`"
            ),
        }
    }
}

impl Error for ConfigError {}

/// Connection settings for the remote comment table.
#[derive(Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    /// Project base url without trailing slash.
    pub url: String,
    pub anon_key: String,
}

impl std::fmt::Debug for RemoteConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteConfig")
            .field("url", &self.url)
            .field("anon_key", &"<redacted>")
            .finish()
    }
}

/// Resolved application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallConfig {
    pub remote: Option<RemoteConfig>,
    pub db_path: PathBuf,
    pub log_level: Option<String>,
    pub log_dir: Option<String>,
    pub poll_interval: Duration,
}

impl WallConfig {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(std::env::vars())
    }

    /// Builds configuration from explicit `(name, value)` pairs.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut remote_url = None;
        let mut anon_key = None;
        let mut db_path = None;
        let mut log_level = None;
        let mut log_dir = None;
        let mut poll_interval = None;

        for (name, value) in vars {
            let slot = match name.as_ref() {
                REMOTE_URL_VAR => &mut remote_url,
                REMOTE_ANON_KEY_VAR => &mut anon_key,
                DB_PATH_VAR => &mut db_path,
                LOG_LEVEL_VAR => &mut log_level,
                LOG_DIR_VAR => &mut log_dir,
                POLL_INTERVAL_VAR => &mut poll_interval,
                _ => continue,
            };
            *slot = non_blank(value.into());
        }

        let remote = match (remote_url, anon_key) {
            (Some(url), Some(anon_key)) => Some(RemoteConfig {
                url: normalize_remote_url(&url)?,
                anon_key,
            }),
            _ => None,
        };

        let poll_interval = match poll_interval {
            Some(raw) => parse_poll_interval(&raw)?,
            None => Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
        };

        Ok(Self {
            remote,
            db_path: db_path
                .map(PathBuf::from)
                .unwrap_or_else(|| std::env::temp_dir().join(DEFAULT_DB_FILE_NAME)),
            log_level,
            log_dir,
            poll_interval,
        })
    }

    /// Backend that `CommentBackend::from_config` will build.
    pub fn backend_kind(&self) -> BackendKind {
        if self.remote.is_some() {
            BackendKind::Cloud
        } else {
            BackendKind::Local
        }
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn normalize_remote_url(raw: &str) -> Result<String, ConfigError> {
    let url = raw.trim_end_matches('/');
    if !REMOTE_URL_RE.is_match(url) {
        return Err(ConfigError::InvalidRemoteUrl(raw.to_string()));
    }
    Ok(url.to_string())
}

fn parse_poll_interval(raw: &str) -> Result<Duration, ConfigError> {
    let millis: u64 = raw
        .parse()
        .map_err(|_| ConfigError::InvalidPollInterval(raw.to_string()))?;
    Ok(Duration::from_millis(millis.max(MIN_POLL_INTERVAL_MS)))
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, WallConfig, REMOTE_ANON_KEY_VAR, REMOTE_URL_VAR};
    use crate::store::BackendKind;
    use std::time::Duration;

    #[test]
    fn missing_key_falls_back_to_local() {
        let config =
            WallConfig::from_vars([(REMOTE_URL_VAR, "https://abc.supabase.co")]).unwrap();
        assert_eq!(config.backend_kind(), BackendKind::Local);
        assert_eq!(config.poll_interval, Duration::from_millis(2_000));
    }

    #[test]
    fn blank_values_count_as_missing() {
        let config = WallConfig::from_vars([
            (REMOTE_URL_VAR, "https://abc.supabase.co"),
            (REMOTE_ANON_KEY_VAR, "   "),
        ])
        .unwrap();
        assert!(config.remote.is_none());
    }

    #[test]
    fn both_values_select_cloud_and_trim_trailing_slash() {
        let config = WallConfig::from_vars([
            (REMOTE_URL_VAR, "https://abc.supabase.co/"),
            (REMOTE_ANON_KEY_VAR, "anon"),
        ])
        .unwrap();
        assert_eq!(config.backend_kind(), BackendKind::Cloud);
        let remote = config.remote.unwrap();
        assert_eq!(remote.url, "https://abc.supabase.co");
        assert!(!format!("{remote:?}").contains("anon\""));
    }

    #[test]
    fn invalid_url_and_interval_are_rejected() {
        let err = WallConfig::from_vars([
            (REMOTE_URL_VAR, "ftp://nope"),
            (REMOTE_ANON_KEY_VAR, "anon"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRemoteUrl(_)));

        let err = WallConfig::from_vars([("INTROWALL_POLL_INTERVAL_MS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPollInterval(_)));

        let config = WallConfig::from_vars([("INTROWALL_POLL_INTERVAL_MS", "5")]).unwrap();
        assert_eq!(config.poll_interval, Duration::from_millis(200));
    }
}
