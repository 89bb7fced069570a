//! Process configuration resolved from environment variables.
//!
//! # Responsibility
//! - Resolve database location and logging settings with defaults.
//!
//! # Invariants
//! - Resolution never touches the filesystem.
//! - Blank variables are treated as unset.

use crate::logging::{default_log_level, normalize_level};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

pub const ENV_DB_PATH: &str = "EMOTION_VR_DB_PATH";
pub const ENV_LOG_LEVEL: &str = "EMOTION_VR_LOG_LEVEL";
pub const ENV_LOG_DIR: &str = "EMOTION_VR_LOG_DIR";

pub const DEFAULT_DB_FILE_NAME: &str = "emotion_vr.db";

const SQLITE_URL_PREFIX: &str = "sqlite:///";

/// Errors from configuration resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable holds a value outside its accepted set.
    InvalidValue {
        variable: &'static str,
        value: String,
        reason: String,
    },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue {
                variable,
                value,
                reason,
            } => write!(f, "invalid {variable}=`{value}`: {reason}"),
        }
    }
}

impl Error for ConfigError {}

/// Resolved core settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    /// SQLite database file.
    pub db_path: PathBuf,
    /// Normalized log level.
    pub log_level: &'static str,
    /// Absolute log directory; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Resolves settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolves settings through `lookup`, which maps a variable name to its
    /// value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self::default();

        if let Some(raw) = read(ENV_DB_PATH) {
            config.db_path = parse_db_path(&raw);
        }

        if let Some(raw) = read(ENV_LOG_LEVEL) {
            config.log_level = normalize_level(&raw).map_err(|err| ConfigError::InvalidValue {
                variable: ENV_LOG_LEVEL,
                value: raw.clone(),
                reason: err.to_string(),
            })?;
        }

        if let Some(raw) = read(ENV_LOG_DIR) {
            if !Path::new(&raw).is_absolute() {
                return Err(ConfigError::InvalidValue {
                    variable: ENV_LOG_DIR,
                    value: raw,
                    reason: "must be an absolute path".to_string(),
                });
            }
            config.log_dir = Some(PathBuf::from(raw));
        }

        Ok(config)
    }
}

/// Accepts a plain path or a `sqlite:///path` URL.
pub fn parse_db_path(raw: &str) -> PathBuf {
    PathBuf::from(raw.strip_prefix(SQLITE_URL_PREFIX).unwrap_or(raw))
}
