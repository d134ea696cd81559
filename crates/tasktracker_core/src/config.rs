//! Runtime configuration for the task tracker composition root.

use crate::logging::{default_log_level, init_logging, LoggingError};
use crate::store::session_store::DEFAULT_LOGIN_DELAY;
use std::path::PathBuf;
use std::time::Duration;

/// Settings consumed by `TaskTracker::open`.
///
/// Defaults: in-memory database, build-mode log level, no file logging,
/// one second login delay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite file backing durable storage; `None` keeps state in memory.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// Absolute directory for rolling logs; `None` disables file logging.
    pub log_dir: Option<PathBuf>,
    pub login_delay: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level().to_string(),
            log_dir: None,
            login_delay: DEFAULT_LOGIN_DELAY,
        }
    }
}

impl AppConfig {
    pub fn with_db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.db_path = Some(path.into());
        self
    }

    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    pub fn with_login_delay(mut self, delay: Duration) -> Self {
        self.login_delay = delay;
        self
    }

    /// Starts file logging when `log_dir` is set; otherwise does nothing.
    pub fn init_logging(&self) -> Result<(), LoggingError> {
        match &self.log_dir {
            Some(dir) => init_logging(&self.log_level, dir),
            None => Ok(()),
        }
    }
}
