//! Configuration for the dispatch component.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::policy::RetryPolicy;

/// Errors while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Dispatch configuration, loadable from TOML.
///
/// ```toml
/// max_attachment_size = 1048576
/// log_failed_messages = true
/// logging_level = "debug"
///
/// [retry]
/// max_retries = 5
/// retry_countdown_secs = 60
/// retryable_errors = ["recipients-refused", "connection-failed"]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailConfig {
    /// Upper bound on an attachment's *encoded* payload length, in
    /// bytes. Checked synchronously at submission.
    ///
    /// Default: 10 MiB
    #[serde(default = "defaults::max_attachment_size")]
    pub max_attachment_size: usize,

    /// Log message bodies (and attachment listings) at info level when
    /// a job fails terminally. Leaks message content into the logs;
    /// off by default.
    #[serde(default)]
    pub log_failed_messages: bool,

    /// Verbosity for the mail logger ("trace" .. "error"). `None`
    /// falls back to the `LOG_LEVEL` environment variable, then the
    /// build-profile default.
    #[serde(default)]
    pub logging_level: Option<String>,

    /// Retry behaviour.
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            max_attachment_size: defaults::max_attachment_size(),
            log_failed_messages: false,
            logging_level: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl MailConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }
}

mod defaults {
    pub const fn max_attachment_size() -> usize {
        10 * 1024 * 1024 // 10 MiB of encoded payload
    }
}
