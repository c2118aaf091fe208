//! User-facing engine settings

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::rank::DEFAULT_MAX_RANK_LEN;
use crate::reconcile::{CommitPolicy, DEFAULT_PERSIST_TIMEOUT_MS};
use crate::tracing::TracingLevel;

/// Shortest key length limit accepted from settings
pub const MIN_MAX_RANK_LEN: usize = 4;

/// Settings stored in `settings.toml`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardSettings {
    /// Timeout for one persistence call, in milliseconds
    pub persist_timeout_ms: u64,
    /// Handling of a second drag on an item whose commit is pending
    pub commit_policy: CommitPolicy,
    /// Key length past which a partition is rebalanced
    pub max_rank_len: usize,
    /// Default columns for a new board
    pub default_partitions: Vec<String>,
    /// Logging settings
    pub logging: LoggingSettings,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self {
            persist_timeout_ms: DEFAULT_PERSIST_TIMEOUT_MS,
            commit_policy: CommitPolicy::Queue,
            max_rank_len: DEFAULT_MAX_RANK_LEN,
            default_partitions: ["BACKLOG", "TODO", "IN_PROGRESS", "DONE"]
                .into_iter()
                .map(String::from)
                .collect(),
            logging: LoggingSettings::default(),
        }
    }
}

impl BoardSettings {
    /// Checks that every value is usable
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] naming the first bad field.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.persist_timeout_ms == 0 {
            return Err(ConfigError::Validation {
                field: "persist_timeout_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_rank_len < MIN_MAX_RANK_LEN {
            return Err(ConfigError::Validation {
                field: "max_rank_len".to_string(),
                reason: format!("must be at least {MIN_MAX_RANK_LEN}"),
            });
        }
        if self.default_partitions.iter().any(|p| p.trim().is_empty()) {
            return Err(ConfigError::Validation {
                field: "default_partitions".to_string(),
                reason: "partition names must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Minimum level (`error`, `warn`, `info`, `debug`, `trace`)
    pub level: String,
    /// Optional `EnvFilter` directive overriding `level`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: TracingLevel::Info.to_string(),
            filter: None,
        }
    }
}

impl LoggingSettings {
    /// Parsed level, falling back to `info` for unknown names
    #[must_use]
    pub fn tracing_level(&self) -> TracingLevel {
        self.level.parse().unwrap_or_default()
    }
}
