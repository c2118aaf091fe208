//! Error types for the ordered-board engine
//!
//! Each concern has its own `thiserror` enum: rank generation, move
//! validation, the persistence boundary, the reconciler lifecycle, and
//! configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{ItemId, PartitionId};

/// Errors produced while generating or parsing rank keys
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RankError {
    /// The key contains a character outside the rank alphabet
    #[error("Invalid rank key '{key}': {reason}")]
    InvalidKey {
        /// The offending key text
        key: String,
        /// What is wrong with it
        reason: &'static str,
    },

    /// `lower` was not strictly less than `upper`
    #[error("Rank bounds out of order: '{lower}' is not below '{upper}'")]
    OutOfOrder {
        /// Lower bound
        lower: String,
        /// Upper bound
        upper: String,
    },

    /// No key fits between the neighbours within the practical length limit
    #[error("Rank keyspace exhausted between {lower:?} and {upper:?} (limit {max_len})")]
    Exhausted {
        /// Lower neighbour, if any
        lower: Option<String>,
        /// Upper neighbour, if any
        upper: Option<String>,
        /// Configured maximum key length
        max_len: usize,
    },

    /// An item that should be ranked has no rank on the board
    #[error("Item {0} has no rank on the board")]
    Unranked(ItemId),
}

/// Result type for rank operations
pub type RankResult<T> = Result<T, RankError>;

/// A move intent that cannot be applied to the current board
///
/// These are programmer errors: they are rejected before any optimistic
/// mutation happens, so nothing needs rolling back.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// The partition is not part of the board
    #[error("Unknown partition: {0}")]
    UnknownPartition(PartitionId),

    /// The item is not placed anywhere on the board
    #[error("Unknown item: {0}")]
    UnknownItem(ItemId),

    /// The item exists but not in the declared source partition
    #[error("Item {item} is not in partition {partition}")]
    NotInSource {
        /// The item being moved
        item: ItemId,
        /// The declared source partition
        partition: PartitionId,
    },

    /// The target index is past the end of the target partition
    #[error("Target index {index} out of range for partition {partition} (len {len})")]
    IndexOutOfRange {
        /// The target partition
        partition: PartitionId,
        /// The requested index
        index: usize,
        /// Length of the partition after removing the moved item
        len: usize,
    },

    /// An item with this id is already on the board
    #[error("Item already exists: {0}")]
    DuplicateItem(ItemId),
}

/// Machine-readable reason attached to a persistence failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistFailureKind {
    /// The store refused the payload as invalid
    Validation,
    /// The item was changed elsewhere (optimistic-lock conflict)
    Conflict,
    /// Network or store temporarily unavailable
    Transient,
    /// No answer within the caller-supplied timeout
    Timeout,
}

impl std::fmt::Display for PersistFailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Conflict => write!(f, "conflict"),
            Self::Transient => write!(f, "transient"),
            Self::Timeout => write!(f, "timeout"),
        }
    }
}

/// Failure returned by the persistence boundary
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("Persistence failed ({kind}): {message}")]
pub struct PersistError {
    /// Why the store rejected the call
    pub kind: PersistFailureKind,
    /// Human-readable detail from the store
    pub message: String,
}

impl PersistError {
    /// Creates a persistence error of the given kind
    #[must_use]
    pub fn new(kind: PersistFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Validation rejection
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(PersistFailureKind::Validation, message)
    }

    /// Optimistic-lock conflict
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(PersistFailureKind::Conflict, message)
    }

    /// Transient network/store failure
    #[must_use]
    pub fn transient(message: impl Into<String>) -> Self {
        Self::new(PersistFailureKind::Transient, message)
    }
}

/// Errors returned by [`crate::reconcile::ReorderReconciler`]
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReorderError {
    /// The move was rejected before any local change
    #[error("Invalid move intent: {0}")]
    InvalidMoveIntent(#[from] MoveError),

    /// The store answered with a validation or conflict error; rolled back
    #[error("Reorder rejected by store ({kind}): {message}")]
    PersistenceRejected {
        /// Validation or conflict
        kind: PersistFailureKind,
        /// Detail from the store
        message: String,
    },

    /// The store could not be reached or timed out; rolled back
    #[error("Store unavailable ({kind}): {message}")]
    PersistenceUnavailable {
        /// Transient or timeout
        kind: PersistFailureKind,
        /// Detail from the store
        message: String,
    },

    /// A newer gesture on the same item cancelled this commit
    #[error("Commit for item {0} was superseded by a newer move")]
    Superseded(ItemId),

    /// The board was torn down while the commit was pending
    #[error("Board was torn down")]
    TornDown,

    /// Rank generation failed in a way rebalance could not repair
    #[error("Rank allocation failed: {0}")]
    Rank(#[from] RankError),
}

/// Shown when the store could not be reached
pub const MSG_RETRY: &str = "Couldn't save the new order — try again";

/// Shown when the store refused the change
pub const MSG_REFRESH: &str = "This task was changed elsewhere — refresh";

impl From<PersistError> for ReorderError {
    fn from(err: PersistError) -> Self {
        match err.kind {
            PersistFailureKind::Validation | PersistFailureKind::Conflict => {
                Self::PersistenceRejected {
                    kind: err.kind,
                    message: err.message,
                }
            }
            PersistFailureKind::Transient | PersistFailureKind::Timeout => {
                Self::PersistenceUnavailable {
                    kind: err.kind,
                    message: err.message,
                }
            }
        }
    }
}

impl ReorderError {
    /// Returns the message to show the end user, if this error is user-facing
    ///
    /// Only persistence failures reach the user; invalid intents and
    /// internal cancellations are logged instead. A rejection and an
    /// unreachable store always read differently.
    #[must_use]
    pub const fn user_message(&self) -> Option<&'static str> {
        match self {
            Self::PersistenceRejected { .. } => Some(MSG_REFRESH),
            Self::PersistenceUnavailable { .. } => Some(MSG_RETRY),
            Self::InvalidMoveIntent(_) | Self::Superseded(_) | Self::TornDown | Self::Rank(_) => {
                None
            }
        }
    }

    /// Whether re-attempting the same gesture may succeed
    ///
    /// Only transient failures and timeouts qualify; the store answers a
    /// rejected payload the same way every time.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::PersistenceUnavailable { .. })
    }

    /// Whether the local board was rolled back because of this error
    #[must_use]
    pub const fn rolled_back(&self) -> bool {
        matches!(
            self,
            Self::PersistenceRejected { .. } | Self::PersistenceUnavailable { .. }
        )
    }
}

/// Result type for reconciler operations
pub type ReorderResult<T> = Result<T, ReorderError>;

/// Errors from loading or saving settings
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings file could not be read or written
    #[error("Failed to access {path}: {source}")]
    Io {
        /// File involved
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid TOML
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// Settings could not be serialized
    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A setting holds an unusable value
    #[error("Invalid setting '{field}': {reason}")]
    Validation {
        /// Setting name
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// No configuration directory could be determined
    #[error("Could not determine configuration directory")]
    NoConfigDir,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
