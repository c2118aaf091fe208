//! CLI error types and exit codes.

use boardrank_core::error::{ConfigError, MoveError, RankError, ReorderError};

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, validation, or I/O errors
    pub const GENERAL_ERROR: i32 = 1;
    /// The store refused the change or could not be reached; the board was
    /// left as it was
    pub const COMMIT_FAILURE: i32 = 2;
    /// `check` found ordering problems
    pub const INCONSISTENT_BOARD: i32 = 3;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Board file could not be read or written
    #[error("Board file error: {0}")]
    Board(String),

    /// Item not found on the board
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Invalid command arguments
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Rank key error
    #[error("Rank error: {0}")]
    Rank(#[from] RankError),

    /// The move could not be committed
    #[error("{0}")]
    Commit(ReorderError),

    /// The board failed verification
    #[error("Board has {0} ordering problem(s)")]
    Inconsistent(usize),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<MoveError> for CliError {
    fn from(err: MoveError) -> Self {
        match err {
            MoveError::UnknownItem(id) => Self::ItemNotFound(id.to_string()),
            other => Self::InvalidArgument(other.to_string()),
        }
    }
}

impl From<ReorderError> for CliError {
    fn from(err: ReorderError) -> Self {
        match err {
            ReorderError::InvalidMoveIntent(e) => e.into(),
            ReorderError::Rank(e) => Self::Rank(e),
            other => Self::Commit(other),
        }
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, arguments, board file, IO)
    /// - 2: Commit failure (store rejected or unavailable)
    /// - 3: Board failed `check`
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Commit(_) => exit_codes::COMMIT_FAILURE,
            Self::Inconsistent(_) => exit_codes::INCONSISTENT_BOARD,
            Self::Config(_)
            | Self::Board(_)
            | Self::ItemNotFound(_)
            | Self::InvalidArgument(_)
            | Self::Rank(_)
            | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }

    /// Message for the user, preferring the engine's wording for commit failures
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Commit(err) => err
                .user_message()
                .map_or_else(|| err.to_string(), |msg| format!("{msg} ({err})")),
            other => other.to_string(),
        }
    }
}
