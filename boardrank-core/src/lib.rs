//! `BoardRank` Core Library
//!
//! This crate provides the ordering engine behind `BoardRank` kanban boards:
//! fractional rank keys, the board model that applies drag-and-drop moves,
//! and the reconciler that commits moves optimistically and rolls them back
//! when the store refuses them.
//!
//! # Crate Structure
//!
//! - [`rank`] - Base-62 rank keys and rank allocation
//! - [`board`] - Partitions, arrangements, moves and drop resolution
//! - [`reconcile`] - Optimistic commit, persistence boundary, rollback
//! - [`config`] - Settings stored in `settings.toml`
//! - [`error`] - Error types for every layer
//! - [`testing`] - Scriptable persistence for tests and demos
//! - [`tracing`] - Structured logging setup

// Enable missing_docs warning for public API documentation
#![warn(missing_docs)]

pub mod board;
pub mod config;
pub mod error;
pub mod rank;
pub mod reconcile;
pub mod testing;
pub mod tracing;

// =============================================================================
// Convenience re-exports
//
// Flat re-exports used by the CLI and the integration tests.
// =============================================================================

pub use board::{
    Arrangement, Board, DropPosition, DropTarget, Item, ItemId, MoveIntent, OrderViolation,
    PartitionId, apply_intent, apply_move, intent_for_drop, is_noop, is_valid_drop_position,
    resolve_drop, validate_move,
};
pub use config::{BoardSettings, ConfigManager, LoggingSettings};
pub use error::{
    ConfigError, ConfigResult, MoveError, PersistError, PersistFailureKind, RankError,
    RankResult, ReorderError, ReorderResult,
};
pub use rank::{
    Allocation, DEFAULT_MAX_RANK_LEN, MID_KEY, RankAllocator, RankKey, next_rank, rank_for_end,
    rebalance,
};
pub use reconcile::{
    CancellationToken, ChangePayload, CommitOutcome, CommitPolicy, Confirmation,
    PartitionOrder, PartitionTransition, PersistenceBoundary, RankAssignment,
    ReconcilerConfig, ReorderReconciler,
};
pub use testing::{MockOutcome, MockPersistence};
pub use tracing::{
    TracingConfig, TracingError, TracingLevel, TracingOutput, TracingResult, init_tracing,
};
