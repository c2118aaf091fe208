//! Reorder reconciliation
//!
//! [`ReorderReconciler`] applies a move to the local board before the store
//! confirms it, sends a minimal [`ChangePayload`] through the
//! [`PersistenceBoundary`], and restores the previous board if the store
//! rejects the change or does not answer in time.
//!
//! Commits for the same item never overlap: depending on [`CommitPolicy`] a
//! second gesture either waits for the first or cancels it. Commits for
//! different items run concurrently.

mod payload;
mod reconciler;
mod slots;

pub use payload::{
    ChangePayload, Confirmation, PartitionOrder, PartitionTransition, PersistenceBoundary,
    RankAssignment,
};
pub use reconciler::{
    CommitOutcome, DEFAULT_PERSIST_TIMEOUT_MS, ReconcilerConfig, ReorderReconciler,
};
pub use slots::{CancellationToken, CommitPolicy};
