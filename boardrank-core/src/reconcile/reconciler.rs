//! Optimistic commit/rollback lifecycle

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, debug_span, error, info, instrument, warn};

use crate::board::{
    Arrangement, Board, ItemId, MoveIntent, PartitionId, apply_intent, is_noop, validate_move,
};
use crate::config::BoardSettings;
use crate::error::{PersistError, PersistFailureKind, ReorderError, ReorderResult};
use crate::rank::{DEFAULT_MAX_RANK_LEN, RankAllocator, RankKey};
use crate::tracing::span_names;

use super::payload::{ChangePayload, Confirmation, PersistenceBoundary};
use super::slots::{CommitPolicy, ItemSlots};

/// Default timeout for one persistence call in milliseconds
pub const DEFAULT_PERSIST_TIMEOUT_MS: u64 = 10_000;

/// Reconciler behaviour
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Deadline for one persistence call; expiry counts as failure
    pub persist_timeout: Duration,
    /// Handling of a second gesture on an item with a pending commit
    pub commit_policy: CommitPolicy,
    /// Key length past which a partition is rebalanced
    pub max_rank_len: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            persist_timeout: Duration::from_millis(DEFAULT_PERSIST_TIMEOUT_MS),
            commit_policy: CommitPolicy::default(),
            max_rank_len: DEFAULT_MAX_RANK_LEN,
        }
    }
}

impl ReconcilerConfig {
    /// Creates a configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from user settings
    #[must_use]
    pub fn from_settings(settings: &BoardSettings) -> Self {
        Self {
            persist_timeout: Duration::from_millis(settings.persist_timeout_ms),
            commit_policy: settings.commit_policy,
            max_rank_len: settings.max_rank_len,
        }
    }

    /// Sets the persistence timeout
    #[must_use]
    pub const fn with_persist_timeout(mut self, timeout: Duration) -> Self {
        self.persist_timeout = timeout;
        self
    }

    /// Sets the commit policy
    #[must_use]
    pub const fn with_commit_policy(mut self, policy: CommitPolicy) -> Self {
        self.commit_policy = policy;
        self
    }

    /// Sets the practical rank length limit
    #[must_use]
    pub const fn with_max_rank_len(mut self, max_rank_len: usize) -> Self {
        self.max_rank_len = max_rank_len;
        self
    }
}

/// Result of a successful commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The move left the board unchanged; nothing was persisted
    Unchanged,
    /// The store accepted the change
    Committed {
        /// What was sent
        payload: ChangePayload,
        /// What the store answered
        confirmation: Confirmation,
    },
}

impl CommitOutcome {
    /// The payload that was persisted, if any
    #[must_use]
    pub const fn payload(&self) -> Option<&ChangePayload> {
        match self {
            Self::Unchanged => None,
            Self::Committed { payload, .. } => Some(payload),
        }
    }
}

/// State kept between publishing an optimistic board and resolving it
///
/// A superseded commit hands its `Pending` to the commit that replaced it,
/// since the store never saw that change.
struct Pending {
    previous: Arc<Board>,
    published_revision: u64,
    payload: ChangePayload,
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Owns the optimistic update lifecycle of a board
///
/// The board is published through a watch channel and only ever replaced
/// as a whole value, so readers never observe a half-applied move.
pub struct ReorderReconciler {
    state: watch::Sender<Arc<Board>>,
    persistence: Arc<dyn PersistenceBoundary>,
    allocator: RankAllocator,
    config: ReconcilerConfig,
    slots: ItemSlots<Pending>,
    live: super::CancellationToken,
    in_flight: AtomicUsize,
}

impl ReorderReconciler {
    /// Creates a reconciler over a confirmed board
    #[must_use]
    pub fn new(
        board: Board,
        persistence: Arc<dyn PersistenceBoundary>,
        config: ReconcilerConfig,
    ) -> Self {
        let (state, _) = watch::channel(Arc::new(board));
        Self {
            state,
            persistence,
            allocator: RankAllocator::new().with_max_rank_len(config.max_rank_len),
            config,
            slots: ItemSlots::default(),
            live: super::CancellationToken::new(),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// The board as currently displayed
    #[must_use]
    pub fn board(&self) -> Arc<Board> {
        Arc::clone(&self.state.borrow())
    }

    /// Subscribes to board publications
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Board>> {
        self.state.subscribe()
    }

    /// The active configuration
    #[must_use]
    pub const fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Number of commits currently running or queued
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Marks the board as discarded
    ///
    /// Pending commits finish their persistence call but leave the board
    /// alone; new commits fail with [`ReorderError::TornDown`].
    pub fn teardown(&self) {
        info!("Tearing down board reconciler");
        self.live.cancel();
    }

    /// Whether the board is still being displayed
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.live.is_cancelled()
    }

    /// Projects a drag-over without publishing anything
    ///
    /// # Errors
    ///
    /// Returns [`ReorderError::InvalidMoveIntent`] if the intent does not fit
    /// the current board.
    pub fn preview(&self, intent: &MoveIntent) -> ReorderResult<Arrangement> {
        let board = self.board();
        validate_move(board.arrangement(), intent)?;
        Ok(apply_intent(board.arrangement(), intent))
    }

    /// Commits a drag-end: applies it locally, persists it, rolls back on failure
    ///
    /// When this commit replaced superseded ones, its payload also carries
    /// their unsaved changes and a failure rolls the item back to where the
    /// store last saw it.
    ///
    /// # Errors
    ///
    /// - [`ReorderError::InvalidMoveIntent`] before any local change; changes
    ///   left unsaved by superseded commits are rolled back
    /// - [`ReorderError::PersistenceRejected`] / [`ReorderError::PersistenceUnavailable`]
    ///   after rolling the board back
    /// - [`ReorderError::Superseded`] when a newer gesture cancelled this one
    /// - [`ReorderError::TornDown`] when the board was discarded
    #[instrument(
        skip(self, intent),
        fields(
            item = %intent.item_id,
            source = %intent.source,
            target = %intent.target,
            index = intent.target_index
        )
    )]
    pub async fn commit_move(&self, intent: MoveIntent) -> ReorderResult<CommitOutcome> {
        self.ensure_live()?;
        let _in_flight = InFlight::enter(&self.in_flight);
        let slot = self
            .slots
            .acquire(&intent.item_id, self.config.commit_policy)
            .await;
        self.ensure_live()?;
        let mut unsaved = slot.take_unsaved();

        let published = self.publish(|board| {
            let prepared = self.prepare_move(board, &intent)?;
            Ok(prepared.map(|(next, payload)| {
                let payload = carry_unsaved(payload, &intent.item_id, &unsaved, &next);
                (next, payload)
            }))
        });
        let pending = match published {
            Ok(Some(pending)) => pending,
            Ok(None) => {
                // The board already shows this move; only the store is behind
                let Some(resend) = unsaved.pop() else {
                    debug!("Move leaves the board unchanged");
                    return Ok(CommitOutcome::Unchanged);
                };
                debug!("Resending change left unsaved by a superseded commit");
                resend
            }
            Err(err) => {
                if !unsaved.is_empty() {
                    self.rollback(&intent.item_id, None, &unsaved);
                }
                return Err(err);
            }
        };

        let result = tokio::select! {
            biased;
            () = slot.token().cancelled() => {
                debug!("Commit superseded by a newer move");
                unsaved.push(pending);
                slot.hand_over(unsaved);
                return Err(ReorderError::Superseded(intent.item_id));
            }
            result = self.persist(&pending.payload) => result,
        };

        self.resolve(&intent.item_id, pending, &unsaved, result)
    }

    /// Adds a new item at the end of `partition` and persists it
    ///
    /// The rank is allocated like a move's, so an exhausted or inconsistent
    /// partition is rebalanced rather than given a colliding key.
    ///
    /// # Errors
    ///
    /// Same as [`ReorderReconciler::commit_move`]; a duplicate id or unknown
    /// partition is reported as [`ReorderError::InvalidMoveIntent`].
    #[instrument(skip(self, item_id, partition), fields(item = %item_id, partition = %partition))]
    pub async fn create_item(
        &self,
        item_id: ItemId,
        partition: PartitionId,
    ) -> ReorderResult<CommitOutcome> {
        self.ensure_live()?;
        let _in_flight = InFlight::enter(&self.in_flight);
        let _slot = self
            .slots
            .acquire(&item_id, self.config.commit_policy)
            .await;
        self.ensure_live()?;

        let pending = self
            .publish(|board| {
                let next_arrangement = board.append_item(&item_id, &partition)?;
                let allocation =
                    self.allocator
                        .allocate_in(board, &next_arrangement, &item_id, &partition)?;
                let payload =
                    ChangePayload::for_create(&item_id, &partition, &next_arrangement, &allocation);
                let next = board.with_changes(next_arrangement, allocation.assignments(&item_id));
                Ok(Some((next, payload)))
            })?
            .ok_or(ReorderError::TornDown)?;

        let result = self.persist(&pending.payload).await;
        self.resolve(&item_id, pending, &[], result)
    }

    fn ensure_live(&self) -> ReorderResult<()> {
        if self.is_live() {
            Ok(())
        } else {
            Err(ReorderError::TornDown)
        }
    }

    fn prepare_move(
        &self,
        board: &Board,
        intent: &MoveIntent,
    ) -> ReorderResult<Option<(Board, ChangePayload)>> {
        if let Err(err) = validate_move(board.arrangement(), intent) {
            error!(error = %err, "Rejected invalid move intent");
            return Err(err.into());
        }
        if is_noop(board.arrangement(), intent) {
            return Ok(None);
        }

        let next_arrangement = apply_intent(board.arrangement(), intent);
        let allocation = self.allocator.allocate(board, &next_arrangement, intent)?;
        let payload = ChangePayload::for_move(intent, &next_arrangement, &allocation);
        let next = board.with_changes(next_arrangement, allocation.assignments(&intent.item_id));
        Ok(Some((next, payload)))
    }

    /// Computes and publishes the optimistic board in one step
    ///
    /// `prepare` runs under the channel's write lock, so no other commit can
    /// publish between reading the board and replacing it.
    fn publish<F>(&self, prepare: F) -> ReorderResult<Option<Pending>>
    where
        F: FnOnce(&Board) -> ReorderResult<Option<(Board, ChangePayload)>>,
    {
        let mut outcome = Ok(None);
        self.state.send_if_modified(|current| match prepare(current) {
            Ok(Some((next, payload))) => {
                let pending = Pending {
                    previous: Arc::clone(current),
                    published_revision: next.revision(),
                    payload,
                };
                *current = Arc::new(next);
                outcome = Ok(Some(pending));
                true
            }
            Ok(None) => false,
            Err(err) => {
                outcome = Err(err);
                false
            }
        });
        outcome
    }

    async fn persist(&self, payload: &ChangePayload) -> Result<Confirmation, PersistError> {
        let timeout = self.config.persist_timeout;
        match tokio::time::timeout(timeout, self.persistence.persist_move(payload)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    boundary = self.persistence.boundary_id(),
                    timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
                    "Persistence call timed out"
                );
                Err(PersistError::new(
                    PersistFailureKind::Timeout,
                    format!("no answer within {timeout:?}"),
                ))
            }
        }
    }

    fn resolve(
        &self,
        item: &ItemId,
        pending: Pending,
        unsaved: &[Pending],
        result: Result<Confirmation, PersistError>,
    ) -> ReorderResult<CommitOutcome> {
        match result {
            Ok(confirmation) => {
                if !self.is_live() {
                    debug!("Board torn down, not applying confirmation");
                } else if let Some(rank) = &confirmation.rank {
                    if *rank != pending.payload.rank {
                        self.adopt_rank(item, &pending.payload.rank, rank);
                    }
                }
                info!(rank = %pending.payload.rank, "Reorder committed");
                Ok(CommitOutcome::Committed {
                    payload: pending.payload,
                    confirmation,
                })
            }
            Err(err) => {
                if !self.is_live() {
                    warn!(error = %err, "Board torn down, skipping rollback");
                    return Err(ReorderError::TornDown);
                }
                warn!(kind = %err.kind, error = %err, "Reorder failed, rolling back");
                self.rollback(item, Some(&pending), unsaved);
                Err(err.into())
            }
        }
    }

    /// Undoes `pending`, then every change superseded commits left unsaved
    fn rollback(&self, item: &ItemId, pending: Option<&Pending>, unsaved: &[Pending]) {
        let _span = debug_span!(span_names::ROLLBACK, %item, unsaved = unsaved.len()).entered();
        self.state.send_modify(|current| {
            for step in pending.into_iter().chain(unsaved.iter().rev()) {
                let restored = if current.revision() == step.published_revision {
                    current.restored_from(&step.previous)
                } else {
                    debug!("Board changed since publish, reverting only this item");
                    revert_item(current, &step.previous, item, &step.payload)
                };
                *current = Arc::new(restored);
            }
        });
    }

    fn adopt_rank(&self, item: &ItemId, proposed: &RankKey, confirmed: &RankKey) {
        self.state.send_if_modified(|current| {
            if current.rank(item) != Some(proposed) {
                return false;
            }
            let Some((partition, _)) = current.arrangement().locate(item) else {
                return false;
            };
            let partition = partition.clone();
            let mut ranks = HashMap::new();
            ranks.insert(item.clone(), confirmed.clone());
            let arrangement = resorted(current, &[partition], &ranks);
            debug!(%confirmed, "Adopted store-assigned rank");
            *current = Arc::new(current.with_changes(arrangement, ranks));
            true
        });
    }
}

/// Widens `payload` to cover changes superseded commits never saved
fn carry_unsaved(
    mut payload: ChangePayload,
    item: &ItemId,
    unsaved: &[Pending],
    next: &Board,
) -> ChangePayload {
    for earlier in unsaved.iter().rev() {
        if let Some((origin, _)) = earlier.previous.arrangement().locate(item) {
            payload.absorb(&earlier.payload, origin, next);
        }
    }
    payload
}

/// Undoes one item's change on a board that others have changed since
///
/// Ranks touched by the payload go back to their previous values, the item
/// returns to its previous partition (or leaves the board if it was new),
/// and affected partitions are re-sorted by rank.
fn revert_item(current: &Board, previous: &Board, item: &ItemId, payload: &ChangePayload) -> Board {
    let mut arrangement = current.arrangement().clone();
    let mut touched: Vec<PartitionId> = payload
        .partitions
        .iter()
        .map(|order| order.partition.clone())
        .collect();

    if let Some((partition, _)) = current.arrangement().locate(item) {
        let ids = arrangement
            .items(partition)
            .unwrap_or(&[])
            .iter()
            .filter(|id| *id != item)
            .cloned()
            .collect();
        arrangement.set(partition.clone(), ids);
    }

    let mut ranks = HashMap::new();
    for write in payload.rank_writes() {
        if let Some(rank) = previous.rank(&write.item_id) {
            ranks.insert(write.item_id, rank.clone());
        }
    }

    let Some((partition, _)) = previous.arrangement().locate(item) else {
        return current.without_item(item, arrangement);
    };
    let mut ids = arrangement.items(partition).unwrap_or(&[]).to_vec();
    ids.push(item.clone());
    arrangement.set(partition.clone(), ids);
    touched.push(partition.clone());

    let staged = current.with_changes(arrangement, ranks.clone());
    let arrangement = resorted(&staged, &touched, &HashMap::new());
    current.with_changes(arrangement, ranks)
}

/// Re-sorts the given partitions by rank, with `overrides` taking precedence
fn resorted(
    board: &Board,
    partitions: &[PartitionId],
    overrides: &HashMap<ItemId, RankKey>,
) -> Arrangement {
    let mut arrangement = board.arrangement().clone();
    for partition in partitions {
        let mut entries: Vec<(Option<RankKey>, ItemId)> = arrangement
            .items(partition)
            .unwrap_or(&[])
            .iter()
            .map(|id| {
                let rank = overrides.get(id).or_else(|| board.rank(id)).cloned();
                (rank, id.clone())
            })
            .collect();
        entries.sort();
        arrangement.set(
            partition.clone(),
            entries.into_iter().map(|(_, id)| id).collect(),
        );
    }
    arrangement
}
