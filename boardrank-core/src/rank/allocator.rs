//! Rank allocation policies
//!
//! Turns "put this item at index N of that partition" into a concrete
//! [`RankKey`], and owns the rebalance path taken when the keyspace between
//! two neighbours is exhausted.

use tracing::{debug, debug_span, trace_span, warn};

use crate::board::{Arrangement, Board, ItemId, MoveIntent, PartitionId};
use crate::error::{RankError, RankResult};
use crate::tracing::span_names;

use super::key::{DEFAULT_MAX_RANK_LEN, RankKey};

/// Returns the rank for an item placed at `target_index`
///
/// `partition_ranks` is the target partition's ranks in order, with the
/// moved item already removed. `lower` is the rank before the slot and
/// `upper` the one at it; either may be missing at the edges.
///
/// # Errors
///
/// Propagates [`RankError::OutOfOrder`] if the input was not sorted.
pub fn next_rank(partition_ranks: &[RankKey], target_index: usize) -> RankResult<RankKey> {
    let (lower, upper) = neighbours(partition_ranks, target_index);
    RankKey::between(lower, upper)
}

/// Returns the rank for a new item appended to a partition
///
/// # Errors
///
/// Propagates [`RankError::OutOfOrder`] if the input was not sorted.
pub fn rank_for_end(partition_ranks: &[RankKey]) -> RankResult<RankKey> {
    next_rank(partition_ranks, partition_ranks.len())
}

/// Assigns evenly spaced ranks across a whole partition, in order
#[must_use]
pub fn rebalance(ids: &[ItemId]) -> Vec<(ItemId, RankKey)> {
    ids.iter().cloned().zip(RankKey::spread(ids.len())).collect()
}

fn neighbours(ranks: &[RankKey], target_index: usize) -> (Option<&RankKey>, Option<&RankKey>) {
    let lower = target_index.checked_sub(1).and_then(|i| ranks.get(i));
    let upper = ranks.get(target_index);
    (lower, upper)
}

/// Outcome of allocating a rank for one move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Allocation {
    /// A single new rank for the moved item
    Single {
        /// The moved item's new rank
        rank: RankKey,
        /// Rank immediately before it, if any
        lower: Option<RankKey>,
        /// Rank immediately after it, if any
        upper: Option<RankKey>,
    },
    /// The target partition was renumbered to make room
    Rebalanced {
        /// The moved item's new rank
        rank: RankKey,
        /// Every item of the target partition with its new rank, in order
        ranks: Vec<(ItemId, RankKey)>,
    },
}

impl Allocation {
    /// The moved item's new rank
    #[must_use]
    pub const fn rank(&self) -> &RankKey {
        match self {
            Self::Single { rank, .. } | Self::Rebalanced { rank, .. } => rank,
        }
    }

    /// All rank assignments this allocation implies
    #[must_use]
    pub fn assignments(&self, item: &ItemId) -> Vec<(ItemId, RankKey)> {
        match self {
            Self::Single { rank, .. } => vec![(item.clone(), rank.clone())],
            Self::Rebalanced { ranks, .. } => ranks.clone(),
        }
    }
}

/// Allocates ranks for moves against a board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankAllocator {
    max_rank_len: usize,
}

impl Default for RankAllocator {
    fn default() -> Self {
        Self {
            max_rank_len: DEFAULT_MAX_RANK_LEN,
        }
    }
}

impl RankAllocator {
    /// Creates an allocator with the default length limit
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the practical key length past which a partition is rebalanced
    #[must_use]
    pub const fn with_max_rank_len(mut self, max_rank_len: usize) -> Self {
        self.max_rank_len = max_rank_len;
        self
    }

    /// Returns the configured length limit
    #[must_use]
    pub const fn max_rank_len(&self) -> usize {
        self.max_rank_len
    }

    /// Allocates the moved item's rank in `next`
    ///
    /// `board` supplies the current ranks of every other item; `next` is the
    /// arrangement after [`crate::board::apply_move`]. Exhaustion and
    /// duplicate neighbour ranks are healed by rebalancing the target
    /// partition; they never reach the caller.
    ///
    /// # Errors
    ///
    /// Returns [`RankError::Unranked`] when an item of the target partition
    /// has no rank on the board, which means the board itself is inconsistent.
    pub fn allocate(
        &self,
        board: &Board,
        next: &Arrangement,
        intent: &MoveIntent,
    ) -> RankResult<Allocation> {
        self.allocate_in(board, next, &intent.item_id, &intent.target)
    }

    /// Allocates a rank for `item` wherever it sits in `partition` of `next`
    ///
    /// Used for moves and for new items alike; `item` itself need not have a
    /// rank on `board` yet.
    ///
    /// # Errors
    ///
    /// Same as [`RankAllocator::allocate`].
    pub fn allocate_in(
        &self,
        board: &Board,
        next: &Arrangement,
        item: &ItemId,
        partition: &PartitionId,
    ) -> RankResult<Allocation> {
        let _span = trace_span!(span_names::ALLOCATE_RANK, %item).entered();
        let ids = next.items(partition).unwrap_or(&[]);
        let index = ids.iter().position(|id| id == item).unwrap_or(ids.len());

        let lower = index
            .checked_sub(1)
            .and_then(|i| ids.get(i))
            .map(|id| rank_of(board, id))
            .transpose()?;
        let upper = ids
            .get(index + 1)
            .map(|id| rank_of(board, id))
            .transpose()?;

        match RankKey::between_bounded(lower.as_ref(), upper.as_ref(), self.max_rank_len) {
            Ok(rank) => {
                debug!(%item, %rank, "Allocated rank");
                Ok(Allocation::Single { rank, lower, upper })
            }
            Err(err @ (RankError::Exhausted { .. } | RankError::OutOfOrder { .. })) => {
                warn!(
                    %partition,
                    error = %err,
                    "Rank space unusable, rebalancing partition"
                );
                Ok(self.rebalanced(partition, ids, item))
            }
            Err(err) => Err(err),
        }
    }

    fn rebalanced(&self, partition: &PartitionId, ids: &[ItemId], item: &ItemId) -> Allocation {
        let _span = debug_span!(span_names::REBALANCE, %partition).entered();
        let ranks = rebalance(ids);
        let rank = ranks
            .iter()
            .find(|(id, _)| id == item)
            .map_or_else(RankKey::mid, |(_, rank)| rank.clone());
        debug!(
            %partition,
            count = ranks.len(),
            limit = self.max_rank_len,
            "Rebalanced partition"
        );
        Allocation::Rebalanced { rank, ranks }
    }
}

fn rank_of(board: &Board, id: &ItemId) -> RankResult<RankKey> {
    board
        .rank(id)
        .cloned()
        .ok_or_else(|| RankError::Unranked(id.clone()))
}
