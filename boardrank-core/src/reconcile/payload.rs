//! Persistence boundary types
//!
//! [`ChangePayload`] is what the engine hands to the store after a move;
//! [`PersistenceBoundary`] is the store's side of the contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::{Arrangement, Board, ItemId, MoveIntent, PartitionId};
use crate::error::PersistError;
use crate::rank::{Allocation, RankKey};

/// Ordered ids of one partition after the change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionOrder {
    /// Partition id
    pub partition: PartitionId,
    /// Items in display order
    pub items: Vec<ItemId>,
}

/// Status transition recorded when an item changes column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionTransition {
    /// Previous partition
    pub from: PartitionId,
    /// New partition
    pub to: PartitionId,
}

/// A rank written as part of a rebalance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankAssignment {
    /// Item id
    pub item_id: ItemId,
    /// Its new rank
    pub rank: RankKey,
}

/// Minimal description of one reorder, sent to the store
///
/// Carries both forms of ordering information: the resolved rank with its
/// neighbours for direct persistence, and the ordered id lists of every
/// affected partition for collaborators that re-derive ranks themselves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangePayload {
    /// The moved (or created) item
    pub item_id: ItemId,
    /// Partition the item now belongs to
    pub partition: PartitionId,
    /// Present when the item changed partition
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<PartitionTransition>,
    /// The item's new rank
    pub rank: RankKey,
    /// Rank immediately before the item, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<RankKey>,
    /// Rank immediately after the item, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<RankKey>,
    /// Ordered ids of the target partition, then the source if different
    pub partitions: Vec<PartitionOrder>,
    /// Every other rank changed by a rebalance
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rebalanced: Vec<RankAssignment>,
}

impl ChangePayload {
    /// Builds the payload for a move
    #[must_use]
    pub fn for_move(intent: &MoveIntent, next: &Arrangement, allocation: &Allocation) -> Self {
        let mut partitions = vec![partition_order(next, &intent.target)];
        let transition = intent.crosses_partitions().then(|| {
            partitions.push(partition_order(next, &intent.source));
            PartitionTransition {
                from: intent.source.clone(),
                to: intent.target.clone(),
            }
        });
        Self::placed(&intent.item_id, &intent.target, transition, partitions, allocation)
    }

    /// Builds the payload for a newly created item appended to `partition`
    #[must_use]
    pub fn for_create(
        item_id: &ItemId,
        partition: &PartitionId,
        next: &Arrangement,
        allocation: &Allocation,
    ) -> Self {
        let partitions = vec![partition_order(next, partition)];
        Self::placed(item_id, partition, None, partitions, allocation)
    }

    fn placed(
        item_id: &ItemId,
        partition: &PartitionId,
        transition: Option<PartitionTransition>,
        partitions: Vec<PartitionOrder>,
        allocation: &Allocation,
    ) -> Self {
        let (lower, upper, rebalanced) = match allocation {
            Allocation::Single { lower, upper, .. } => (lower.clone(), upper.clone(), Vec::new()),
            Allocation::Rebalanced { ranks, .. } => {
                let position = ranks.iter().position(|(id, _)| id == item_id);
                let lower = position
                    .and_then(|i| i.checked_sub(1))
                    .and_then(|i| ranks.get(i))
                    .map(|(_, rank)| rank.clone());
                let upper = position
                    .and_then(|i| ranks.get(i + 1))
                    .map(|(_, rank)| rank.clone());
                let others = ranks
                    .iter()
                    .filter(|(id, _)| id != item_id)
                    .map(|(id, rank)| RankAssignment {
                        item_id: id.clone(),
                        rank: rank.clone(),
                    })
                    .collect();
                (lower, upper, others)
            }
        };

        Self {
            item_id: item_id.clone(),
            partition: partition.clone(),
            transition,
            rank: allocation.rank().clone(),
            lower,
            upper,
            partitions,
            rebalanced,
        }
    }

    /// Folds in an earlier change of the same item that never reached the store
    ///
    /// `origin` is where the item sat before `earlier`. The transition is
    /// recomputed from it, every partition either change touched is listed
    /// with its order on `next`, and ranks `earlier` rebalanced are resent at
    /// their current value unless `self` already writes them.
    pub fn absorb(&mut self, earlier: &Self, origin: &PartitionId, next: &Board) {
        self.transition = (*origin != self.partition).then(|| PartitionTransition {
            from: origin.clone(),
            to: self.partition.clone(),
        });

        let touched = earlier
            .partitions
            .iter()
            .map(|order| &order.partition)
            .chain(std::iter::once(origin));
        for partition in touched {
            if !self.partitions.iter().any(|order| order.partition == *partition) {
                self.partitions
                    .push(partition_order(next.arrangement(), partition));
            }
        }

        for write in &earlier.rebalanced {
            let written = write.item_id == self.item_id
                || self.rebalanced.iter().any(|w| w.item_id == write.item_id);
            if written {
                continue;
            }
            if let Some(rank) = next.rank(&write.item_id) {
                self.rebalanced.push(RankAssignment {
                    item_id: write.item_id.clone(),
                    rank: rank.clone(),
                });
            }
        }
    }

    /// All rank writes this payload asks for, the moved item first
    #[must_use]
    pub fn rank_writes(&self) -> Vec<RankAssignment> {
        let mut writes = vec![RankAssignment {
            item_id: self.item_id.clone(),
            rank: self.rank.clone(),
        }];
        writes.extend(self.rebalanced.iter().cloned());
        writes
    }
}

fn partition_order(arrangement: &Arrangement, partition: &PartitionId) -> PartitionOrder {
    PartitionOrder {
        partition: partition.clone(),
        items: arrangement.items(partition).unwrap_or(&[]).to_vec(),
    }
}

/// Store acknowledgement of a persisted change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confirmation {
    /// The item the store wrote
    pub item_id: ItemId,
    /// Rank the store settled on, when it differs from the proposed one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rank: Option<RankKey>,
    /// When the store accepted the write
    pub confirmed_at: DateTime<Utc>,
}

impl Confirmation {
    /// Acknowledges a payload as proposed
    #[must_use]
    pub fn accepted(payload: &ChangePayload) -> Self {
        Self {
            item_id: payload.item_id.clone(),
            rank: None,
            confirmed_at: Utc::now(),
        }
    }

    /// Acknowledges a payload with a store-chosen rank
    #[must_use]
    pub fn with_rank(payload: &ChangePayload, rank: RankKey) -> Self {
        Self {
            item_id: payload.item_id.clone(),
            rank: Some(rank),
            confirmed_at: Utc::now(),
        }
    }
}

/// The data layer that durably stores rank and partition changes
///
/// Implementations must be idempotent for identical payloads, since a
/// payload may be resent after an ambiguous timeout.
#[async_trait]
pub trait PersistenceBoundary: Send + Sync {
    /// Persists a move or creation
    ///
    /// # Errors
    ///
    /// Returns a [`PersistError`] whose kind tells validation, conflict and
    /// transient failures apart.
    async fn persist_move(&self, payload: &ChangePayload) -> Result<Confirmation, PersistError>;

    /// Short name used in logs
    fn boundary_id(&self) -> &'static str {
        "persistence"
    }
}
