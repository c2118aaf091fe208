//! Items and the published [`Board`] state

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::MoveError;
use crate::rank::RankKey;

use super::arrangement::{Arrangement, ItemId, PartitionId};

/// A task on the board
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    /// Item identifier
    pub id: ItemId,
    /// Status column the item belongs to
    pub partition: PartitionId,
    /// Order key within the partition
    pub rank: RankKey,
}

impl Item {
    /// Creates an item
    #[must_use]
    pub fn new(id: impl Into<ItemId>, partition: impl Into<PartitionId>, rank: RankKey) -> Self {
        Self {
            id: id.into(),
            partition: partition.into(),
            rank,
        }
    }
}

/// A partition whose displayed order disagrees with its ranks
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderViolation {
    /// `before` is displayed first but does not rank strictly lower
    OutOfOrder {
        /// Affected partition
        partition: PartitionId,
        /// Item displayed first
        before: ItemId,
        /// Item displayed second
        after: ItemId,
    },
    /// A placed item has no rank
    MissingRank(ItemId),
    /// A ranked item is not placed in any partition
    Unplaced(ItemId),
}

impl std::fmt::Display for OrderViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OutOfOrder {
                partition,
                before,
                after,
            } => write!(f, "{partition}: {before} is shown before {after} but does not rank lower"),
            Self::MissingRank(id) => write!(f, "{id} has no rank"),
            Self::Unplaced(id) => write!(f, "{id} has a rank but no partition"),
        }
    }
}

/// Local board state: arrangement plus every item's rank
///
/// Boards are immutable values. Every change produces a new board with a
/// higher `revision`, which the reconciler uses to tell whether anything
/// was published since it last wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    arrangement: Arrangement,
    ranks: HashMap<ItemId, RankKey>,
    #[serde(default)]
    revision: u64,
}

impl Board {
    /// Creates a board with empty partitions
    #[must_use]
    pub fn new<I, P>(partitions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PartitionId>,
    {
        Self {
            arrangement: Arrangement::with_partitions(partitions),
            ranks: HashMap::new(),
            revision: 0,
        }
    }

    /// Derives a board from a flat list of items
    ///
    /// Partition membership comes from each item's `partition` field; order
    /// within a partition comes from ranks, ties broken by id. Partitions
    /// named in `partitions` exist even when empty.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::DuplicateItem`] if an id appears twice.
    pub fn from_items<I, P>(partitions: I, items: impl IntoIterator<Item = Item>) -> Result<Self, MoveError>
    where
        I: IntoIterator<Item = P>,
        P: Into<PartitionId>,
    {
        let mut board = Self::new(partitions);
        let mut columns: HashMap<PartitionId, Vec<(RankKey, ItemId)>> = HashMap::new();

        for item in items {
            if board.ranks.contains_key(&item.id) {
                return Err(MoveError::DuplicateItem(item.id));
            }
            board.ranks.insert(item.id.clone(), item.rank.clone());
            columns
                .entry(item.partition)
                .or_default()
                .push((item.rank, item.id));
        }

        for (partition, mut entries) in columns {
            entries.sort();
            board
                .arrangement
                .set(partition, entries.into_iter().map(|(_, id)| id).collect());
        }
        Ok(board)
    }

    /// The current arrangement
    #[must_use]
    pub const fn arrangement(&self) -> &Arrangement {
        &self.arrangement
    }

    /// Publication counter
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Whether both boards hold the same placement and ranks, ignoring revision
    #[must_use]
    pub fn same_content(&self, other: &Self) -> bool {
        self.arrangement == other.arrangement && self.ranks == other.ranks
    }

    /// Rank of an item
    #[must_use]
    pub fn rank(&self, item: &ItemId) -> Option<&RankKey> {
        self.ranks.get(item)
    }

    /// Ranks of a partition's items, in displayed order
    #[must_use]
    pub fn partition_ranks(&self, partition: &PartitionId) -> Vec<RankKey> {
        self.arrangement
            .items(partition)
            .unwrap_or(&[])
            .iter()
            .filter_map(|id| self.ranks.get(id).cloned())
            .collect()
    }

    /// Looks up a full item
    #[must_use]
    pub fn item(&self, id: &ItemId) -> Option<Item> {
        let (partition, _) = self.arrangement.locate(id)?;
        Some(Item {
            id: id.clone(),
            partition: partition.clone(),
            rank: self.ranks.get(id)?.clone(),
        })
    }

    /// All items, partition by partition in displayed order
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.arrangement
            .iter()
            .flat_map(|(partition, ids)| {
                ids.iter().filter_map(move |id| {
                    self.ranks
                        .get(id)
                        .map(|rank| Item::new(id.clone(), partition.clone(), rank.clone()))
                })
            })
            .collect()
    }

    /// Returns every place where displayed order and rank order disagree
    #[must_use]
    pub fn verify(&self) -> Vec<OrderViolation> {
        let mut violations = Vec::new();
        for (partition, ids) in self.arrangement.iter() {
            for id in ids {
                if !self.ranks.contains_key(id) {
                    violations.push(OrderViolation::MissingRank(id.clone()));
                }
            }
            for pair in ids.windows(2) {
                if let (Some(a), Some(b)) = (self.ranks.get(&pair[0]), self.ranks.get(&pair[1])) {
                    if a >= b {
                        violations.push(OrderViolation::OutOfOrder {
                            partition: partition.clone(),
                            before: pair[0].clone(),
                            after: pair[1].clone(),
                        });
                    }
                }
            }
        }
        let mut unplaced: Vec<_> = self
            .ranks
            .keys()
            .filter(|id| !self.arrangement.contains_item(id))
            .cloned()
            .collect();
        unplaced.sort();
        violations.extend(unplaced.into_iter().map(OrderViolation::Unplaced));
        violations
    }

    /// New board with `arrangement` and updated ranks, one revision later
    #[must_use]
    pub fn with_changes(
        &self,
        arrangement: Arrangement,
        ranks: impl IntoIterator<Item = (ItemId, RankKey)>,
    ) -> Self {
        let mut next = self.clone();
        next.arrangement = arrangement;
        next.ranks.extend(ranks);
        next.revision = self.revision + 1;
        next
    }

    /// New board using `arrangement` with `item`'s rank dropped
    #[must_use]
    pub fn without_item(&self, item: &ItemId, arrangement: Arrangement) -> Self {
        let mut next = self.clone();
        next.arrangement = arrangement;
        next.ranks.remove(item);
        next.revision = self.revision + 1;
        next
    }

    /// Same content as `other`, stamped one revision past `self`
    #[must_use]
    pub fn restored_from(&self, other: &Self) -> Self {
        let mut next = other.clone();
        next.revision = self.revision + 1;
        next
    }

    /// Arrangement with a new item appended to `partition`
    ///
    /// The item gets no rank here; the caller allocates one against this
    /// board so creation shares the move path's exhaustion handling.
    ///
    /// # Errors
    ///
    /// Returns [`MoveError::UnknownPartition`] or [`MoveError::DuplicateItem`].
    pub fn append_item(&self, id: &ItemId, partition: &PartitionId) -> Result<Arrangement, MoveError> {
        if !self.arrangement.contains_partition(partition) {
            return Err(MoveError::UnknownPartition(partition.clone()));
        }
        if self.ranks.contains_key(id) || self.arrangement.contains_item(id) {
            return Err(MoveError::DuplicateItem(id.clone()));
        }

        let mut arrangement = self.arrangement.clone();
        let mut ids = arrangement.items(partition).unwrap_or(&[]).to_vec();
        ids.push(id.clone());
        arrangement.set(partition.clone(), ids);
        Ok(arrangement)
    }
}
