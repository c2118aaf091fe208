//! Identifiers and the [`Arrangement`] snapshot type

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier text
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a board item (task)
    ItemId
);

string_id!(
    /// Identifier of a partition (status column)
    PartitionId
);

/// Ordered item ids per partition at one instant
///
/// This is the unit of optimistic rollback. Columns stay present while
/// empty so that moves into them can be validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arrangement {
    partitions: BTreeMap<PartitionId, Vec<ItemId>>,
}

impl Arrangement {
    /// Creates an arrangement without any partitions
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an arrangement with the given empty partitions
    #[must_use]
    pub fn with_partitions<I, P>(partitions: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PartitionId>,
    {
        Self {
            partitions: partitions
                .into_iter()
                .map(|p| (p.into(), Vec::new()))
                .collect(),
        }
    }

    /// Adds a partition if it is not already present
    pub fn ensure_partition(&mut self, partition: PartitionId) {
        self.partitions.entry(partition).or_default();
    }

    /// Builder-style variant of [`Arrangement::set`]
    #[must_use]
    pub fn with(mut self, partition: impl Into<PartitionId>, items: Vec<ItemId>) -> Self {
        self.set(partition.into(), items);
        self
    }

    /// Replaces one partition's ordered list
    pub fn set(&mut self, partition: PartitionId, items: Vec<ItemId>) {
        self.partitions.insert(partition, items);
    }

    /// Ordered item ids of a partition
    #[must_use]
    pub fn items(&self, partition: &PartitionId) -> Option<&[ItemId]> {
        self.partitions.get(partition).map(Vec::as_slice)
    }

    /// Whether the partition is known
    #[must_use]
    pub fn contains_partition(&self, partition: &PartitionId) -> bool {
        self.partitions.contains_key(partition)
    }

    /// Number of items in a partition (0 when unknown)
    #[must_use]
    pub fn len(&self, partition: &PartitionId) -> usize {
        self.partitions.get(partition).map_or(0, Vec::len)
    }

    /// Total number of placed items
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.partitions.values().map(Vec::len).sum()
    }

    /// Whether no items are placed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total_items() == 0
    }

    /// Partition ids in sorted order
    pub fn partition_ids(&self) -> impl Iterator<Item = &PartitionId> {
        self.partitions.keys()
    }

    /// Iterates over partitions and their ordered items
    pub fn iter(&self) -> impl Iterator<Item = (&PartitionId, &[ItemId])> {
        self.partitions.iter().map(|(p, items)| (p, items.as_slice()))
    }

    /// Finds the partition and index holding an item
    #[must_use]
    pub fn locate(&self, item: &ItemId) -> Option<(&PartitionId, usize)> {
        self.partitions.iter().find_map(|(partition, items)| {
            items
                .iter()
                .position(|id| id == item)
                .map(|index| (partition, index))
        })
    }

    /// Whether the item is placed in any partition
    #[must_use]
    pub fn contains_item(&self, item: &ItemId) -> bool {
        self.locate(item).is_some()
    }
}
