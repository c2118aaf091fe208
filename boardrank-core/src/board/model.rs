//! Pure board transformations
//!
//! [`apply_move`] answers "what does the board look like after this drag?"
//! without touching any shared state. Drag-over previews call it against the
//! current confirmed arrangement on every pointer event and throw the result
//! away; only drag-end hands it to the reconciler.

use serde::{Deserialize, Serialize};

use crate::error::MoveError;

use super::arrangement::{Arrangement, ItemId, PartitionId};

/// A resolved drag gesture
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveIntent {
    /// The dragged item
    pub item_id: ItemId,
    /// Partition the item is currently in
    pub source: PartitionId,
    /// Partition it is dropped into
    pub target: PartitionId,
    /// Index within `target` after the item is removed from `source`
    pub target_index: usize,
}

impl MoveIntent {
    /// Creates a move intent
    #[must_use]
    pub fn new(
        item_id: impl Into<ItemId>,
        source: impl Into<PartitionId>,
        target: impl Into<PartitionId>,
        target_index: usize,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            source: source.into(),
            target: target.into(),
            target_index,
        }
    }

    /// Whether the item changes partition
    #[must_use]
    pub fn crosses_partitions(&self) -> bool {
        self.source != self.target
    }
}

/// Computes the arrangement after moving `item` to `target_index` of `target`
///
/// The item is removed from `source` (no-op if absent), the index is
/// clamped into `[0, len]` of the target list after removal, and the item is
/// inserted there. Only the affected list(s) are rebuilt.
#[must_use]
pub fn apply_move(
    current: &Arrangement,
    item: &ItemId,
    source: &PartitionId,
    target: &PartitionId,
    target_index: usize,
) -> Arrangement {
    let mut next = current.clone();

    let source_items: Vec<ItemId> = current
        .items(source)
        .unwrap_or(&[])
        .iter()
        .filter(|id| *id != item)
        .cloned()
        .collect();

    let mut target_items = if source == target {
        source_items
    } else {
        next.set(source.clone(), source_items);
        current
            .items(target)
            .unwrap_or(&[])
            .iter()
            .filter(|id| *id != item)
            .cloned()
            .collect()
    };

    let index = target_index.min(target_items.len());
    target_items.insert(index, item.clone());
    next.set(target.clone(), target_items);
    next
}

/// [`apply_move`] for a [`MoveIntent`]
#[must_use]
pub fn apply_intent(current: &Arrangement, intent: &MoveIntent) -> Arrangement {
    apply_move(
        current,
        &intent.item_id,
        &intent.source,
        &intent.target,
        intent.target_index,
    )
}

/// Checks that an intent can be applied to `current` as stated
///
/// # Errors
///
/// Returns [`MoveError`] for unknown partitions, an item that is not placed
/// or not in its declared source, or an index past the end of the target
/// partition once the item has been removed.
pub fn validate_move(current: &Arrangement, intent: &MoveIntent) -> Result<(), MoveError> {
    for partition in [&intent.source, &intent.target] {
        if !current.contains_partition(partition) {
            return Err(MoveError::UnknownPartition(partition.clone()));
        }
    }

    let source_items = current.items(&intent.source).unwrap_or(&[]);
    if !source_items.contains(&intent.item_id) {
        return Err(match current.locate(&intent.item_id) {
            Some(_) => MoveError::NotInSource {
                item: intent.item_id.clone(),
                partition: intent.source.clone(),
            },
            None => MoveError::UnknownItem(intent.item_id.clone()),
        });
    }

    let len = if intent.crosses_partitions() {
        current.len(&intent.target)
    } else {
        current.len(&intent.target) - 1
    };
    if intent.target_index > len {
        return Err(MoveError::IndexOutOfRange {
            partition: intent.target.clone(),
            index: intent.target_index,
            len,
        });
    }
    Ok(())
}

/// Whether applying the intent leaves the arrangement unchanged
#[must_use]
pub fn is_noop(current: &Arrangement, intent: &MoveIntent) -> bool {
    !intent.crosses_partitions()
        && current
            .locate(&intent.item_id)
            .is_some_and(|(p, index)| *p == intent.source && index == intent.target_index)
}
