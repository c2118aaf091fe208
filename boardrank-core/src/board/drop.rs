//! Drop-target resolution
//!
//! Translates an id-level drop target ("before task X", "into column Y")
//! into the `(partition, index)` pair that [`super::apply_move`] expects.
//! Pixel hit-testing belongs to the presentation layer and is not modelled.

use super::arrangement::{Arrangement, ItemId, PartitionId};
use super::model::MoveIntent;

/// Drop position relative to a target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropPosition {
    /// Drop before the target item
    Before,
    /// Drop after the target item
    After,
    /// Drop into the target column (appends)
    Into,
}

/// What the pointer was released over
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Empty space of a column
    Column(PartitionId),
    /// A sibling card
    Item {
        /// The card under the pointer
        id: ItemId,
        /// Which side of it
        position: DropPosition,
    },
}

impl DropTarget {
    /// Drop before an item
    #[must_use]
    pub fn before(id: impl Into<ItemId>) -> Self {
        Self::Item {
            id: id.into(),
            position: DropPosition::Before,
        }
    }

    /// Drop after an item
    #[must_use]
    pub fn after(id: impl Into<ItemId>) -> Self {
        Self::Item {
            id: id.into(),
            position: DropPosition::After,
        }
    }
}

/// Validates that a drop position is valid for the given target kind
///
/// Cards accept `Before`/`After`; columns accept only `Into`.
#[must_use]
pub const fn is_valid_drop_position(position: DropPosition, target: &DropTarget) -> bool {
    match target {
        DropTarget::Column(_) => matches!(position, DropPosition::Into),
        DropTarget::Item { .. } => !matches!(position, DropPosition::Into),
    }
}

/// Resolves a drop target into a partition and insertion index
///
/// The index is relative to the target list with `moving` removed, which is
/// what [`super::apply_move`] expects. Dropping a card onto itself resolves
/// to its current slot. Returns `None` for unknown targets and for `Into`
/// on a card.
#[must_use]
pub fn resolve_drop(
    arrangement: &Arrangement,
    moving: &ItemId,
    target: &DropTarget,
) -> Option<(PartitionId, usize)> {
    match target {
        DropTarget::Column(partition) => {
            let items = arrangement.items(partition)?;
            let len = items.iter().filter(|id| *id != moving).count();
            Some((partition.clone(), len))
        }
        DropTarget::Item { id, position } => {
            if !is_valid_drop_position(*position, target) {
                return None;
            }
            let (partition, index) = arrangement.locate(id)?;
            if id == moving {
                return Some((partition.clone(), index));
            }
            let remaining: Vec<&ItemId> = arrangement
                .items(partition)?
                .iter()
                .filter(|other| *other != moving)
                .collect();
            let anchor = remaining.iter().position(|other| *other == id)?;
            let index = match position {
                DropPosition::Before => anchor,
                DropPosition::After | DropPosition::Into => anchor + 1,
            };
            Some((partition.clone(), index))
        }
    }
}

/// Builds a [`MoveIntent`] for dropping `moving` onto `target`
#[must_use]
pub fn intent_for_drop(
    arrangement: &Arrangement,
    moving: &ItemId,
    target: &DropTarget,
) -> Option<MoveIntent> {
    let (source, _) = arrangement.locate(moving)?;
    let (partition, index) = resolve_drop(arrangement, moving, target)?;
    Some(MoveIntent {
        item_id: moving.clone(),
        source: source.clone(),
        target: partition,
        target_index: index,
    })
}
