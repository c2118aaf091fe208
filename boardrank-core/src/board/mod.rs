//! Board model
//!
//! Pure data structures and transformations for the ordered board:
//! identifiers, [`Arrangement`] snapshots, the published [`Board`] state,
//! [`apply_move`], and drop-target resolution. Nothing here has side effects,
//! which keeps drag previews and rollback testable without a runtime.

mod arrangement;
mod drop;
mod model;
mod state;

pub use arrangement::{Arrangement, ItemId, PartitionId};
pub use drop::{DropPosition, DropTarget, intent_for_drop, is_valid_drop_position, resolve_drop};
pub use model::{MoveIntent, apply_intent, apply_move, is_noop, validate_move};
pub use state::{Board, Item, OrderViolation};
