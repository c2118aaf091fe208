//! Per-item commit serialisation and cancellation

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::{Notify, OwnedMutexGuard};

use crate::board::ItemId;

/// Token for cancelling a pending commit or tearing down a board
///
/// Clones share state. Once cancelled a token stays cancelled.
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenState>,
}

#[derive(Default)]
struct TokenState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    /// Creates a new, uncancelled token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancels every operation holding this token
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    /// Checks if the token has been cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Completes once the token is cancelled
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// What happens when an item is dragged again before its commit resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitPolicy {
    /// Wait for the pending commit to resolve, then run
    #[default]
    Queue,
    /// Cancel the pending commit and run immediately
    Supersede,
}

impl std::fmt::Display for CommitPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Queue => write!(f, "queue"),
            Self::Supersede => write!(f, "supersede"),
        }
    }
}

impl std::str::FromStr for CommitPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "queue" => Ok(Self::Queue),
            "supersede" => Ok(Self::Supersede),
            other => Err(format!("unknown commit policy '{other}'")),
        }
    }
}

struct Slot<T> {
    lock: Arc<tokio::sync::Mutex<()>>,
    current: Mutex<Option<CancellationToken>>,
    unsaved: Mutex<Vec<T>>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self {
            lock: Arc::default(),
            current: Mutex::default(),
            unsaved: Mutex::new(Vec::new()),
        }
    }
}

/// Exclusive right to commit one item
///
/// Dropping the guard releases the slot and forgets it once no other
/// commit for the item is waiting.
pub(crate) struct SlotGuard<'a, T> {
    owner: &'a ItemSlots<T>,
    item: ItemId,
    slot: Arc<Slot<T>>,
    lock: Option<OwnedMutexGuard<()>>,
    token: CancellationToken,
}

impl<T> SlotGuard<'_, T> {
    /// Cancelled when a newer commit supersedes this one
    pub(crate) const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Takes the changes that superseded commits left unsaved, oldest first
    pub(crate) fn take_unsaved(&self) -> Vec<T> {
        std::mem::take(&mut *self.slot.unsaved.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Leaves unsaved changes to the commit that superseded this one
    pub(crate) fn hand_over(&self, unsaved: Vec<T>) {
        *self.slot.unsaved.lock().unwrap_or_else(PoisonError::into_inner) = unsaved;
    }
}

impl<T> Drop for SlotGuard<'_, T> {
    fn drop(&mut self) {
        drop(self.lock.take());
        let mut slots = self
            .owner
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // The map and this guard are the only holders: nobody is waiting
        let idle = slots
            .get(&self.item)
            .is_some_and(|slot| Arc::ptr_eq(slot, &self.slot))
            && Arc::strong_count(&self.slot) == 2;
        if idle {
            slots.remove(&self.item);
        }
    }
}

/// One commit slot per item with a commit running or waiting
pub(crate) struct ItemSlots<T> {
    slots: Mutex<HashMap<ItemId, Arc<Slot<T>>>>,
}

impl<T> Default for ItemSlots<T> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<T> ItemSlots<T> {
    /// Waits for the item's slot according to `policy`
    pub(crate) async fn acquire(&self, item: &ItemId, policy: CommitPolicy) -> SlotGuard<'_, T> {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(item.clone()).or_default())
        };

        if policy == CommitPolicy::Supersede {
            let pending = slot
                .current
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            if let Some(pending) = pending {
                pending.cancel();
            }
        }

        // Built before waiting so a dropped acquire still releases the entry
        let mut guard = SlotGuard {
            owner: self,
            item: item.clone(),
            slot,
            lock: None,
            token: CancellationToken::new(),
        };
        guard.lock = Some(Arc::clone(&guard.slot.lock).lock_owned().await);
        *guard
            .slot
            .current
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(guard.token.clone());
        guard
    }

    /// Number of items with a commit running or waiting
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
