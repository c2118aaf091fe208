//! Scriptable persistence for exercising the reconciler
//!
//! [`MockPersistence`] answers each call from a queue of scripted
//! [`MockOutcome`]s, falling back to a default outcome once the queue is
//! empty, and records every payload it receives.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{PersistError, PersistFailureKind};
use crate::rank::RankKey;
use crate::reconcile::{ChangePayload, Confirmation, PersistenceBoundary};

/// How the mock answers one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOutcome {
    /// Accept the payload as proposed
    Accept,
    /// Accept, but report a different rank
    AcceptWithRank(RankKey),
    /// Fail with the given error
    Fail(PersistError),
    /// Never answer
    Hang,
}

impl MockOutcome {
    /// A failure of the given kind
    #[must_use]
    pub fn fail(kind: PersistFailureKind, message: impl Into<String>) -> Self {
        Self::Fail(PersistError::new(kind, message))
    }
}

#[derive(Debug)]
struct Script {
    queue: VecDeque<(Duration, MockOutcome)>,
    default: MockOutcome,
    delay: Duration,
    received: Vec<ChangePayload>,
}

/// In-memory [`PersistenceBoundary`] driven by a script
#[derive(Debug)]
pub struct MockPersistence {
    script: Mutex<Script>,
}

impl Default for MockPersistence {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPersistence {
    /// A mock that accepts everything immediately
    #[must_use]
    pub fn new() -> Self {
        Self::with_default(MockOutcome::Accept)
    }

    /// A mock answering every unscripted call with `outcome`
    #[must_use]
    pub fn with_default(outcome: MockOutcome) -> Self {
        Self {
            script: Mutex::new(Script {
                queue: VecDeque::new(),
                default: outcome,
                delay: Duration::ZERO,
                received: Vec::new(),
            }),
        }
    }

    /// Delays every unscripted answer
    #[must_use]
    pub fn with_delay(self, delay: Duration) -> Self {
        self.lock().delay = delay;
        self
    }

    /// Queues the answer for the next unanswered call
    pub fn push(&self, outcome: MockOutcome) {
        self.push_delayed(Duration::ZERO, outcome);
    }

    /// Queues an answer given after `delay`
    pub fn push_delayed(&self, delay: Duration, outcome: MockOutcome) {
        self.lock().queue.push_back((delay, outcome));
    }

    /// Payloads received so far, in call order
    #[must_use]
    pub fn payloads(&self) -> Vec<ChangePayload> {
        self.lock().received.clone()
    }

    /// Number of calls received
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.lock().received.len()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_outcome(&self, payload: &ChangePayload) -> (Duration, MockOutcome) {
        let mut script = self.lock();
        script.received.push(payload.clone());
        match script.queue.pop_front() {
            Some(scripted) => scripted,
            None => (script.delay, script.default.clone()),
        }
    }
}

#[async_trait]
impl PersistenceBoundary for MockPersistence {
    async fn persist_move(&self, payload: &ChangePayload) -> Result<Confirmation, PersistError> {
        let (delay, outcome) = self.next_outcome(payload);
        debug!(item = %payload.item_id, ?outcome, "Mock persistence call");
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        match outcome {
            MockOutcome::Accept => Ok(Confirmation::accepted(payload)),
            MockOutcome::AcceptWithRank(rank) => Ok(Confirmation::with_rank(payload, rank)),
            MockOutcome::Fail(err) => Err(err),
            MockOutcome::Hang => std::future::pending().await,
        }
    }

    fn boundary_id(&self) -> &'static str {
        "mock"
    }
}
