//! Due-item review queue.
//!
//! Drives a sequence of [`ReviewSession`]s over the items currently due,
//! staying live against the repository feed. The queue never persists
//! anything itself; it advances only after a session's write is confirmed.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::engine::session::{ReviewSession, SessionPhase};
use crate::error::{MnemoError, MnemoResult};
use crate::repository::{FeedSubscription, Repository};
use crate::types::StudyItem;

/// Queue lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueuePhase {
    /// Not open; no subscription held.
    Idle,
    /// `open()` in flight, waiting on the first feed emission.
    Loading,
    /// Snapshot available; sessions can be started.
    Ready,
    /// A session handed out by `start_next()` is in progress.
    Reviewing,
}

/// Ordered queue of due items backed by the live item feed.
pub struct ReviewQueue {
    repo: Arc<Repository>,
    subscription: Option<FeedSubscription>,
    snapshot: Vec<StudyItem>,
    cursor: usize,
    reviewed: HashSet<Uuid>,
    completed_count: usize,
    phase: QueuePhase,
}

impl ReviewQueue {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self {
            repo,
            subscription: None,
            snapshot: Vec::new(),
            cursor: 0,
            reviewed: HashSet::new(),
            completed_count: 0,
            phase: QueuePhase::Idle,
        }
    }

    /// Subscribe to the item feed and capture the first due snapshot.
    ///
    /// Reopening drops the previous subscription first, so at most one is
    /// ever held.
    pub async fn open(&mut self, now: DateTime<Utc>) -> MnemoResult<()> {
        self.subscription = None;
        self.snapshot.clear();
        self.cursor = 0;
        self.reviewed.clear();
        self.completed_count = 0;
        self.phase = QueuePhase::Loading;

        let mut subscription = match self.repo.subscribe().await {
            Ok(sub) => sub,
            Err(err) => {
                self.phase = QueuePhase::Idle;
                return Err(err);
            }
        };
        let items = subscription.recv().await.unwrap_or_default();
        self.subscription = Some(subscription);
        self.apply_emission(items, now);
        self.phase = QueuePhase::Ready;
        Ok(())
    }

    /// Drop the subscription and reset. Safe to call in any phase.
    pub fn close(&mut self) {
        self.subscription = None;
        self.snapshot.clear();
        self.cursor = 0;
        self.reviewed.clear();
        self.completed_count = 0;
        self.phase = QueuePhase::Idle;
    }

    /// Start a session over the item at the cursor.
    ///
    /// Pending feed emissions are folded in first, so the session always
    /// reflects the freshest snapshot. Returns `None` when the queue is not
    /// `Ready` or is exhausted. The session holds its own copy of the item;
    /// later emissions do not disturb it.
    pub fn start_next(&mut self, now: DateTime<Utc>) -> Option<ReviewSession> {
        if self.phase != QueuePhase::Ready {
            return None;
        }
        self.drain(now);
        let item = self.snapshot.get(self.cursor)?.clone();
        self.phase = QueuePhase::Reviewing;
        Some(ReviewSession::new(self.repo.clone(), item, now))
    }

    /// Acknowledge a completed session and advance.
    ///
    /// Rejects sessions whose write has not been confirmed; a cancelled or
    /// still-submitting session must go through [`ReviewQueue::review_cancelled`]
    /// or be retried instead.
    pub fn review_completed(
        &mut self,
        session: &ReviewSession,
        now: DateTime<Utc>,
    ) -> MnemoResult<()> {
        if self.phase != QueuePhase::Reviewing {
            return Err(MnemoError::validation(
                "review_completed() requires an in-progress review",
            ));
        }
        if session.phase() != SessionPhase::Completed {
            return Err(MnemoError::validation(
                "session has no confirmed write; the queue does not advance",
            ));
        }

        self.reviewed.insert(session.item().id);
        self.completed_count += 1;
        // Step past the reviewed item; a fresh emission normally re-derives
        // the position, this covers the case where none arrives.
        self.cursor = (self.cursor + 1).min(self.snapshot.len());
        self.drain(now);
        self.phase = QueuePhase::Ready;
        Ok(())
    }

    /// Return to `Ready` after a session was cancelled. The cursor does not
    /// move; the same item is offered again.
    pub fn review_cancelled(&mut self) {
        if self.phase == QueuePhase::Reviewing {
            self.phase = QueuePhase::Ready;
        }
    }

    pub fn phase(&self) -> QueuePhase {
        self.phase
    }

    /// The item the next session would cover.
    pub fn current_item(&self) -> Option<&StudyItem> {
        self.snapshot.get(self.cursor)
    }

    /// Items still waiting in this queue run.
    pub fn remaining(&self) -> usize {
        self.snapshot.len() - self.cursor
    }

    /// Reviews confirmed since `open()`.
    pub fn completed_count(&self) -> usize {
        self.completed_count
    }

    /// True once every due item has been reviewed or has left the due set.
    pub fn is_exhausted(&self) -> bool {
        self.cursor >= self.snapshot.len()
    }

    /// Fraction of this run already completed, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        let total = self.completed_count + self.remaining();
        if total == 0 {
            0.0
        } else {
            self.completed_count as f64 / total as f64
        }
    }

    fn drain(&mut self, now: DateTime<Utc>) {
        let Some(subscription) = &mut self.subscription else {
            return;
        };
        if let Some(items) = subscription.latest() {
            self.apply_emission(items, now);
        }
    }

    fn apply_emission(&mut self, items: Vec<StudyItem>, now: DateTime<Utc>) {
        self.snapshot = items
            .into_iter()
            .filter(|item| item.is_due(now) && !self.reviewed.contains(&item.id))
            .collect();
        // Reviewed items are filtered out above, so the head of the snapshot
        // is always the next unreviewed due item.
        self.cursor = 0;
    }
}
