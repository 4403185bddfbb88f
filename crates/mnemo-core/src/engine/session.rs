//! Per-item graded review session.
//!
//! State machine walking one item from question to persisted grade:
//! AwaitingReveal -> AnswerShown -> Submitting -> Completed, with Cancelled
//! reachable from the two pre-submission states. The session owns response
//! timing; elapsed time runs from construction, not from reveal.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use thiserror::Error;

use crate::error::MnemoError;
use crate::repository::{Repository, ReviewCommitError};
use crate::scheduler;
use crate::types::{Quality, StudyItem};

/// Session lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Question visible, answer hidden.
    AwaitingReveal,
    /// Answer revealed, awaiting a quality rating.
    AnswerShown,
    /// Persistence attempted and failed; retry available.
    Submitting,
    /// Review persisted. Terminal.
    Completed,
    /// Discarded with no persistence. Terminal.
    Cancelled,
}

/// Errors surfaced by session actions.
#[derive(Error, Debug)]
pub enum SessionError {
    /// The action is not valid in the current phase.
    #[error("Invalid session action: {0}")]
    InvalidAction(String),

    /// The two-phase review commit failed; the variant tells whether the
    /// review graded.
    #[error(transparent)]
    Commit(#[from] ReviewCommitError),

    /// Scheduler rejected the inputs.
    #[error(transparent)]
    Other(#[from] MnemoError),
}

struct PendingReview {
    updated: StudyItem,
    quality: Quality,
    response_secs: f64,
    reviewed_at: DateTime<Utc>,
}

/// One graded review of one item.
pub struct ReviewSession {
    repo: Arc<Repository>,
    item: StudyItem,
    started_at: DateTime<Utc>,
    phase: SessionPhase,
    pending: Option<PendingReview>,
    completed: Option<StudyItem>,
}

impl ReviewSession {
    /// Start a session over a copy of `item`. The response clock starts
    /// here.
    pub fn new(repo: Arc<Repository>, item: StudyItem, now: DateTime<Utc>) -> Self {
        Self {
            repo,
            item,
            started_at: now,
            phase: SessionPhase::AwaitingReveal,
            pending: None,
            completed: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// The item under review, as captured at session start. Feed emissions
    /// never replace it mid-session.
    pub fn item(&self) -> &StudyItem {
        &self.item
    }

    /// The rescheduled item, once the session completed.
    pub fn completed_item(&self) -> Option<&StudyItem> {
        self.completed.as_ref()
    }

    /// Reveal the answer. A display gate only; nothing is recorded.
    pub fn reveal(&mut self) {
        if self.phase == SessionPhase::AwaitingReveal {
            self.phase = SessionPhase::AnswerShown;
        }
    }

    /// Rate recall quality, reschedule, and persist.
    ///
    /// Valid only once the answer is shown. On success the session is
    /// `Completed` and the updated item is returned. On persistence failure
    /// the session stays in `Submitting` - no partial transition is
    /// observable - and the caller may [`ReviewSession::retry`]; the session
    /// never retries on its own.
    pub async fn rate<Tz: TimeZone>(
        &mut self,
        quality: Quality,
        now: DateTime<Tz>,
    ) -> Result<StudyItem, SessionError> {
        if self.phase != SessionPhase::AnswerShown {
            return Err(SessionError::InvalidAction(format!(
                "rate() requires AnswerShown, session is {:?}",
                self.phase
            )));
        }

        let reviewed_at = now.with_timezone(&Utc);
        let response_secs = ((reviewed_at - self.started_at).num_milliseconds() as f64 / 1000.0)
            .max(0.0);

        let outcome = scheduler::next_review(
            self.item.ease_factor,
            self.item.interval_days,
            quality.score(),
            now,
        )?;

        let mut updated = self.item.clone();
        updated.next_review_at = outcome.next_at.with_timezone(&Utc);
        updated.interval_days = outcome.interval_days;
        updated.ease_factor = outcome.ease_factor;
        updated.review_count += 1;

        self.phase = SessionPhase::Submitting;
        self.pending = Some(PendingReview {
            updated,
            quality,
            response_secs,
            reviewed_at,
        });
        self.submit().await
    }

    /// Re-attempt a failed submission.
    pub async fn retry(&mut self) -> Result<StudyItem, SessionError> {
        if self.phase != SessionPhase::Submitting || self.pending.is_none() {
            return Err(SessionError::InvalidAction(
                "retry() requires a failed submission".to_string(),
            ));
        }
        self.submit().await
    }

    /// Discard the session without persisting anything.
    ///
    /// Valid only before submission has started; the underlying item is
    /// untouched.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        match self.phase {
            SessionPhase::AwaitingReveal | SessionPhase::AnswerShown => {
                self.phase = SessionPhase::Cancelled;
                Ok(())
            }
            phase => Err(SessionError::InvalidAction(format!(
                "cancel() is not valid from {:?}",
                phase
            ))),
        }
    }

    async fn submit(&mut self) -> Result<StudyItem, SessionError> {
        let Some(pending) = self.pending.as_ref() else {
            return Err(SessionError::InvalidAction(
                "no pending review to submit".to_string(),
            ));
        };

        self.repo
            .record_review(
                pending.updated.clone(),
                pending.quality,
                pending.response_secs,
                pending.reviewed_at,
            )
            .await?;

        let updated = pending.updated.clone();
        self.completed = Some(updated.clone());
        self.pending = None;
        self.phase = SessionPhase::Completed;
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use chrono::Duration;

    async fn repo_with(item: &StudyItem) -> Arc<Repository> {
        let repo = Arc::new(Repository::new(Arc::new(InMemoryStore::new())));
        repo.create(item.clone()).await.unwrap();
        repo
    }

    fn due_item(now: DateTime<Utc>) -> StudyItem {
        let mut item = StudyItem::new("q", "a", now - Duration::days(2));
        item.next_review_at = now;
        item.interval_days = 1;
        item
    }

    #[tokio::test]
    async fn test_full_review_flow() {
        let now = Utc::now();
        let item = due_item(now);
        let repo = repo_with(&item).await;

        let mut session = ReviewSession::new(repo.clone(), item.clone(), now);
        assert_eq!(session.phase(), SessionPhase::AwaitingReveal);

        session.reveal();
        assert_eq!(session.phase(), SessionPhase::AnswerShown);

        let rated_at = now + Duration::seconds(7);
        let updated = session.rate(Quality::Perfect, rated_at).await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Completed);
        assert_eq!(updated.review_count, item.review_count + 1);
        assert_eq!(updated.interval_days, 6); // second successful review

        // Persisted item and log agree with the session outcome.
        let stored = repo.fetch_one(item.id).await.unwrap().unwrap();
        assert_eq!(stored, updated);
        let logs = repo.reviews(item.id).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].quality, 5);
        assert!((logs[0].response_secs - 7.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_rate_requires_reveal() {
        let now = Utc::now();
        let item = due_item(now);
        let repo = repo_with(&item).await;

        let mut session = ReviewSession::new(repo, item, now);
        let err = session.rate(Quality::Good, now).await.unwrap_err();
        assert!(matches!(err, SessionError::InvalidAction(_)));
        assert_eq!(session.phase(), SessionPhase::AwaitingReveal);
    }

    #[tokio::test]
    async fn test_response_time_runs_from_construction() {
        let now = Utc::now();
        let item = due_item(now);
        let repo = repo_with(&item).await;

        let mut session = ReviewSession::new(repo.clone(), item.clone(), now);
        // Reveal late; the clock still started at construction.
        session.reveal();
        session
            .rate(Quality::Hard, now + Duration::seconds(42))
            .await
            .unwrap();

        let logs = repo.reviews(item.id).await.unwrap();
        assert!((logs[0].response_secs - 42.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_failed_submission_stays_submitting_and_retries() {
        let now = Utc::now();
        let item = due_item(now);
        // Repository over an empty store: the update fails with NotFound.
        let repo = Arc::new(Repository::new(Arc::new(InMemoryStore::new())));

        let mut session = ReviewSession::new(repo.clone(), item.clone(), now);
        session.reveal();

        let err = session.rate(Quality::Good, now).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Commit(ReviewCommitError::Update(_))
        ));
        assert_eq!(session.phase(), SessionPhase::Submitting);
        assert!(session.completed_item().is_none());

        // Create the item out-of-band, then retry succeeds.
        repo.create(item).await.unwrap();
        let updated = session.retry().await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Completed);
        assert_eq!(updated.review_count, 1);
    }

    #[tokio::test]
    async fn test_cancel_before_submission_only() {
        let now = Utc::now();
        let item = due_item(now);
        let repo = repo_with(&item).await;

        let mut session = ReviewSession::new(repo.clone(), item.clone(), now);
        session.reveal();
        session.cancel().unwrap();
        assert_eq!(session.phase(), SessionPhase::Cancelled);

        // Nothing was written.
        assert!(repo.reviews(item.id).await.unwrap().is_empty());
        let stored = repo.fetch_one(item.id).await.unwrap().unwrap();
        assert_eq!(stored, item);
    }

    #[tokio::test]
    async fn test_cancel_after_completion_rejected() {
        let now = Utc::now();
        let item = due_item(now);
        let repo = repo_with(&item).await;

        let mut session = ReviewSession::new(repo, item, now);
        session.reveal();
        session.rate(Quality::Good, now).await.unwrap();
        assert!(session.cancel().is_err());
        assert_eq!(session.phase(), SessionPhase::Completed);
    }
}
