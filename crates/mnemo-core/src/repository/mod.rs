//! Item repository facade.
//!
//! The single funnel for every item mutation. Wraps an [`ItemStore`] backend
//! and re-broadcasts the full item set on each committed write, so that
//! every consumer (queue, stats, library, practice) derives its view from
//! one consistent stream. Constructed explicitly and passed by handle to
//! each engine; there is no ambient global instance.

mod feed;

pub use feed::{FeedSubscription, ItemFeed};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::error::{MnemoError, MnemoResult};
use crate::store::ItemStore;
use crate::types::{Quality, ReviewLog, StudyItem};

/// Failure of the two-phase review commit.
///
/// The item update and the log append are both attempted, but not atomic
/// across the two; the variant tells the caller whether the review counted.
#[derive(Error, Debug)]
pub enum ReviewCommitError {
    /// The item update failed: the review did not grade.
    #[error("Review not graded: {0}")]
    Update(#[source] MnemoError),

    /// The item update committed but the log append failed: the review
    /// graded, with no history record.
    #[error("Review graded but not logged: {0}")]
    History(#[source] MnemoError),
}

/// Repository over a storage backend plus the live feed.
pub struct Repository {
    store: Arc<dyn ItemStore>,
    feed: ItemFeed,
}

impl Repository {
    /// Create a repository over the given backend.
    pub fn new(store: Arc<dyn ItemStore>) -> Self {
        Self {
            store,
            feed: ItemFeed::new(),
        }
    }

    /// Create a repository with a custom feed capacity.
    pub fn with_feed_capacity(store: Arc<dyn ItemStore>, capacity: usize) -> Self {
        Self {
            store,
            feed: ItemFeed::with_capacity(capacity),
        }
    }

    /// Subscribe to the live feed.
    ///
    /// The subscription immediately carries the current full set; each
    /// subsequent committed write re-delivers the whole set. Any number of
    /// subscribers may be active at once.
    pub async fn subscribe(&self) -> MnemoResult<FeedSubscription> {
        // Reserve the receiver slot before reading: a write committing
        // between the two queues its emission behind the replay instead of
        // slipping past a not-yet-registered subscriber.
        let receiver = self.feed.register();
        let current = self.store.fetch_all().await?;
        Ok(FeedSubscription::replaying(current, receiver))
    }

    /// Insert a new item and broadcast.
    pub async fn create(&self, item: StudyItem) -> MnemoResult<()> {
        self.store.insert(item).await?;
        tracing::debug!("Item created");
        self.broadcast().await;
        Ok(())
    }

    /// Replace an existing item and broadcast.
    pub async fn update(&self, item: StudyItem) -> MnemoResult<()> {
        self.store.update(item).await?;
        self.broadcast().await;
        Ok(())
    }

    /// Delete an item and broadcast.
    ///
    /// Review log records for the item are left in place and ignored.
    pub async fn delete(&self, id: Uuid) -> MnemoResult<()> {
        self.store.delete(id).await?;
        tracing::debug!(%id, "Item deleted");
        self.broadcast().await;
        Ok(())
    }

    /// Fetch every item, most recently created first.
    pub async fn fetch_all(&self) -> MnemoResult<Vec<StudyItem>> {
        self.store.fetch_all().await
    }

    /// Fetch one item by id.
    pub async fn fetch_one(&self, id: Uuid) -> MnemoResult<Option<StudyItem>> {
        self.store.fetch_one(id).await
    }

    /// Fetch the items due at `now`.
    pub async fn fetch_due(&self, now: DateTime<Utc>) -> MnemoResult<Vec<StudyItem>> {
        self.store.fetch_due(now).await
    }

    /// Fetch the review log for an item, newest first.
    pub async fn reviews(&self, item_id: Uuid) -> MnemoResult<Vec<ReviewLog>> {
        self.store.fetch_reviews(item_id).await
    }

    /// Commit a completed graded review: persist the rescheduled item and
    /// append exactly one review log record.
    ///
    /// Both writes are attempted. A failed update aborts before the append
    /// and nothing is broadcast. A failed append still broadcasts, because
    /// the item update committed.
    pub async fn record_review(
        &self,
        item: StudyItem,
        quality: Quality,
        response_secs: f64,
        reviewed_at: DateTime<Utc>,
    ) -> Result<(), ReviewCommitError> {
        let item_id = item.id;
        self.store
            .update(item)
            .await
            .map_err(ReviewCommitError::Update)?;

        let log = ReviewLog::new(item_id, quality, response_secs, reviewed_at);
        let appended = self
            .store
            .append_review(log)
            .await
            .map_err(ReviewCommitError::History);

        tracing::debug!(%item_id, quality = quality.score(), "Review recorded");
        self.broadcast().await;
        appended
    }

    /// Re-broadcast the full current set to all subscribers.
    ///
    /// Called only after a committed write; a failed write never reaches
    /// this point, so partial success is never visible.
    async fn broadcast(&self) {
        match self.store.fetch_all().await {
            Ok(items) => self.feed.emit(items),
            Err(err) => {
                tracing::warn!(error = %err, "Skipping feed broadcast; snapshot fetch failed")
            }
        }
    }
}
