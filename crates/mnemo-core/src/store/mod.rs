//! Storage trait and the in-memory reference backend.
//!
//! The repository owns the canonical item collection; storage backends only
//! persist it. Backends implement [`ItemStore`] and are injected at
//! construction time (see `mnemo-store-sqlite` for the durable one).

mod memory;

pub use memory::InMemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::MnemoResult;
use crate::types::{ReviewLog, StudyItem};

/// Core storage trait - all item store backends implement this.
///
/// Items round-trip exactly, including attachment bytes. Writes are applied
/// in the order issued by a single caller; racing writers are
/// last-write-wins (the backend does no per-item versioning).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// Insert a new item.
    async fn insert(&self, item: StudyItem) -> MnemoResult<()>;

    /// Fetch every item, most recently created first.
    async fn fetch_all(&self) -> MnemoResult<Vec<StudyItem>>;

    /// Fetch one item by id. `Ok(None)` when the id is unknown.
    async fn fetch_one(&self, id: Uuid) -> MnemoResult<Option<StudyItem>>;

    /// Fetch the items due at `now`, soonest review date first.
    async fn fetch_due(&self, now: DateTime<Utc>) -> MnemoResult<Vec<StudyItem>>;

    /// Replace an existing item wholesale. `NotFound` when the id is
    /// unknown.
    async fn update(&self, item: StudyItem) -> MnemoResult<()>;

    /// Delete an item. `NotFound` when the id is unknown.
    async fn delete(&self, id: Uuid) -> MnemoResult<()>;

    /// Append one review log record.
    async fn append_review(&self, log: ReviewLog) -> MnemoResult<()>;

    /// Fetch the review log for an item, newest first.
    async fn fetch_reviews(&self, item_id: Uuid) -> MnemoResult<Vec<ReviewLog>>;
}
