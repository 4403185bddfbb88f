//! In-memory item store.
//!
//! Reference backend used by tests and embedders that do not need
//! durability. Semantics match the sqlite backend: insertion order is
//! irrelevant, fetch order is defined by timestamps.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{MnemoError, MnemoResult};
use crate::types::{ReviewLog, StudyItem};

use super::ItemStore;

/// Non-durable [`ItemStore`] backed by process memory.
#[derive(Default)]
pub struct InMemoryStore {
    items: RwLock<Vec<StudyItem>>,
    reviews: RwLock<Vec<ReviewLog>>,
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ItemStore for InMemoryStore {
    async fn insert(&self, item: StudyItem) -> MnemoResult<()> {
        let mut items = self.items.write().await;
        items.push(item);
        Ok(())
    }

    async fn fetch_all(&self) -> MnemoResult<Vec<StudyItem>> {
        let items = self.items.read().await;
        let mut all = items.clone();
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn fetch_one(&self, id: Uuid) -> MnemoResult<Option<StudyItem>> {
        let items = self.items.read().await;
        Ok(items.iter().find(|item| item.id == id).cloned())
    }

    async fn fetch_due(&self, now: DateTime<Utc>) -> MnemoResult<Vec<StudyItem>> {
        let items = self.items.read().await;
        let mut due: Vec<StudyItem> = items
            .iter()
            .filter(|item| item.next_review_at <= now)
            .cloned()
            .collect();
        due.sort_by(|a, b| a.next_review_at.cmp(&b.next_review_at));
        Ok(due)
    }

    async fn update(&self, item: StudyItem) -> MnemoResult<()> {
        let mut items = self.items.write().await;
        match items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => {
                *existing = item;
                Ok(())
            }
            None => Err(MnemoError::not_found(item.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> MnemoResult<()> {
        let mut items = self.items.write().await;
        let before = items.len();
        items.retain(|item| item.id != id);
        if items.len() == before {
            return Err(MnemoError::not_found(id));
        }
        Ok(())
    }

    async fn append_review(&self, log: ReviewLog) -> MnemoResult<()> {
        let mut reviews = self.reviews.write().await;
        reviews.push(log);
        Ok(())
    }

    async fn fetch_reviews(&self, item_id: Uuid) -> MnemoResult<Vec<ReviewLog>> {
        let reviews = self.reviews.read().await;
        let mut logs: Vec<ReviewLog> = reviews
            .iter()
            .filter(|log| log.item_id == item_id)
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.reviewed_at.cmp(&a.reviewed_at));
        Ok(logs)
    }
}
