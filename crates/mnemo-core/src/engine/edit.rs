//! Item authoring: drafts for new items, edit sessions for existing ones,
//! and the two-step delete confirmation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{MnemoError, MnemoResult};
use crate::repository::Repository;
use crate::types::StudyItem;

/// Working copy of a new item before it exists anywhere.
#[derive(Debug, Clone, Default)]
pub struct ItemDraft {
    title: String,
    body: String,
    images: Vec<Vec<u8>>,
    pdf: Option<Vec<u8>>,
    tags: Vec<String>,
}

impl ItemDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn images(&self) -> &[Vec<u8>] {
        &self.images
    }

    pub fn pdf(&self) -> Option<&[u8]> {
        self.pdf.as_deref()
    }

    /// Raw input is kept as typed; trimming happens at commit.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    /// Add a tag, trimmed. Empty and duplicate tags are ignored; returns
    /// whether the tag was added.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        add_tag(&mut self.tags, tag)
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    pub fn add_image(&mut self, data: Vec<u8>) {
        self.images.push(data);
    }

    /// Remove the image at `index`; out-of-range indices are ignored.
    pub fn remove_image(&mut self, index: usize) {
        if index < self.images.len() {
            self.images.remove(index);
        }
    }

    pub fn set_pdf(&mut self, data: Vec<u8>) {
        self.pdf = Some(data);
    }

    pub fn clear_pdf(&mut self) {
        self.pdf = None;
    }

    /// Whether the draft would pass commit validation.
    pub fn is_valid(&self) -> bool {
        !self.title.trim().is_empty() && !self.body.trim().is_empty()
    }

    /// Validate, materialize the item with fresh scheduling state, and
    /// persist it. The draft is reusable if the write fails.
    pub async fn commit(&self, repo: &Repository, now: DateTime<Utc>) -> MnemoResult<StudyItem> {
        let title = self.title.trim();
        let body = self.body.trim();
        if title.is_empty() {
            return Err(MnemoError::missing_field("title"));
        }
        if body.is_empty() {
            return Err(MnemoError::missing_field("body"));
        }

        let mut item = StudyItem::new(title, body, now)
            .with_tags(self.tags.clone())
            .with_images(self.images.clone());
        if let Some(pdf) = &self.pdf {
            item = item.with_pdf(pdf.clone());
        }
        repo.create(item.clone()).await?;
        Ok(item)
    }
}

/// Edit pass over an existing item's content fields.
///
/// Scheduling state is out of reach here: ease factor, interval, review
/// count, and the next review date all pass through commit untouched.
#[derive(Debug, Clone)]
pub struct EditSession {
    original: StudyItem,
    title: String,
    body: String,
    tags: Vec<String>,
    images: Vec<Vec<u8>>,
    pdf: Option<Vec<u8>>,
}

impl EditSession {
    /// Begin editing a snapshot of `item`.
    pub fn from_item(item: StudyItem) -> Self {
        Self {
            title: item.title.clone(),
            body: item.body.clone(),
            tags: item.tags.clone(),
            images: item.images.clone(),
            pdf: item.pdf.clone(),
            original: item,
        }
    }

    /// Fetch the item and begin editing it.
    pub async fn load(repo: &Repository, id: Uuid) -> MnemoResult<Self> {
        let item = repo
            .fetch_one(id)
            .await?
            .ok_or_else(|| MnemoError::not_found(id))?;
        Ok(Self::from_item(item))
    }

    pub fn item_id(&self) -> Uuid {
        self.original.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn set_body(&mut self, body: impl Into<String>) {
        self.body = body.into();
    }

    pub fn add_tag(&mut self, tag: &str) -> bool {
        add_tag(&mut self.tags, tag)
    }

    pub fn remove_tag(&mut self, tag: &str) {
        self.tags.retain(|t| t != tag);
    }

    pub fn add_image(&mut self, data: Vec<u8>) {
        self.images.push(data);
    }

    pub fn remove_image(&mut self, index: usize) {
        if index < self.images.len() {
            self.images.remove(index);
        }
    }

    pub fn set_pdf(&mut self, data: Vec<u8>) {
        self.pdf = Some(data);
    }

    pub fn clear_pdf(&mut self) {
        self.pdf = None;
    }

    /// Whether any content field differs from the loaded snapshot.
    pub fn is_dirty(&self) -> bool {
        self.title != self.original.title
            || self.body != self.original.body
            || self.tags != self.original.tags
            || self.images != self.original.images
            || self.pdf != self.original.pdf
    }

    /// Validate and write the edited content back. Last write wins; there
    /// is no version check against concurrent edits.
    pub async fn commit(&self, repo: &Repository) -> MnemoResult<StudyItem> {
        let title = self.title.trim();
        let body = self.body.trim();
        if title.is_empty() {
            return Err(MnemoError::missing_field("title"));
        }
        if body.is_empty() {
            return Err(MnemoError::missing_field("body"));
        }

        let mut updated = self.original.clone();
        updated.title = title.to_string();
        updated.body = body.to_string();
        updated.tags = self.tags.clone();
        updated.images = self.images.clone();
        updated.pdf = self.pdf.clone();

        repo.update(updated.clone()).await?;
        Ok(updated)
    }
}

fn add_tag(tags: &mut Vec<String>, tag: &str) -> bool {
    let tag = tag.trim();
    if tag.is_empty() || tags.iter().any(|t| t == tag) {
        return false;
    }
    tags.push(tag.to_string());
    true
}

/// Delete confirmation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteState {
    Idle,
    /// Confirmation requested, nothing deleted yet.
    PendingConfirmation,
    /// The delete went through. Terminal.
    Deleted,
}

/// Two-step guarded delete: request, then confirm or cancel.
#[derive(Debug)]
pub struct DeleteConfirmation {
    item_id: Uuid,
    state: DeleteState,
}

impl DeleteConfirmation {
    pub fn new(item_id: Uuid) -> Self {
        Self {
            item_id,
            state: DeleteState::Idle,
        }
    }

    pub fn state(&self) -> DeleteState {
        self.state
    }

    pub fn item_id(&self) -> Uuid {
        self.item_id
    }

    /// Ask for confirmation. No effect outside `Idle`.
    pub fn request(&mut self) {
        if self.state == DeleteState::Idle {
            self.state = DeleteState::PendingConfirmation;
        }
    }

    /// Back out of a pending confirmation.
    pub fn cancel(&mut self) {
        if self.state == DeleteState::PendingConfirmation {
            self.state = DeleteState::Idle;
        }
    }

    /// Perform the delete. Only valid while confirmation is pending; on
    /// storage failure the confirmation stays pending.
    pub async fn confirm(&mut self, repo: &Repository) -> MnemoResult<()> {
        if self.state != DeleteState::PendingConfirmation {
            return Err(MnemoError::invalid_argument(
                "delete has not been requested",
            ));
        }
        repo.delete(self.item_id).await?;
        self.state = DeleteState::Deleted;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;
    use std::sync::Arc;

    fn empty_repo() -> Repository {
        Repository::new(Arc::new(InMemoryStore::new()))
    }

    #[tokio::test]
    async fn test_draft_commit_creates_scheduled_item() {
        let repo = empty_repo();
        let now = Utc::now();

        let mut draft = ItemDraft::new();
        draft.set_title("  What is ownership?  ");
        draft.set_body("A set of rules governing memory.");
        draft.add_tag("rust");

        let item = draft.commit(&repo, now).await.unwrap();
        assert_eq!(item.title, "What is ownership?");
        assert_eq!(item.interval_days, 1);
        assert_eq!(item.review_count, 0);
        assert!(repo.fetch_one(item.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_draft_rejects_blank_fields() {
        let repo = empty_repo();
        let now = Utc::now();

        let mut draft = ItemDraft::new();
        draft.set_title("   ");
        draft.set_body("body");
        assert!(!draft.is_valid());
        assert!(draft.commit(&repo, now).await.is_err());

        draft.set_title("title");
        draft.set_body("");
        assert!(draft.commit(&repo, now).await.is_err());
    }

    #[test]
    fn test_tag_dedup_and_trim() {
        let mut draft = ItemDraft::new();
        assert!(draft.add_tag("  rust  "));
        assert!(!draft.add_tag("rust"));
        assert!(!draft.add_tag("   "));
        assert_eq!(draft.tags(), ["rust"]);

        draft.remove_tag("rust");
        assert!(draft.tags().is_empty());
    }

    #[test]
    fn test_remove_image_out_of_range_is_ignored() {
        let mut draft = ItemDraft::new();
        draft.add_image(vec![1, 2, 3]);
        draft.remove_image(5);
        assert_eq!(draft.images().len(), 1);
        draft.remove_image(0);
        assert!(draft.images().is_empty());
    }

    #[tokio::test]
    async fn test_edit_preserves_scheduling_state() {
        let repo = empty_repo();
        let now = Utc::now();

        let mut item = StudyItem::new("old title", "old body", now);
        item.ease_factor = 2.1;
        item.interval_days = 15;
        item.review_count = 4;
        repo.create(item.clone()).await.unwrap();

        let mut edit = EditSession::load(&repo, item.id).await.unwrap();
        assert!(!edit.is_dirty());
        edit.set_title("new title");
        edit.add_tag("updated");
        assert!(edit.is_dirty());

        let updated = edit.commit(&repo).await.unwrap();
        assert_eq!(updated.title, "new title");
        assert_eq!(updated.ease_factor, 2.1);
        assert_eq!(updated.interval_days, 15);
        assert_eq!(updated.review_count, 4);
        assert_eq!(updated.next_review_at, item.next_review_at);
    }

    #[tokio::test]
    async fn test_edit_load_missing_item() {
        let repo = empty_repo();
        let err = EditSession::load(&repo, Uuid::new_v4()).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let repo = empty_repo();
        let now = Utc::now();
        let item = StudyItem::new("t", "b", now);
        repo.create(item.clone()).await.unwrap();

        let mut confirmation = DeleteConfirmation::new(item.id);
        // Confirm without request is rejected.
        assert!(confirmation.confirm(&repo).await.is_err());
        assert!(repo.fetch_one(item.id).await.unwrap().is_some());

        confirmation.request();
        assert_eq!(confirmation.state(), DeleteState::PendingConfirmation);
        confirmation.cancel();
        assert_eq!(confirmation.state(), DeleteState::Idle);

        confirmation.request();
        confirmation.confirm(&repo).await.unwrap();
        assert_eq!(confirmation.state(), DeleteState::Deleted);
        assert!(repo.fetch_one(item.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failed_delete_stays_pending() {
        let repo = empty_repo();
        let mut confirmation = DeleteConfirmation::new(Uuid::new_v4());
        confirmation.request();
        assert!(confirmation.confirm(&repo).await.is_err());
        assert_eq!(confirmation.state(), DeleteState::PendingConfirmation);
    }
}
