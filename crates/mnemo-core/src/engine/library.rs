//! Live item listing with search and a tracked selection.

use chrono::{DateTime, Utc};
use strum::{Display, EnumIter};
use uuid::Uuid;

use crate::error::MnemoResult;
use crate::repository::{FeedSubscription, Repository};
use crate::types::StudyItem;

/// Which slice of the collection the library shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum LibraryFilter {
    /// Every item.
    All,
    /// Items currently due.
    Due,
    /// Items reviewed at least once, furthest-out review date first.
    Recent,
}

/// Browsable view over the whole collection, kept live by the feed.
///
/// Selection survives emissions as long as the selected item exists; when it
/// vanishes the selection falls back to the head of the list.
pub struct Library {
    subscription: FeedSubscription,
    items: Vec<StudyItem>,
    query: String,
    filter: LibraryFilter,
    selected: Option<Uuid>,
}

impl Library {
    /// Subscribe and populate from the first emission. The first item, if
    /// any, starts selected.
    pub async fn open(repo: &Repository) -> MnemoResult<Self> {
        let mut subscription = repo.subscribe().await?;
        let items = subscription.recv().await.unwrap_or_default();

        let mut library = Self {
            subscription,
            items: Vec::new(),
            query: String::new(),
            filter: LibraryFilter::All,
            selected: None,
        };
        library.apply(items);
        Ok(library)
    }

    /// Fold in pending feed emissions.
    pub fn sync(&mut self) {
        if let Some(items) = self.subscription.latest() {
            self.apply(items);
        }
    }

    /// All items, newest first.
    pub fn items(&self) -> &[StudyItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Items due at `now`.
    pub fn due_count(&self, now: DateTime<Utc>) -> usize {
        self.items.iter().filter(|item| item.is_due(now)).count()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn filter(&self) -> LibraryFilter {
        self.filter
    }

    pub fn set_filter(&mut self, filter: LibraryFilter) {
        self.filter = filter;
    }

    /// Items matching the current query, case-insensitively, against title,
    /// body, and tags. An empty query matches everything.
    pub fn search_results(&self) -> Vec<&StudyItem> {
        self.items
            .iter()
            .filter(|item| self.matches_query(item))
            .collect()
    }

    /// Items passing the active filter and the current query.
    ///
    /// `All` and `Due` keep the feed order (newest created first); `Recent`
    /// re-sorts with the furthest-out next review first, so freshly
    /// reviewed items lead the list.
    pub fn visible_items(&self, now: DateTime<Utc>) -> Vec<&StudyItem> {
        let mut visible: Vec<&StudyItem> = self
            .items
            .iter()
            .filter(|item| self.matches_filter(item, now) && self.matches_query(item))
            .collect();
        if self.filter == LibraryFilter::Recent {
            visible.sort_by(|a, b| b.next_review_at.cmp(&a.next_review_at));
        }
        visible
    }

    fn matches_filter(&self, item: &StudyItem, now: DateTime<Utc>) -> bool {
        match self.filter {
            LibraryFilter::All => true,
            LibraryFilter::Due => item.is_due(now),
            LibraryFilter::Recent => item.review_count > 0,
        }
    }

    fn matches_query(&self, item: &StudyItem) -> bool {
        let needle = self.query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        item.title.to_lowercase().contains(&needle)
            || item.body.to_lowercase().contains(&needle)
            || item.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }

    pub fn selected_item(&self) -> Option<&StudyItem> {
        let id = self.selected?;
        self.items.iter().find(|item| item.id == id)
    }

    /// Select an item by id; unknown ids clear the selection back to the
    /// list head.
    pub fn select(&mut self, id: Uuid) {
        if self.items.iter().any(|item| item.id == id) {
            self.selected = Some(id);
        } else {
            self.selected = self.items.first().map(|item| item.id);
        }
    }

    /// Move the selection off `id` before it gets deleted: the following
    /// item takes over, else the preceding one, else nothing.
    ///
    /// Called ahead of the delete so the view never points at a corpse
    /// while the feed catches up.
    pub fn retarget_before_delete(&mut self, id: Uuid) {
        if self.selected != Some(id) {
            return;
        }
        let Some(pos) = self.items.iter().position(|item| item.id == id) else {
            self.selected = None;
            return;
        };
        self.selected = self
            .items
            .get(pos + 1)
            .or_else(|| if pos > 0 { self.items.get(pos - 1) } else { None })
            .map(|item| item.id);
    }

    fn apply(&mut self, items: Vec<StudyItem>) {
        self.items = items;
        let still_there = self
            .selected
            .map(|id| self.items.iter().any(|item| item.id == id))
            .unwrap_or(false);
        if !still_there {
            self.selected = self.items.first().map(|item| item.id);
        }
    }
}
