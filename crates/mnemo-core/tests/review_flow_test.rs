//! Integration tests covering the full study loop: authoring items, running
//! the due queue end to end, practice isolation, and live library updates.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use mnemo_core::error::MnemoResult;
use mnemo_core::store::{InMemoryStore, ItemStore};
use mnemo_core::{
    ItemDraft, Library, PracticeConfig, PracticeMode, PracticeSession, Quality, Repository,
    ReviewLog, ReviewQueue, SessionPhase, StatsSnapshot, StudyItem,
};

/// Store wrapper counting write traffic, to prove which flows persist.
struct CountingStore {
    inner: InMemoryStore,
    updates: AtomicUsize,
    appends: AtomicUsize,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: InMemoryStore::new(),
            updates: AtomicUsize::new(0),
            appends: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ItemStore for CountingStore {
    async fn insert(&self, item: StudyItem) -> MnemoResult<()> {
        self.inner.insert(item).await
    }

    async fn fetch_all(&self) -> MnemoResult<Vec<StudyItem>> {
        self.inner.fetch_all().await
    }

    async fn fetch_one(&self, id: Uuid) -> MnemoResult<Option<StudyItem>> {
        self.inner.fetch_one(id).await
    }

    async fn fetch_due(&self, now: DateTime<Utc>) -> MnemoResult<Vec<StudyItem>> {
        self.inner.fetch_due(now).await
    }

    async fn update(&self, item: StudyItem) -> MnemoResult<()> {
        self.updates.fetch_add(1, Ordering::SeqCst);
        self.inner.update(item).await
    }

    async fn delete(&self, id: Uuid) -> MnemoResult<()> {
        self.inner.delete(id).await
    }

    async fn append_review(&self, log: ReviewLog) -> MnemoResult<()> {
        self.appends.fetch_add(1, Ordering::SeqCst);
        self.inner.append_review(log).await
    }

    async fn fetch_reviews(&self, item_id: Uuid) -> MnemoResult<Vec<ReviewLog>> {
        self.inner.fetch_reviews(item_id).await
    }
}

async fn draft_item(repo: &Repository, title: &str, now: DateTime<Utc>) -> StudyItem {
    let mut draft = ItemDraft::new();
    draft.set_title(title);
    draft.set_body("answer");
    draft.commit(repo, now).await.unwrap()
}

/// Push an item into the due set by backdating its schedule.
async fn make_due(repo: &Repository, item: &StudyItem, now: DateTime<Utc>) -> StudyItem {
    let mut due = item.clone();
    due.next_review_at = now - Duration::hours(1);
    repo.update(due.clone()).await.unwrap();
    due
}

#[tokio::test]
async fn test_full_study_loop() {
    let now = Utc::now();
    let store = Arc::new(CountingStore::new());
    let repo = Arc::new(Repository::new(store.clone()));

    // Author three items; two become due.
    let a = draft_item(&repo, "a", now).await;
    let b = draft_item(&repo, "b", now).await;
    let _later = draft_item(&repo, "later", now).await;
    make_due(&repo, &a, now).await;
    make_due(&repo, &b, now).await;
    let setup_updates = store.updates.load(Ordering::SeqCst);

    let mut queue = ReviewQueue::new(repo.clone());
    queue.open(now).await.unwrap();
    assert_eq!(queue.remaining(), 2);

    let mut reviewed = 0;
    while let Some(mut session) = queue.start_next(now) {
        session.reveal();
        let updated = session.rate(Quality::Good, now).await.unwrap();
        assert_eq!(session.phase(), SessionPhase::Completed);
        assert!(updated.next_review_at > now);
        queue.review_completed(&session, now).unwrap();
        reviewed += 1;
    }

    assert_eq!(reviewed, 2);
    assert!(queue.is_exhausted());
    // Exactly one item update and one history append per review.
    assert_eq!(
        store.updates.load(Ordering::SeqCst) - setup_updates,
        2
    );
    assert_eq!(store.appends.load(Ordering::SeqCst), 2);

    // Stats computed over the post-review snapshot.
    let items = repo.fetch_all().await.unwrap();
    let stats = StatsSnapshot::compute(&items, now);
    assert_eq!(stats.total_items, 3);
    assert_eq!(stats.due_now, 0);
    assert_eq!(stats.total_reviews, 2);
    assert_eq!(stats.reviewed_today, 2);
}

#[tokio::test]
async fn test_practice_performs_no_writes() {
    let now = Utc::now();
    let store = Arc::new(CountingStore::new());
    let repo = Arc::new(Repository::new(store.clone()));

    for i in 0..4 {
        draft_item(&repo, &format!("item {}", i), now).await;
    }
    let baseline_updates = store.updates.load(Ordering::SeqCst);

    let mut practice = PracticeSession::open(
        &repo,
        PracticeConfig::default(),
        PracticeMode::All,
        true,
        now,
    )
    .await
    .unwrap();

    for _ in 0..practice.deck_size() {
        practice.flip();
        practice.mark_known();
    }
    practice.restart();
    practice.set_mode(PracticeMode::DueOnly, now);

    assert_eq!(store.updates.load(Ordering::SeqCst), baseline_updates);
    assert_eq!(store.appends.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_library_tracks_queue_driven_changes() {
    let now = Utc::now();
    let repo = Arc::new(Repository::new(Arc::new(InMemoryStore::new())));

    let a = draft_item(&repo, "a", now).await;
    let a = make_due(&repo, &a, now).await;

    let mut library = Library::open(&repo).await.unwrap();
    assert_eq!(library.due_count(now), 1);

    let mut queue = ReviewQueue::new(repo.clone());
    queue.open(now).await.unwrap();
    let mut session = queue.start_next(now).unwrap();
    session.reveal();
    session.rate(Quality::Perfect, now).await.unwrap();
    queue.review_completed(&session, now).unwrap();

    // The library sees the reschedule through the feed.
    library.sync();
    assert_eq!(library.due_count(now), 0);
    let refreshed = library
        .items()
        .iter()
        .find(|item| item.id == a.id)
        .unwrap();
    assert_eq!(refreshed.review_count, 1);
}

#[tokio::test]
async fn test_two_consumers_share_one_feed() {
    let now = Utc::now();
    let repo = Arc::new(Repository::new(Arc::new(InMemoryStore::new())));
    draft_item(&repo, "seed", now).await;

    let mut library = Library::open(&repo).await.unwrap();
    let mut practice = PracticeSession::open(
        &repo,
        PracticeConfig::default(),
        PracticeMode::All,
        false,
        now,
    )
    .await
    .unwrap();

    draft_item(&repo, "second", now + Duration::seconds(1)).await;

    library.sync();
    practice.sync(now);
    assert_eq!(library.len(), 2);
    assert_eq!(practice.deck_size(), 2);
}
