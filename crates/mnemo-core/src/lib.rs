//! mnemo-core - Core library for mnemo.
//!
//! This crate provides the spaced-repetition scheduler, the study item
//! repository with its live snapshot feed, and the interaction engines
//! (review queue, review sessions, practice, authoring, library view).
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use chrono::Utc;
//! use mnemo_core::{Quality, Repository, ReviewQueue};
//! use mnemo_core::store::InMemoryStore;
//!
//! let repo = Arc::new(Repository::new(Arc::new(InMemoryStore::new())));
//!
//! let mut queue = ReviewQueue::new(repo);
//! queue.open(Utc::now()).await?;
//!
//! while let Some(mut session) = queue.start_next(Utc::now()) {
//!     session.reveal();
//!     session.rate(Quality::Good, Utc::now()).await?;
//!     queue.review_completed(&session, Utc::now())?;
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod notify;
pub mod repository;
pub mod scheduler;
pub mod stats;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use config::{MnemoConfig, PracticeConfig, ReminderConfig};
pub use engine::{
    DeleteConfirmation, DeleteState, EditSession, ItemDraft, Library, LibraryFilter,
    PracticeMode, PracticeSession, QueuePhase, ReviewQueue, ReviewSession, SessionError,
    SessionPhase,
};
pub use error::{ErrorCode, MnemoError, MnemoResult};
pub use notify::{Notifier, NullNotifier};
pub use repository::{FeedSubscription, ItemFeed, Repository, ReviewCommitError};
pub use scheduler::{ReviewOutcome, MIN_EASE_FACTOR};
pub use stats::{DayForecast, Maturity, StatsFeed, StatsSnapshot, FORECAST_DAYS};
pub use store::ItemStore;
pub use types::{Quality, ReviewLog, StudyItem, DEFAULT_EASE_FACTOR};
