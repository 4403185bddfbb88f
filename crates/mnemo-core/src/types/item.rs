//! Study item types.

use chrono::{DateTime, Days, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Default ease factor assigned to new items.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// A study item: a question/answer note with optional attachments and tags.
///
/// Items are value types. Engines hold copies obtained from the live feed
/// and never mutate the canonical record in place; changes go back through
/// repository commands as whole replacement values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyItem {
    /// Unique identifier, immutable for the item's lifetime.
    pub id: Uuid,
    /// Prompt shown before the answer is revealed.
    pub title: String,
    /// Answer / notes body.
    pub body: String,
    /// Image attachments, in display order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<Vec<u8>>,
    /// Optional single PDF attachment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pdf: Option<Vec<u8>>,
    /// Free-text tags, order-preserving and de-duplicated on add.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Creation timestamp, set once.
    pub created_at: DateTime<Utc>,
    /// When the item is next due. Mutated only by the scheduler or by the
    /// creation default.
    pub next_review_at: DateTime<Utc>,
    /// Completed graded reviews. Monotonically non-decreasing.
    pub review_count: u32,
    /// SM-2 ease factor. Invariant: always >= 1.3.
    pub ease_factor: f64,
    /// Current interval in days. 0 means never yet scheduled past creation.
    pub interval_days: i32,
}

impl StudyItem {
    /// Create a new item with the onboarding scheduling defaults.
    ///
    /// New items start with `interval_days = 1`, the default ease factor,
    /// and a first review one day after creation. The one-day delay is
    /// deliberate: a freshly created item is never immediately due.
    pub fn new(title: impl Into<String>, body: impl Into<String>, now: DateTime<Utc>) -> Self {
        let next_review_at = now.checked_add_days(Days::new(1)).unwrap_or(now);
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            body: body.into(),
            images: Vec::new(),
            pdf: None,
            tags: Vec::new(),
            created_at: now,
            next_review_at,
            review_count: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            interval_days: 1,
        }
    }

    /// Set the tags.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set the image attachments.
    pub fn with_images(mut self, images: Vec<Vec<u8>>) -> Self {
        self.images = images;
        self
    }

    /// Set the PDF attachment.
    pub fn with_pdf(mut self, pdf: Vec<u8>) -> Self {
        self.pdf = Some(pdf);
        self
    }

    /// Whether the item is due at `now`.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review_at <= now
    }

    /// Whole days until the next review, clamped to zero for due items.
    pub fn days_until_review(&self, now: DateTime<Utc>) -> i64 {
        (self.next_review_at - now).num_days().max(0)
    }

    /// Whether the item carries any attachment.
    pub fn has_media(&self) -> bool {
        !self.images.is_empty() || self.pdf.is_some()
    }
}
