//! Collection statistics computed from an item snapshot.
//!
//! Pure derivation, no storage access: callers hand in the items from the
//! latest feed emission plus the current time and get a [`StatsSnapshot`]
//! back.

use chrono::{DateTime, Days, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use crate::error::MnemoResult;
use crate::repository::{FeedSubscription, Repository};
use crate::types::{StudyItem, DEFAULT_EASE_FACTOR};

/// Number of days covered by the upcoming-review forecast, today included.
pub const FORECAST_DAYS: usize = 7;

/// Maturity bucket for the interval histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Maturity {
    /// Interval 0: never successfully scheduled out.
    New,
    /// 1 to 6 days.
    Learning,
    /// 7 to 21 days.
    Young,
    /// Over 21 days.
    Mature,
}

impl Maturity {
    pub fn of(interval_days: i32) -> Self {
        match interval_days {
            i if i <= 0 => Self::New,
            1..=6 => Self::Learning,
            7..=21 => Self::Young,
            _ => Self::Mature,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::New => "New",
            Self::Learning => "Learning",
            Self::Young => "Young",
            Self::Mature => "Mature",
        }
    }
}

/// One day of the review forecast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayForecast {
    /// "Today", "Tomorrow", or a short weekday name.
    pub label: String,
    pub date: NaiveDate,
    pub count: usize,
}

/// Point-in-time aggregate over the collection.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub total_items: usize,
    pub due_now: usize,
    pub reviewed_today: usize,
    /// Sum of per-item review counts.
    pub total_reviews: u64,
    /// Mean ease factor, or the starting ease when the collection is empty.
    pub average_ease: f64,
    /// Item counts per maturity bucket, in `Maturity` declaration order.
    pub maturity_counts: [usize; 4],
    /// Per-day due counts for the next [`FORECAST_DAYS`] local days.
    pub forecast: Vec<DayForecast>,
}

impl StatsSnapshot {
    /// Aggregate `items` as of `now`. Day boundaries for the forecast are
    /// midnights in `now`'s time zone.
    pub fn compute<Tz: TimeZone>(items: &[StudyItem], now: DateTime<Tz>) -> Self {
        let now_utc = now.with_timezone(&Utc);

        let total_items = items.len();
        let due_now = items.iter().filter(|item| item.is_due(now_utc)).count();

        // Approximation carried over from the earliest stats screen: an item
        // counts as "reviewed today" when it has any review history and its
        // next review lies in the future. Overcounts items reviewed on
        // earlier days whose schedule has not yet come around.
        let reviewed_today = items
            .iter()
            .filter(|item| item.review_count > 0 && item.next_review_at > now_utc)
            .count();

        let total_reviews = items.iter().map(|item| u64::from(item.review_count)).sum();

        let average_ease = if items.is_empty() {
            DEFAULT_EASE_FACTOR
        } else {
            items.iter().map(|item| item.ease_factor).sum::<f64>() / items.len() as f64
        };

        let mut maturity_counts = [0usize; 4];
        for item in items {
            maturity_counts[Maturity::of(item.interval_days) as usize] += 1;
        }

        let forecast = forecast(items, &now);

        Self {
            total_items,
            due_now,
            reviewed_today,
            total_reviews,
            average_ease,
            maturity_counts,
            forecast,
        }
    }

    pub fn maturity_count(&self, maturity: Maturity) -> usize {
        self.maturity_counts[maturity as usize]
    }
}

/// Live statistics view: folds the item feed into successive snapshots.
pub struct StatsFeed {
    subscription: FeedSubscription,
    items: Vec<StudyItem>,
}

impl StatsFeed {
    /// Subscribe and capture the current item set.
    pub async fn open(repo: &Repository) -> MnemoResult<Self> {
        let mut subscription = repo.subscribe().await?;
        let items = subscription.recv().await.unwrap_or_default();
        Ok(Self {
            subscription,
            items,
        })
    }

    /// Fold in pending feed emissions.
    pub fn sync(&mut self) {
        if let Some(items) = self.subscription.latest() {
            self.items = items;
        }
    }

    /// Aggregate the latest known item set as of `now`.
    pub fn snapshot<Tz: TimeZone>(&self, now: DateTime<Tz>) -> StatsSnapshot {
        StatsSnapshot::compute(&self.items, now)
    }
}

fn forecast<Tz: TimeZone>(items: &[StudyItem], now: &DateTime<Tz>) -> Vec<DayForecast> {
    let today = now.date_naive();
    let mut days = Vec::with_capacity(FORECAST_DAYS);

    for offset in 0..FORECAST_DAYS as u64 {
        let Some(date) = today.checked_add_days(Days::new(offset)) else {
            break;
        };
        let Some(start) = local_midnight(&now.timezone(), date) else {
            break;
        };
        let end = date
            .checked_add_days(Days::new(1))
            .and_then(|next| local_midnight(&now.timezone(), next));

        let count = items
            .iter()
            .filter(|item| {
                item.next_review_at >= start
                    && end.map(|end| item.next_review_at < end).unwrap_or(true)
            })
            .count();

        let label = match offset {
            0 => "Today".to_string(),
            1 => "Tomorrow".to_string(),
            _ => date.format("%a").to_string(),
        };
        days.push(DayForecast { label, date, count });
    }

    days
}

fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> Option<DateTime<Utc>> {
    let naive = date.and_hms_opt(0, 0, 0)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}
