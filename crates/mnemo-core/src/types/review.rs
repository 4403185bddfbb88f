//! Review quality ratings and the review audit log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use uuid::Uuid;

/// Self-assessed recall quality for a graded review (SM-2 scale 0-5).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[repr(u8)]
pub enum Quality {
    /// Complete blackout, no memory.
    Blackout = 0,
    /// Incorrect, but remembered after seeing the answer.
    Wrong = 1,
    /// Incorrect, but the answer seemed easy to recall.
    WrongButEasy = 2,
    /// Correct with serious difficulty.
    Hard = 3,
    /// Correct with some hesitation.
    Good = 4,
    /// Perfect response.
    Perfect = 5,
}

impl Quality {
    /// Convert to the raw SM-2 score (0-5).
    pub fn score(self) -> u8 {
        self as u8
    }

    /// Create from a raw score. Returns None for values outside 0..=5.
    pub fn from_score(score: u8) -> Option<Self> {
        match score {
            0 => Some(Quality::Blackout),
            1 => Some(Quality::Wrong),
            2 => Some(Quality::WrongButEasy),
            3 => Some(Quality::Hard),
            4 => Some(Quality::Good),
            5 => Some(Quality::Perfect),
            _ => None,
        }
    }

    /// Whether the rating counts as a successful recall.
    pub fn is_passing(self) -> bool {
        self.score() >= 3
    }

    /// One-line description shown alongside the rating.
    pub fn description(self) -> &'static str {
        match self {
            Quality::Blackout => "Complete blackout, no memory",
            Quality::Wrong => "Incorrect, but remembered after",
            Quality::WrongButEasy => "Incorrect, but seemed easy",
            Quality::Hard => "Correct with serious difficulty",
            Quality::Good => "Correct with some hesitation",
            Quality::Perfect => "Perfect response",
        }
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.score()
    }
}

impl TryFrom<u8> for Quality {
    type Error = ();

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Quality::from_score(value).ok_or(())
    }
}

/// Immutable audit record of one completed graded review.
///
/// Created exactly once per successful review; never mutated or deleted by
/// normal flow. Records for a deleted item are left orphaned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
    /// Record identifier.
    pub id: Uuid,
    /// The reviewed item.
    pub item_id: Uuid,
    /// When the review completed.
    pub reviewed_at: DateTime<Utc>,
    /// Quality rating (0-5).
    pub quality: u8,
    /// Seconds from session start to rating. 0 when not tracked.
    pub response_secs: f64,
}

impl ReviewLog {
    /// Create a new log entry with a fresh identifier.
    pub fn new(
        item_id: Uuid,
        quality: Quality,
        response_secs: f64,
        reviewed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            item_id,
            reviewed_at,
            quality: quality.score(),
            response_secs,
        }
    }
}
