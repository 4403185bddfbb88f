//! Free practice over flip cards.
//!
//! Practice never touches scheduling state: no item writes, no review log
//! entries. The session holds no write path at all; it only reads the feed.

use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use strum::{Display, EnumIter};
use uuid::Uuid;

use crate::config::PracticeConfig;
use crate::error::MnemoResult;
use crate::repository::{FeedSubscription, Repository};
use crate::types::StudyItem;

/// Which items make up the practice deck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum PracticeMode {
    /// Every item in the collection.
    All,
    /// Items currently due.
    DueOnly,
    /// A random sample capped by `sample_size`.
    RandomSample,
    /// Items whose ease factor is at or below the difficulty threshold.
    Difficult,
}

/// A flip-card practice run over a deck derived from the live feed.
pub struct PracticeSession {
    subscription: FeedSubscription,
    all_items: Vec<StudyItem>,
    deck: Vec<StudyItem>,
    cursor: usize,
    flipped: bool,
    mode: PracticeMode,
    shuffle: bool,
    config: PracticeConfig,
}

impl PracticeSession {
    /// Subscribe to the feed and build the initial deck.
    pub async fn open(
        repo: &Repository,
        config: PracticeConfig,
        mode: PracticeMode,
        shuffle: bool,
        now: DateTime<Utc>,
    ) -> MnemoResult<Self> {
        let mut subscription = repo.subscribe().await?;
        let all_items = subscription.recv().await.unwrap_or_default();

        let mut session = Self {
            subscription,
            all_items,
            deck: Vec::new(),
            cursor: 0,
            flipped: false,
            mode,
            shuffle,
            config,
        };
        session.rebuild_deck(now);
        Ok(session)
    }

    /// Fold in any pending feed emissions.
    ///
    /// Cards keep their position in the deck: retained items are refreshed
    /// in place, vanished ones drop out, and newly matching items join at
    /// the end. A random-sample deck is never re-sampled here; it only
    /// shrinks as sampled items disappear. The cursor clamps into range and
    /// the flip resets.
    pub fn sync(&mut self, now: DateTime<Utc>) {
        let Some(items) = self.subscription.latest() else {
            return;
        };
        self.all_items = items;

        let mut deck: Vec<StudyItem> = self
            .deck
            .iter()
            .filter_map(|card| {
                self.all_items
                    .iter()
                    .find(|item| item.id == card.id)
                    .cloned()
            })
            .collect();

        if self.mode != PracticeMode::RandomSample {
            let held: Vec<Uuid> = deck.iter().map(|c| c.id).collect();
            let mut fresh: Vec<StudyItem> = self
                .all_items
                .iter()
                .filter(|item| self.matches_mode(item, now) && !held.contains(&item.id))
                .cloned()
                .collect();
            if self.shuffle {
                fresh.shuffle(&mut rand::thread_rng());
            }
            deck.extend(fresh);
            deck.retain(|item| self.matches_mode(item, now));
        }

        self.deck = deck;
        self.cursor = self.cursor.min(self.deck.len().saturating_sub(1));
        self.flipped = false;
    }

    /// The card currently facing the user.
    pub fn current_card(&self) -> Option<&StudyItem> {
        self.deck.get(self.cursor)
    }

    pub fn mode(&self) -> PracticeMode {
        self.mode
    }

    pub fn deck_size(&self) -> usize {
        self.deck.len()
    }

    pub fn position(&self) -> usize {
        self.cursor
    }

    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    /// Fraction of the deck already passed, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.deck.is_empty() {
            0.0
        } else {
            self.cursor as f64 / self.deck.len() as f64
        }
    }

    /// Toggle between question and answer face.
    pub fn flip(&mut self) {
        if !self.deck.is_empty() {
            self.flipped = !self.flipped;
        }
    }

    /// Advance to the next card, question face up. Stops at the last card.
    pub fn next_card(&mut self) {
        if self.cursor + 1 < self.deck.len() {
            self.cursor += 1;
            self.flipped = false;
        }
    }

    /// Step back to the previous card, question face up.
    pub fn previous_card(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            self.flipped = false;
        }
    }

    /// Self-assessment shortcut: either verdict just moves on. Nothing is
    /// recorded anywhere.
    pub fn mark_known(&mut self) {
        self.flipped = false;
        self.next_card();
    }

    /// See [`PracticeSession::mark_known`].
    pub fn mark_needs_work(&mut self) {
        self.flipped = false;
        self.next_card();
    }

    /// Rebuild the deck in a new order, re-sampling in random mode.
    pub fn reshuffle(&mut self, now: DateTime<Utc>) {
        self.shuffle = true;
        self.rebuild_deck(now);
    }

    /// Switch deck mode and rebuild from the latest known items.
    pub fn set_mode(&mut self, mode: PracticeMode, now: DateTime<Utc>) {
        self.mode = mode;
        self.rebuild_deck(now);
    }

    /// Return to the first card without rebuilding the deck.
    pub fn restart(&mut self) {
        self.cursor = 0;
        self.flipped = false;
    }

    fn matches_mode(&self, item: &StudyItem, now: DateTime<Utc>) -> bool {
        match self.mode {
            PracticeMode::All | PracticeMode::RandomSample => true,
            PracticeMode::DueOnly => item.is_due(now),
            PracticeMode::Difficult => item.ease_factor < self.config.difficult_threshold,
        }
    }

    fn rebuild_deck(&mut self, now: DateTime<Utc>) {
        let mut deck: Vec<StudyItem> = self
            .all_items
            .iter()
            .filter(|item| self.matches_mode(item, now))
            .cloned()
            .collect();

        if self.mode == PracticeMode::RandomSample {
            deck.shuffle(&mut rand::thread_rng());
            deck.truncate(self.config.sample_size);
        } else if self.shuffle {
            deck.shuffle(&mut rand::thread_rng());
        }

        self.deck = deck;
        self.cursor = 0;
        self.flipped = false;
    }
}
