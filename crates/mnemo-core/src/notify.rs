//! Reminder scheduling seam.
//!
//! The engine only decides *when* a reminder should fire; delivery belongs
//! to whatever shell embeds the crate. [`NullNotifier`] is the default
//! stand-in for headless use and tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{MnemoError, MnemoResult};

/// Delivery backend for review reminders.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Ask the platform for permission to notify. Returns whether it was
    /// granted.
    async fn request_authorization(&self) -> MnemoResult<bool>;

    /// Schedule a repeating reminder at the given local wall-clock time.
    async fn schedule_daily_reminder(&self, hour: u8, minute: u8) -> MnemoResult<()>;

    /// Schedule a one-shot reminder about `item_count` items due at `at`.
    async fn schedule_review_reminder(&self, at: DateTime<Utc>, item_count: u32)
        -> MnemoResult<()>;

    /// Drop every pending reminder.
    async fn cancel_all(&self) -> MnemoResult<()>;
}

/// No-op backend: grants authorization and swallows every schedule call,
/// still validating inputs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn request_authorization(&self) -> MnemoResult<bool> {
        Ok(true)
    }

    async fn schedule_daily_reminder(&self, hour: u8, minute: u8) -> MnemoResult<()> {
        if hour > 23 || minute > 59 {
            return Err(MnemoError::invalid_argument(format!(
                "invalid reminder time {:02}:{:02}",
                hour, minute
            )));
        }
        tracing::debug!(hour, minute, "daily reminder discarded");
        Ok(())
    }

    async fn schedule_review_reminder(
        &self,
        at: DateTime<Utc>,
        item_count: u32,
    ) -> MnemoResult<()> {
        tracing::debug!(%at, item_count, "review reminder discarded");
        Ok(())
    }

    async fn cancel_all(&self) -> MnemoResult<()> {
        Ok(())
    }
}
