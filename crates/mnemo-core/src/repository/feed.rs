//! Live item feed using a tokio broadcast channel.
//!
//! Every committed mutation re-broadcasts the *full current item set* to all
//! active subscribers - a whole-snapshot design with no delta ordering to
//! get wrong. Slow subscribers skip to newer snapshots rather than blocking
//! the writer.

use tokio::sync::broadcast;

use crate::types::StudyItem;

/// Default channel capacity.
const DEFAULT_CAPACITY: usize = 64;

/// Fan-out channel for full item-set snapshots.
///
/// Emissions are fire-and-forget; with no subscribers a snapshot is simply
/// dropped.
pub struct ItemFeed {
    sender: broadcast::Sender<Vec<StudyItem>>,
}

impl ItemFeed {
    /// Create a new feed with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Create a new feed with a custom capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Open a bare receiver slot, without a replay snapshot.
    ///
    /// Emissions start queueing immediately. Used to reserve the slot
    /// *before* reading the current set, so a write landing in between is
    /// queued behind the replay instead of lost.
    pub fn register(&self) -> broadcast::Receiver<Vec<StudyItem>> {
        self.sender.subscribe()
    }

    /// Subscribe, replaying `current` as the subscription's first emission.
    ///
    /// Later emissions arrive in commit order. Dropping the subscription
    /// cancels it without affecting other subscribers or pending writes.
    pub fn subscribe_with(&self, current: Vec<StudyItem>) -> FeedSubscription {
        FeedSubscription::replaying(current, self.sender.subscribe())
    }

    /// Emit a snapshot to all subscribers.
    pub fn emit(&self, items: Vec<StudyItem>) {
        let _ = self.sender.send(items);
    }

    /// Number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for ItemFeed {
    fn default() -> Self {
        Self::new()
    }
}

/// One subscriber's view of the item feed.
pub struct FeedSubscription {
    initial: Option<Vec<StudyItem>>,
    receiver: broadcast::Receiver<Vec<StudyItem>>,
}

impl FeedSubscription {
    /// Build a subscription over an already-registered receiver, replaying
    /// `initial` first. Emissions queued on the receiver before this call
    /// are delivered after the replay, oldest first.
    pub fn replaying(
        initial: Vec<StudyItem>,
        receiver: broadcast::Receiver<Vec<StudyItem>>,
    ) -> Self {
        Self {
            initial: Some(initial),
            receiver,
        }
    }

    /// Receive the next snapshot.
    ///
    /// The first call returns the set replayed at subscribe time. Returns
    /// None once the feed is gone. A lagged subscriber skips missed
    /// snapshots and picks up the freshest one.
    pub async fn recv(&mut self) -> Option<Vec<StudyItem>> {
        if let Some(items) = self.initial.take() {
            return Some(items);
        }
        loop {
            match self.receiver.recv().await {
                Ok(items) => return Some(items),
                Err(broadcast::error::RecvError::Closed) => return None,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Feed subscriber lagged by {} snapshots", n);
                    continue;
                }
            }
        }
    }

    /// Receive a pending snapshot without blocking.
    pub fn try_recv(&mut self) -> Option<Vec<StudyItem>> {
        if let Some(items) = self.initial.take() {
            return Some(items);
        }
        loop {
            match self.receiver.try_recv() {
                Ok(items) => return Some(items),
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    tracing::warn!("Feed subscriber lagged by {} snapshots", n);
                    continue;
                }
                Err(_) => return None,
            }
        }
    }

    /// Drain all pending snapshots, returning the freshest one if any.
    pub fn latest(&mut self) -> Option<Vec<StudyItem>> {
        let mut latest = None;
        while let Some(items) = self.try_recv() {
            latest = Some(items);
        }
        latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(title: &str) -> StudyItem {
        StudyItem::new(title, "body", Utc::now())
    }

    #[tokio::test]
    async fn test_subscribe_replays_current_set() {
        let feed = ItemFeed::new();
        let mut sub = feed.subscribe_with(vec![item("a"), item("b")]);

        let first = sub.recv().await.unwrap();
        assert_eq!(first.len(), 2);
    }

    #[tokio::test]
    async fn test_emission_reaches_all_subscribers() {
        let feed = ItemFeed::new();
        let mut sub1 = feed.subscribe_with(vec![]);
        let mut sub2 = feed.subscribe_with(vec![]);

        assert!(sub1.recv().await.unwrap().is_empty());
        assert!(sub2.recv().await.unwrap().is_empty());

        feed.emit(vec![item("a")]);
        assert_eq!(sub1.recv().await.unwrap().len(), 1);
        assert_eq!(sub2.recv().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_drop_does_not_affect_others() {
        let feed = ItemFeed::new();
        let sub1 = feed.subscribe_with(vec![]);
        let mut sub2 = feed.subscribe_with(vec![]);
        assert_eq!(feed.subscriber_count(), 2);

        drop(sub1);
        assert_eq!(feed.subscriber_count(), 1);

        feed.emit(vec![item("a")]);
        sub2.try_recv(); // initial
        assert_eq!(sub2.try_recv().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_latest_drains_to_freshest() {
        let feed = ItemFeed::new();
        let mut sub = feed.subscribe_with(vec![]);

        feed.emit(vec![item("a")]);
        feed.emit(vec![item("a"), item("b")]);

        let freshest = sub.latest().unwrap();
        assert_eq!(freshest.len(), 2);
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_emission_between_register_and_replay_is_not_lost() {
        let feed = ItemFeed::new();

        // Receiver registered first; a write lands before the snapshot
        // read completes.
        let receiver = feed.register();
        feed.emit(vec![item("a")]);

        // The replay snapshot predates the write.
        let mut sub = FeedSubscription::replaying(vec![], receiver);
        assert!(sub.recv().await.unwrap().is_empty());
        // The write queued behind the replay and still arrives.
        assert_eq!(sub.recv().await.unwrap().len(), 1);
    }

    #[test]
    fn test_emit_without_subscribers_does_not_panic() {
        let feed = ItemFeed::new();
        feed.emit(vec![item("a")]);
    }
}
