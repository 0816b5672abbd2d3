//! The in-process feed that announces changes to the transaction data.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// How many unconsumed events a subscriber may fall behind before it starts
/// missing events. Subscribers treat a missed event the same as any other
/// change, so a small buffer is enough.
const CHANGE_FEED_CAPACITY: usize = 16;

/// A change to the transaction data.
///
/// Subscribers do not get told what changed, only that something did, and are
/// expected to refetch whatever they display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeEvent {
    /// A transaction was added.
    Inserted,
    /// A transaction was modified.
    Updated,
    /// A transaction was removed.
    Deleted,
}

impl ChangeEvent {
    /// The string sent over the wire for this event.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeEvent::Inserted => "inserted",
            ChangeEvent::Updated => "updated",
            ChangeEvent::Deleted => "deleted",
        }
    }
}

/// Broadcasts [ChangeEvent]s to all current subscribers.
///
/// Cloning the feed is cheap, all clones publish to the same subscribers.
/// Publishing when nobody is listening is fine, the event is simply dropped.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    sender: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    /// Create a new feed with no subscribers.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANGE_FEED_CAPACITY);

        Self { sender }
    }

    /// Announce a change to all current subscribers.
    pub fn publish(&self, event: ChangeEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to changes published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.sender.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}
