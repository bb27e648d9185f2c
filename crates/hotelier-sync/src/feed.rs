//! # Change Feed
//!
//! Subscribe/unsubscribe abstraction over a push-based source of
//! [`FeedMessage`]s. The store layer consumes it; billing and occupancy never
//! see it.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DatabaseSource / remote listener                                      │
//! │       │  publish(FeedMessage)                                           │
//! │       ▼                                                                 │
//! │  BroadcastFeed ── tokio::sync::broadcast (bounded) ──┐                 │
//! │                                                      │                  │
//! │       subscribe(hotel_id) ──► Subscription ◄─────────┘                  │
//! │                                  │                                      │
//! │                                  ├── Message(msg)  for this hotel only  │
//! │                                  ├── Lagged(n)     buffer overrun       │
//! │                                  └── None          feed closed          │
//! │                                                                         │
//! │  Dropping the Subscription (or calling unsubscribe) detaches it.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};
use crate::protocol::FeedMessage;

/// What a subscriber receives.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    Message(FeedMessage),
    /// `n` messages were dropped; the subscriber's view is stale until it
    /// receives fresh snapshots.
    Lagged(u64),
}

/// A source of change feed subscriptions.
pub trait ChangeFeed: Send + Sync {
    /// Starts receiving messages for one hotel. Only messages published after
    /// this call are delivered.
    fn subscribe(&self, hotel_id: &str) -> Subscription;
}

// =============================================================================
// Subscription
// =============================================================================

/// A live subscription to one hotel's messages.
#[derive(Debug)]
pub struct Subscription {
    hotel_id: String,
    rx: broadcast::Receiver<FeedMessage>,
}

impl Subscription {
    pub fn new(hotel_id: impl Into<String>, rx: broadcast::Receiver<FeedMessage>) -> Self {
        Subscription {
            hotel_id: hotel_id.into(),
            rx,
        }
    }

    pub fn hotel_id(&self) -> &str {
        &self.hotel_id
    }

    /// Waits for the next event. Returns `None` once the feed is closed.
    pub async fn next(&mut self) -> Option<FeedEvent> {
        loop {
            match self.rx.recv().await {
                Ok(msg) if msg.hotel_id() == self.hotel_id => {
                    return Some(FeedEvent::Message(msg));
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(hotel_id = %self.hotel_id, skipped = n, "Feed subscriber lagged");
                    return Some(FeedEvent::Lagged(n));
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(hotel_id = %self.hotel_id, "Feed closed");
                    return None;
                }
            }
        }
    }

    /// Detaches from the feed.
    pub fn unsubscribe(self) {
        debug!(hotel_id = %self.hotel_id, "Unsubscribed from feed");
    }

    /// Turns the subscription into a `Stream` of events.
    pub fn into_stream(self) -> impl Stream<Item = FeedEvent> {
        let hotel_id = self.hotel_id;
        BroadcastStream::new(self.rx).filter_map(move |item| match item {
            Ok(msg) if msg.hotel_id() == hotel_id => Some(FeedEvent::Message(msg)),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(n)) => Some(FeedEvent::Lagged(n)),
        })
    }
}

// =============================================================================
// In-process Feed
// =============================================================================

/// In-process feed on a bounded broadcast channel. Cheap to clone.
#[derive(Debug, Clone)]
pub struct BroadcastFeed {
    tx: broadcast::Sender<FeedMessage>,
}

impl BroadcastFeed {
    /// Creates a feed buffering `capacity` messages per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        BroadcastFeed { tx }
    }

    /// Publishes a message to every current subscriber.
    ///
    /// Returns the number of subscribers reached; `ChannelError` when there
    /// are none.
    pub fn publish(&self, msg: FeedMessage) -> SyncResult<usize> {
        debug!(
            hotel_id = %msg.hotel_id(),
            message_type = msg.message_type(),
            "Publishing feed message"
        );
        self.tx
            .send(msg)
            .map_err(|_| SyncError::ChannelError("No feed subscribers".into()))
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for BroadcastFeed {
    fn default() -> Self {
        BroadcastFeed::new(256)
    }
}

impl ChangeFeed for BroadcastFeed {
    fn subscribe(&self, hotel_id: &str) -> Subscription {
        Subscription::new(hotel_id, self.tx.subscribe())
    }
}
