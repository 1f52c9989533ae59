//! In-process broadcast hubs for event fan-out.
//!
//! Each hub owns the live subscriber set for one logical channel and fans
//! a serialized event out to every subscriber. There is no per-subscriber
//! queueing inside the hub beyond the transport channel and no replay: a
//! subscriber that is not connected when an event is published misses it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::{mpsc, Mutex};

/// Fan-out hub for one broadcast channel.
///
/// The subscriber set is mutated by both the subscribe path and the
/// publish path (pruning of dead subscribers), so it lives behind a lock.
pub struct BroadcastHub {
    channel: String,
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<u64, mpsc::UnboundedSender<String>>>,
}

/// One subscriber's end of a hub channel.
///
/// Frames arrive pre-serialized. Dropping the receiver (or the whole
/// subscription) causes the hub to prune the subscriber on its next
/// publish.
pub struct Subscription {
    pub id: u64,
    pub receiver: mpsc::UnboundedReceiver<String>,
}

impl BroadcastHub {
    /// Create a hub for the named channel.
    #[must_use]
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Channel name.
    #[must_use]
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Attach a new subscriber and return its end of the channel.
    pub async fn subscribe(&self) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, receiver) = mpsc::unbounded_channel();

        self.subscribers.lock().await.insert(id, tx);
        tracing::debug!(channel = %self.channel, subscriber = id, "subscriber attached");

        Subscription { id, receiver }
    }

    /// Detach a subscriber explicitly (e.g. when its connection closes).
    pub async fn unsubscribe(&self, id: u64) {
        if self.subscribers.lock().await.remove(&id).is_some() {
            tracing::debug!(channel = %self.channel, subscriber = id, "subscriber detached");
        }
    }

    /// Number of currently attached subscribers.
    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }

    /// Serialize the event once and deliver it to every subscriber.
    ///
    /// Subscribers whose transport is gone are removed from the set
    /// without affecting delivery to the others. Returns the number of
    /// subscribers the event was delivered to.
    pub async fn publish<E: Serialize>(&self, event: &E) -> usize {
        let frame = match serde_json::to_string(event) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::error!(channel = %self.channel, error = %e, "event serialization failed");
                return 0;
            }
        };

        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|id, tx| {
            if tx.send(frame.clone()).is_ok() {
                true
            } else {
                tracing::debug!(channel = %self.channel, subscriber = *id, "dropping dead subscriber");
                false
            }
        });
        subscribers.len()
    }
}
