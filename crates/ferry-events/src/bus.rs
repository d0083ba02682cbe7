//! Broadcast hook for observing agent activity.
//!
//! Publishing never blocks and never fails. A subscriber that falls more than
//! [`DEFAULT_CHANNEL_CAPACITY`] events behind skips ahead to the oldest event
//! still buffered. Subscribers only see events published after they subscribe.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tokio::sync::broadcast::{self, Receiver, Sender, error::RecvError, error::TryRecvError};

use crate::payloads::{DEFAULT_CHANNEL_CAPACITY, Event, EventEnvelope, EventId};

/// Shared event bus built on top of `tokio::broadcast`.
#[derive(Clone)]
pub struct EventBus {
    sender: Sender<EventEnvelope>,
    next_id: Arc<AtomicU64>,
}

impl EventBus {
    /// Construct a bus buffering up to [`DEFAULT_CHANNEL_CAPACITY`] events per subscriber.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_CHANNEL_CAPACITY);
        Self {
            sender,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Publish a new event, assigning it a sequential identifier.
    ///
    /// Having no subscribers is not an error.
    pub fn publish(&self, event: Event) -> EventId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let _ = self.sender.send(EventEnvelope {
            id,
            timestamp: Utc::now(),
            event,
        });
        id
    }

    /// Subscribe to events published from now on.
    #[must_use]
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            receiver: self.sender.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half of an [`EventBus`] subscription.
pub struct EventStream {
    receiver: Receiver<EventEnvelope>,
}

impl EventStream {
    /// Receive the next event. Returns `None` once every bus handle is dropped.
    pub async fn next(&mut self) -> Option<EventEnvelope> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Return the next event if one is immediately available.
    pub fn try_next(&mut self) -> Option<EventEnvelope> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(_)) => {}
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::time::Duration;
    use tokio::task;
    use tokio::time::timeout;

    const PUBLISH_TIMEOUT: Duration = Duration::from_secs(1);

    fn dropped(id: usize) -> Event {
        Event::NotificationDropped {
            path: format!("/in/file-{id}.csv"),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_sequential_ids() {
        let bus = EventBus::new();
        let mut stream = bus.subscribe();

        let ids: Vec<_> = (0..3).map(|i| bus.publish(dropped(i))).collect();
        assert_eq!(ids, vec![1, 2, 3]);

        let mut received = Vec::new();
        for _ in 0..3 {
            if let Some(envelope) = stream.next().await {
                received.push(envelope.id);
            }
        }
        assert_eq!(received, ids);
    }

    #[test]
    fn events_before_subscribing_are_not_delivered() {
        let bus = EventBus::new();
        assert_eq!(bus.publish(dropped(0)), 1);

        let mut stream = bus.subscribe();
        assert!(stream.try_next().is_none());

        bus.publish(dropped(1));
        let envelope = stream.try_next().map(|envelope| (envelope.id, envelope.event));
        assert_eq!(envelope, Some((2, dropped(1))));
    }

    #[test]
    fn lagging_subscriber_skips_to_oldest_buffered_event() {
        let bus = EventBus::new();
        let mut stream = bus.subscribe();
        let overflow = 10;
        for i in 0..DEFAULT_CHANNEL_CAPACITY + overflow {
            bus.publish(dropped(i));
        }

        let first = stream.try_next().map(|envelope| envelope.id);
        assert_eq!(first, Some(overflow as u64 + 1));
        let rest = std::iter::from_fn(|| stream.try_next()).count();
        assert_eq!(rest, DEFAULT_CHANNEL_CAPACITY - 1);
    }

    #[tokio::test]
    async fn stream_ends_when_bus_is_dropped() {
        let bus = EventBus::new();
        let mut stream = bus.subscribe();
        bus.publish(dropped(0));
        drop(bus);

        assert_eq!(stream.next().await.map(|envelope| envelope.id), Some(1));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn load_test_does_not_stall_publishers() {
        let bus = Arc::new(EventBus::new());
        let mut stream = bus.subscribe();

        let publisher = {
            let bus = bus.clone();
            task::spawn(async move {
                for i in 0..500 {
                    let publish_bus = bus.clone();
                    timeout(PUBLISH_TIMEOUT, async move {
                        publish_bus.publish(dropped(i));
                    })
                    .await
                    .expect("publish timed out");
                }
            })
        };

        let consumer = task::spawn(async move {
            let mut ids = HashSet::new();
            while ids.len() < 500 {
                if let Some(event) = stream.next().await {
                    ids.insert(event.id);
                }
            }
            ids
        });

        publisher.await.expect("publisher task panicked");
        let ids = consumer.await.expect("consumer task panicked");
        assert_eq!(ids.len(), 500);
    }
}
