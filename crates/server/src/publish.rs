//! Pub/sub fan-out.
//!
//! Mutations call [`publish`]; [`PubSub`] routes each event to the broadcast
//! channel for its topic (`CHANNEL.entityId`). Delivery is best effort: a
//! topic nobody listens to drops the event, and slow receivers may lag.

use std::sync::Arc;

use api_types::{Channel, EventType, PublishEvent, PublishOptions, SubscriptionPayload};
use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::trace;

pub const DEFAULT_TOPIC_CAPACITY: usize = 256;

pub trait Publisher: Send + Sync {
    fn publish(&self, event: PublishEvent);
}

/// Build and send one event.
pub fn publish(
    publisher: &dyn Publisher,
    channel: Channel,
    entity_id: &str,
    event_type: EventType,
    payload: SubscriptionPayload,
    options: PublishOptions,
) {
    publisher.publish(PublishEvent {
        channel,
        entity_id: entity_id.to_string(),
        event_type,
        payload,
        options,
    });
}

#[derive(Debug)]
pub struct PubSub {
    topics: DashMap<String, broadcast::Sender<Arc<PublishEvent>>>,
    capacity: usize,
}

impl Default for PubSub {
    fn default() -> Self {
        Self::new(DEFAULT_TOPIC_CAPACITY)
    }
}

impl PubSub {
    pub fn new(capacity: usize) -> Self {
        Self {
            topics: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn subscribe(&self, topic: &str) -> broadcast::Receiver<Arc<PublishEvent>> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.topics
            .get(topic)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }

    /// Drop topics whose last receiver has gone away.
    pub fn prune(&self) {
        self.topics.retain(|_, sender| sender.receiver_count() > 0);
    }
}

impl Publisher for PubSub {
    fn publish(&self, event: PublishEvent) {
        let topic = event.topic();
        match self.topics.get(&topic) {
            Some(sender) => {
                let delivered = sender.send(Arc::new(event)).unwrap_or(0);
                trace!(%topic, delivered, "published event");
            }
            None => trace!(%topic, "no subscribers for topic"),
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// Publisher that keeps every event for later assertions.
    #[derive(Debug, Default)]
    pub struct RecordingPublisher {
        events: Mutex<Vec<PublishEvent>>,
    }

    impl RecordingPublisher {
        pub fn events(&self) -> Vec<PublishEvent> {
            self.events.lock().unwrap().clone()
        }
    }

    impl Publisher for RecordingPublisher {
        fn publish(&self, event: PublishEvent) {
            self.events.lock().unwrap().push(event);
        }
    }
}
