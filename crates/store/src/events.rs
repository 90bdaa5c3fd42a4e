//! Change notifications for views that prefer push over polling.

use aries_domain::ServiceId;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::trace;

/// Broadcast channel capacity for store events.
const CHANNEL_CAPACITY: usize = 64;

/// Emitted after the store state actually changed. Serialized with a `type`
/// tag so it can be relayed to other processes unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    ServicesReplaced { count: usize },
    ServiceUpdated { id: ServiceId, index: usize },
    ServiceAdded { index: usize },
    ErrorChanged { message: Option<String> },
    LoadingChanged { loading: bool },
}

pub(crate) struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub(crate) fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub(crate) fn publish(&self, event: StoreEvent) {
        if self.sender.receiver_count() > 0 {
            trace!(?event, "publishing store event");
            let _ = self.sender.send(event);
        }
    }

    pub(crate) fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.sender.subscribe()
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialize_with_type_tag() {
        let updated = StoreEvent::ServiceUpdated {
            id: ServiceId::Number(2),
            index: 0,
        };
        assert_eq!(
            serde_json::to_value(&updated).unwrap(),
            json!({"type": "service_updated", "id": 2, "index": 0})
        );

        let cleared = StoreEvent::ErrorChanged { message: None };
        assert_eq!(
            serde_json::to_value(&cleared).unwrap(),
            json!({"type": "error_changed", "message": null})
        );
    }

    #[test]
    fn publish_without_subscribers_is_silent() {
        let bus = EventBus::new();
        bus.publish(StoreEvent::LoadingChanged { loading: true });
        assert_eq!(bus.subscriber_count(), 0);

        let mut receiver = bus.subscribe();
        bus.publish(StoreEvent::LoadingChanged { loading: false });
        assert_eq!(
            receiver.try_recv().unwrap(),
            StoreEvent::LoadingChanged { loading: false }
        );
    }
}
