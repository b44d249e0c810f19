use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::PageEvent;

/// In-process event bus backed by `tokio::broadcast`.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<PageEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Publish an event to all current subscribers. Having no subscribers
    /// is not an error worth surfacing to mutation paths.
    pub fn publish(&self, event: PageEvent) {
        let _ = self.sender.send(event);
    }

    /// Subscribe to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<PageEvent> {
        self.sender.subscribe()
    }

    /// Number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(PageEvent::Welcome);

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, PageEvent::Welcome));
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        assert_eq!(bus.subscriber_count(), 2);

        let event = PageEvent::Deleted(super::super::types::DeletedEvent {
            page_name: "home".to_string(),
            timestamp: chrono::Utc::now(),
        });
        bus.publish(event);

        assert!(matches!(rx1.recv().await.unwrap(), PageEvent::Deleted(_)));
        assert!(matches!(rx2.recv().await.unwrap(), PageEvent::Deleted(_)));
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_fine() {
        let bus = EventBus::new(16);
        bus.publish(PageEvent::Welcome);
    }
}
