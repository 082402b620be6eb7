//! Broadcast event bus with explicit subscriptions.

use garden_rs_protocol::GardenEvent;
use log::{debug, warn};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Default number of buffered events per subscriber.
pub const DEFAULT_EVENT_BUFFER: usize = 256;

/// Broadcast-backed bus carrying [`GardenEvent`]s.
#[derive(Clone, Debug)]
pub struct EventBus {
    sender: broadcast::Sender<GardenEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER)
    }
}

impl EventBus {
    /// Create a new event bus with the given channel buffer size.
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer.max(1));
        debug!("garden event bus initialized (buffer={})", buffer);
        Self { sender }
    }

    /// Publish an event to every live subscription.
    pub fn emit(&self, event: GardenEvent) {
        let _ = self.sender.send(event);
    }

    /// Open a subscription that receives events emitted from now on.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            receiver: Some(self.sender.subscribe()),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// A live registration on an [`EventBus`].
///
/// Dropping the subscription unsubscribes it.
#[derive(Debug)]
pub struct Subscription {
    receiver: Option<broadcast::Receiver<GardenEvent>>,
}

impl Subscription {
    /// Wait for the next event.
    ///
    /// Returns `None` once unsubscribed or when the bus is gone. Events
    /// missed because the subscriber fell behind are skipped.
    pub async fn recv(&mut self) -> Option<GardenEvent> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(missed)) => {
                    warn!("event subscription lagged (missed={missed})");
                }
                Err(RecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Take the next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<GardenEvent> {
        loop {
            let receiver = self.receiver.as_mut()?;
            match receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(missed)) => {
                    warn!("event subscription lagged (missed={missed})");
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Closed) => {
                    self.receiver = None;
                    return None;
                }
            }
        }
    }

    /// Stop receiving events. Further calls to `recv` return `None`.
    pub fn unsubscribe(&mut self) {
        if self.receiver.take().is_some() {
            debug!("event subscription closed");
        }
    }

    pub fn is_active(&self) -> bool {
        self.receiver.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use garden_rs_protocol::GardenAction;

    fn failed(message: &str) -> GardenEvent {
        GardenEvent::Failed {
            action: GardenAction::Load,
            message: message.to_string(),
        }
    }

    #[tokio::test]
    async fn delivers_to_every_subscriber() {
        let bus = EventBus::new(8);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        bus.emit(failed("a"));

        assert!(matches!(first.recv().await, Some(GardenEvent::Failed { message, .. }) if message == "a"));
        assert!(matches!(second.try_recv(), Some(GardenEvent::Failed { .. })));
        assert!(second.try_recv().is_none());
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let bus = EventBus::new(8);
        let mut subscription = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        subscription.unsubscribe();
        assert!(!subscription.is_active());
        assert_eq!(bus.subscriber_count(), 0);
        bus.emit(failed("ignored"));
        assert!(subscription.recv().await.is_none());
    }

    #[test]
    fn drop_unsubscribes() {
        let bus = EventBus::new(8);
        {
            let _subscription = bus.subscribe();
            assert_eq!(bus.subscriber_count(), 1);
        }
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn lagging_subscriber_skips_to_newest() {
        let bus = EventBus::new(2);
        let mut subscription = bus.subscribe();
        for message in ["1", "2", "3", "4"] {
            bus.emit(failed(message));
        }
        let mut seen = Vec::new();
        while let Some(GardenEvent::Failed { message, .. }) = subscription.try_recv() {
            seen.push(message);
        }
        assert_eq!(seen, vec!["3".to_string(), "4".to_string()]);
    }
}
