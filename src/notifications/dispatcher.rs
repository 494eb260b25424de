//! Notification dispatch.
//!
//! `Dispatcher::enqueue` hands an event to the collaborator without ever
//! blocking or failing the triggering operation; a delivery failure is
//! logged and never rolls back committed state. The background delivery
//! worker drains the bus into a [`DeliverySink`] - email, push or
//! whatever the deployment plugs in.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::shared::ShutdownSignal;

use super::event_bus::SharedEventBus;
use super::events::{Event, EventMessage};

/// Delivery backend for notification payloads.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    async fn deliver(&self, message: &EventMessage) -> Result<(), String>;
}

/// Sink that only logs. Used when no delivery backend is configured.
pub struct LoggingSink;

#[async_trait]
impl DeliverySink for LoggingSink {
    async fn deliver(&self, message: &EventMessage) -> Result<(), String> {
        info!(
            event_type = message.event.event_type(),
            user_id = ?message.event.user_id(),
            "notification delivered (log sink)"
        );
        Ok(())
    }
}

/// Fire-and-forget enqueue facade over the event bus.
#[derive(Clone)]
pub struct Dispatcher {
    bus: SharedEventBus,
}

impl Dispatcher {
    pub fn new(bus: SharedEventBus) -> Self {
        Self { bus }
    }

    /// Enqueue an event, optionally delayed. Returns immediately.
    pub fn enqueue(&self, event: Event, delay: Duration) {
        if delay.is_zero() {
            self.bus.publish(event);
            return;
        }
        let bus = self.bus.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            bus.publish(event);
        });
    }
}

/// Start the background worker that drains the bus into the sink.
pub fn start_delivery_worker(
    bus: SharedEventBus,
    sink: Arc<dyn DeliverySink>,
    shutdown: ShutdownSignal,
) {
    tokio::spawn(async move {
        let mut subscriber = bus.subscribe();
        info!("🔔 Notification delivery worker started");

        loop {
            tokio::select! {
                message = subscriber.recv() => {
                    let Some(message) = message else { break };
                    if let Err(e) = sink.deliver(&message).await {
                        // delivery is best-effort; the triggering operation
                        // already committed
                        warn!(
                            event_type = message.event.event_type(),
                            error = %e,
                            "notification delivery failed"
                        );
                    }
                }
                _ = shutdown.notified().wait() => {
                    info!("🔔 Notification delivery worker shutting down");
                    break;
                }
            }
        }
    });
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::event_bus::create_event_bus;
    use crate::notifications::events::LotAddedEvent;
    use chrono::Utc;

    fn lot_added() -> Event {
        Event::LotAdded(LotAddedEvent {
            lot_id: 1,
            name: "Central".to_string(),
            capacity: 10,
            timestamp: Utc::now(),
        })
    }

    #[tokio::test]
    async fn immediate_enqueue_publishes() {
        let bus = create_event_bus();
        let mut subscriber = bus.subscribe();
        let dispatcher = Dispatcher::new(bus);

        dispatcher.enqueue(lot_added(), Duration::ZERO);

        let received =
            tokio::time::timeout(Duration::from_millis(100), subscriber.recv())
                .await
                .expect("Timeout")
                .expect("No message");
        assert_eq!(received.event.event_type(), "lot_added");
    }

    #[tokio::test]
    async fn delayed_enqueue_publishes_later() {
        let bus = create_event_bus();
        let mut subscriber = bus.subscribe();
        let dispatcher = Dispatcher::new(bus);

        dispatcher.enqueue(lot_added(), Duration::from_millis(20));

        // nothing yet
        assert!(
            tokio::time::timeout(Duration::from_millis(5), subscriber.recv())
                .await
                .is_err()
        );

        let received =
            tokio::time::timeout(Duration::from_millis(200), subscriber.recv())
                .await
                .expect("Timeout")
                .expect("No message");
        assert_eq!(received.event.event_type(), "lot_added");
    }

    struct FailingSink;

    #[async_trait]
    impl DeliverySink for FailingSink {
        async fn deliver(&self, _message: &EventMessage) -> Result<(), String> {
            Err("smtp down".to_string())
        }
    }

    #[tokio::test]
    async fn delivery_failure_does_not_stop_worker() {
        let bus = create_event_bus();
        let shutdown = ShutdownSignal::new();
        start_delivery_worker(bus.clone(), Arc::new(FailingSink), shutdown.clone());

        // give the worker a beat to subscribe
        tokio::time::sleep(Duration::from_millis(10)).await;
        bus.publish(lot_added());
        bus.publish(lot_added());
        tokio::time::sleep(Duration::from_millis(20)).await;

        // still subscribed after failures
        assert_eq!(bus.subscriber_count(), 1);
        shutdown.trigger();
    }
}
