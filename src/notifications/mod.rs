//! Structured notification events, the broadcast bus and the dispatch
//! worker that hands payloads to the delivery collaborator.

pub mod dispatcher;
pub mod event_bus;
pub mod events;

pub use dispatcher::{start_delivery_worker, DeliverySink, Dispatcher, LoggingSink};
pub use event_bus::{create_event_bus, EventBus, EventSubscriber, SharedEventBus};
pub use events::{Event, EventMessage};
