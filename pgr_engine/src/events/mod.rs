//! Payment events and the hooks that subscribe to them.
//!
//! This is the engine's notification channel. The APIs publish events after a financial state change has been
//! committed, and subscribers (receipts, analytics, fulfilment systems) react on their own tasks.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::*;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
