//! Event dispatch for domain and coordinator events.
//!
//! Aggregates queue [`DomainEvent`](crate::messages::DomainEvent)s; actions and
//! the context coordinator convert them to [`BusMessage`]s and hand them to an
//! [`EventBus`]. The bus is an ordinary value owned by the application or
//! session, never a process-wide global.
//!
//! # Quick Start
//!
//! ```rust
//! use tenantry::events::ListenerRegistry;
//! use tenantry::events::listeners::LoggingListener;
//!
//! let mut registry = ListenerRegistry::new();
//! registry.listen(LoggingListener::new());
//!
//! // pass `registry` (or an `Arc` of it) wherever an `EventBus` is expected
//! ```
//!
//! # Custom Listeners
//!
//! ```rust,ignore
//! use tenantry::events::{BusMessage, Listener};
//! use async_trait::async_trait;
//!
//! struct AuditListener;
//!
//! #[async_trait]
//! impl Listener for AuditListener {
//!     async fn handle(&self, message: &BusMessage) {
//!         if message.event_type.ends_with(".failed") {
//!             // page someone
//!         }
//!     }
//! }
//! ```

mod bus;
mod listener;
mod registry;

pub mod listeners;

#[cfg(any(test, feature = "mocks"))]
mod recording;

pub use bus::{BusMessage, EventBus, EventScope};
pub use listener::Listener;
#[cfg(any(test, feature = "mocks"))]
pub use recording::RecordingEventBus;
pub use registry::ListenerRegistry;
