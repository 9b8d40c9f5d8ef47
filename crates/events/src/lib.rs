//! `storefront-events` — event abstractions shared by domain and infra.
//!
//! Events are immutable facts: versioned for schema evolution and designed to
//! be append-only. The bus here is distribution only; the event store is the
//! source of truth.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::InMemoryEventBus;
