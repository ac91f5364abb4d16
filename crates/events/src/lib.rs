//! `medtrack-events` — domain-event mechanics (no business rules).
//!
//! Events here are **notifications between aggregates**, not a source of
//! truth: each aggregate commits its own state first, then publishes. The
//! bus provides at-least-once-intended delivery; consumers must tolerate
//! redelivery.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod user;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use user::UserScoped;
