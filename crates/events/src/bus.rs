//! Event publishing/subscription abstraction (mechanics only).
//!
//! This module provides the **event bus pattern** - a pub/sub mechanism for
//! distributing events to multiple consumers (the inventory reconciler,
//! cascade cleanup, notification layers, etc.).
//!
//! ## Design Philosophy
//!
//! The event bus is intentionally **lightweight** and makes minimal assumptions:
//!
//! - **Transport-agnostic**: Works with in-memory channels, message queues, etc.
//! - **At-least-once delivery**: Events may be delivered multiple times; consumers
//!   must tolerate duplicates
//! - **No persistence**: The bus is for distribution, not storage; each aggregate's
//!   own store is the source of truth
//!
//! ## Publish After Commit
//!
//! Publishers commit their state change first, then publish. Consumers must not
//! assume synchronous delivery within the publisher's transaction: a completed
//! intake and the matching inventory subtraction are **two separate transactions**
//! linked only by the bus. If publication fails the committed state stands and the
//! event can be republished, which is why consumers must be idempotent or tolerant
//! of redelivery.

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to an event stream.
///
/// Each subscription gets a copy of all events published to the bus
/// (broadcast semantics).
///
/// ## Usage Pattern
///
/// ```ignore
/// let bus: Arc<dyn EventBus<EventEnvelope<IntakeEvent>>> = ...;
/// let subscription = bus.subscribe();
///
/// loop {
///     match subscription.recv_timeout(Duration::from_secs(1)) {
///         Ok(event) => process(event)?,
///         Err(std::sync::mpsc::RecvTimeoutError::Timeout) => continue,  // Check for shutdown
///         Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,  // Bus closed
///     }
/// }
/// ```
///
/// ## Thread Safety
///
/// Subscriptions are designed for single-threaded consumption. Each subscription
/// should be used by one thread (or use a mutex/channel to distribute events to
/// multiple threads).
///
/// ## Message Ordering
///
/// Messages are received in the order they were published by the bus
/// implementation. Publishers needing per-stream ordering (e.g. per-medication
/// serialization of cabinet effects) must serialize their own publishes; the
/// envelope's sequence number makes that ordering checkable on the consumer side.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Domain-agnostic event bus (pub/sub abstraction).
///
/// The bus sits between an aggregate's committed state change and its
/// consumers:
///
/// ```text
/// IntakeLedger (commit row) → EventBus (publish) → Consumers
///                                                      ├─ InventoryReconciler
///                                                      └─ notification layer
/// ```
///
/// ## Delivery Guarantees
///
/// The bus provides **at-least-once delivery**:
/// - Events may be delivered multiple times
/// - Consumers must tolerate duplicates
///
/// ## Error Handling
///
/// `publish()` can fail (e.g., bus is full). Failures are surfaced to the
/// caller, which may retry or log; the committed state change stands either
/// way.
///
/// ## Thread Safety
///
/// The trait requires `Send + Sync`; multiple threads can publish events
/// concurrently.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
