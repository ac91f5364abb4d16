//! Observability helpers (tracing/logging init).

pub mod tracing;

pub use tracing::init;
