//! Event bus error types

use thiserror::Error;

/// Errors surfaced by `publish`.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus was stopped; further publishes are refused
    #[error("event bus is closed")]
    Closed,
}

/// Errors a handler may return from `handle`.
///
/// These are caught by the dispatch loop, logged, and counted; they are
/// never propagated to sibling handlers and never auto-retried.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Handler-specific processing failure
    #[error("handler processing failed: {0}")]
    Processing(String),

    /// A derived-event publish failed (bus closed mid-shutdown)
    #[error("publish from handler failed: {0}")]
    Publish(#[from] BusError),

    /// IO failure inside a persistence handler
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
