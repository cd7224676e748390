//! EventHandler trait - subscriber contract
//!
//! Handlers pattern-match on the events they care about and communicate
//! with the rest of the pipeline only by publishing derived events through
//! the context's publisher.

use async_trait::async_trait;

use contracts::Event;

use crate::bus::EventPublisher;
use crate::error::HandlerError;

/// Context passed to every handler invocation.
pub struct HandlerContext {
    /// Publisher for emitting derived events
    pub publisher: EventPublisher,
}

/// Subscriber contract.
///
/// Invocations of one handler instance are strictly serialized in event
/// arrival order by the dispatch loop, so stateful handlers may keep their
/// state behind a plain async mutex. Handlers for the same event run
/// concurrently with each other on the worker pool.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Human-readable name for logging/metrics
    fn name(&self) -> &'static str;

    /// Handle one event.
    ///
    /// # Errors
    /// Returned errors are logged and counted by the bus, never propagated.
    async fn handle(&self, event: &Event, ctx: &HandlerContext) -> Result<(), HandlerError>;
}
