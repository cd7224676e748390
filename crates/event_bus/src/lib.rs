//! # Event Bus
//!
//! In-process concurrent publish/subscribe broker.
//!
//! Responsibilities:
//! - Two delivery classes: guaranteed (lifecycle/derived events) and
//!   best-effort most-recent-wins (the 60 Hz frame stream)
//! - Single dispatch loop, per-kind ordering, concurrent fan-out
//! - Handler isolation: a failing or panicking handler never stops the
//!   loop or its siblings
//! - Graceful drain on stop, with published/delivered/dropped counters

mod bus;
mod error;
mod handler;
mod metrics;

pub use bus::{BusConfig, EventBus, EventPublisher};
pub use contracts::{Event, EventKind, EventPayload};
pub use error::{BusError, HandlerError};
pub use handler::{EventHandler, HandlerContext};
pub use metrics::{BusMetrics, BusStats};
