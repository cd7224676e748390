//! FrameSource trait - telemetry source abstraction
//!
//! Defines a unified interface for telemetry sources, decoupling the
//! collector from concrete simulator adapters. Live and replay sources
//! share this one contract.

use thiserror::Error;

use crate::TelemetryFrame;

/// Errors a frame source can surface to its caller.
///
/// These never enter the event bus: the collector handles them in its own
/// context and reports upward as session-lifecycle signals.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Connection to the simulator was lost or never established
    #[error("source connection lost: {message}")]
    ConnectionLost { message: String },

    /// A frame could not be decoded
    #[error("malformed frame at record {record}: {message}")]
    MalformedFrame { record: usize, message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl SourceError {
    pub fn connection_lost(message: impl Into<String>) -> Self {
        Self::ConnectionLost {
            message: message.into(),
        }
    }

    pub fn malformed_frame(record: usize, message: impl Into<String>) -> Self {
        Self::MalformedFrame {
            record,
            message: message.into(),
        }
    }
}

/// Telemetry source trait.
///
/// The collector drives this generically; implementations pace themselves
/// inside `next_frame` so the producer loop runs at the source's native
/// rate.
///
/// `next_frame` returning `None` signals end-of-stream for file sources;
/// live sources yield `None` only after `stop()`.
#[trait_variant::make(FrameSource: Send)]
pub trait LocalFrameSource {
    /// Source name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Open the source and prepare it to emit frames.
    ///
    /// # Errors
    /// Connection or decode failures; the source is unusable afterwards.
    async fn start(&mut self) -> Result<(), SourceError>;

    /// Stop emitting. Idempotent; a stopped source yields `None`.
    fn stop(&mut self);

    /// Whether the source is currently able to emit frames.
    fn is_connected(&self) -> bool;

    /// Next telemetry sample, or `None` at end-of-stream.
    async fn next_frame(&mut self) -> Option<TelemetryFrame>;
}
