//! # Ingestion
//!
//! Frame sources and the collector loop feeding the event bus.
//!
//! Live and replay sources share the `FrameSource` contract; the collector
//! drives whichever it is given on a dedicated task at the source's native
//! rate, publishing frames best-effort so the producer is never stalled.

mod collector;
mod replay;
mod synthetic;

pub use collector::{CollectorError, CollectorStats, FrameCollector};
pub use contracts::{FrameSource, SourceError};
pub use replay::ReplayFrameSource;
pub use synthetic::{SyntheticFrameSource, SyntheticSourceConfig};
