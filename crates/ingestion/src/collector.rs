//! Frame collector - the producer loop.
//!
//! One dedicated task owns the frame source and runs continuously at its
//! native rate. Frames publish best-effort, so a slow consumer can never
//! park the producer; lifecycle events publish guaranteed.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use contracts::{Event, EventPayload, FrameSource, SessionInfo, SourceError};
use event_bus::EventPublisher;

/// Collector failure: the source broke. Bus shutdown mid-run is not an
/// error, just the end of the run.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Counters from a finished collector run.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectorStats {
    pub frames_published: u64,
}

/// Drives one `FrameSource` into the bus.
pub struct FrameCollector<S: FrameSource> {
    source: S,
    session: SessionInfo,
    stop_flag: Arc<AtomicBool>,
}

impl<S: FrameSource> FrameCollector<S> {
    pub fn new(source: S, session: SessionInfo) -> Self {
        Self {
            source,
            session,
            stop_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Cooperative stop handle. Setting it ends the loop after the frame
    /// in flight; the shutdown sequence stops the source before the bus.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }

    pub fn session_id(&self) -> Uuid {
        self.session.session_id
    }

    /// Run to end-of-stream or stop.
    ///
    /// Publishes SessionStart, the frame stream, then SessionEnd. Source
    /// errors surface here, to the caller, never into the bus.
    #[instrument(name = "collector_run", skip(self, publisher), fields(source = self.source.name()))]
    pub async fn run(mut self, publisher: EventPublisher) -> Result<CollectorStats, CollectorError> {
        self.source.start().await?;

        let session_id = self.session.session_id;
        info!(%session_id, track = %self.session.track_name, "session started");

        if publisher
            .publish(Event::new(EventPayload::SessionStart(self.session.clone())))
            .await
            .is_err()
        {
            warn!("bus closed before session start, aborting collection");
            self.source.stop();
            return Ok(CollectorStats::default());
        }

        let mut stats = CollectorStats::default();
        while !self.stop_flag.load(Ordering::Relaxed) {
            let Some(frame) = self.source.next_frame().await else {
                debug!("source end-of-stream");
                break;
            };

            match publisher.publish(Event::new(EventPayload::Frame(frame))).await {
                Ok(()) => {
                    stats.frames_published += 1;
                    metrics::counter!("lapcoach_frames_collected_total").increment(1);
                }
                Err(_) => {
                    // Shutdown has begun; producer-origin publishes are
                    // refused from here on.
                    debug!("bus closed, ending collection");
                    break;
                }
            }
        }

        self.source.stop();

        if publisher
            .publish(Event::new(EventPayload::SessionEnd { session_id }))
            .await
            .is_err()
        {
            debug!("bus closed before session end event");
        }

        info!(
            frames = stats.frames_published,
            %session_id,
            "collection finished"
        );
        Ok(stats)
    }
}
