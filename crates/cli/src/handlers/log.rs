//! LogHandler - logs event summaries via tracing

use async_trait::async_trait;
use tracing::info;

use contracts::{Event, EventPayload};
use event_bus::{EventHandler, HandlerContext, HandlerError};

/// Subscriber that logs lifecycle and derived events for debugging.
pub struct LogHandler;

impl LogHandler {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LogHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventHandler for LogHandler {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn handle(&self, event: &Event, _ctx: &HandlerContext) -> Result<(), HandlerError> {
        match &event.payload {
            EventPayload::SessionStart(session) => {
                info!(
                    session_id = %session.session_id,
                    track = %session.track_name,
                    car = %session.car_name,
                    "session started"
                );
            }
            EventPayload::SessionEnd { session_id } => {
                info!(%session_id, "session ended");
            }
            EventPayload::LapCompleted { lap, .. } => {
                info!(
                    lap = lap.lap_number,
                    frames = lap.len(),
                    lap_time = format!("{:.3}", lap.lap_time),
                    valid = lap.is_valid,
                    "lap received"
                );
            }
            EventPayload::MetricsExtracted {
                lap_number,
                metrics,
                ..
            } => {
                info!(
                    lap = *lap_number,
                    braking_zones = metrics.braking_zones.len(),
                    corners = metrics.corners.len(),
                    max_speed = format!("{:.1}", metrics.max_speed),
                    "metrics received"
                );
            }
            EventPayload::Frame(_) => {}
        }
        Ok(())
    }
}
