//! Lap assembly from the raw frame stream.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use contracts::{AssemblerSettings, Event, EventPayload, Lap, PartialLapPolicy, TelemetryFrame};
use event_bus::{EventHandler, HandlerContext, HandlerError};
use observability::record_lap_completed;

/// Internal assembler state. The dispatch loop serializes invocations, so
/// the mutex is never contended; it only gives the handler interior
/// mutability behind `&self`.
struct AssemblerState {
    session_id: Option<Uuid>,
    current_lap: Option<i32>,
    buffer: Vec<TelemetryFrame>,
    frames_seen: u64,
}

impl Default for AssemblerState {
    fn default() -> Self {
        Self {
            session_id: None,
            current_lap: None,
            // Roughly a 2.5 minute lap at 60 Hz
            buffer: Vec::with_capacity(10_000),
            frames_seen: 0,
        }
    }
}

/// Stateful subscriber turning the frame stream into discrete laps.
///
/// A lap boundary is a lap-number change or a distance wrap from near the
/// finish line (>= wrap_high) to just past it (<= wrap_low) within one
/// sample. The first frame of a session seeds state without emitting.
pub struct LapAssembler {
    settings: AssemblerSettings,
    state: Mutex<AssemblerState>,
}

impl LapAssembler {
    pub fn new(settings: AssemblerSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(AssemblerState::default()),
        }
    }

    async fn on_session_start(&self, session_id: Uuid) {
        let mut state = self.state.lock().await;
        if !state.buffer.is_empty() {
            info!(
                discarded = state.buffer.len(),
                "new session, discarding buffered frames"
            );
        }
        *state = AssemblerState::default();
        state.session_id = Some(session_id);
        debug!(%session_id, "lap assembler reset for session");
    }

    async fn on_session_end(&self, ctx: &HandlerContext) -> Result<(), HandlerError> {
        let mut state = self.state.lock().await;
        let buffered = state.buffer.len();

        match self.settings.partial_lap_policy {
            PartialLapPolicy::Discard => {
                if buffered > 0 {
                    info!(discarded = buffered, "session ended mid-lap, discarding partial lap");
                }
            }
            PartialLapPolicy::Flush => {
                if buffered > 0 {
                    let lap_number = state.current_lap.unwrap_or_default();
                    info!(frames = buffered, lap = lap_number, "session ended mid-lap, flushing partial lap");
                    Self::publish_lap(&mut state, lap_number, ctx).await?;
                }
            }
        }

        info!(frames_seen = state.frames_seen, "session complete");
        state.buffer.clear();
        state.current_lap = None;
        Ok(())
    }

    async fn on_frame(
        &self,
        frame: &TelemetryFrame,
        ctx: &HandlerContext,
    ) -> Result<(), HandlerError> {
        let mut state = self.state.lock().await;
        state.frames_seen += 1;

        let Some(current_lap) = state.current_lap else {
            // First frame of the session seeds state without emitting.
            state.current_lap = Some(frame.lap_number);
            state.buffer.push(frame.clone());
            return Ok(());
        };

        let lap_changed = frame.lap_number != current_lap;
        let wrapped = state.buffer.last().map_or(false, |last| {
            last.lap_distance_pct >= self.settings.wrap_high
                && frame.lap_distance_pct <= self.settings.wrap_low
        });

        if lap_changed || wrapped {
            debug!(
                from = current_lap,
                to = frame.lap_number,
                wrapped,
                "lap boundary detected"
            );
            Self::publish_lap(&mut state, current_lap, ctx).await?;
            state.current_lap = Some(frame.lap_number);
        }

        state.buffer.push(frame.clone());
        Ok(())
    }

    /// Finalize the buffer into a Lap and publish it. The buffer is left
    /// empty for the next lap.
    async fn publish_lap(
        state: &mut AssemblerState,
        lap_number: i32,
        ctx: &HandlerContext,
    ) -> Result<(), HandlerError> {
        let frames = std::mem::take(&mut state.buffer);
        if frames.is_empty() {
            warn!(lap = lap_number, "lap boundary with empty buffer, nothing to publish");
            return Ok(());
        }

        let lap = Lap::from_frames(lap_number, frames);
        info!(
            lap = lap.lap_number,
            frames = lap.len(),
            lap_time = lap.lap_time,
            valid = lap.is_valid,
            "lap completed"
        );
        record_lap_completed(lap.lap_number, lap.len(), lap.lap_time, lap.is_valid);

        let session_id = *state.session_id.get_or_insert_with(Uuid::new_v4);
        ctx.publisher
            .publish(Event::new(EventPayload::LapCompleted {
                session_id,
                lap: Arc::new(lap),
            }))
            .await?;
        Ok(())
    }
}

#[async_trait]
impl EventHandler for LapAssembler {
    fn name(&self) -> &'static str {
        "lap_assembler"
    }

    #[instrument(name = "lap_assemble", skip_all)]
    async fn handle(&self, event: &Event, ctx: &HandlerContext) -> Result<(), HandlerError> {
        match &event.payload {
            EventPayload::SessionStart(session) => {
                self.on_session_start(session.session_id).await;
                Ok(())
            }
            EventPayload::SessionEnd { .. } => self.on_session_end(ctx).await,
            EventPayload::Frame(frame) => self.on_frame(frame, ctx).await,
            _ => Ok(()),
        }
    }
}
