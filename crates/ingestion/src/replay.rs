//! Replay frame source
//!
//! Reads a recorded telemetry file (one JSON frame per line) and replays
//! it paced by the recorded session-time deltas.

use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

use contracts::{FrameSource, SourceError, TelemetryFrame};

/// File-backed telemetry source.
///
/// `next_frame` yields frames in recorded order, sleeping the recorded
/// inter-frame gap divided by the speed multiplier. A multiplier <= 0
/// replays as fast as the consumer pulls.
pub struct ReplayFrameSource {
    path: PathBuf,
    speed_multiplier: f64,
    frames: Vec<TelemetryFrame>,
    cursor: usize,
    last_session_time: Option<f64>,
    connected: bool,
}

impl ReplayFrameSource {
    pub fn new(path: impl Into<PathBuf>, speed_multiplier: f64) -> Self {
        Self {
            path: path.into(),
            speed_multiplier,
            frames: Vec::new(),
            cursor: 0,
            last_session_time: None,
            connected: false,
        }
    }

    /// Frames remaining to be replayed.
    pub fn remaining(&self) -> usize {
        self.frames.len().saturating_sub(self.cursor)
    }
}

impl FrameSource for ReplayFrameSource {
    fn name(&self) -> &str {
        "replay"
    }

    async fn start(&mut self) -> Result<(), SourceError> {
        let content = std::fs::read_to_string(&self.path)?;

        let mut frames = Vec::new();
        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let frame: TelemetryFrame = serde_json::from_str(line)
                .map_err(|e| SourceError::malformed_frame(line_no + 1, e.to_string()))?;
            frames.push(frame);
        }

        info!(
            path = %self.path.display(),
            frames = frames.len(),
            speed = self.speed_multiplier,
            "replay source opened"
        );

        self.frames = frames;
        self.cursor = 0;
        self.last_session_time = None;
        self.connected = true;
        Ok(())
    }

    fn stop(&mut self) {
        if self.connected {
            debug!(replayed = self.cursor, "replay source stopped");
            self.connected = false;
        }
    }

    fn is_connected(&self) -> bool {
        self.connected && self.cursor < self.frames.len()
    }

    async fn next_frame(&mut self) -> Option<TelemetryFrame> {
        if !self.connected {
            return None;
        }

        let frame = self.frames.get(self.cursor)?.clone();
        self.cursor += 1;

        if self.speed_multiplier > 0.0 {
            if let Some(prev) = self.last_session_time {
                let gap = (frame.session_time - prev).max(0.0) / self.speed_multiplier;
                if gap > 0.0 {
                    tokio::time::sleep(Duration::from_secs_f64(gap)).await;
                }
            }
        }
        self.last_session_time = Some(frame.session_time);

        Some(frame)
    }
}
