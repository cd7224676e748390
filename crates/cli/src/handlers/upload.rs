//! UploadHandler - persists laps and metrics as JSON files
//!
//! Stands in for the remote upload service: it owns serialization and
//! forwards completed laps and extracted metrics outward. Write failures
//! are isolated by the bus like any other handler error.

use std::fs::{self, File};
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::{debug, instrument};
use uuid::Uuid;

use contracts::{Event, EventPayload};
use event_bus::{EventHandler, HandlerContext, HandlerError};

/// Subscriber writing one JSON file per lap and per metrics set under
/// `<output_dir>/<session_id>/`.
pub struct UploadHandler {
    output_dir: PathBuf,
}

impl UploadHandler {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn session_dir(&self, session_id: &Uuid) -> Result<PathBuf, HandlerError> {
        let dir = self.output_dir.join(session_id.to_string());
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    fn write_json<T: serde::Serialize>(
        &self,
        session_id: &Uuid,
        file_name: &str,
        value: &T,
    ) -> Result<(), HandlerError> {
        let path = self.session_dir(session_id)?.join(file_name);
        let file = File::create(&path)?;
        serde_json::to_writer_pretty(file, value)
            .map_err(|e| HandlerError::Processing(format!("serialize {file_name}: {e}")))?;
        debug!(path = %path.display(), "wrote artifact");
        Ok(())
    }
}

#[async_trait]
impl EventHandler for UploadHandler {
    fn name(&self) -> &'static str {
        "upload"
    }

    #[instrument(name = "upload_write", skip_all)]
    async fn handle(&self, event: &Event, _ctx: &HandlerContext) -> Result<(), HandlerError> {
        match &event.payload {
            EventPayload::LapCompleted { session_id, lap } => {
                self.write_json(session_id, &format!("lap_{:04}.json", lap.lap_number), &**lap)
            }
            EventPayload::MetricsExtracted {
                session_id,
                lap_number,
                metrics,
            } => self.write_json(
                session_id,
                &format!("lap_{lap_number:04}_metrics.json"),
                &**metrics,
            ),
            _ => Ok(()),
        }
    }
}
