//! StatsHandler - feeds the session aggregator for the run summary

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use contracts::{Event, EventPayload};
use event_bus::{EventHandler, HandlerContext, HandlerError};
use observability::SessionAggregator;

/// Subscriber that folds lap results into a shared aggregator so the
/// orchestrator can print a summary after the bus drains.
pub struct StatsHandler {
    aggregator: Arc<Mutex<SessionAggregator>>,
}

impl StatsHandler {
    pub fn new(aggregator: Arc<Mutex<SessionAggregator>>) -> Self {
        Self { aggregator }
    }
}

#[async_trait]
impl EventHandler for StatsHandler {
    fn name(&self) -> &'static str {
        "stats"
    }

    async fn handle(&self, event: &Event, _ctx: &HandlerContext) -> Result<(), HandlerError> {
        match &event.payload {
            EventPayload::LapCompleted { lap, .. } => {
                self.aggregator
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .observe_lap(lap.lap_time, lap.is_valid);
            }
            EventPayload::MetricsExtracted { metrics, .. } => {
                self.aggregator
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .observe_metrics(metrics);
            }
            _ => {}
        }
        Ok(())
    }
}
