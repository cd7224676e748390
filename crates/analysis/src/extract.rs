//! Lap metrics extraction and the MetricsExtracted-producing handler.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use contracts::{AnalysisConfig, BrakingZone, Corner, Event, EventPayload, Lap, LapMetrics};
use event_bus::{EventHandler, HandlerContext, HandlerError};
use observability::record_lap_metrics;

use crate::braking::extract_braking_zones;
use crate::corner::extract_corners;
use crate::math::wrap_delta;

/// Extract all metrics from one lap.
///
/// Pure and deterministic: two single-pass scans plus lap-wide speed
/// statistics. Entries that violate structural invariants are asserted in
/// development and dropped with a warning in release builds, so one
/// malformed zone never poisons the lap.
pub fn extract_lap_metrics(lap: &Lap, config: &AnalysisConfig) -> LapMetrics {
    let frames = &lap.frames;

    let mut braking_zones = extract_braking_zones(frames, config);
    braking_zones.retain(|zone| {
        let ok = zone_well_formed(zone, config);
        debug_assert!(ok, "malformed braking zone: {zone:?}");
        if !ok {
            warn!(
                lap = lap.lap_number,
                start = zone.start_distance,
                end = zone.end_distance,
                "dropping malformed braking zone"
            );
        }
        ok
    });

    let mut corners = extract_corners(frames, config);
    corners.retain(|corner| {
        let ok = corner_well_formed(corner);
        debug_assert!(ok, "malformed corner: {corner:?}");
        if !ok {
            warn!(
                lap = lap.lap_number,
                entry = corner.entry_distance,
                exit = corner.exit_distance,
                "dropping malformed corner"
            );
        }
        ok
    });

    let max_speed = frames.iter().map(|f| f.speed).fold(0.0, f64::max);
    let min_speed = frames
        .iter()
        .map(|f| f.speed)
        .fold(f64::INFINITY, f64::min);
    let average_corner_speed = if corners.is_empty() {
        0.0
    } else {
        corners.iter().map(|c| c.apex_speed).sum::<f64>() / corners.len() as f64
    };

    LapMetrics {
        lap_number: lap.lap_number,
        lap_time: (!frames.is_empty()).then_some(lap.lap_time),
        braking_zones,
        corners,
        max_speed,
        min_speed: if min_speed.is_finite() { min_speed } else { 0.0 },
        average_corner_speed,
    }
}

fn zone_well_formed(zone: &BrakingZone, config: &AnalysisConfig) -> bool {
    zone.min_speed <= zone.entry_speed + f64::EPSILON
        && zone.max_brake_pressure > config.brake_threshold
        && zone.braking_duration >= 0.0
}

fn corner_well_formed(corner: &Corner) -> bool {
    let entry_to_apex = wrap_delta(corner.apex_distance - corner.entry_distance);
    let entry_to_exit = wrap_delta(corner.exit_distance - corner.entry_distance);
    entry_to_apex <= entry_to_exit + f64::EPSILON && corner.time_in_corner >= 0.0
}

/// Stateless subscriber: turns each completed lap into metrics and
/// publishes them back onto the bus.
pub struct MetricsExtractor {
    config: AnalysisConfig,
}

impl MetricsExtractor {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }
}

impl Default for MetricsExtractor {
    fn default() -> Self {
        Self::new(AnalysisConfig::default())
    }
}

#[async_trait]
impl EventHandler for MetricsExtractor {
    fn name(&self) -> &'static str {
        "metrics_extractor"
    }

    #[instrument(name = "metrics_extract", skip_all)]
    async fn handle(&self, event: &Event, ctx: &HandlerContext) -> Result<(), HandlerError> {
        let EventPayload::LapCompleted { session_id, lap } = &event.payload else {
            return Ok(());
        };

        if lap.is_empty() {
            debug!(lap = lap.lap_number, "skipping empty lap");
            return Ok(());
        }

        let metrics = extract_lap_metrics(lap, &self.config);
        info!(
            lap = metrics.lap_number,
            braking_zones = metrics.braking_zones.len(),
            corners = metrics.corners.len(),
            "lap metrics extracted"
        );
        record_lap_metrics(&metrics);

        ctx.publisher
            .publish(Event::new(EventPayload::MetricsExtracted {
                session_id: *session_id,
                lap_number: metrics.lap_number,
                metrics: Arc::new(metrics),
            }))
            .await?;
        Ok(())
    }
}
