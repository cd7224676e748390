//! Pipeline metric recording and in-memory aggregation.

use contracts::LapMetrics;
use metrics::{counter, gauge, histogram};

/// Record a completed lap.
///
/// Called by the lap assembler every time a boundary closes a lap.
pub fn record_lap_completed(lap_number: i32, frames: usize, lap_time_s: f64, is_valid: bool) {
    counter!("lapcoach_laps_completed_total").increment(1);
    if !is_valid {
        counter!("lapcoach_laps_invalid_total").increment(1);
    }
    gauge!("lapcoach_last_lap_number").set(f64::from(lap_number));
    gauge!("lapcoach_last_lap_frames").set(frames as f64);
    histogram!("lapcoach_lap_time_seconds").record(lap_time_s);
}

/// Record extracted lap metrics.
pub fn record_lap_metrics(metrics: &LapMetrics) {
    counter!("lapcoach_laps_analyzed_total").increment(1);
    gauge!("lapcoach_last_lap_braking_zones").set(metrics.braking_zones.len() as f64);
    gauge!("lapcoach_last_lap_corners").set(metrics.corners.len() as f64);
    histogram!("lapcoach_lap_max_speed_mps").record(metrics.max_speed);

    if metrics.average_corner_speed > 0.0 {
        histogram!("lapcoach_lap_avg_corner_speed_mps").record(metrics.average_corner_speed);
    }

    for zone in &metrics.braking_zones {
        histogram!("lapcoach_braking_efficiency").record(zone.braking_efficiency);
        if zone.has_trail_braking {
            counter!("lapcoach_trail_braking_zones_total").increment(1);
        }
    }
}

/// Record a bus queue depth sample.
pub fn record_bus_queue_depth(queue: &'static str, depth: usize) {
    gauge!("lapcoach_bus_queue_depth", "queue" => queue).set(depth as f64);
}

/// Session-level aggregation of lap results.
///
/// Aggregates in memory so the run summary can be printed without
/// scraping the Prometheus endpoint.
#[derive(Debug, Clone, Default)]
pub struct SessionAggregator {
    /// Laps completed by the assembler
    pub total_laps: u64,

    /// Laps with every frame on track
    pub valid_laps: u64,

    /// Laps that went through metrics extraction
    pub analyzed_laps: u64,

    /// Braking zones across all analyzed laps
    pub total_braking_zones: u64,

    /// Corners across all analyzed laps
    pub total_corners: u64,

    /// Fastest complete lap seen (seconds)
    pub best_lap_time: Option<f64>,

    /// Lap time statistics (seconds)
    pub lap_time_stats: RunningStats,

    /// Apex speed statistics across all corners (m/s)
    pub corner_speed_stats: RunningStats,
}

impl SessionAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one completed lap.
    pub fn observe_lap(&mut self, lap_time_s: f64, is_valid: bool) {
        self.total_laps += 1;
        if is_valid {
            self.valid_laps += 1;
        }
        if lap_time_s > 0.0 {
            self.lap_time_stats.push(lap_time_s);
            if is_valid {
                let best = self.best_lap_time.get_or_insert(lap_time_s);
                if lap_time_s < *best {
                    *best = lap_time_s;
                }
            }
        }
    }

    /// Fold in one lap's extracted metrics.
    pub fn observe_metrics(&mut self, metrics: &LapMetrics) {
        self.analyzed_laps += 1;
        self.total_braking_zones += metrics.braking_zones.len() as u64;
        self.total_corners += metrics.corners.len() as u64;
        for corner in &metrics.corners {
            self.corner_speed_stats.push(corner.apex_speed);
        }
    }

    /// Produce the summary report.
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            total_laps: self.total_laps,
            valid_laps: self.valid_laps,
            analyzed_laps: self.analyzed_laps,
            total_braking_zones: self.total_braking_zones,
            total_corners: self.total_corners,
            best_lap_time: self.best_lap_time,
            lap_time: StatsSummary::from(&self.lap_time_stats),
            corner_speed: StatsSummary::from(&self.corner_speed_stats),
        }
    }

    /// Reset all statistics.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Aggregated session report.
#[derive(Debug, Clone, Default)]
pub struct SessionSummary {
    pub total_laps: u64,
    pub valid_laps: u64,
    pub analyzed_laps: u64,
    pub total_braking_zones: u64,
    pub total_corners: u64,
    pub best_lap_time: Option<f64>,
    pub lap_time: StatsSummary,
    pub corner_speed: StatsSummary,
}

impl std::fmt::Display for SessionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Session Summary ===")?;
        writeln!(f, "Laps: {} ({} valid)", self.total_laps, self.valid_laps)?;
        writeln!(f, "Analyzed laps: {}", self.analyzed_laps)?;
        writeln!(f, "Braking zones: {}", self.total_braking_zones)?;
        writeln!(f, "Corners: {}", self.total_corners)?;
        match self.best_lap_time {
            Some(best) => writeln!(f, "Best lap: {best:.3}s")?,
            None => writeln!(f, "Best lap: N/A")?,
        }
        writeln!(f, "Lap time (s): {}", self.lap_time)?;
        writeln!(f, "Corner apex speed (m/s): {}", self.corner_speed)?;
        Ok(())
    }
}

/// Summary of one statistic series.
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm).
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// Add a new value.
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();

        stats.push(1.0);
        stats.push(2.0);
        stats.push(3.0);
        stats.push(4.0);
        stats.push(5.0);

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_laps() {
        let mut aggregator = SessionAggregator::new();

        aggregator.observe_lap(92.5, true);
        aggregator.observe_lap(95.0, false);
        aggregator.observe_lap(91.2, true);

        assert_eq!(aggregator.total_laps, 3);
        assert_eq!(aggregator.valid_laps, 2);
        // Best lap only considers valid laps
        assert_eq!(aggregator.best_lap_time, Some(91.2));
    }

    #[test]
    fn test_aggregator_metrics() {
        let mut aggregator = SessionAggregator::new();
        let metrics = LapMetrics {
            lap_number: 2,
            lap_time: Some(90.0),
            braking_zones: vec![],
            corners: vec![],
            max_speed: 75.0,
            min_speed: 30.0,
            average_corner_speed: 0.0,
        };

        aggregator.observe_metrics(&metrics);
        assert_eq!(aggregator.analyzed_laps, 1);

        let summary = aggregator.summary();
        assert_eq!(summary.analyzed_laps, 1);
        assert_eq!(summary.corner_speed.count, 0);
    }

    #[test]
    fn test_summary_display() {
        let mut aggregator = SessionAggregator::new();
        aggregator.observe_lap(90.0, true);
        let output = format!("{}", aggregator.summary());
        assert!(output.contains("Laps: 1 (1 valid)"));
        assert!(output.contains("Best lap: 90.000s"));
    }
}
