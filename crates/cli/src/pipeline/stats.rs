//! Pipeline statistics for the run summary.

use std::time::Duration;

use event_bus::BusStats;
use observability::SessionSummary;

/// Statistics from a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Frames the collector published
    pub frames_published: u64,

    /// Bus counters reported after the drain
    pub bus: BusStats,

    /// Aggregated lap/session results
    pub session: SessionSummary,

    /// Total duration of the pipeline run
    pub duration: Duration,
}

impl PipelineStats {
    /// Frames per second pushed by the collector.
    pub fn fps(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.frames_published as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Print the detailed run summary.
    pub fn print_summary(&self) {
        println!("\n=== Pipeline Statistics ===");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Frames published: {}", self.frames_published);
        println!("Collector rate: {:.1} fps", self.fps());
        println!("\n=== Event Bus ===");
        println!("Published: {}", self.bus.published);
        println!("Delivered: {}", self.bus.delivered);
        println!("Dropped (best-effort): {}", self.bus.dropped);
        println!("Handler errors: {}", self.bus.handler_errors);
        println!();
        println!("{}", self.session);
    }
}
