//! Pipeline orchestrator - coordinates all components.
//!
//! Wires source -> collector -> bus -> handlers, runs to end-of-stream or
//! shutdown signal, then drains the bus and reports statistics.

use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::{info, warn};

use analysis::{LapAssembler, MetricsExtractor};
use contracts::{
    EventKind, FrameSource, PipelineSettings, SessionInfo, SourceError, SourceMode,
    TelemetryFrame,
};
use event_bus::{BusConfig, EventBus};
use ingestion::{FrameCollector, ReplayFrameSource, SyntheticFrameSource, SyntheticSourceConfig};
use observability::SessionAggregator;

use crate::handlers::{LogHandler, StatsHandler, UploadHandler};

use super::PipelineStats;

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Loaded settings (after CLI overrides)
    pub settings: PipelineSettings,

    /// Pipeline timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// Metrics server port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// Main pipeline orchestrator.
pub struct Pipeline {
    config: PipelineConfig,
}

/// Source selected at runtime; both variants share the FrameSource
/// contract, so the collector does not care which it drives.
enum TelemetrySource {
    Replay(ReplayFrameSource),
    Synthetic(SyntheticFrameSource),
}

impl FrameSource for TelemetrySource {
    fn name(&self) -> &str {
        match self {
            TelemetrySource::Replay(source) => source.name(),
            TelemetrySource::Synthetic(source) => source.name(),
        }
    }

    async fn start(&mut self) -> Result<(), SourceError> {
        match self {
            TelemetrySource::Replay(source) => source.start().await,
            TelemetrySource::Synthetic(source) => source.start().await,
        }
    }

    fn stop(&mut self) {
        match self {
            TelemetrySource::Replay(source) => source.stop(),
            TelemetrySource::Synthetic(source) => source.stop(),
        }
    }

    fn is_connected(&self) -> bool {
        match self {
            TelemetrySource::Replay(source) => source.is_connected(),
            TelemetrySource::Synthetic(source) => source.is_connected(),
        }
    }

    async fn next_frame(&mut self) -> Option<TelemetryFrame> {
        match self {
            TelemetrySource::Replay(source) => source.next_frame().await,
            TelemetrySource::Synthetic(source) => source.next_frame().await,
        }
    }
}

impl Pipeline {
    /// Create a new pipeline with the given configuration.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Run the pipeline to completion.
    pub async fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let settings = &self.config.settings;

        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!(port, "Metrics endpoint available");
        }

        // Event bus + handlers
        let mut bus = EventBus::new(BusConfig {
            lifecycle_capacity: settings.bus.lifecycle_capacity,
            frame_capacity: settings.bus.frame_capacity,
            drain_timeout: Duration::from_millis(settings.bus.drain_timeout_ms),
        });

        let aggregator = Arc::new(Mutex::new(SessionAggregator::new()));

        let assembler = Arc::new(LapAssembler::new(settings.assembler.clone()));
        bus.subscribe(EventKind::SessionStart, assembler.clone());
        bus.subscribe(EventKind::SessionEnd, assembler.clone());
        bus.subscribe(EventKind::Frame, assembler);

        let extractor = Arc::new(MetricsExtractor::new(settings.analysis.to_config()));
        bus.subscribe(EventKind::LapCompleted, extractor);

        let stats_handler = Arc::new(StatsHandler::new(Arc::clone(&aggregator)));
        bus.subscribe(EventKind::LapCompleted, stats_handler.clone());
        bus.subscribe(EventKind::MetricsExtracted, stats_handler);

        let log_handler = Arc::new(LogHandler::new());
        bus.subscribe(EventKind::SessionStart, log_handler.clone());
        bus.subscribe(EventKind::SessionEnd, log_handler.clone());
        bus.subscribe(EventKind::LapCompleted, log_handler.clone());
        bus.subscribe(EventKind::MetricsExtracted, log_handler);

        if settings.upload.enabled {
            let upload = Arc::new(UploadHandler::new(settings.upload.output_dir.clone()));
            bus.subscribe(EventKind::LapCompleted, upload.clone());
            bus.subscribe(EventKind::MetricsExtracted, upload);
            info!(dir = %settings.upload.output_dir.display(), "upload handler enabled");
        }

        bus.start();

        // Source + collector
        let (source, session) = build_source(settings);
        let collector = FrameCollector::new(source, session);
        let stop_handle = collector.stop_handle();
        let publisher = bus.publisher();
        let mut collector_handle = tokio::spawn(collector.run(publisher));

        info!("Pipeline running");

        // Wait for end-of-stream, a shutdown signal, or the timeout. On a
        // signal the source stops first; the collector then finishes its
        // frame in flight and publishes SessionEnd before the bus drains.
        let timeout = self.config.timeout;
        let timeout_fut = async {
            match timeout {
                Some(t) => tokio::time::sleep(t).await,
                None => std::future::pending().await,
            }
        };

        let early_result = tokio::select! {
            result = &mut collector_handle => Some(result),
            _ = shutdown_signal() => {
                warn!("Shutdown signal received, stopping frame source");
                stop_handle.store(true, Ordering::Relaxed);
                None
            }
            _ = timeout_fut => {
                warn!("Pipeline timeout reached, stopping frame source");
                stop_handle.store(true, Ordering::Relaxed);
                None
            }
        };

        let collector_result = match early_result {
            Some(result) => result,
            None => collector_handle.await,
        };

        let collector_stats = collector_result
            .context("collector task panicked")?
            .context("frame source failed")?;

        // Drain queued events, then report.
        observability::record_bus_queue_depth("frame", bus.frame_queue_len());
        observability::record_bus_queue_depth("lifecycle", bus.lifecycle_queue_len());
        let bus_stats = bus.stop().await;

        let session_summary = aggregator
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .summary();

        info!(
            frames = collector_stats.frames_published,
            laps = session_summary.total_laps,
            duration_secs = start_time.elapsed().as_secs_f64(),
            "Pipeline shutdown complete"
        );

        Ok(PipelineStats {
            frames_published: collector_stats.frames_published,
            bus: bus_stats,
            session: session_summary,
            duration: start_time.elapsed(),
        })
    }
}

/// Build the configured frame source and the session describing it.
fn build_source(settings: &PipelineSettings) -> (TelemetrySource, SessionInfo) {
    match settings.source.mode {
        SourceMode::Synthetic => {
            let source = SyntheticFrameSource::new(SyntheticSourceConfig {
                frequency_hz: settings.source.frequency_hz,
                laps: settings.source.synthetic_laps,
                realtime: settings.source.realtime,
                ..Default::default()
            });
            let session = SessionInfo::new(0, "synthetic circuit", "synthetic car");
            (TelemetrySource::Synthetic(source), session)
        }
        SourceMode::Replay => {
            let path = settings
                .source
                .replay_path
                .clone()
                .unwrap_or_default();
            let track_name = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("replay")
                .to_string();
            let source = ReplayFrameSource::new(path, settings.source.speed_multiplier);
            let session = SessionInfo::new(0, track_name, "replay car");
            (TelemetrySource::Replay(source), session)
        }
    }
}

/// Setup Ctrl+C and SIGTERM signal handlers
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
