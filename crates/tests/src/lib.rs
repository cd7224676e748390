//! # Integration Tests
//!
//! End-to-end tests over the full pipeline:
//! - synthetic source -> collector -> bus -> assembler -> extractor
//! - backpressure behavior under sustained publish pressure
//! - handler isolation
//! - lap partition and comparison properties

#[cfg(test)]
mod support {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::Utc;

    use contracts::{
        Event, EventPayload, Lap, LapMetrics, TelemetryFrame, TrackSurface,
    };
    use event_bus::{EventHandler, HandlerContext, HandlerError};

    /// Captures laps and metrics as they come off the bus.
    pub struct CaptureHandler {
        pub laps: Arc<Mutex<Vec<Arc<Lap>>>>,
        pub metrics: Arc<Mutex<Vec<Arc<LapMetrics>>>>,
    }

    impl CaptureHandler {
        pub fn new() -> Self {
            Self {
                laps: Arc::new(Mutex::new(Vec::new())),
                metrics: Arc::new(Mutex::new(Vec::new())),
            }
        }
    }

    #[async_trait]
    impl EventHandler for CaptureHandler {
        fn name(&self) -> &'static str {
            "capture"
        }

        async fn handle(&self, event: &Event, _ctx: &HandlerContext) -> Result<(), HandlerError> {
            match &event.payload {
                EventPayload::LapCompleted { lap, .. } => {
                    self.laps.lock().unwrap().push(Arc::clone(lap));
                }
                EventPayload::MetricsExtracted { metrics, .. } => {
                    self.metrics.lock().unwrap().push(Arc::clone(metrics));
                }
                _ => {}
            }
            Ok(())
        }
    }

    /// Always fails; used to prove isolation.
    pub struct AlwaysFails;

    #[async_trait]
    impl EventHandler for AlwaysFails {
        fn name(&self) -> &'static str {
            "always_fails"
        }

        async fn handle(&self, _event: &Event, _ctx: &HandlerContext) -> Result<(), HandlerError> {
            Err(HandlerError::Processing("induced failure".into()))
        }
    }

    pub fn plain_frame(session_time: f64, lap_number: i32, distance: f64) -> TelemetryFrame {
        TelemetryFrame {
            timestamp: Utc::now(),
            session_time,
            lap_number,
            lap_distance_pct: distance,
            speed: 60.0,
            throttle: 0.7,
            brake: 0.0,
            steering_angle: 0.0,
            lateral_acceleration: 0.0,
            longitudinal_acceleration: 0.0,
            track_surface: TrackSurface::OnTrack,
        }
    }
}

#[cfg(test)]
mod pipeline_tests {
    use std::sync::Arc;

    use analysis::{LapAssembler, MetricsExtractor};
    use contracts::{
        AnalysisConfig, AssemblerSettings, EventKind, PartialLapPolicy, SessionInfo,
    };
    use event_bus::{BusConfig, EventBus};
    use ingestion::{FrameCollector, SyntheticFrameSource, SyntheticSourceConfig};

    use crate::support::CaptureHandler;

    fn assembler_settings(policy: PartialLapPolicy) -> AssemblerSettings {
        AssemblerSettings {
            partial_lap_policy: policy,
            ..Default::default()
        }
    }

    /// Full chain: synthetic source -> collector -> bus -> assembler ->
    /// extractor -> capture.
    #[tokio::test]
    async fn test_e2e_synthetic_pipeline() {
        let mut bus = EventBus::new(BusConfig {
            // Large enough that no frame can drop: the lossless partition
            // property below depends on it.
            frame_capacity: 8_192,
            ..Default::default()
        });

        let assembler = Arc::new(LapAssembler::new(assembler_settings(PartialLapPolicy::Flush)));
        bus.subscribe(EventKind::SessionStart, assembler.clone());
        bus.subscribe(EventKind::SessionEnd, assembler.clone());
        bus.subscribe(EventKind::Frame, assembler);

        let extractor = Arc::new(MetricsExtractor::new(AnalysisConfig::default()));
        bus.subscribe(EventKind::LapCompleted, extractor);

        let capture = Arc::new(CaptureHandler::new());
        let laps = Arc::clone(&capture.laps);
        let metrics = Arc::clone(&capture.metrics);
        bus.subscribe(EventKind::LapCompleted, capture.clone());
        bus.subscribe(EventKind::MetricsExtracted, capture);

        bus.start();

        let source = SyntheticFrameSource::new(SyntheticSourceConfig {
            frequency_hz: 60.0,
            laps: 2,
            lap_seconds: 30.0,
            realtime: false,
        });
        let collector = FrameCollector::new(source, SessionInfo::new(0, "circuit", "car"));
        let stats = collector.run(bus.publisher()).await.unwrap();
        assert_eq!(stats.frames_published, 2 * 1_800);

        let bus_stats = bus.stop().await;
        assert_eq!(bus_stats.dropped, 0);

        // With Flush, both laps come out: one at the boundary, one at
        // session end.
        let laps = laps.lock().unwrap();
        assert_eq!(laps.len(), 2);
        assert_eq!(laps[0].lap_number, 1);
        assert_eq!(laps[1].lap_number, 2);
        assert!(laps.iter().all(|lap| lap.is_valid));

        // Lossless, order-preserving partition of the frame stream.
        let total_frames: usize = laps.iter().map(|lap| lap.len()).sum();
        assert_eq!(total_frames, 3_600);
        let mut last_time = f64::NEG_INFINITY;
        for lap in laps.iter() {
            for frame in &lap.frames {
                assert!(frame.session_time >= last_time);
                last_time = frame.session_time;
            }
        }

        // Every lap got metrics with the synthetic circuit's three
        // corners and three braking zones.
        let metrics = metrics.lock().unwrap();
        assert_eq!(metrics.len(), 2);
        for lap_metrics in metrics.iter() {
            assert_eq!(lap_metrics.braking_zones.len(), 3);
            assert_eq!(lap_metrics.corners.len(), 3);
        }
    }

    #[tokio::test]
    async fn test_partial_lap_discarded_by_default() {
        let mut bus = EventBus::new(BusConfig {
            frame_capacity: 8_192,
            ..Default::default()
        });

        let assembler = Arc::new(LapAssembler::new(assembler_settings(PartialLapPolicy::Discard)));
        bus.subscribe(EventKind::SessionStart, assembler.clone());
        bus.subscribe(EventKind::SessionEnd, assembler.clone());
        bus.subscribe(EventKind::Frame, assembler);

        let capture = Arc::new(CaptureHandler::new());
        let laps = Arc::clone(&capture.laps);
        bus.subscribe(EventKind::LapCompleted, capture);

        bus.start();

        let source = SyntheticFrameSource::new(SyntheticSourceConfig {
            frequency_hz: 60.0,
            laps: 2,
            lap_seconds: 20.0,
            realtime: false,
        });
        let collector = FrameCollector::new(source, SessionInfo::new(0, "circuit", "car"));
        collector.run(bus.publisher()).await.unwrap();
        bus.stop().await;

        // Lap 2's buffer is dropped at session end; only lap 1 emerges.
        let laps = laps.lock().unwrap();
        assert_eq!(laps.len(), 1);
        assert_eq!(laps[0].lap_number, 1);
    }
}

#[cfg(test)]
mod backpressure_tests {
    use std::sync::Arc;

    use contracts::{Event, EventKind, EventPayload};
    use event_bus::{BusConfig, EventBus};

    use crate::support::{plain_frame, CaptureHandler};

    /// Publishing 10,000 frames against a capacity-1,000 queue with no
    /// consumer retains exactly the newest 1,000, reports a non-zero
    /// dropped counter, and never blocks the producer.
    #[tokio::test]
    async fn test_sustained_pressure_keeps_newest_1000() {
        let mut bus = EventBus::new(BusConfig {
            frame_capacity: 1_000,
            ..Default::default()
        });

        for i in 0..10_000 {
            bus.publish(Event::new(EventPayload::Frame(plain_frame(
                i as f64, 1, 0.0,
            ))))
            .await
            .unwrap();
        }

        assert_eq!(bus.frame_queue_len(), 1_000);
        let live = bus.stats();
        assert_eq!(live.published, 10_000);
        assert_eq!(live.dropped, 9_000);

        // Drain what survived and check it is exactly the newest window.
        let capture = Arc::new(CaptureHandler::new());
        bus.subscribe(EventKind::Frame, capture.clone());
        let recorder = Arc::new(FrameTimes::default());
        bus.subscribe(EventKind::Frame, recorder.clone());
        bus.start();
        bus.stop().await;

        let times = recorder.times.lock().unwrap();
        assert_eq!(times.len(), 1_000);
        assert_eq!(times[0], 9_000.0);
        assert_eq!(times[999], 9_999.0);
    }

    #[derive(Default)]
    struct FrameTimes {
        times: std::sync::Mutex<Vec<f64>>,
    }

    #[async_trait::async_trait]
    impl event_bus::EventHandler for FrameTimes {
        fn name(&self) -> &'static str {
            "frame_times"
        }

        async fn handle(
            &self,
            event: &Event,
            _ctx: &event_bus::HandlerContext,
        ) -> Result<(), event_bus::HandlerError> {
            if let EventPayload::Frame(frame) = &event.payload {
                self.times.lock().unwrap().push(frame.session_time);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod isolation_tests {
    use std::sync::Arc;

    use analysis::LapAssembler;
    use contracts::{AssemblerSettings, Event, EventKind, EventPayload, SessionInfo};
    use event_bus::{BusConfig, EventBus};
    use uuid::Uuid;

    use crate::support::{plain_frame, AlwaysFails, CaptureHandler};

    /// A handler that always fails must not stop laps from being built
    /// from the same frame stream.
    #[tokio::test]
    async fn test_failing_sibling_does_not_block_assembly() {
        let mut bus = EventBus::new(BusConfig {
            frame_capacity: 4_096,
            ..Default::default()
        });

        bus.subscribe(EventKind::Frame, Arc::new(AlwaysFails));

        let assembler = Arc::new(LapAssembler::new(AssemblerSettings::default()));
        bus.subscribe(EventKind::SessionStart, assembler.clone());
        bus.subscribe(EventKind::Frame, assembler);

        let capture = Arc::new(CaptureHandler::new());
        let laps = Arc::clone(&capture.laps);
        bus.subscribe(EventKind::LapCompleted, capture);

        bus.start();

        let session = SessionInfo::new(0, "t", "c");
        bus.publish(Event::new(EventPayload::SessionStart(session)))
            .await
            .unwrap();

        // Two laps' worth of frames via an explicit lap-number change.
        for i in 0..100 {
            bus.publish(Event::new(EventPayload::Frame(plain_frame(
                i as f64 * 0.016,
                1,
                i as f64 / 100.0,
            ))))
            .await
            .unwrap();
        }
        for i in 0..100 {
            bus.publish(Event::new(EventPayload::Frame(plain_frame(
                (100 + i) as f64 * 0.016,
                2,
                i as f64 / 100.0,
            ))))
            .await
            .unwrap();
        }
        bus.publish(Event::new(EventPayload::SessionEnd {
            session_id: Uuid::new_v4(),
        }))
        .await
        .unwrap();

        let stats = bus.stop().await;

        // Every frame hit the failing handler, and lap 1 still came out.
        assert!(stats.handler_errors >= 200);
        let laps = laps.lock().unwrap();
        assert_eq!(laps.len(), 1);
        assert_eq!(laps[0].lap_number, 1);
        assert_eq!(laps[0].len(), 100);
    }
}

#[cfg(test)]
mod scenario_tests {
    use analysis::{compare, extract_braking_zones, extract_lap_metrics, CompareConfig};
    use contracts::{AnalysisConfig, Lap, TelemetryFrame};

    use crate::support::plain_frame;

    /// 5,400 synthetic frames (90 s @ 60 Hz) with one braking event
    /// between frames 1000 and 1100 yield exactly one braking zone
    /// bounded near those frames' distances.
    #[test]
    fn test_single_braking_event_scenario() {
        let total = 5_400usize;
        let frames: Vec<TelemetryFrame> = (0..total)
            .map(|i| {
                let mut frame = plain_frame(i as f64 / 60.0, 1, i as f64 / total as f64);
                if (1_000..1_100).contains(&i) {
                    frame.brake = 0.8;
                    frame.throttle = 0.0;
                    frame.speed = 70.0 - (i - 1_000) as f64 * 0.3;
                }
                frame
            })
            .collect();

        let zones = extract_braking_zones(&frames, &AnalysisConfig::default());
        assert_eq!(zones.len(), 1);

        let zone = &zones[0];
        let expected_start = 1_000.0 / total as f64;
        let expected_end = 1_099.0 / total as f64;
        assert!((zone.start_distance - expected_start).abs() < 1e-9);
        assert!((zone.end_distance - expected_end).abs() < 1e-9);
        assert_eq!(zone.entry_speed, 70.0);
        assert!(zone.min_speed < zone.entry_speed);
        assert!(zone.average_deceleration < 0.0);
    }

    /// Two identical laps compared yield full matches with zero deltas.
    #[test]
    fn test_identical_lap_comparison_scenario() {
        // A realistic lap: straight, braking zone, corner, straight.
        let mut frames = Vec::new();
        for i in 0..200 {
            frames.push(plain_frame(i as f64 / 60.0, 1, i as f64 / 1_000.0));
        }
        for i in 200..280 {
            let mut f = plain_frame(i as f64 / 60.0, 1, i as f64 / 1_000.0);
            f.brake = 0.85;
            f.throttle = 0.0;
            f.speed = 60.0 - (i - 200) as f64 * 0.25;
            frames.push(f);
        }
        for i in 280..400 {
            let mut f = plain_frame(i as f64 / 60.0, 1, i as f64 / 1_000.0);
            f.steering_angle = 12.0;
            f.lateral_acceleration = 2.4;
            f.speed = 40.0;
            f.throttle = if i > 340 { 0.5 } else { 0.0 };
            frames.push(f);
        }
        for i in 400..1_000 {
            frames.push(plain_frame(i as f64 / 60.0, 1, i as f64 / 1_000.0));
        }

        let lap = Lap::from_frames(1, frames);
        let metrics = extract_lap_metrics(&lap, &AnalysisConfig::default());
        assert_eq!(metrics.braking_zones.len(), 1);
        assert_eq!(metrics.corners.len(), 1);

        let result = compare(&metrics, &metrics, &CompareConfig::default());
        assert_eq!(result.summary.matched_braking_zones, 1);
        assert_eq!(result.summary.matched_corners, 1);
        assert_eq!(result.summary.lap_time_delta, Some(0.0));
        assert!(result.unmatched_candidate_zones.is_empty());
        assert!(result.unmatched_candidate_corners.is_empty());
        assert_eq!(result.braking_zones[0].entry_speed_delta, Some(0.0));
        assert_eq!(result.corners[0].apex_speed_delta, Some(0.0));
    }
}
