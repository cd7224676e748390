//! Corner extraction.
//!
//! Two-state scan over |steering angle| with exit hysteresis: a corner
//! only closes after `min_corner_frames` consecutive below-threshold
//! frames, which suppresses flapping at the detection boundary.

use contracts::{AnalysisConfig, Corner, TelemetryFrame};

use crate::math::wrap_delta;

/// Tracking state for one open corner.
struct OpenCorner {
    entry_idx: usize,
    /// First frame of the current below-threshold run, if one is active
    quiet_start: Option<usize>,
    quiet_len: usize,
}

/// Extract all corners from a lap's frames.
///
/// Enter when |steering| exceeds the threshold. While inside, below-
/// threshold frames only close the corner once `min_corner_frames` of
/// them arrive consecutively; the exit is anchored at the first frame of
/// that quiet run. Steering re-crossing the threshold before confirmation
/// keeps the corner open (a chicane blip, not an exit). A corner still
/// open at the end of the slice finalizes at the last frame.
pub fn extract_corners(frames: &[TelemetryFrame], config: &AnalysisConfig) -> Vec<Corner> {
    let mut corners = Vec::new();
    let mut open: Option<OpenCorner> = None;

    for (idx, frame) in frames.iter().enumerate() {
        let turning = frame.steering_angle.abs() > config.steering_threshold;

        if let Some(corner) = open.as_mut() {
            if turning {
                corner.quiet_start = None;
                corner.quiet_len = 0;
            } else {
                if corner.quiet_start.is_none() {
                    corner.quiet_start = Some(idx);
                }
                corner.quiet_len += 1;
            }
        } else if turning {
            open = Some(OpenCorner {
                entry_idx: idx,
                quiet_start: None,
                quiet_len: 0,
            });
        }

        let exit_confirmed = open
            .as_ref()
            .map_or(false, |corner| corner.quiet_len >= config.min_corner_frames);
        if exit_confirmed {
            if let Some(corner) = open.take() {
                let exit_idx = corner.quiet_start.unwrap_or(idx);
                corners.push(finalize_corner(frames, corner.entry_idx, exit_idx, config));
            }
        }
    }

    if let Some(corner) = open.take() {
        let exit_idx = corner.quiet_start.unwrap_or(frames.len() - 1);
        corners.push(finalize_corner(frames, corner.entry_idx, exit_idx, config));
    }

    corners
}

/// Compute the corner record from its confirmed [entry, exit] frame range.
///
/// The apex is the frame of maximum |lateral acceleration| in the range
/// (first such frame on ties), which keeps entry <= apex <= exit by
/// construction.
fn finalize_corner(
    frames: &[TelemetryFrame],
    entry_idx: usize,
    exit_idx: usize,
    config: &AnalysisConfig,
) -> Corner {
    let entry = &frames[entry_idx];
    let exit = &frames[exit_idx];

    let mut apex_idx = entry_idx;
    let mut max_lateral_g = frames[entry_idx].lateral_acceleration.abs();
    let mut min_speed = f64::INFINITY;
    for (idx, frame) in frames[entry_idx..=exit_idx].iter().enumerate() {
        min_speed = min_speed.min(frame.speed);
        let lateral = frame.lateral_acceleration.abs();
        if lateral > max_lateral_g {
            max_lateral_g = lateral;
            apex_idx = entry_idx + idx;
        }
    }
    let apex = &frames[apex_idx];

    // First post-apex throttle application; the exit frame stands in when
    // the driver never got back on throttle inside the corner.
    let throttle_application_distance = frames[apex_idx..=exit_idx]
        .iter()
        .find(|f| f.throttle > config.throttle_threshold)
        .map(|f| f.lap_distance_pct)
        .unwrap_or(exit.lap_distance_pct);

    Corner {
        entry_distance: entry.lap_distance_pct,
        apex_distance: apex.lap_distance_pct,
        exit_distance: exit.lap_distance_pct,
        entry_speed: entry.speed,
        apex_speed: apex.speed,
        exit_speed: exit.speed,
        min_speed,
        max_lateral_g,
        throttle_application_distance,
        apex_steering_angle: apex.steering_angle,
        is_left_turn: apex.steering_angle < 0.0,
        time_in_corner: exit.session_time - entry.session_time,
        corner_distance: wrap_delta(exit.lap_distance_pct - entry.lap_distance_pct),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use contracts::TrackSurface;

    fn frame(
        steering: f64,
        speed: f64,
        lateral_g: f64,
        distance: f64,
        session_time: f64,
        throttle: f64,
    ) -> TelemetryFrame {
        TelemetryFrame {
            timestamp: Utc::now(),
            session_time,
            lap_number: 1,
            lap_distance_pct: distance,
            speed,
            throttle,
            brake: 0.0,
            steering_angle: steering,
            lateral_acceleration: lateral_g,
            longitudinal_acceleration: 0.0,
            track_surface: TrackSurface::OnTrack,
        }
    }

    /// Config with a short hysteresis window so tests stay compact.
    fn config() -> AnalysisConfig {
        AnalysisConfig {
            min_corner_frames: 3,
            ..AnalysisConfig::default()
        }
    }

    fn straight_run(n: usize, start_distance: f64, start_time: f64) -> Vec<TelemetryFrame> {
        (0..n)
            .map(|i| {
                frame(
                    0.0,
                    60.0,
                    0.0,
                    start_distance + i as f64 * 0.01,
                    start_time + i as f64 * 0.1,
                    0.6,
                )
            })
            .collect()
    }

    #[test]
    fn test_no_corners_on_straight() {
        let frames = straight_run(20, 0.0, 0.0);
        assert!(extract_corners(&frames, &config()).is_empty());
    }

    #[test]
    fn test_single_corner() {
        let mut frames = vec![
            frame(0.0, 60.0, 0.0, 0.30, 0.0, 0.5),
            frame(8.0, 55.0, 1.5, 0.32, 0.5, 0.0),
            frame(12.0, 45.0, 2.5, 0.35, 1.0, 0.0),
            frame(8.0, 50.0, 2.0, 0.38, 1.5, 0.1),
        ];
        frames.extend(straight_run(5, 0.40, 2.0));

        let corners = extract_corners(&frames, &config());
        assert_eq!(corners.len(), 1);

        let corner = &corners[0];
        assert_eq!(corner.entry_distance, 0.32);
        assert_eq!(corner.entry_speed, 55.0);
        assert_eq!(corner.apex_distance, 0.35);
        assert_eq!(corner.apex_speed, 45.0);
        assert_eq!(corner.max_lateral_g, 2.5);
        assert_eq!(corner.min_speed, 45.0);
        assert!(!corner.is_left_turn);
        // Exit anchored at the first quiet frame
        assert_eq!(corner.exit_distance, 0.40);
    }

    #[test]
    fn test_left_turn_sign() {
        let mut frames = vec![
            frame(-8.0, 55.0, 1.5, 0.10, 0.0, 0.0),
            frame(-12.0, 45.0, 2.5, 0.12, 0.5, 0.0),
        ];
        frames.extend(straight_run(5, 0.14, 1.0));

        let corners = extract_corners(&frames, &config());
        assert_eq!(corners.len(), 1);
        assert!(corners[0].is_left_turn);
        assert_eq!(corners[0].apex_steering_angle, -12.0);
    }

    #[test]
    fn test_hysteresis_bridges_chicane_blip() {
        // Steering dips below threshold for 2 frames (< min_corner_frames)
        // mid-corner; the scan must keep one corner, not split it.
        let mut frames = vec![
            frame(10.0, 50.0, 2.0, 0.10, 0.0, 0.0),
            frame(12.0, 48.0, 2.2, 0.12, 0.2, 0.0),
            frame(2.0, 47.0, 0.5, 0.14, 0.4, 0.0),
            frame(1.0, 47.0, 0.4, 0.16, 0.6, 0.0),
            frame(-11.0, 46.0, 2.6, 0.18, 0.8, 0.0),
            frame(-9.0, 48.0, 2.1, 0.20, 1.0, 0.1),
        ];
        frames.extend(straight_run(5, 0.22, 1.2));

        let corners = extract_corners(&frames, &config());
        assert_eq!(corners.len(), 1);
        // Apex is the second half's peak lateral load
        assert_eq!(corners[0].apex_distance, 0.18);
        assert!(corners[0].is_left_turn);
    }

    #[test]
    fn test_short_noise_spike_exits_after_hysteresis() {
        // Corner, then exactly min_corner_frames quiet frames, then a new
        // corner: two distinct corners.
        let mut frames = vec![
            frame(10.0, 50.0, 2.0, 0.10, 0.0, 0.0),
            frame(10.0, 48.0, 2.2, 0.12, 0.2, 0.0),
        ];
        frames.extend(straight_run(3, 0.14, 0.4));
        frames.push(frame(-10.0, 50.0, 1.8, 0.20, 0.8, 0.0));
        frames.push(frame(-10.0, 49.0, 2.4, 0.22, 1.0, 0.0));
        frames.extend(straight_run(3, 0.24, 1.2));

        let corners = extract_corners(&frames, &config());
        assert_eq!(corners.len(), 2);
        assert!(!corners[0].is_left_turn);
        assert!(corners[1].is_left_turn);
    }

    #[test]
    fn test_corner_open_at_end_finalizes() {
        let frames = vec![
            frame(0.0, 60.0, 0.0, 0.90, 0.0, 0.5),
            frame(10.0, 45.0, 2.0, 0.95, 1.0, 0.0),
            frame(11.0, 40.0, 2.5, 0.99, 2.0, 0.0),
        ];
        let corners = extract_corners(&frames, &config());
        assert_eq!(corners.len(), 1);
        assert_eq!(corners[0].exit_distance, 0.99);
    }

    #[test]
    fn test_entry_apex_exit_order_under_wrap() {
        let mut frames = vec![
            frame(10.0, 45.0, 2.0, 0.98, 0.0, 0.0),
            frame(11.0, 40.0, 2.5, 0.02, 0.5, 0.0),
            frame(9.0, 42.0, 2.2, 0.05, 1.0, 0.1),
        ];
        frames.extend(straight_run(5, 0.07, 1.5));

        let corners = extract_corners(&frames, &config());
        assert_eq!(corners.len(), 1);

        let corner = &corners[0];
        let entry_to_apex = wrap_delta(corner.apex_distance - corner.entry_distance);
        let entry_to_exit = wrap_delta(corner.exit_distance - corner.entry_distance);
        assert!(entry_to_apex <= entry_to_exit);
        // 0.98 -> 0.07 spans 0.09
        assert!((corner.corner_distance - 0.09).abs() < 1e-10);
    }

    #[test]
    fn test_throttle_application_post_apex() {
        let mut frames = vec![
            frame(10.0, 50.0, 1.5, 0.30, 0.0, 0.3), // entry, still rolling throttle
            frame(12.0, 45.0, 2.5, 0.33, 0.5, 0.0), // apex, off throttle
            frame(8.0, 47.0, 1.8, 0.36, 1.0, 0.0),
            frame(6.0, 50.0, 1.2, 0.39, 1.5, 0.2), // back on throttle
        ];
        frames.extend(straight_run(5, 0.41, 2.0));

        let corners = extract_corners(&frames, &config());
        let corner = &corners[0];
        // Pre-apex throttle must not count
        assert_eq!(corner.throttle_application_distance, 0.39);
    }

    #[test]
    fn test_empty_frames() {
        let frames: Vec<TelemetryFrame> = vec![];
        assert!(extract_corners(&frames, &config()).is_empty());
    }
}
