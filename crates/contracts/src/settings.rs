//! PipelineSettings - Config Loader output
//!
//! Describes a complete pipeline run: frame source, event-bus queue
//! capacities, lap-boundary detection, analysis thresholds, comparison
//! tolerance, and the upload sink.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Full pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PipelineSettings {
    /// Frame source selection
    #[serde(default)]
    #[validate(nested)]
    pub source: SourceSettings,

    /// Event bus queue capacities and drain behavior
    #[serde(default)]
    #[validate(nested)]
    pub bus: BusSettings,

    /// Lap boundary detection
    #[serde(default)]
    #[validate(nested)]
    pub assembler: AssemblerSettings,

    /// Metrics extraction thresholds
    #[serde(default)]
    #[validate(nested)]
    pub analysis: AnalysisSettings,

    /// Lap comparison tuning
    #[serde(default)]
    #[validate(nested)]
    pub comparison: ComparisonSettings,

    /// Upload/persistence sink
    #[serde(default)]
    pub upload: UploadSettings,
}

/// Where telemetry frames come from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMode {
    /// Replay a recorded JSON-lines telemetry file
    #[default]
    Replay,
    /// Generate a deterministic synthetic circuit
    Synthetic,
}

/// Frame source configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SourceSettings {
    #[serde(default)]
    pub mode: SourceMode,

    /// Telemetry file for replay mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replay_path: Option<PathBuf>,

    /// Replay speed multiplier; <= 0 replays as fast as possible
    #[serde(default = "default_speed_multiplier")]
    pub speed_multiplier: f64,

    /// Sample rate for the synthetic source (Hz)
    #[serde(default = "default_frequency_hz")]
    #[validate(range(min = 1.0, max = 1000.0))]
    pub frequency_hz: f64,

    /// Number of laps the synthetic source generates
    #[serde(default = "default_synthetic_laps")]
    #[validate(range(min = 1))]
    pub synthetic_laps: u32,

    /// Pace the synthetic source in real time instead of free-running
    #[serde(default)]
    pub realtime: bool,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            mode: SourceMode::Replay,
            replay_path: None,
            speed_multiplier: default_speed_multiplier(),
            frequency_hz: default_frequency_hz(),
            synthetic_laps: default_synthetic_laps(),
            realtime: false,
        }
    }
}

/// Event bus queue capacities.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BusSettings {
    /// Guaranteed-class queue depth (lifecycle + derived events)
    #[serde(default = "default_lifecycle_capacity")]
    #[validate(range(min = 1))]
    pub lifecycle_capacity: usize,

    /// Best-effort frame queue depth (most-recent-wins when full)
    #[serde(default = "default_frame_capacity")]
    #[validate(range(min = 1))]
    pub frame_capacity: usize,

    /// How long stop() drains queued events before giving up (ms)
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,

    /// Handler worker pool size; unset = available parallelism
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_threads: Option<usize>,
}

impl Default for BusSettings {
    fn default() -> Self {
        Self {
            lifecycle_capacity: default_lifecycle_capacity(),
            frame_capacity: default_frame_capacity(),
            drain_timeout_ms: default_drain_timeout_ms(),
            worker_threads: None,
        }
    }
}

/// What to do with a partially buffered lap when the session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartialLapPolicy {
    /// Drop the buffer; a partial lap time is not comparable
    #[default]
    Discard,
    /// Publish the buffer as a lap anyway (data-capture use cases)
    Flush,
}

/// Lap boundary detection configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssemblerSettings {
    /// Distance above which a frame counts as "near the finish line"
    #[serde(default = "default_wrap_high")]
    #[validate(range(min = 0.5, max = 1.0))]
    pub wrap_high: f64,

    /// Distance below which the next frame confirms a wrap
    #[serde(default = "default_wrap_low")]
    #[validate(range(min = 0.0, max = 0.5))]
    pub wrap_low: f64,

    /// Partial-lap handling at session end
    #[serde(default)]
    pub partial_lap_policy: PartialLapPolicy,
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self {
            wrap_high: default_wrap_high(),
            wrap_low: default_wrap_low(),
            partial_lap_policy: PartialLapPolicy::Discard,
        }
    }
}

/// Metrics extraction thresholds.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AnalysisSettings {
    /// Minimum brake input to count as braking
    #[serde(default = "default_brake_threshold")]
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub brake_threshold: f64,

    /// Frames used for the initial-deceleration window
    #[serde(default = "default_decel_window")]
    #[validate(range(min = 1))]
    pub decel_window: usize,

    /// Minimum |steering angle| (degrees) to count as cornering
    #[serde(default = "default_steering_threshold_deg")]
    #[validate(range(min = 0.1))]
    pub steering_threshold_deg: f64,

    /// Consecutive below-threshold frames required to confirm corner exit
    #[serde(default = "default_min_corner_frames")]
    #[validate(range(min = 1))]
    pub min_corner_frames: usize,

    /// Minimum throttle input to count as throttle application
    #[serde(default = "default_throttle_threshold")]
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub throttle_threshold: f64,

    /// Minimum |steering angle| (degrees) for trail-braking detection
    #[serde(default = "default_trail_steering_threshold_deg")]
    #[validate(range(min = 0.1))]
    pub trail_steering_threshold_deg: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            brake_threshold: default_brake_threshold(),
            decel_window: default_decel_window(),
            steering_threshold_deg: default_steering_threshold_deg(),
            min_corner_frames: default_min_corner_frames(),
            throttle_threshold: default_throttle_threshold(),
            trail_steering_threshold_deg: default_trail_steering_threshold_deg(),
        }
    }
}

/// Lap comparison configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ComparisonSettings {
    /// Maximum wrap-aware start/entry distance separation for a match
    #[serde(default = "default_distance_tolerance")]
    #[validate(range(exclusive_min = 0.0, max = 0.5))]
    pub distance_tolerance: f64,
}

impl Default for ComparisonSettings {
    fn default() -> Self {
        Self {
            distance_tolerance: default_distance_tolerance(),
        }
    }
}

/// Upload/persistence sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
    /// Register the upload handler on the bus
    #[serde(default)]
    pub enabled: bool,

    /// Directory laps and metrics are written under
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            output_dir: default_output_dir(),
        }
    }
}

/// Flat threshold bundle the extraction functions take.
///
/// Copyable so pure functions can take it by value or reference without
/// touching the settings tree.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisConfig {
    pub brake_threshold: f64,
    pub decel_window: usize,
    pub steering_threshold: f64,
    pub min_corner_frames: usize,
    pub throttle_threshold: f64,
    pub trail_steering_threshold: f64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        AnalysisSettings::default().to_config()
    }
}

impl AnalysisSettings {
    /// Flatten into the threshold bundle used by the extraction scans.
    pub fn to_config(&self) -> AnalysisConfig {
        AnalysisConfig {
            brake_threshold: self.brake_threshold,
            decel_window: self.decel_window,
            steering_threshold: self.steering_threshold_deg,
            min_corner_frames: self.min_corner_frames,
            throttle_threshold: self.throttle_threshold,
            trail_steering_threshold: self.trail_steering_threshold_deg,
        }
    }
}

fn default_speed_multiplier() -> f64 {
    1.0
}

fn default_frequency_hz() -> f64 {
    60.0
}

fn default_synthetic_laps() -> u32 {
    3
}

fn default_lifecycle_capacity() -> usize {
    10_000
}

fn default_frame_capacity() -> usize {
    1_024
}

fn default_drain_timeout_ms() -> u64 {
    5_000
}

fn default_wrap_high() -> f64 {
    0.95
}

fn default_wrap_low() -> f64 {
    0.05
}

fn default_brake_threshold() -> f64 {
    0.05
}

fn default_decel_window() -> usize {
    5
}

fn default_steering_threshold_deg() -> f64 {
    5.0
}

fn default_min_corner_frames() -> usize {
    10
}

fn default_throttle_threshold() -> f64 {
    0.05
}

fn default_trail_steering_threshold_deg() -> f64 {
    5.0
}

fn default_distance_tolerance() -> f64 {
    0.10
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./laps")
}
