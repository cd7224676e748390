//! SessionInfo - metadata for one telemetry session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity and context of a telemetry session.
///
/// Created by the collector when a source connects; carried on
/// session-lifecycle events and attached to every derived artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Unique session identity
    pub session_id: Uuid,

    /// Session start (wall clock)
    pub timestamp: DateTime<Utc>,

    /// Simulator track identifier
    pub track_id: i32,

    /// Track display name
    pub track_name: String,

    /// Track layout variant, if any
    pub track_config_name: Option<String>,

    /// Car display name
    pub car_name: String,
}

impl SessionInfo {
    /// New session with a fresh identity.
    pub fn new(track_id: i32, track_name: impl Into<String>, car_name: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            track_id,
            track_name: track_name.into(),
            track_config_name: None,
            car_name: car_name.into(),
        }
    }
}
