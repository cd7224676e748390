//! Event - Event Bus payload
//!
//! Ownership of an event transfers to the bus on publish; each handler
//! invocation sees a shared reference. Large payloads sit behind `Arc` so
//! fan-out never copies frame buffers.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Lap, LapMetrics, SessionInfo, TelemetryFrame};

/// Delivery guarantee for an event kind.
///
/// Guaranteed events go through a generously sized queue that blocks the
/// publisher only as a last resort. BestEffort events are most-recent-wins:
/// a full queue drops the oldest unconsumed item instead of blocking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryClass {
    Guaranteed,
    BestEffort,
}

/// Discriminant for event routing and subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    SessionStart,
    SessionEnd,
    Frame,
    LapCompleted,
    MetricsExtracted,
}

impl EventKind {
    /// All kinds, in a fixed order. Used to pre-build routing tables.
    pub const ALL: [EventKind; 5] = [
        EventKind::SessionStart,
        EventKind::SessionEnd,
        EventKind::Frame,
        EventKind::LapCompleted,
        EventKind::MetricsExtracted,
    ];

    /// Delivery class for this kind. Only the 60 Hz raw frame stream is
    /// best-effort; lifecycle and derived events must never be lost.
    pub fn delivery_class(self) -> DeliveryClass {
        match self {
            EventKind::Frame => DeliveryClass::BestEffort,
            _ => DeliveryClass::Guaranteed,
        }
    }

    /// Stable label for logging and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::SessionStart => "session_start",
            EventKind::SessionEnd => "session_end",
            EventKind::Frame => "frame",
            EventKind::LapCompleted => "lap_completed",
            EventKind::MetricsExtracted => "metrics_extracted",
        }
    }
}

/// Payload carried by an event.
#[derive(Debug, Clone)]
pub enum EventPayload {
    /// A telemetry session has started
    SessionStart(SessionInfo),

    /// A telemetry session has ended
    SessionEnd { session_id: Uuid },

    /// Raw telemetry sample from the frame source
    Frame(TelemetryFrame),

    /// A lap boundary was crossed and the lap is fully assembled
    LapCompleted { session_id: Uuid, lap: Arc<Lap> },

    /// Per-lap metrics were extracted
    MetricsExtracted {
        session_id: Uuid,
        lap_number: i32,
        metrics: Arc<LapMetrics>,
    },
}

/// An event on the bus: payload plus publish timestamp.
#[derive(Debug, Clone)]
pub struct Event {
    pub payload: EventPayload,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    /// Wrap a payload, stamping the current time.
    pub fn new(payload: EventPayload) -> Self {
        Self {
            payload,
            timestamp: Utc::now(),
        }
    }

    /// Routing discriminant for this event.
    pub fn kind(&self) -> EventKind {
        match self.payload {
            EventPayload::SessionStart(_) => EventKind::SessionStart,
            EventPayload::SessionEnd { .. } => EventKind::SessionEnd,
            EventPayload::Frame(_) => EventKind::Frame,
            EventPayload::LapCompleted { .. } => EventKind::LapCompleted,
            EventPayload::MetricsExtracted { .. } => EventKind::MetricsExtracted,
        }
    }

    /// Delivery class, derived from the kind.
    pub fn delivery_class(&self) -> DeliveryClass {
        self.kind().delivery_class()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrackSurface;

    fn frame() -> TelemetryFrame {
        TelemetryFrame {
            timestamp: Utc::now(),
            session_time: 0.0,
            lap_number: 1,
            lap_distance_pct: 0.0,
            speed: 0.0,
            throttle: 0.0,
            brake: 0.0,
            steering_angle: 0.0,
            lateral_acceleration: 0.0,
            longitudinal_acceleration: 0.0,
            track_surface: TrackSurface::OnTrack,
        }
    }

    #[test]
    fn test_kind_routing() {
        let ev = Event::new(EventPayload::Frame(frame()));
        assert_eq!(ev.kind(), EventKind::Frame);
        assert_eq!(ev.delivery_class(), DeliveryClass::BestEffort);

        let ev = Event::new(EventPayload::SessionEnd {
            session_id: Uuid::new_v4(),
        });
        assert_eq!(ev.kind(), EventKind::SessionEnd);
        assert_eq!(ev.delivery_class(), DeliveryClass::Guaranteed);
    }

    #[test]
    fn test_all_kinds_cover_payloads() {
        assert_eq!(EventKind::ALL.len(), 5);
    }
}
