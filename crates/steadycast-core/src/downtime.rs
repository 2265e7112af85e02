// Downtime event domain types
//
// A DowntimeEvent records one period during which the broadcast was offline
// or degraded, why it happened, and what was done about it. The failure
// escalator is the sole writer of these records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of failure that caused downtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// Output connection to the distribution endpoint dropped
    ConnectionLost,
    /// Control surface became unreachable or unresponsive
    SurfaceCrash,
    /// A content item failed to play or the catalog was empty
    ContentFailure,
    /// Network bandwidth insufficient for the configured quality
    NetworkDegraded,
    /// Output stopped by hand outside this system
    ManualStop,
}

impl FailureCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureCause::ConnectionLost => "connection_lost",
            FailureCause::SurfaceCrash => "surface_crash",
            FailureCause::ContentFailure => "content_failure",
            FailureCause::NetworkDegraded => "network_degraded",
            FailureCause::ManualStop => "manual_stop",
        }
    }
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for FailureCause {
    fn from(s: &str) -> Self {
        match s {
            "connection_lost" => FailureCause::ConnectionLost,
            "surface_crash" => FailureCause::SurfaceCrash,
            "content_failure" => FailureCause::ContentFailure,
            "network_degraded" => FailureCause::NetworkDegraded,
            _ => FailureCause::ManualStop,
        }
    }
}

/// Period when the broadcast was offline or degraded
///
/// Invariants:
/// - `end_time > start_time` when set; `end_time == None` means ongoing
/// - `duration_sec` is derived on close, never authoritative before it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DowntimeEvent {
    pub id: Uuid,
    /// Parent broadcast session
    pub broadcast_session_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Derived duration in seconds; 0.0 while ongoing
    pub duration_sec: f64,
    pub cause: FailureCause,
    /// Narrative of recovery steps, extended as attempts proceed
    pub recovery_action: String,
    /// True if recovery was automatic, false if a human intervened
    pub automatic_recovery: bool,
}

impl DowntimeEvent {
    /// Open a new downtime event starting now
    pub fn open(
        broadcast_session_id: Uuid,
        cause: FailureCause,
        initial_action: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            broadcast_session_id,
            start_time: now,
            end_time: None,
            duration_sec: 0.0,
            cause,
            recovery_action: initial_action.into(),
            automatic_recovery: true,
        }
    }

    /// Whether the downtime is still ongoing
    pub fn is_ongoing(&self) -> bool {
        self.end_time.is_none()
    }

    /// Extend the recovery narrative with another step
    pub fn append_action(&mut self, action: &str) {
        self.recovery_action = format!("{} -> {}", self.recovery_action, action);
    }

    /// Close the event: set end time and derive the duration
    pub fn close(&mut self, final_action: &str, now: DateTime<Utc>) {
        self.end_time = Some(now);
        self.duration_sec = (now - self.start_time).num_milliseconds().max(0) as f64 / 1000.0;
        self.append_action(final_action);
    }
}
