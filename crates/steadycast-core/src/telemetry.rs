// Health telemetry domain types
//
// One HealthMetric row is written per sampler tick. Rows are immutable once
// written; the metric stream has no gaps even when the control surface is
// unreachable (the sampler writes an offline row instead of skipping).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dropped-frame percentage above which a metric counts as degraded
pub const DEGRADED_DROP_PCT: f64 = 1.0;

/// Connection state of the output pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Degraded,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Degraded => "degraded",
        }
    }
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for ConnectionStatus {
    fn from(s: &str) -> Self {
        match s {
            "connected" => ConnectionStatus::Connected,
            "degraded" => ConnectionStatus::Degraded,
            _ => ConnectionStatus::Disconnected,
        }
    }
}

/// Output state as reported by the control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputState {
    Running,
    Stopped,
    Starting,
    Stopping,
}

impl OutputState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputState::Running => "running",
            OutputState::Stopped => "stopped",
            OutputState::Starting => "starting",
            OutputState::Stopping => "stopping",
        }
    }
}

impl std::fmt::Display for OutputState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for OutputState {
    fn from(s: &str) -> Self {
        match s {
            "running" => OutputState::Running,
            "starting" => OutputState::Starting,
            "stopping" => OutputState::Stopping,
            _ => OutputState::Stopped,
        }
    }
}

/// Point-in-time broadcast health measurement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthMetric {
    pub id: Uuid,
    /// Parent broadcast session
    pub broadcast_session_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub bitrate_kbps: f64,
    /// Percentage of dropped frames (0-100)
    pub dropped_frames_pct: f64,
    /// System CPU usage percentage (0-100)
    pub cpu_usage_pct: f64,
    pub active_scene: String,
    /// Currently playing content title, if automated playback is running
    pub active_content: Option<String>,
    pub connection_status: ConnectionStatus,
    pub output_state: OutputState,
}

impl HealthMetric {
    /// Metric row written when the control surface itself is unreachable:
    /// zeroed counters, disconnected/stopped status, unknown scene
    pub fn offline(broadcast_session_id: Uuid, cpu_usage_pct: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            broadcast_session_id,
            timestamp: now,
            bitrate_kbps: 0.0,
            dropped_frames_pct: 0.0,
            cpu_usage_pct,
            active_scene: "Unknown".to_string(),
            active_content: None,
            connection_status: ConnectionStatus::Disconnected,
            output_state: OutputState::Stopped,
        }
    }

    /// Whether quality is degraded (dropped frames above the threshold)
    pub fn is_degraded(&self) -> bool {
        self.dropped_frames_pct > DEGRADED_DROP_PCT
    }

    /// Whether the broadcast is healthy: connected, running, not degraded
    pub fn is_healthy(&self) -> bool {
        self.connection_status == ConnectionStatus::Connected
            && self.output_state == OutputState::Running
            && !self.is_degraded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(drop_pct: f64) -> HealthMetric {
        HealthMetric {
            id: Uuid::now_v7(),
            broadcast_session_id: Uuid::now_v7(),
            timestamp: Utc::now(),
            bitrate_kbps: 6000.0,
            dropped_frames_pct: drop_pct,
            cpu_usage_pct: 40.0,
            active_scene: "Automated Content".to_string(),
            active_content: Some("clip.mp4".to_string()),
            connection_status: ConnectionStatus::Connected,
            output_state: OutputState::Running,
        }
    }

    #[test]
    fn degraded_above_one_percent() {
        assert!(!metric(1.0).is_degraded());
        assert!(metric(1.01).is_degraded());
        assert!(metric(2.5).is_degraded());
    }

    #[test]
    fn healthy_requires_connected_running_and_clean() {
        assert!(metric(0.2).is_healthy());

        let mut disconnected = metric(0.2);
        disconnected.connection_status = ConnectionStatus::Disconnected;
        assert!(!disconnected.is_healthy());

        let mut stopped = metric(0.2);
        stopped.output_state = OutputState::Stopped;
        assert!(!stopped.is_healthy());

        assert!(!metric(3.0).is_healthy());
    }

    #[test]
    fn offline_metric_has_no_gaps_in_required_fields() {
        let m = HealthMetric::offline(Uuid::now_v7(), 12.5, Utc::now());
        assert_eq!(m.connection_status, ConnectionStatus::Disconnected);
        assert_eq!(m.output_state, OutputState::Stopped);
        assert_eq!(m.bitrate_kbps, 0.0);
        assert_eq!(m.cpu_usage_pct, 12.5);
    }
}
