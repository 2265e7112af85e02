// Database models (internal, converted to core domain types at the boundary)

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use steadycast_core::{
    AgeRating, BroadcastSession, ConnectionStatus, ContentItem, DowntimeEvent, FailureCause,
    HealthMetric, OperatorSession, OutputState, TriggerMethod,
};

// ============================================
// Broadcast session rows
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct BroadcastSessionRow {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub total_duration_sec: i64,
    pub downtime_duration_sec: i64,
    pub avg_bitrate_kbps: f64,
    pub avg_dropped_frames_pct: f64,
    pub peak_cpu_usage_pct: f64,
}

impl From<BroadcastSessionRow> for BroadcastSession {
    fn from(row: BroadcastSessionRow) -> Self {
        BroadcastSession {
            id: row.id,
            start_time: row.start_time,
            end_time: row.end_time,
            total_duration_sec: row.total_duration_sec,
            downtime_duration_sec: row.downtime_duration_sec,
            avg_bitrate_kbps: row.avg_bitrate_kbps,
            avg_dropped_frames_pct: row.avg_dropped_frames_pct,
            peak_cpu_usage_pct: row.peak_cpu_usage_pct,
        }
    }
}

// ============================================
// Downtime event rows
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct DowntimeEventRow {
    pub id: Uuid,
    pub broadcast_session_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_sec: f64,
    pub cause: String,
    pub recovery_action: String,
    pub automatic_recovery: bool,
}

impl From<DowntimeEventRow> for DowntimeEvent {
    fn from(row: DowntimeEventRow) -> Self {
        DowntimeEvent {
            id: row.id,
            broadcast_session_id: row.broadcast_session_id,
            start_time: row.start_time,
            end_time: row.end_time,
            duration_sec: row.duration_sec,
            cause: FailureCause::from(row.cause.as_str()),
            recovery_action: row.recovery_action,
            automatic_recovery: row.automatic_recovery,
        }
    }
}

// ============================================
// Health metric rows
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct HealthMetricRow {
    pub id: Uuid,
    pub broadcast_session_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub bitrate_kbps: f64,
    pub dropped_frames_pct: f64,
    pub cpu_usage_pct: f64,
    pub active_scene: String,
    pub active_content: Option<String>,
    pub connection_status: String,
    pub output_state: String,
}

impl From<HealthMetricRow> for HealthMetric {
    fn from(row: HealthMetricRow) -> Self {
        HealthMetric {
            id: row.id,
            broadcast_session_id: row.broadcast_session_id,
            timestamp: row.timestamp,
            bitrate_kbps: row.bitrate_kbps,
            dropped_frames_pct: row.dropped_frames_pct,
            cpu_usage_pct: row.cpu_usage_pct,
            active_scene: row.active_scene,
            active_content: row.active_content,
            connection_status: ConnectionStatus::from(row.connection_status.as_str()),
            output_state: OutputState::from(row.output_state.as_str()),
        }
    }
}

// ============================================
// Operator session rows
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct OperatorSessionRow {
    pub id: Uuid,
    pub broadcast_session_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_sec: i64,
    pub interrupted_content: Option<String>,
    pub resumed_content: Option<String>,
    pub transition_latency_sec: f64,
    pub trigger_method: String,
}

impl From<OperatorSessionRow> for OperatorSession {
    fn from(row: OperatorSessionRow) -> Self {
        OperatorSession {
            id: row.id,
            broadcast_session_id: row.broadcast_session_id,
            start_time: row.start_time,
            end_time: row.end_time,
            duration_sec: row.duration_sec,
            interrupted_content: row.interrupted_content,
            resumed_content: row.resumed_content,
            transition_latency_sec: row.transition_latency_sec,
            trigger_method: TriggerMethod::from(row.trigger_method.as_str()),
        }
    }
}

// ============================================
// Content item rows
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct ContentItemRow {
    pub id: Uuid,
    pub title: String,
    pub path: String,
    pub duration_sec: i64,
    pub age_rating: String,
    pub time_blocks: Vec<String>,
    pub priority: i32,
    pub source_attribution: String,
}

impl From<ContentItemRow> for ContentItem {
    fn from(row: ContentItemRow) -> Self {
        ContentItem {
            id: row.id,
            title: row.title,
            path: row.path,
            duration_sec: row.duration_sec,
            age_rating: AgeRating::from(row.age_rating.as_str()),
            time_blocks: row.time_blocks,
            priority: row.priority,
            source_attribution: row.source_attribution,
        }
    }
}

// Note: Integration tests require a database connection. Unit tests focus on
// the row -> domain conversion logic.

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn downtime_row_converts_status_strings() {
        let row = DowntimeEventRow {
            id: Uuid::now_v7(),
            broadcast_session_id: Uuid::now_v7(),
            start_time: Utc::now(),
            end_time: None,
            duration_sec: 0.0,
            cause: "surface_crash".to_string(),
            recovery_action: "control surface unreachable".to_string(),
            automatic_recovery: true,
        };
        let event: DowntimeEvent = row.into();
        assert_eq!(event.cause, FailureCause::SurfaceCrash);
        assert!(event.is_ongoing());
    }

    #[test]
    fn metric_row_converts_status_strings() {
        let row = HealthMetricRow {
            id: Uuid::now_v7(),
            broadcast_session_id: Uuid::now_v7(),
            timestamp: Utc::now(),
            bitrate_kbps: 6000.0,
            dropped_frames_pct: 0.4,
            cpu_usage_pct: 30.0,
            active_scene: "Automated Content".to_string(),
            active_content: Some("clip.mp4".to_string()),
            connection_status: "degraded".to_string(),
            output_state: "running".to_string(),
        };
        let metric: HealthMetric = row.into();
        assert_eq!(metric.connection_status, ConnectionStatus::Degraded);
        assert_eq!(metric.output_state, OutputState::Running);
        assert!(!metric.is_degraded());
    }

    #[test]
    fn unknown_status_strings_fall_back_conservatively() {
        let row = OperatorSessionRow {
            id: Uuid::now_v7(),
            broadcast_session_id: Uuid::now_v7(),
            start_time: Utc::now(),
            end_time: None,
            duration_sec: 0,
            interrupted_content: None,
            resumed_content: None,
            transition_latency_sec: 0.5,
            trigger_method: "something_new".to_string(),
        };
        let session: OperatorSession = row.into();
        assert_eq!(session.trigger_method, TriggerMethod::SceneChange);
    }
}
