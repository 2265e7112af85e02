// Broadcast session domain types
//
// A BroadcastSession is one continuous on-air period from output start to
// output stop. An OperatorSession is a sub-interval of a broadcast session
// during which a human operator held the picture.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How the operator triggered a takeover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMethod {
    /// Hotkey-equivalent trigger (a bound key switched the scene)
    Hotkey,
    /// Operator manually switched to the operator scene
    SceneChange,
}

impl TriggerMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerMethod::Hotkey => "hotkey",
            TriggerMethod::SceneChange => "scene_change",
        }
    }
}

impl std::fmt::Display for TriggerMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<&str> for TriggerMethod {
    fn from(s: &str) -> Self {
        match s {
            "hotkey" => TriggerMethod::Hotkey,
            _ => TriggerMethod::SceneChange,
        }
    }
}

/// Continuous broadcast period tracking
///
/// Invariants:
/// - `downtime_duration_sec <= total_duration_sec` at every observed point
/// - `end_time > start_time` when set; `end_time == None` means ongoing
/// - exactly one session may be ongoing at a time (enforced by the
///   session coordinator, which is the sole writer of this record)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastSession {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    /// Total seconds on-air (refreshed every monitor tick)
    pub total_duration_sec: i64,
    /// Total seconds offline during the session
    pub downtime_duration_sec: i64,
    /// Rolling average bitrate across persisted health metrics
    pub avg_bitrate_kbps: f64,
    /// Rolling average dropped-frame percentage
    pub avg_dropped_frames_pct: f64,
    /// Peak CPU usage observed during the session
    pub peak_cpu_usage_pct: f64,
}

impl BroadcastSession {
    /// Open a new session starting now
    pub fn begin(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            start_time: now,
            end_time: None,
            total_duration_sec: 0,
            downtime_duration_sec: 0,
            avg_bitrate_kbps: 0.0,
            avg_dropped_frames_pct: 0.0,
            peak_cpu_usage_pct: 0.0,
        }
    }

    /// Whether the session is still on-air
    pub fn is_ongoing(&self) -> bool {
        self.end_time.is_none()
    }

    /// Refresh elapsed duration against the wall clock
    pub fn refresh_duration(&mut self, now: DateTime<Utc>) {
        self.total_duration_sec = (now - self.start_time).num_seconds().max(0);
    }

    /// Seconds actually on-air (total minus downtime)
    pub fn uptime_duration_sec(&self) -> i64 {
        self.total_duration_sec - self.downtime_duration_sec
    }

    /// Uptime percentage for the session; 100% for a zero-length session
    pub fn uptime_percentage(&self) -> f64 {
        if self.total_duration_sec == 0 {
            return 100.0;
        }
        (self.uptime_duration_sec() as f64 / self.total_duration_sec as f64) * 100.0
    }

    /// Close the session: set end time and final duration
    pub fn close(&mut self, now: DateTime<Utc>) {
        self.end_time = Some(now);
        self.refresh_duration(now);
    }
}

/// Period when the operator held the picture
///
/// Invariant: operator sessions within one broadcast session never overlap;
/// at most one may be open (`end_time == None`) at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorSession {
    pub id: Uuid,
    /// Parent broadcast session
    pub broadcast_session_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_sec: i64,
    /// Content title that was playing when the operator took over
    pub interrupted_content: Option<String>,
    /// Content title that resumed after the operator handed back
    pub resumed_content: Option<String>,
    /// Measured (or estimated) takeover transition latency
    pub transition_latency_sec: f64,
    pub trigger_method: TriggerMethod,
}

impl OperatorSession {
    /// Open a new operator session under the given broadcast session
    pub fn begin(
        broadcast_session_id: Uuid,
        interrupted_content: Option<String>,
        transition_latency_sec: f64,
        trigger_method: TriggerMethod,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            broadcast_session_id,
            start_time: now,
            end_time: None,
            duration_sec: 0,
            interrupted_content,
            resumed_content: None,
            transition_latency_sec,
            trigger_method,
        }
    }

    /// Whether the operator still holds the picture
    pub fn is_ongoing(&self) -> bool {
        self.end_time.is_none()
    }

    /// Close the operator session: set end time and derived duration
    pub fn close(&mut self, resumed_content: Option<String>, now: DateTime<Utc>) {
        self.end_time = Some(now);
        self.duration_sec = (now - self.start_time).num_seconds().max(0);
        self.resumed_content = resumed_content;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn fresh_session_is_ongoing_with_full_uptime() {
        let session = BroadcastSession::begin(Utc::now());
        assert!(session.is_ongoing());
        assert_eq!(session.uptime_percentage(), 100.0);
    }

    #[test]
    fn close_sets_end_time_after_start() {
        let start = Utc::now();
        let mut session = BroadcastSession::begin(start);
        session.close(start + Duration::seconds(120));

        assert!(!session.is_ongoing());
        assert_eq!(session.total_duration_sec, 120);
        assert!(session.end_time.unwrap() > session.start_time);
    }

    #[test]
    fn uptime_percentage_accounts_for_downtime() {
        let start = Utc::now();
        let mut session = BroadcastSession::begin(start);
        session.refresh_duration(start + Duration::seconds(200));
        session.downtime_duration_sec = 50;

        assert_eq!(session.uptime_duration_sec(), 150);
        assert!((session.uptime_percentage() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn operator_session_close_derives_duration() {
        let start = Utc::now();
        let mut op = OperatorSession::begin(
            Uuid::now_v7(),
            Some("morning_show.mp4".to_string()),
            0.5,
            TriggerMethod::SceneChange,
            start,
        );
        op.close(Some("afternoon_show.mp4".to_string()), start + Duration::seconds(90));

        assert!(!op.is_ongoing());
        assert_eq!(op.duration_sec, 90);
        assert_eq!(op.resumed_content.as_deref(), Some("afternoon_show.mp4"));
    }

    #[test]
    fn trigger_method_round_trips_through_str() {
        assert_eq!(TriggerMethod::from(TriggerMethod::Hotkey.as_str()), TriggerMethod::Hotkey);
        assert_eq!(
            TriggerMethod::from(TriggerMethod::SceneChange.as_str()),
            TriggerMethod::SceneChange
        );
    }
}
