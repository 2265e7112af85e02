// In-memory implementations for examples and testing
//
// These implement the store traits and the control-surface contract without
// any external process. The scripted surface records every mutating call and
// lets tests inject failures (connect refusals, failing scene switches,
// blanket call failures) to drive the escalation paths.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::content::ContentItem;
use crate::downtime::DowntimeEvent;
use crate::error::{OrchestratorError, Result};
use crate::session::{BroadcastSession, OperatorSession};
use crate::store::{ContentCatalog, DowntimeStore, MetricAggregates, MetricStore, SessionStore};
use crate::surface::{ControlSurface, OutputStatus, PerformanceStats, TextStyle};
use crate::telemetry::HealthMetric;

// ============================================================================
// InMemorySessionStore
// ============================================================================

/// In-memory session store for examples and testing
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<Vec<BroadcastSession>>>,
    operator_sessions: Arc<RwLock<Vec<OperatorSession>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all persisted broadcast sessions
    pub async fn sessions(&self) -> Vec<BroadcastSession> {
        self.sessions.read().await.clone()
    }

    /// Snapshot of all persisted operator sessions
    pub async fn operator_sessions(&self) -> Vec<OperatorSession> {
        self.operator_sessions.read().await.clone()
    }

    pub async fn clear(&self) {
        self.sessions.write().await.clear();
        self.operator_sessions.write().await.clear();
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, session: &BroadcastSession) -> Result<()> {
        self.sessions.write().await.push(session.clone());
        Ok(())
    }

    async fn update_session(&self, session: &BroadcastSession) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        match sessions.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => {
                *existing = session.clone();
                Ok(())
            }
            None => Err(OrchestratorError::store(format!(
                "unknown broadcast session {}",
                session.id
            ))),
        }
    }

    async fn latest_open_session(&self) -> Result<Option<BroadcastSession>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .iter()
            .filter(|s| s.is_ongoing())
            .max_by_key(|s| s.start_time)
            .cloned())
    }

    async fn create_operator_session(&self, session: &OperatorSession) -> Result<()> {
        self.operator_sessions.write().await.push(session.clone());
        Ok(())
    }

    async fn update_operator_session(&self, session: &OperatorSession) -> Result<()> {
        let mut sessions = self.operator_sessions.write().await;
        match sessions.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => {
                *existing = session.clone();
                Ok(())
            }
            None => Err(OrchestratorError::store(format!(
                "unknown operator session {}",
                session.id
            ))),
        }
    }

    async fn operator_sessions_for(&self, session_id: Uuid) -> Result<Vec<OperatorSession>> {
        let sessions = self.operator_sessions.read().await;
        let mut matching: Vec<OperatorSession> = sessions
            .iter()
            .filter(|s| s.broadcast_session_id == session_id)
            .cloned()
            .collect();
        matching.sort_by_key(|s| s.start_time);
        Ok(matching)
    }
}

// ============================================================================
// InMemoryDowntimeStore
// ============================================================================

/// In-memory downtime event store for examples and testing
#[derive(Clone, Default)]
pub struct InMemoryDowntimeStore {
    events: Arc<RwLock<Vec<DowntimeEvent>>>,
}

impl InMemoryDowntimeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all persisted downtime events
    pub async fn events(&self) -> Vec<DowntimeEvent> {
        self.events.read().await.clone()
    }

    pub async fn clear(&self) {
        self.events.write().await.clear();
    }
}

#[async_trait]
impl DowntimeStore for InMemoryDowntimeStore {
    async fn create_event(&self, event: &DowntimeEvent) -> Result<()> {
        self.events.write().await.push(event.clone());
        Ok(())
    }

    async fn update_event(&self, event: &DowntimeEvent) -> Result<()> {
        let mut events = self.events.write().await;
        match events.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => {
                *existing = event.clone();
                Ok(())
            }
            None => Err(OrchestratorError::store(format!(
                "unknown downtime event {}",
                event.id
            ))),
        }
    }

    async fn events_for(&self, session_id: Uuid) -> Result<Vec<DowntimeEvent>> {
        let events = self.events.read().await;
        let mut matching: Vec<DowntimeEvent> = events
            .iter()
            .filter(|e| e.broadcast_session_id == session_id)
            .cloned()
            .collect();
        matching.sort_by_key(|e| e.start_time);
        Ok(matching)
    }

    async fn downtime_total_sec(&self, session_id: Uuid) -> Result<f64> {
        let events = self.events.read().await;
        Ok(events
            .iter()
            .filter(|e| e.broadcast_session_id == session_id && !e.is_ongoing())
            .map(|e| e.duration_sec)
            .sum())
    }
}

// ============================================================================
// InMemoryMetricStore
// ============================================================================

/// In-memory metric store for examples and testing
#[derive(Clone, Default)]
pub struct InMemoryMetricStore {
    metrics: Arc<RwLock<Vec<HealthMetric>>>,
}

impl InMemoryMetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all persisted metrics
    pub async fn metrics(&self) -> Vec<HealthMetric> {
        self.metrics.read().await.clone()
    }

    pub async fn clear(&self) {
        self.metrics.write().await.clear();
    }
}

#[async_trait]
impl MetricStore for InMemoryMetricStore {
    async fn record(&self, metric: &HealthMetric) -> Result<()> {
        self.metrics.write().await.push(metric.clone());
        Ok(())
    }

    async fn metrics_for(&self, session_id: Uuid) -> Result<Vec<HealthMetric>> {
        let metrics = self.metrics.read().await;
        let mut matching: Vec<HealthMetric> = metrics
            .iter()
            .filter(|m| m.broadcast_session_id == session_id)
            .cloned()
            .collect();
        matching.sort_by_key(|m| m.timestamp);
        Ok(matching)
    }

    async fn latest_for(&self, session_id: Uuid) -> Result<Option<HealthMetric>> {
        let metrics = self.metrics.read().await;
        Ok(metrics
            .iter()
            .filter(|m| m.broadcast_session_id == session_id)
            .max_by_key(|m| m.timestamp)
            .cloned())
    }

    async fn aggregates_for(&self, session_id: Uuid) -> Result<Option<MetricAggregates>> {
        let metrics = self.metrics.read().await;
        let matching: Vec<&HealthMetric> = metrics
            .iter()
            .filter(|m| m.broadcast_session_id == session_id)
            .collect();
        if matching.is_empty() {
            return Ok(None);
        }

        let count = matching.len() as f64;
        Ok(Some(MetricAggregates {
            avg_bitrate_kbps: matching.iter().map(|m| m.bitrate_kbps).sum::<f64>() / count,
            avg_dropped_frames_pct: matching.iter().map(|m| m.dropped_frames_pct).sum::<f64>()
                / count,
            peak_cpu_usage_pct: matching
                .iter()
                .map(|m| m.cpu_usage_pct)
                .fold(0.0, f64::max),
        }))
    }
}

// ============================================================================
// InMemoryCatalog
// ============================================================================

/// In-memory content catalog for examples and testing
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    items: Arc<RwLock<Vec<ContentItem>>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the catalog contents
    pub async fn seed(&self, items: Vec<ContentItem>) {
        *self.items.write().await = items;
    }

    pub async fn add_item(&self, item: ContentItem) {
        self.items.write().await.push(item);
    }

    pub async fn clear(&self) {
        self.items.write().await.clear();
    }
}

#[async_trait]
impl ContentCatalog for InMemoryCatalog {
    async fn list_items(&self) -> Result<Vec<ContentItem>> {
        let items = self.items.read().await;
        let mut listing = items.clone();
        listing.sort_by(|a, b| a.priority.cmp(&b.priority).then_with(|| a.title.cmp(&b.title)));
        Ok(listing)
    }
}

// ============================================================================
// ScriptedSurface
// ============================================================================

#[derive(Default)]
struct SurfaceState {
    connected: bool,
    scenes: Vec<String>,
    current_scene: String,
    output: OutputStatus,
    stats: PerformanceStats,
    connect_failures_remaining: u32,
    failing_scenes: HashSet<String>,
    fail_start_output: bool,
    fail_all_calls: bool,
    calls: Vec<String>,
}

/// Scriptable control surface for examples and testing
///
/// Starts connected with no scenes. Mutating calls are recorded in order
/// (inspect with `calls()`); failures are injected per-operation.
#[derive(Clone)]
pub struct ScriptedSurface {
    state: Arc<RwLock<SurfaceState>>,
}

impl Default for ScriptedSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSurface {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(SurfaceState {
                connected: true,
                ..SurfaceState::default()
            })),
        }
    }

    /// Surface with the given scenes, the first one on program
    pub async fn with_scenes(scenes: &[&str]) -> Self {
        let surface = Self::new();
        {
            let mut state = surface.state.write().await;
            state.scenes = scenes.iter().map(|s| s.to_string()).collect();
            if let Some(first) = scenes.first() {
                state.current_scene = first.to_string();
            }
        }
        surface
    }

    pub async fn set_connected(&self, connected: bool) {
        self.state.write().await.connected = connected;
    }

    pub async fn set_current_scene(&self, name: &str) {
        self.state.write().await.current_scene = name.to_string();
    }

    /// Set output active/reconnecting flags
    pub async fn set_output(&self, active: bool, reconnecting: bool) {
        let mut state = self.state.write().await;
        state.output.active = active;
        state.output.reconnecting = reconnecting;
    }

    /// Set output byte/duration counters (for bitrate derivation)
    pub async fn set_output_counters(&self, bytes_sent: u64, duration_ms: u64) {
        let mut state = self.state.write().await;
        state.output.bytes_sent = bytes_sent;
        state.output.duration_ms = duration_ms;
    }

    pub async fn set_stats(&self, stats: PerformanceStats) {
        self.state.write().await.stats = stats;
    }

    /// Make the next `n` connect() calls fail
    pub async fn fail_connects(&self, n: u32) {
        self.state.write().await.connect_failures_remaining = n;
    }

    /// Make every switch to this scene fail
    pub async fn fail_scene_switch(&self, name: &str) {
        self.state.write().await.failing_scenes.insert(name.to_string());
    }

    pub async fn clear_scene_failures(&self) {
        self.state.write().await.failing_scenes.clear();
    }

    /// Make start_output() fail
    pub async fn fail_start_output(&self, fail: bool) {
        self.state.write().await.fail_start_output = fail;
    }

    /// Make every call fail with a connection error
    pub async fn set_fail_all(&self, fail: bool) {
        self.state.write().await.fail_all_calls = fail;
    }

    /// Recorded calls, in order
    pub async fn calls(&self) -> Vec<String> {
        self.state.read().await.calls.clone()
    }

    /// How many recorded calls start with the given prefix
    pub async fn call_count(&self, prefix: &str) -> usize {
        self.state
            .read()
            .await
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    pub async fn clear_calls(&self) {
        self.state.write().await.calls.clear();
    }

    fn ensure_ok(state: &SurfaceState) -> Result<()> {
        if state.fail_all_calls {
            return Err(OrchestratorError::surface("scripted call failure"));
        }
        if !state.connected {
            return Err(OrchestratorError::surface("not connected to control surface"));
        }
        Ok(())
    }
}

#[async_trait]
impl ControlSurface for ScriptedSurface {
    async fn connect(&self) -> Result<()> {
        let mut state = self.state.write().await;
        if state.connect_failures_remaining > 0 {
            state.connect_failures_remaining -= 1;
            state.calls.push("connect:err".to_string());
            return Err(OrchestratorError::surface("scripted connect refusal"));
        }
        state.connected = true;
        state.calls.push("connect".to_string());
        Ok(())
    }

    async fn disconnect(&self) -> Result<()> {
        let mut state = self.state.write().await;
        state.connected = false;
        state.calls.push("disconnect".to_string());
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.state.read().await.connected
    }

    async fn list_scenes(&self) -> Result<Vec<String>> {
        let state = self.state.read().await;
        Self::ensure_ok(&state)?;
        Ok(state.scenes.clone())
    }

    async fn create_scene(&self, name: &str) -> Result<()> {
        let mut state = self.state.write().await;
        Self::ensure_ok(&state)?;
        if !state.scenes.iter().any(|s| s == name) {
            state.scenes.push(name.to_string());
        }
        state.calls.push(format!("create_scene:{name}"));
        Ok(())
    }

    async fn switch_scene(&self, name: &str, _transition_ms: u32) -> Result<()> {
        let mut state = self.state.write().await;
        Self::ensure_ok(&state)?;
        if state.failing_scenes.contains(name) {
            state.calls.push(format!("switch_scene:{name}:err"));
            return Err(OrchestratorError::surface(format!(
                "scripted switch failure for scene '{name}'"
            )));
        }
        state.current_scene = name.to_string();
        state.calls.push(format!("switch_scene:{name}"));
        Ok(())
    }

    async fn current_scene(&self) -> Result<String> {
        let state = self.state.read().await;
        Self::ensure_ok(&state)?;
        Ok(state.current_scene.clone())
    }

    async fn upsert_media_source(
        &self,
        scene: &str,
        source: &str,
        path: &str,
        _loop_playback: bool,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        Self::ensure_ok(&state)?;
        state.calls.push(format!("media_source:{scene}/{source}:{path}"));
        Ok(())
    }

    async fn upsert_text_source(
        &self,
        scene: &str,
        source: &str,
        _text: &str,
        _style: &TextStyle,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        Self::ensure_ok(&state)?;
        state.calls.push(format!("text_source:{scene}/{source}"));
        Ok(())
    }

    async fn output_status(&self) -> Result<OutputStatus> {
        let state = self.state.read().await;
        Self::ensure_ok(&state)?;
        Ok(state.output)
    }

    async fn start_output(&self) -> Result<()> {
        let mut state = self.state.write().await;
        Self::ensure_ok(&state)?;
        if state.fail_start_output {
            state.calls.push("start_output:err".to_string());
            return Err(OrchestratorError::surface("scripted output start failure"));
        }
        state.output.active = true;
        state.output.reconnecting = false;
        state.calls.push("start_output".to_string());
        Ok(())
    }

    async fn stop_output(&self) -> Result<()> {
        let mut state = self.state.write().await;
        Self::ensure_ok(&state)?;
        state.output.active = false;
        state.calls.push("stop_output".to_string());
        Ok(())
    }

    async fn performance_stats(&self) -> Result<PerformanceStats> {
        let state = self.state.read().await;
        Self::ensure_ok(&state)?;
        Ok(state.stats)
    }
}
