// Store contracts for persisted records
//
// These traits allow the coordinators to be used with different backends:
// - Postgres implementations for production (steadycast-storage)
// - In-memory implementations for examples and testing (crate::memory)
//
// Writes are immediate and non-batched: every create/update call persists
// before returning, so a second process reading the store always sees the
// latest known state.

use async_trait::async_trait;
use uuid::Uuid;

use crate::content::ContentItem;
use crate::downtime::DowntimeEvent;
use crate::error::Result;
use crate::session::{BroadcastSession, OperatorSession};
use crate::telemetry::HealthMetric;

/// Rolling quality aggregates over a session's persisted metrics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricAggregates {
    pub avg_bitrate_kbps: f64,
    pub avg_dropped_frames_pct: f64,
    pub peak_cpu_usage_pct: f64,
}

// ============================================================================
// SessionStore - broadcast sessions and operator sessions
// ============================================================================

/// Persistence for broadcast sessions and operator sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Append a new broadcast session record
    async fn create_session(&self, session: &BroadcastSession) -> Result<()>;

    /// Point-update an existing broadcast session by id
    async fn update_session(&self, session: &BroadcastSession) -> Result<()>;

    /// Most recent session with no end time, if any
    async fn latest_open_session(&self) -> Result<Option<BroadcastSession>>;

    /// Append a new operator session record
    async fn create_operator_session(&self, session: &OperatorSession) -> Result<()>;

    /// Point-update an existing operator session by id
    async fn update_operator_session(&self, session: &OperatorSession) -> Result<()>;

    /// Operator sessions belonging to a broadcast session, ordered by time
    async fn operator_sessions_for(&self, session_id: Uuid) -> Result<Vec<OperatorSession>>;
}

// ============================================================================
// DowntimeStore - downtime events
// ============================================================================

/// Persistence for downtime events
#[async_trait]
pub trait DowntimeStore: Send + Sync {
    /// Append a new downtime event record
    async fn create_event(&self, event: &DowntimeEvent) -> Result<()>;

    /// Point-update an existing downtime event by id
    async fn update_event(&self, event: &DowntimeEvent) -> Result<()>;

    /// Downtime events belonging to a broadcast session, ordered by time
    async fn events_for(&self, session_id: Uuid) -> Result<Vec<DowntimeEvent>>;

    /// Sum of closed downtime durations for a session, in seconds
    async fn downtime_total_sec(&self, session_id: Uuid) -> Result<f64>;
}

// ============================================================================
// MetricStore - health metrics
// ============================================================================

/// Persistence for health metrics (append-only; rows are immutable)
#[async_trait]
pub trait MetricStore: Send + Sync {
    /// Append one metric row
    async fn record(&self, metric: &HealthMetric) -> Result<()>;

    /// Metrics belonging to a broadcast session, ordered by time
    async fn metrics_for(&self, session_id: Uuid) -> Result<Vec<HealthMetric>>;

    /// Most recent metric for a session, if any
    async fn latest_for(&self, session_id: Uuid) -> Result<Option<HealthMetric>>;

    /// Rolling aggregates over a session's metrics; None when no rows exist
    async fn aggregates_for(&self, session_id: Uuid) -> Result<Option<MetricAggregates>>;
}

// ============================================================================
// ContentCatalog - read-only catalog access
// ============================================================================

/// Read-only view of the content catalog
#[async_trait]
pub trait ContentCatalog: Send + Sync {
    /// All playable items, ordered by priority then title
    async fn list_items(&self) -> Result<Vec<ContentItem>>;
}
