// Database-backed implementations of the core store traits
//
// Thin adapters that delegate to the repository layer and map database
// errors into the core error taxonomy. Each coordinator receives these via
// Arc<dyn Trait>, so in-memory doubles can stand in during tests.

use async_trait::async_trait;
use uuid::Uuid;

use steadycast_core::{
    BroadcastSession, ContentCatalog, ContentItem, DowntimeEvent, DowntimeStore, HealthMetric,
    MetricAggregates, MetricStore, OperatorSession, OrchestratorError, Result, SessionStore,
};

use crate::repositories::Database;

// ============================================================================
// DbSessionStore
// ============================================================================

/// Database-backed session store
#[derive(Clone)]
pub struct DbSessionStore {
    db: Database,
}

impl DbSessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SessionStore for DbSessionStore {
    async fn create_session(&self, session: &BroadcastSession) -> Result<()> {
        self.db
            .create_broadcast_session(session)
            .await
            .map_err(|e| OrchestratorError::store(e.to_string()))
    }

    async fn update_session(&self, session: &BroadcastSession) -> Result<()> {
        self.db
            .update_broadcast_session(session)
            .await
            .map_err(|e| OrchestratorError::store(e.to_string()))
    }

    async fn latest_open_session(&self) -> Result<Option<BroadcastSession>> {
        self.db
            .latest_open_broadcast_session()
            .await
            .map_err(|e| OrchestratorError::store(e.to_string()))
    }

    async fn create_operator_session(&self, session: &OperatorSession) -> Result<()> {
        self.db
            .create_operator_session(session)
            .await
            .map_err(|e| OrchestratorError::store(e.to_string()))
    }

    async fn update_operator_session(&self, session: &OperatorSession) -> Result<()> {
        self.db
            .update_operator_session(session)
            .await
            .map_err(|e| OrchestratorError::store(e.to_string()))
    }

    async fn operator_sessions_for(&self, session_id: Uuid) -> Result<Vec<OperatorSession>> {
        self.db
            .operator_sessions_for(session_id)
            .await
            .map_err(|e| OrchestratorError::store(e.to_string()))
    }
}

// ============================================================================
// DbDowntimeStore
// ============================================================================

/// Database-backed downtime event store
#[derive(Clone)]
pub struct DbDowntimeStore {
    db: Database,
}

impl DbDowntimeStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DowntimeStore for DbDowntimeStore {
    async fn create_event(&self, event: &DowntimeEvent) -> Result<()> {
        self.db
            .create_downtime_event(event)
            .await
            .map_err(|e| OrchestratorError::store(e.to_string()))
    }

    async fn update_event(&self, event: &DowntimeEvent) -> Result<()> {
        self.db
            .update_downtime_event(event)
            .await
            .map_err(|e| OrchestratorError::store(e.to_string()))
    }

    async fn events_for(&self, session_id: Uuid) -> Result<Vec<DowntimeEvent>> {
        self.db
            .downtime_events_for(session_id)
            .await
            .map_err(|e| OrchestratorError::store(e.to_string()))
    }

    async fn downtime_total_sec(&self, session_id: Uuid) -> Result<f64> {
        self.db
            .downtime_total_sec(session_id)
            .await
            .map_err(|e| OrchestratorError::store(e.to_string()))
    }
}

// ============================================================================
// DbMetricStore
// ============================================================================

/// Database-backed health metric store
#[derive(Clone)]
pub struct DbMetricStore {
    db: Database,
}

impl DbMetricStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MetricStore for DbMetricStore {
    async fn record(&self, metric: &HealthMetric) -> Result<()> {
        self.db
            .create_health_metric(metric)
            .await
            .map_err(|e| OrchestratorError::store(e.to_string()))
    }

    async fn metrics_for(&self, session_id: Uuid) -> Result<Vec<HealthMetric>> {
        self.db
            .health_metrics_for(session_id)
            .await
            .map_err(|e| OrchestratorError::store(e.to_string()))
    }

    async fn latest_for(&self, session_id: Uuid) -> Result<Option<HealthMetric>> {
        self.db
            .latest_health_metric(session_id)
            .await
            .map_err(|e| OrchestratorError::store(e.to_string()))
    }

    async fn aggregates_for(&self, session_id: Uuid) -> Result<Option<MetricAggregates>> {
        self.db
            .metric_aggregates(session_id)
            .await
            .map_err(|e| OrchestratorError::store(e.to_string()))
    }
}

// ============================================================================
// DbContentCatalog
// ============================================================================

/// Database-backed read-only content catalog
#[derive(Clone)]
pub struct DbContentCatalog {
    db: Database,
}

impl DbContentCatalog {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ContentCatalog for DbContentCatalog {
    async fn list_items(&self) -> Result<Vec<ContentItem>> {
        self.db
            .list_content_items()
            .await
            .map_err(|e| OrchestratorError::store(e.to_string()))
    }
}

// ============================================================================
// Factory functions
// ============================================================================

/// Create a database-backed session store
pub fn create_db_session_store(db: Database) -> DbSessionStore {
    DbSessionStore::new(db)
}

/// Create a database-backed downtime store
pub fn create_db_downtime_store(db: Database) -> DbDowntimeStore {
    DbDowntimeStore::new(db)
}

/// Create a database-backed metric store
pub fn create_db_metric_store(db: Database) -> DbMetricStore {
    DbMetricStore::new(db)
}

/// Create a database-backed content catalog
pub fn create_db_content_catalog(db: Database) -> DbContentCatalog {
    DbContentCatalog::new(db)
}
