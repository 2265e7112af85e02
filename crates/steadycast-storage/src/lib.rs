// Postgres storage layer with sqlx
//
// This crate provides database implementations for core traits:
// - DbSessionStore: implements SessionStore for broadcast/operator sessions
// - DbDowntimeStore: implements DowntimeStore for downtime events
// - DbMetricStore: implements MetricStore for health metrics
// - DbContentCatalog: implements ContentCatalog (read-only)

pub mod models;
pub mod repositories;
pub mod stores;

pub use models::*;
pub use repositories::Database;
pub use stores::{
    create_db_content_catalog, create_db_downtime_store, create_db_metric_store,
    create_db_session_store, DbContentCatalog, DbDowntimeStore, DbMetricStore, DbSessionStore,
};
