// Repository layer for database operations
//
// Writes are immediate and non-batched: every call persists before
// returning, so a second process reading the store always sees the latest
// known state.

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use steadycast_core::{
    BroadcastSession, ContentItem, DowntimeEvent, HealthMetric, MetricAggregates, OperatorSession,
};

use crate::models::*;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply pending migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // ============================================
    // Broadcast sessions
    // ============================================

    pub async fn create_broadcast_session(&self, session: &BroadcastSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO broadcast_sessions (
                id, start_time, end_time, total_duration_sec, downtime_duration_sec,
                avg_bitrate_kbps, avg_dropped_frames_pct, peak_cpu_usage_pct
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(session.id)
        .bind(session.start_time)
        .bind(session.end_time)
        .bind(session.total_duration_sec)
        .bind(session.downtime_duration_sec)
        .bind(session.avg_bitrate_kbps)
        .bind(session.avg_dropped_frames_pct)
        .bind(session.peak_cpu_usage_pct)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_broadcast_session(&self, session: &BroadcastSession) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE broadcast_sessions
            SET
                end_time = $2,
                total_duration_sec = $3,
                downtime_duration_sec = $4,
                avg_bitrate_kbps = $5,
                avg_dropped_frames_pct = $6,
                peak_cpu_usage_pct = $7
            WHERE id = $1
            "#,
        )
        .bind(session.id)
        .bind(session.end_time)
        .bind(session.total_duration_sec)
        .bind(session.downtime_duration_sec)
        .bind(session.avg_bitrate_kbps)
        .bind(session.avg_dropped_frames_pct)
        .bind(session.peak_cpu_usage_pct)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_broadcast_session(&self, id: Uuid) -> Result<Option<BroadcastSession>> {
        let row = sqlx::query_as::<_, BroadcastSessionRow>(
            r#"
            SELECT id, start_time, end_time, total_duration_sec, downtime_duration_sec,
                   avg_bitrate_kbps, avg_dropped_frames_pct, peak_cpu_usage_pct
            FROM broadcast_sessions
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn latest_open_broadcast_session(&self) -> Result<Option<BroadcastSession>> {
        let row = sqlx::query_as::<_, BroadcastSessionRow>(
            r#"
            SELECT id, start_time, end_time, total_duration_sec, downtime_duration_sec,
                   avg_bitrate_kbps, avg_dropped_frames_pct, peak_cpu_usage_pct
            FROM broadcast_sessions
            WHERE end_time IS NULL
            ORDER BY start_time DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    // ============================================
    // Downtime events
    // ============================================

    pub async fn create_downtime_event(&self, event: &DowntimeEvent) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO downtime_events (
                id, broadcast_session_id, start_time, end_time, duration_sec,
                cause, recovery_action, automatic_recovery
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(event.id)
        .bind(event.broadcast_session_id)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(event.duration_sec)
        .bind(event.cause.as_str())
        .bind(&event.recovery_action)
        .bind(event.automatic_recovery)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_downtime_event(&self, event: &DowntimeEvent) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE downtime_events
            SET
                end_time = $2,
                duration_sec = $3,
                recovery_action = $4,
                automatic_recovery = $5
            WHERE id = $1
            "#,
        )
        .bind(event.id)
        .bind(event.end_time)
        .bind(event.duration_sec)
        .bind(&event.recovery_action)
        .bind(event.automatic_recovery)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn downtime_events_for(&self, session_id: Uuid) -> Result<Vec<DowntimeEvent>> {
        let rows = sqlx::query_as::<_, DowntimeEventRow>(
            r#"
            SELECT id, broadcast_session_id, start_time, end_time, duration_sec,
                   cause, recovery_action, automatic_recovery
            FROM downtime_events
            WHERE broadcast_session_id = $1
            ORDER BY start_time
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn downtime_total_sec(&self, session_id: Uuid) -> Result<f64> {
        let total: (f64,) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(duration_sec), 0)
            FROM downtime_events
            WHERE broadcast_session_id = $1 AND end_time IS NOT NULL
            "#,
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(total.0)
    }

    // ============================================
    // Health metrics
    // ============================================

    pub async fn create_health_metric(&self, metric: &HealthMetric) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO health_metrics (
                id, broadcast_session_id, timestamp, bitrate_kbps, dropped_frames_pct,
                cpu_usage_pct, active_scene, active_content, connection_status, output_state
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(metric.id)
        .bind(metric.broadcast_session_id)
        .bind(metric.timestamp)
        .bind(metric.bitrate_kbps)
        .bind(metric.dropped_frames_pct)
        .bind(metric.cpu_usage_pct)
        .bind(&metric.active_scene)
        .bind(&metric.active_content)
        .bind(metric.connection_status.as_str())
        .bind(metric.output_state.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn health_metrics_for(&self, session_id: Uuid) -> Result<Vec<HealthMetric>> {
        let rows = sqlx::query_as::<_, HealthMetricRow>(
            r#"
            SELECT id, broadcast_session_id, timestamp, bitrate_kbps, dropped_frames_pct,
                   cpu_usage_pct, active_scene, active_content, connection_status, output_state
            FROM health_metrics
            WHERE broadcast_session_id = $1
            ORDER BY timestamp
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn latest_health_metric(&self, session_id: Uuid) -> Result<Option<HealthMetric>> {
        let row = sqlx::query_as::<_, HealthMetricRow>(
            r#"
            SELECT id, broadcast_session_id, timestamp, bitrate_kbps, dropped_frames_pct,
                   cpu_usage_pct, active_scene, active_content, connection_status, output_state
            FROM health_metrics
            WHERE broadcast_session_id = $1
            ORDER BY timestamp DESC
            LIMIT 1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    pub async fn metric_aggregates(&self, session_id: Uuid) -> Result<Option<MetricAggregates>> {
        let row: Option<(f64, f64, f64)> = sqlx::query_as(
            r#"
            SELECT AVG(bitrate_kbps), AVG(dropped_frames_pct), MAX(cpu_usage_pct)
            FROM health_metrics
            WHERE broadcast_session_id = $1
            HAVING COUNT(*) > 0
            "#,
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(avg_bitrate_kbps, avg_dropped_frames_pct, peak_cpu_usage_pct)| {
            MetricAggregates {
                avg_bitrate_kbps,
                avg_dropped_frames_pct,
                peak_cpu_usage_pct,
            }
        }))
    }

    // ============================================
    // Operator sessions
    // ============================================

    pub async fn create_operator_session(&self, session: &OperatorSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO operator_sessions (
                id, broadcast_session_id, start_time, end_time, duration_sec,
                interrupted_content, resumed_content, transition_latency_sec, trigger_method
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(session.id)
        .bind(session.broadcast_session_id)
        .bind(session.start_time)
        .bind(session.end_time)
        .bind(session.duration_sec)
        .bind(&session.interrupted_content)
        .bind(&session.resumed_content)
        .bind(session.transition_latency_sec)
        .bind(session.trigger_method.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update_operator_session(&self, session: &OperatorSession) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE operator_sessions
            SET
                end_time = $2,
                duration_sec = $3,
                resumed_content = $4
            WHERE id = $1
            "#,
        )
        .bind(session.id)
        .bind(session.end_time)
        .bind(session.duration_sec)
        .bind(&session.resumed_content)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn operator_sessions_for(&self, session_id: Uuid) -> Result<Vec<OperatorSession>> {
        let rows = sqlx::query_as::<_, OperatorSessionRow>(
            r#"
            SELECT id, broadcast_session_id, start_time, end_time, duration_sec,
                   interrupted_content, resumed_content, transition_latency_sec, trigger_method
            FROM operator_sessions
            WHERE broadcast_session_id = $1
            ORDER BY start_time
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    // ============================================
    // Content catalog (read-only)
    // ============================================

    pub async fn list_content_items(&self) -> Result<Vec<ContentItem>> {
        let rows = sqlx::query_as::<_, ContentItemRow>(
            r#"
            SELECT id, title, path, duration_sec, age_rating, time_blocks, priority,
                   source_attribution
            FROM content_items
            ORDER BY priority, title
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
