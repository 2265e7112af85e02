// Broadcast Reliability Core
//
// This crate provides the DB-agnostic domain types and trait seams for a
// reliability orchestration core that keeps an unattended broadcast on-air.
//
// Key design decisions:
// - Uses traits (ControlSurface, SessionStore, DowntimeStore, MetricStore,
//   ContentCatalog) for pluggable backends
// - Operator takeovers are communicated as tagged OperatorEvent variants on
//   a channel, not registered callbacks, to ease testing with synthetic
//   event streams
// - Content selection (time block + age rating + priority) is a pure
//   function of catalog and instant, so scheduling is deterministic
// - Error handling distinguishes transient surface errors, ignorable
//   data-integrity errors, and terminal exhausted-recovery errors
// - Domain entities (BroadcastSession, DowntimeEvent, HealthMetric,
//   OperatorSession, ContentItem) are defined here for shared use by the
//   storage and orchestrator crates

// Domain entity types
pub mod content;
pub mod downtime;
pub mod session;
pub mod telemetry;

pub mod error;
pub mod events;
pub mod schedule;
pub mod store;
pub mod surface;

// In-memory implementations for examples and testing
pub mod memory;

// Re-exports for convenience
pub use content::{AgeRating, ContentItem};
pub use downtime::{DowntimeEvent, FailureCause};
pub use error::{OrchestratorError, Result};
pub use events::OperatorEvent;
pub use schedule::{rating_allowed, select_candidates, TimeBlock};
pub use session::{BroadcastSession, OperatorSession, TriggerMethod};
pub use store::{ContentCatalog, DowntimeStore, MetricAggregates, MetricStore, SessionStore};
pub use surface::{ControlSurface, OutputStatus, PerformanceStats, TextStyle};
pub use telemetry::{ConnectionStatus, HealthMetric, OutputState, DEGRADED_DROP_PCT};
