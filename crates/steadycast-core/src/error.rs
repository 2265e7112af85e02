// Error types for the reliability orchestration core

use thiserror::Error;

/// Result type alias for orchestration operations
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// Errors that can occur while keeping a broadcast on-air
///
/// Taxonomy:
/// - `Surface` errors are transient and retried at the owning coordinator's
///   cadence; they never terminate a coordinator loop.
/// - `DataIntegrity` errors indicate a missed or duplicated upstream event
///   (e.g. an operator-return with no open operator session); callers log
///   and ignore them.
/// - `RecoveryExhausted` is the only condition that requires a human: it is
///   raised after bounded reconnect attempts run out or the failover scene
///   itself cannot be engaged.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Control surface unreachable or a call against it failed
    #[error("control surface error: {0}")]
    Surface(String),

    /// Persisted store error
    #[error("store error: {0}")]
    Store(String),

    /// Out-of-order or duplicated event from an upstream watcher
    #[error("data integrity: {0}")]
    DataIntegrity(String),

    /// Bounded recovery attempts exhausted; operator intervention required
    #[error("recovery exhausted: {0}")]
    RecoveryExhausted(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl OrchestratorError {
    /// Create a control surface error
    pub fn surface(msg: impl Into<String>) -> Self {
        OrchestratorError::Surface(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        OrchestratorError::Store(msg.into())
    }

    /// Create a data integrity error
    pub fn integrity(msg: impl Into<String>) -> Self {
        OrchestratorError::DataIntegrity(msg.into())
    }

    /// Create a recovery-exhausted error
    pub fn exhausted(msg: impl Into<String>) -> Self {
        OrchestratorError::RecoveryExhausted(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        OrchestratorError::Configuration(msg.into())
    }

    /// Whether this error is a transient control-surface condition
    pub fn is_surface(&self) -> bool {
        matches!(self, OrchestratorError::Surface(_))
    }
}
