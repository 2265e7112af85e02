// Operator takeover events
//
// The takeover detector emits these as tagged variants on a channel; the
// session coordinator consumes them. Message passing (rather than registered
// callbacks) keeps the detector testable with synthetic event streams.

use serde::{Deserialize, Serialize};

use crate::session::TriggerMethod;

/// Event raised by the operator-takeover detector, at most once per transition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperatorEvent {
    /// The operator scene became active
    Live {
        /// Scene that was on program before the takeover
        interrupted_scene: String,
        /// Estimated takeover transition latency in seconds
        transition_latency_sec: f64,
        trigger_method: TriggerMethod,
    },
    /// The operator switched back to the automated-content scene
    Returned {
        /// Name of the operator scene that was left
        operator_scene: String,
    },
}

impl OperatorEvent {
    /// Short tag for logging
    pub fn kind(&self) -> &'static str {
        match self {
            OperatorEvent::Live { .. } => "operator_live",
            OperatorEvent::Returned { .. } => "operator_returned",
        }
    }
}
