use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state_machine::PipelineState;

/// Broad error category used by pipeline consumers to decide how to react.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PipelineErrorCategory {
    /// The pipeline was torn down or its worker is gone.
    Closed,
    /// The view side went away or refused a transition.
    Detached,
    /// Internal invariant break (for example an invalid lifecycle transition).
    Internal,
}

/// Stable pipeline error payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Error)]
#[error("{category:?}:{code}: {message}")]
pub struct PipelineError {
    /// High-level error category.
    pub category: PipelineErrorCategory,
    /// Stable machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl PipelineError {
    pub fn new(
        category: PipelineErrorCategory,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            code: code.into(),
            message: message.into(),
        }
    }

    /// Snapshot submitted after the worker stopped.
    pub fn closed() -> Self {
        Self::new(
            PipelineErrorCategory::Closed,
            "pipeline_closed",
            "screen pipeline is no longer accepting snapshots",
        )
    }

    /// The apply queue or a pending apply was dropped by the view.
    pub fn view_detached(message: impl Into<String>) -> Self {
        Self::new(PipelineErrorCategory::Detached, "view_detached", message)
    }

    /// Build a standard invalid-state-transition error.
    pub fn invalid_state(current: PipelineState, action: impl Into<String>) -> Self {
        let action = action.into();
        Self::new(
            PipelineErrorCategory::Internal,
            "invalid_state_transition",
            format!("cannot run '{action}' while pipeline is in state {current:?}"),
        )
    }
}

/// Failure of a view-side apply closure.
#[derive(Debug, Error)]
pub enum ApplyError<E> {
    /// The pipeline was torn down before the transition reached the view.
    #[error("pipeline was torn down before the transition was applied")]
    Cancelled,
    /// The view rejected the transition.
    #[error("view failed to apply transition: {0}")]
    View(E),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_invalid_state_error_code_stable() {
        let err = PipelineError::invalid_state(PipelineState::TornDown, "begin_cycle");
        assert_eq!(err.code, "invalid_state_transition");
        assert_eq!(err.category, PipelineErrorCategory::Internal);
        assert!(err.message.contains("TornDown"));
    }

    #[test]
    fn closed_and_detached_codes_are_distinct() {
        assert_eq!(PipelineError::closed().code, "pipeline_closed");
        let detached = PipelineError::view_detached("queue dropped");
        assert_eq!(detached.code, "view_detached");
        assert_eq!(detached.to_string(), "Detached:view_detached: queue dropped");
    }
}
