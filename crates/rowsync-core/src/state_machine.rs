use serde::{Deserialize, Serialize};

use crate::error::PipelineError;

/// Lifecycle of one screen pipeline worker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PipelineState {
    /// Waiting for the next snapshot.
    Idle,
    /// Diffing a snapshot against the last applied one.
    Reconciling,
    /// A transition was handed to the view and is awaiting acknowledgement.
    AwaitingApply,
    /// The screen was destroyed; nothing is applied any more.
    TornDown,
}

#[derive(Debug, Clone)]
pub struct PipelineStateMachine {
    state: PipelineState,
}

impl Default for PipelineStateMachine {
    fn default() -> Self {
        Self {
            state: PipelineState::Idle,
        }
    }
}

impl PipelineStateMachine {
    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn begin_cycle(&mut self) -> Result<(), PipelineError> {
        self.transition_from_state(PipelineState::Idle, PipelineState::Reconciling, "begin_cycle")
    }

    pub fn hand_off(&mut self) -> Result<(), PipelineError> {
        self.transition_from_state(
            PipelineState::Reconciling,
            PipelineState::AwaitingApply,
            "hand_off",
        )
    }

    pub fn complete_apply(&mut self) -> Result<(), PipelineError> {
        self.transition_from_state(
            PipelineState::AwaitingApply,
            PipelineState::Idle,
            "complete_apply",
        )
    }

    /// Reconciliation produced nothing to apply; return to idle.
    pub fn skip_apply(&mut self) -> Result<(), PipelineError> {
        self.transition_from_state(PipelineState::Reconciling, PipelineState::Idle, "skip_apply")
    }

    /// Teardown is allowed from every state and is sticky.
    pub fn tear_down(&mut self) {
        self.state = PipelineState::TornDown;
    }

    pub fn is_torn_down(&self) -> bool {
        self.state == PipelineState::TornDown
    }

    fn transition_from_state(
        &mut self,
        expected: PipelineState,
        next: PipelineState,
        action: &str,
    ) -> Result<(), PipelineError> {
        if self.state != expected {
            return Err(PipelineError::invalid_state(self.state, action));
        }
        self.state = next;
        Ok(())
    }
}
