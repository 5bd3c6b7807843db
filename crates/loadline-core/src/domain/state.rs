//! Step and run state machines.

use serde::{Deserialize, Serialize};

/// Step state (per step instance, per run).
///
/// State transitions:
/// - Created -> Running -> Completed
/// - Created -> Running -> Failed
/// - Created -> Running -> Cancelled
///
/// A step the run never reached stays `Created`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepState {
    /// Not started yet.
    Created,

    /// `load` is in flight.
    Running,

    /// Artifact produced and recorded.
    Completed,

    /// `load` failed.
    Failed,

    /// Run was cancelled while the step was in flight.
    Cancelled,
}

impl StepState {
    /// Is this a terminal state (no further transitions)?
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            StepState::Completed | StepState::Failed | StepState::Cancelled
        )
    }

    pub fn can_transition_to(self, next: StepState) -> bool {
        matches!(
            (self, next),
            (StepState::Created, StepState::Running)
                | (
                    StepState::Running,
                    StepState::Completed | StepState::Failed | StepState::Cancelled
                )
        )
    }

    /// Move to `next`, or return the rejected transition unchanged.
    pub fn transition(&mut self, next: StepState) -> Result<(), InvalidTransition> {
        if !self.can_transition_to(next) {
            return Err(InvalidTransition {
                from: *self,
                to: next,
            });
        }
        *self = next;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid step transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: StepState,
    pub to: StepState,
}

/// Run state (aggregated from steps).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Running,

    /// Every step completed, or failed under a tolerate policy.
    Completed,

    /// Aborted on an untolerated failure.
    Failed,

    /// Aborted by the run's cancellation token.
    Cancelled,
}

impl RunState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, RunState::Running)
    }
}
