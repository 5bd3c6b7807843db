//! Run report: the serializable summary of one pipeline run.
//!
//! This module only defines the "shape" of results so they can be printed,
//! logged, or stored by the host application.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ids::RunId;
use super::state::{RunState, StepState};

/// Per-step line of a run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepReport {
    pub name: String,

    /// `Artifact::KIND` the step declared.
    pub artifact: String,

    pub state: StepState,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// The step failed but its failure policy let the run continue.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub tolerated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed_ms: Option<u64>,
}

impl StepReport {
    pub fn pending(name: impl Into<String>, artifact: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            artifact: artifact.into(),
            state: StepState::Created,
            error: None,
            tolerated: false,
            elapsed_ms: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: RunId,
    pub state: RunState,
    pub steps: Vec<StepReport>,
    pub started_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunReport {
    pub fn step(&self, name: &str) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.name == name)
    }

    /// Names of the steps currently in `state`, in pipeline order.
    pub fn steps_in(&self, state: StepState) -> Vec<&str> {
        self.steps
            .iter()
            .filter(|s| s.state == state)
            .map(|s| s.name.as_str())
            .collect()
    }

    pub fn succeeded(&self) -> bool {
        self.state == RunState::Completed
    }
}
