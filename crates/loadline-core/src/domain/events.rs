//! Events - run の進行イベント
//!
//! EventSink に順番に送られます（tracing, テスト用のメモリ記録など）。

use serde::{Deserialize, Serialize};

use super::ids::RunId;
use super::state::RunState;

/// RunEvent は pipeline run の中で発生したイベント
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        run_id: RunId,
        steps: usize,
    },
    StepStarted {
        run_id: RunId,
        step: String,
    },
    StepCompleted {
        run_id: RunId,
        step: String,
        artifact: String,
        elapsed_ms: u64,
    },
    StepFailed {
        run_id: RunId,
        step: String,
        error: String,
        tolerated: bool,
    },
    StepCancelled {
        run_id: RunId,
        step: String,
    },
    RunFinished {
        run_id: RunId,
        state: RunState,
    },
}

impl RunEvent {
    pub fn run_id(&self) -> RunId {
        match self {
            RunEvent::RunStarted { run_id, .. }
            | RunEvent::StepStarted { run_id, .. }
            | RunEvent::StepCompleted { run_id, .. }
            | RunEvent::StepFailed { run_id, .. }
            | RunEvent::StepCancelled { run_id, .. }
            | RunEvent::RunFinished { run_id, .. } => *run_id,
        }
    }

    /// Step name, for step-scoped events.
    pub fn step(&self) -> Option<&str> {
        match self {
            RunEvent::StepStarted { step, .. }
            | RunEvent::StepCompleted { step, .. }
            | RunEvent::StepFailed { step, .. }
            | RunEvent::StepCancelled { step, .. } => Some(step),
            RunEvent::RunStarted { .. } | RunEvent::RunFinished { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ulid::Ulid;

    #[test]
    fn events_are_tagged() {
        let event = RunEvent::StepCancelled {
            run_id: RunId::from_ulid(Ulid::new()),
            step: "init_audio".to_string(),
        };
        let v = serde_json::to_value(&event).unwrap();
        assert_eq!(v["event"], "step_cancelled");
        assert_eq!(v["step"], "init_audio");
        assert_eq!(event.step(), Some("init_audio"));
    }
}
