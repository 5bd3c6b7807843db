//! Pipeline - step を順番に実行し artifact を記録する
//!
//! # フロー（step ごと）
//! 1. キャンセル済みなら残りの step を開始せずに終了
//! 2. Created → Running、`StepStarted` を送る
//! 3. `load_dyn` をキャンセルトークン（と timeout）と競合させて await
//! 4. 宣言型と実際の型を照合（不一致は致命的）
//! 5. artifact を store に記録 → 次の step から見えるようになる
//! 6. 失敗時は FailurePolicy に従って中断 or 続行

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::domain::{
    DynArtifact, FailureKind, LoadError, LoadFailure, PipelineId, RunEvent, RunId, RunReport,
    RunState, StepReport, StepState,
};
use crate::ports::{CancelToken, Clock, EventSink, IdGenerator};
use crate::typed::{ArtifactStore, DynStep, LoadContext};

/// What the run does when a step fails with a `LoadFailure`.
///
/// Cancellation and type mismatches always abort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    Abort,
    Tolerate,
}

pub(crate) struct StepSlot {
    pub(crate) step: Box<dyn DynStep>,
    pub(crate) policy: FailurePolicy,
}

/// A validated, ready-to-run pipeline. Built by `PipelineBuilder`.
///
/// `run` consumes the pipeline: every step instance is loaded at most once.
pub struct Pipeline {
    pub(crate) id: PipelineId,
    pub(crate) steps: Vec<StepSlot>,
    pub(crate) step_timeout: Option<Duration>,
    pub(crate) sink: Arc<dyn EventSink>,
    pub(crate) ids: Arc<dyn IdGenerator>,
    pub(crate) clock: Arc<dyn Clock>,
}

/// Why a run did not complete.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("step '{step}' failed: {source}")]
    StepFailed {
        step: String,
        #[source]
        source: LoadError,
    },

    #[error("run cancelled")]
    Cancelled { step: Option<String> },
}

impl RunError {
    pub fn step(&self) -> Option<&str> {
        match self {
            RunError::StepFailed { step, .. } => Some(step),
            RunError::Cancelled { step } => step.as_deref(),
        }
    }
}

/// Result of `Pipeline::run`: always carries the report.
#[derive(Debug)]
pub struct RunOutcome {
    pub report: RunReport,
    pub artifacts: ArtifactStore,
    error: Option<RunError>,
}

impl RunOutcome {
    pub fn error(&self) -> Option<&RunError> {
        self.error.as_ref()
    }

    pub fn into_result(self) -> Result<ArtifactStore, RunError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.artifacts),
        }
    }
}

impl Pipeline {
    pub fn id(&self) -> PipelineId {
        self.id
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.step.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order under `cancel`.
    pub async fn run(self, cancel: CancelToken) -> RunOutcome {
        let run_id = self.ids.generate_run_id();
        let span = info_span!("pipeline_run", run_id = %run_id, pipeline = %self.id);
        self.run_inner(run_id, cancel).instrument(span).await
    }

    async fn run_inner(self, run_id: RunId, cancel: CancelToken) -> RunOutcome {
        let started_at = self.clock.now();
        let mut store = ArtifactStore::new();
        let mut steps: Vec<StepReport> = self
            .steps
            .iter()
            .map(|s| StepReport::pending(s.step.name(), s.step.artifact_type().kind()))
            .collect();
        let mut run_state = RunState::Running;
        let mut run_error = None;

        info!(steps = self.steps.len(), "run started");
        self.sink.emit(&RunEvent::RunStarted {
            run_id,
            steps: self.steps.len(),
        });

        for (slot, report) in self.steps.iter().zip(steps.iter_mut()) {
            let name = slot.step.name();

            if cancel.is_cancelled() {
                info!(next_step = name, "run cancelled before step started");
                run_state = RunState::Cancelled;
                run_error = Some(RunError::Cancelled { step: None });
                break;
            }

            advance(report, StepState::Running);
            debug!(step = name, artifact = %slot.step.artifact_type(), "step started");
            self.sink.emit(&RunEvent::StepStarted {
                run_id,
                step: name.to_string(),
            });

            let started = Instant::now();
            let loaded = self.load_step(slot, run_id, &store, &cancel).await;
            let result = loaded.and_then(|artifact| {
                store
                    .insert(name, artifact)
                    .map_err(|e| LoadError::Failed(LoadFailure::from_cause(FailureKind::Other, e)))
            });
            let elapsed_ms = started.elapsed().as_millis() as u64;
            report.elapsed_ms = Some(elapsed_ms);

            match result {
                Ok(()) => {
                    advance(report, StepState::Completed);
                    info!(step = name, elapsed_ms, "step completed");
                    self.sink.emit(&RunEvent::StepCompleted {
                        run_id,
                        step: name.to_string(),
                        artifact: report.artifact.clone(),
                        elapsed_ms,
                    });
                }
                Err(LoadError::Cancelled) => {
                    advance(report, StepState::Cancelled);
                    info!(step = name, "step cancelled");
                    self.sink.emit(&RunEvent::StepCancelled {
                        run_id,
                        step: name.to_string(),
                    });
                    run_state = RunState::Cancelled;
                    run_error = Some(RunError::Cancelled {
                        step: Some(name.to_string()),
                    });
                    break;
                }
                Err(err) => {
                    let tolerated = slot.policy == FailurePolicy::Tolerate
                        && matches!(err, LoadError::Failed(_));
                    advance(report, StepState::Failed);
                    report.error = Some(err.to_string());
                    report.tolerated = tolerated;
                    self.sink.emit(&RunEvent::StepFailed {
                        run_id,
                        step: name.to_string(),
                        error: err.to_string(),
                        tolerated,
                    });

                    if tolerated {
                        warn!(step = name, error = %err, "step failed, continuing");
                        continue;
                    }
                    error!(step = name, error = %err, "step failed, aborting run");
                    run_state = RunState::Failed;
                    run_error = Some(RunError::StepFailed {
                        step: name.to_string(),
                        source: err,
                    });
                    break;
                }
            }
        }

        if run_state == RunState::Running {
            run_state = RunState::Completed;
        }
        info!(state = ?run_state, artifacts = store.len(), "run finished");
        self.sink.emit(&RunEvent::RunFinished {
            run_id,
            state: run_state,
        });

        RunOutcome {
            report: RunReport {
                run_id,
                state: run_state,
                steps,
                started_at,
                finished_at: Some(self.clock.now()),
            },
            artifacts: store,
            error: run_error,
        }
    }

    async fn load_step(
        &self,
        slot: &StepSlot,
        run_id: RunId,
        store: &ArtifactStore,
        cancel: &CancelToken,
    ) -> Result<Arc<dyn DynArtifact>, LoadError> {
        let ctx = LoadContext::new(run_id, slot.step.name(), store, cancel);
        let load = ctx.suspend(slot.step.load_dyn(&ctx));

        let loaded = match self.step_timeout {
            Some(limit) => tokio::time::timeout(limit, load).await.unwrap_or_else(|_| {
                Err(LoadError::failed(
                    FailureKind::Timeout,
                    format!("no result within {}ms", limit.as_millis()),
                ))
            }),
            None => load.await,
        };

        // once the token fired, any result except a contract violation is discarded
        let artifact = match loaded {
            Err(err @ LoadError::TypeMismatch { .. }) => return Err(err),
            _ if cancel.is_cancelled() => return Err(LoadError::Cancelled),
            other => other?,
        };

        let declared = slot.step.artifact_type();
        let actual = artifact.artifact_type();
        if declared != actual {
            return Err(LoadError::TypeMismatch {
                step: slot.step.name().to_string(),
                declared,
                actual,
            });
        }
        Ok(artifact)
    }
}

fn advance(report: &mut StepReport, next: StepState) {
    if let Err(err) = report.state.transition(next) {
        error!(step = %report.name, %err, "step state machine violated");
    }
}
