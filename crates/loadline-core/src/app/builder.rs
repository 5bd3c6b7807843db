//! PipelineBuilder - pipeline の構築とワイヤリング検証
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）: 何も実行する前に配線ミスを見つける
//! - 開発体験の改善（明確なエラーメッセージ）

use std::collections::HashSet;
use std::sync::Arc;

use crate::app::config::PipelineConfig;
use crate::app::pipeline::{FailurePolicy, Pipeline, StepSlot};
use crate::domain::ArtifactType;
use crate::impls::NoopEventSink;
use crate::ports::{Clock, EventSink, IdGenerator, SystemClock, UlidGenerator};
use crate::typed::{DynStep, EmptyLoadingStep, EmptyStep, LoadingStep, TypedStep};

/// PipelineBuilder は step を順番に登録して Pipeline を構築
///
/// # 使用例
/// ```ignore
/// let pipeline = PipelineBuilder::new()
///     .step(FetchManifest)
///     .empty(InitAudio)
///     .step(ActivateScene)
///     .tolerate("init_audio")
///     .expect_artifacts(&["scene.handle"])
///     .build()?;
///
/// let outcome = pipeline.run(cancel.token()).await;
/// ```
///
/// # Fail-fast 設計
/// build() 時に以下をチェックし、不足があれば BuildError を返す
/// - step 名の重複
/// - `requires()` の artifact 型が、より前の step で生成されること
/// - expect_artifacts() の kind が、どこかの step で生成されること
/// - tolerate() で指定した step が存在すること
pub struct PipelineBuilder {
    steps: Vec<StepSlot>,
    tolerated: Vec<String>,
    expected_artifacts: Vec<String>,
    config: PipelineConfig,
    sink: Option<Arc<dyn EventSink>>,
    ids: Option<Arc<dyn IdGenerator>>,
    clock: Option<Arc<dyn Clock>>,
}

/// BuildError は pipeline 構築時のエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("pipeline has no steps")]
    Empty,

    #[error("step name '{0}' is used more than once")]
    DuplicateStep(String),

    #[error("step '{step}' requires '{requires}', which no earlier step produces")]
    UnsatisfiedDependency { step: String, requires: ArtifactType },

    #[error("Missing artifact kinds: {0:?}. These were expected but no step produces them.")]
    MissingArtifactKinds(Vec<String>),

    #[error("tolerate() names unknown step '{0}'")]
    UnknownToleratedStep(String),
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            steps: Vec::new(),
            tolerated: Vec::new(),
            expected_artifacts: Vec::new(),
            config: PipelineConfig::default(),
            sink: None,
            ids: None,
            clock: None,
        }
    }

    /// Append a typed step.
    pub fn step<S: LoadingStep>(self, step: S) -> Self {
        self.dyn_step(Box::new(TypedStep::new(step)))
    }

    /// Append a side-effect-only step.
    pub fn empty<S: EmptyLoadingStep>(self, step: S) -> Self {
        self.step(EmptyStep::new(step))
    }

    /// Append an already erased step. Its declared type is checked at run time.
    pub fn dyn_step(mut self, step: Box<dyn DynStep>) -> Self {
        self.steps.push(StepSlot {
            step,
            policy: FailurePolicy::Abort,
        });
        self
    }

    /// Let the run continue when step `name` fails with a `LoadFailure`.
    pub fn tolerate(mut self, name: impl Into<String>) -> Self {
        self.tolerated.push(name.into());
        self
    }

    /// 期待される artifact kind のリストを設定
    pub fn expect_artifacts(mut self, kinds: &[&str]) -> Self {
        self.expected_artifacts
            .extend(kinds.iter().map(|k| k.to_string()));
        self
    }

    /// Apply a config; its `tolerate` and `expect_artifacts` add to the builder's.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// PipelineBuilder を検証して Pipeline を生成
    pub fn build(self) -> Result<Pipeline, BuildError> {
        if self.steps.is_empty() {
            return Err(BuildError::Empty);
        }

        let mut names: HashSet<&str> = HashSet::new();
        let mut produced: HashSet<ArtifactType> = HashSet::new();
        for slot in &self.steps {
            let name = slot.step.name();
            if !names.insert(name) {
                return Err(BuildError::DuplicateStep(name.to_string()));
            }
            // 自分自身の出力は自分の入力にならない
            if let Some(missing) = slot
                .step
                .requires()
                .into_iter()
                .find(|r| !produced.contains(r))
            {
                return Err(BuildError::UnsatisfiedDependency {
                    step: name.to_string(),
                    requires: missing,
                });
            }
            produced.insert(slot.step.artifact_type());
        }

        let produced_kinds: HashSet<&str> = produced.iter().map(|t| t.kind()).collect();
        let missing_kinds: Vec<String> = self
            .expected_artifacts
            .iter()
            .chain(self.config.expect_artifacts.iter())
            .filter(|k| !produced_kinds.contains(k.as_str()))
            .cloned()
            .collect();
        if !missing_kinds.is_empty() {
            return Err(BuildError::MissingArtifactKinds(missing_kinds));
        }

        let tolerated: Vec<&String> = self
            .tolerated
            .iter()
            .chain(self.config.tolerate.iter())
            .collect();
        if let Some(unknown) = tolerated.iter().find(|t| !names.contains(t.as_str())) {
            return Err(BuildError::UnknownToleratedStep(unknown.to_string()));
        }
        let tolerated: HashSet<String> = tolerated.into_iter().cloned().collect();

        let mut steps = self.steps;
        for slot in &mut steps {
            if tolerated.contains(slot.step.name()) {
                slot.policy = FailurePolicy::Tolerate;
            }
        }

        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(SystemClock)));
        Ok(Pipeline {
            id: ids.generate_pipeline_id(),
            steps,
            step_timeout: self.config.step_timeout(),
            sink: self.sink.unwrap_or_else(|| Arc::new(NoopEventSink)),
            ids,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        })
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
