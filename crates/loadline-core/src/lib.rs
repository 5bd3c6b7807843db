//! loadline-core
//!
//! Orchestration core for asset loading pipelines: typed loading steps,
//! side-effect-only steps, and a sequential runner with uniform failure and
//! cancellation handling.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（artifact, ids, state, errors, events, report）
//! - **ports**: 抽象化レイヤー（Clock, IdGenerator, EventSink, CancelToken）
//! - **typed**: 型付き step API（LoadingStep, EmptyLoadingStep, DynStep, ArtifactStore）
//! - **app**: PipelineBuilder, Pipeline, PipelineConfig
//! - **impls**: EventSink の実装

pub mod app;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod typed;

pub use app::{
    BuildError, FailurePolicy, Pipeline, PipelineBuilder, PipelineConfig, RunError, RunOutcome,
};
pub use domain::{
    Artifact, ArtifactType, EmptyArtifact, FailureKind, LoadError, LoadFailure, RunId, RunReport,
    RunState, StepState,
};
pub use ports::{CancelSource, CancelToken};
pub use typed::{EmptyLoadingStep, LoadContext, LoadingStep, action};

/// Re-exported so implementors can write `#[loadline_core::async_trait]`.
pub use async_trait::async_trait;
