//! DynStep - object-safe な step 抽象
//!
//! # 学習ポイント
//! - ジェネリック trait (`LoadingStep`) と object-safe trait (`DynStep`) の二層構造
//! - Type erasure パターン (`TypedStep<S>` → `Box<dyn DynStep>`)
//!
//! `DynStep` を直接実装すると、宣言した artifact 型と実際の型の一致は
//! コンパイル時には保証されません。pipeline が実行時に検査し、
//! 不一致は `LoadError::TypeMismatch`（致命的）になります。

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ArtifactType, DynArtifact, LoadError};
use crate::typed::context::LoadContext;
use crate::typed::step::LoadingStep;

#[async_trait]
pub trait DynStep: Send + Sync {
    fn name(&self) -> &str;

    /// Declared artifact type, fixed for the step's lifetime.
    fn artifact_type(&self) -> ArtifactType;

    fn requires(&self) -> Vec<ArtifactType>;

    async fn load_dyn(&self, ctx: &LoadContext<'_>) -> Result<Arc<dyn DynArtifact>, LoadError>;
}

/// Erases a `LoadingStep` into a `DynStep`.
pub struct TypedStep<S> {
    step: S,
    declared: ArtifactType,
}

impl<S: LoadingStep> TypedStep<S> {
    pub fn new(step: S) -> Self {
        let declared = step.artifact_type();
        Self { step, declared }
    }
}

#[async_trait]
impl<S: LoadingStep> DynStep for TypedStep<S> {
    fn name(&self) -> &str {
        self.step.name()
    }

    fn artifact_type(&self) -> ArtifactType {
        self.declared
    }

    fn requires(&self) -> Vec<ArtifactType> {
        self.step.requires()
    }

    async fn load_dyn(&self, ctx: &LoadContext<'_>) -> Result<Arc<dyn DynArtifact>, LoadError> {
        let artifact = self.step.load(ctx).await?;
        Ok(Arc::new(artifact))
    }
}
