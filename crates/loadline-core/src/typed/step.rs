//! LoadingStep trait - 型付き step の定義
//!
//! # 学習ポイント
//! - Associated Types (`type Output`) で生成する artifact 型を固定する
//! - 宣言した型と実際に返す型の一致をコンパイル時に保証する

use async_trait::async_trait;

use crate::domain::{Artifact, ArtifactType, LoadError};
use crate::typed::context::LoadContext;

/// LoadingStep は artifact を 1 つ非同期に生成する
///
/// # 使用例
/// ```ignore
/// struct FetchManifest;
///
/// #[async_trait]
/// impl LoadingStep for FetchManifest {
///     type Output = Manifest;
///
///     fn name(&self) -> &str {
///         "fetch_manifest"
///     }
///
///     async fn load(&self, ctx: &LoadContext<'_>) -> Result<Manifest, LoadError> {
///         let bytes = ctx.suspend(read_manifest()).await?;
///         Manifest::parse(&bytes)
///     }
/// }
/// ```
///
/// # 契約
/// - `load` は run ごとに最大 1 回だけ呼ばれる
/// - artifact は pipeline が保持する（step 側でキャッシュしない）
/// - キャンセルは suspension point で観測し、`LoadError::Cancelled` を返す
#[async_trait]
pub trait LoadingStep: Send + Sync + 'static {
    type Output: Artifact;

    /// Stable, unique name within a pipeline.
    fn name(&self) -> &str;

    /// Artifact types this step reads from upstream steps.
    ///
    /// Checked by `PipelineBuilder::build` before anything runs.
    fn requires(&self) -> Vec<ArtifactType> {
        Vec::new()
    }

    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::of::<Self::Output>()
    }

    async fn load(&self, ctx: &LoadContext<'_>) -> Result<Self::Output, LoadError>;
}
