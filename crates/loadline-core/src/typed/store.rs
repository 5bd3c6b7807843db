//! ArtifactStore - run 中に生成された artifact の保管
//!
//! # 学習ポイント
//! - 型消去された trait object (`Arc<dyn DynArtifact>`) の管理
//! - Generic methods での型安全な取り出し（downcast）
//! - append-only: 書き込みは pipeline だけ、step は `&ArtifactStore` を借りるだけ

use std::sync::Arc;

use crate::domain::{Artifact, ArtifactType, DynArtifact};

/// ArtifactStore は step 名 → artifact を挿入順で保持
///
/// # 使用例
/// ```ignore
/// let manifest: &Manifest = store.get::<Manifest>("fetch_manifest")?;
/// let latest: Option<&Manifest> = store.latest::<Manifest>();
/// ```
#[derive(Debug, Default, Clone)]
pub struct ArtifactStore {
    entries: Vec<(String, Arc<dyn DynArtifact>)>,
}

/// LookupError は ArtifactStore の取り出しエラー
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LookupError {
    #[error("no artifact recorded for step '{0}'")]
    NotFound(String),

    #[error("step '{step}' produced '{actual}', not '{requested}'")]
    WrongType {
        step: String,
        requested: ArtifactType,
        actual: ArtifactType,
    },

    #[error("artifact for step '{0}' is already recorded")]
    AlreadyRecorded(String),
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Record the artifact of `step`. Each step records at most once.
    pub(crate) fn insert(
        &mut self,
        step: &str,
        artifact: Arc<dyn DynArtifact>,
    ) -> Result<(), LookupError> {
        if self.contains(step) {
            return Err(LookupError::AlreadyRecorded(step.to_string()));
        }
        self.entries.push((step.to_string(), artifact));
        Ok(())
    }

    pub fn contains(&self, step: &str) -> bool {
        self.entries.iter().any(|(name, _)| name == step)
    }

    pub fn get_dyn(&self, step: &str) -> Option<&Arc<dyn DynArtifact>> {
        self.entries
            .iter()
            .find(|(name, _)| name == step)
            .map(|(_, artifact)| artifact)
    }

    /// Borrow the artifact of `step` as a `T`.
    pub fn get<T: Artifact>(&self, step: &str) -> Result<&T, LookupError> {
        let artifact = self
            .get_dyn(step)
            .ok_or_else(|| LookupError::NotFound(step.to_string()))?;
        artifact
            .downcast_ref::<T>()
            .ok_or_else(|| LookupError::WrongType {
                step: step.to_string(),
                requested: ArtifactType::of::<T>(),
                actual: artifact.artifact_type(),
            })
    }

    /// The most recently recorded artifact of type `T`.
    pub fn latest<T: Artifact>(&self) -> Option<&T> {
        self.entries
            .iter()
            .rev()
            .find_map(|(_, artifact)| artifact.downcast_ref::<T>())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn DynArtifact>)> {
        self.entries.iter().map(|(name, a)| (name.as_str(), a))
    }

    /// Step names in recording order.
    pub fn steps(&self) -> Vec<&str> {
        self.entries.iter().map(|(name, _)| name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
