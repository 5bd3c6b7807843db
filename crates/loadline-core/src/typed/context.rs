//! LoadContext - step に渡される実行コンテキスト
//!
//! step が触れられるもの:
//! - それまでに記録された artifact（読み取りのみ）
//! - run のキャンセルトークン（suspension point で観測する）

use std::future::Future;

use crate::domain::{Artifact, FailureKind, LoadError, LoadFailure, RunId};
use crate::ports::CancelToken;
use crate::typed::store::{ArtifactStore, LookupError};

pub struct LoadContext<'a> {
    run_id: RunId,
    step: &'a str,
    artifacts: &'a ArtifactStore,
    cancel: &'a CancelToken,
}

impl<'a> LoadContext<'a> {
    pub fn new(
        run_id: RunId,
        step: &'a str,
        artifacts: &'a ArtifactStore,
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            run_id,
            step,
            artifacts,
            cancel,
        }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }

    /// Name of the step currently loading.
    pub fn step(&self) -> &str {
        self.step
    }

    pub fn artifacts(&self) -> &'a ArtifactStore {
        self.artifacts
    }

    /// The latest upstream artifact of type `T`.
    pub fn artifact<T: Artifact>(&self) -> Result<&'a T, LoadError> {
        self.artifacts.latest::<T>().ok_or_else(|| {
            LoadError::failed(
                FailureKind::DependencyUnavailable,
                format!("no upstream '{}' artifact", T::KIND),
            )
        })
    }

    /// The artifact produced by upstream step `step`, as a `T`.
    pub fn artifact_from<T: Artifact>(&self, step: &str) -> Result<&'a T, LoadError> {
        Ok(self.artifacts.get::<T>(step)?)
    }

    pub fn cancel_token(&self) -> &'a CancelToken {
        self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Fail with `Cancelled` if the run has been cancelled.
    pub fn checkpoint(&self) -> Result<(), LoadError> {
        if self.cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }
        Ok(())
    }

    /// Await `work` as a suspension point.
    ///
    /// Resolves to `Cancelled` as soon as the run is cancelled; `work` is
    /// dropped in that case. Cancellation wins ties.
    pub async fn suspend<F, T>(&self, work: F) -> Result<T, LoadError>
    where
        F: Future<Output = Result<T, LoadError>>,
    {
        self.checkpoint()?;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(LoadError::Cancelled),
            res = work => res,
        }
    }
}

impl From<LookupError> for LoadError {
    fn from(e: LookupError) -> Self {
        LoadFailure::from_cause(FailureKind::DependencyUnavailable, e).into()
    }
}
