//! Steps shared by the builder and pipeline tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    Artifact, ArtifactType, DynArtifact, EmptyArtifact, FailureKind, LoadError, LoadFailure,
};
use crate::typed::{DynStep, EmptyLoadingStep, LoadContext, LoadingStep};

/// Execution journal shared between steps of one test.
#[derive(Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub(crate) fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub(crate) fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Manifest {
    pub(crate) bundles: Vec<String>,
}

impl Artifact for Manifest {
    const KIND: &'static str = "test.manifest";
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SceneHandle {
    pub(crate) bundle_count: usize,
}

impl Artifact for SceneHandle {
    const KIND: &'static str = "test.scene";
}

pub(crate) struct FetchManifest {
    pub(crate) journal: Journal,
    pub(crate) delay: Duration,
}

#[async_trait]
impl LoadingStep for FetchManifest {
    type Output = Manifest;

    fn name(&self) -> &str {
        "fetch_manifest"
    }

    async fn load(&self, ctx: &LoadContext<'_>) -> Result<Manifest, LoadError> {
        self.journal.record("fetch_manifest:start");
        ctx.suspend(async {
            tokio::time::sleep(self.delay).await;
            Ok(())
        })
        .await?;
        self.journal.record("fetch_manifest:end");
        Ok(Manifest {
            bundles: vec!["core".to_string(), "level1".to_string()],
        })
    }
}

pub(crate) struct ActivateScene {
    pub(crate) journal: Journal,
}

#[async_trait]
impl LoadingStep for ActivateScene {
    type Output = SceneHandle;

    fn name(&self) -> &str {
        "activate_scene"
    }

    fn requires(&self) -> Vec<ArtifactType> {
        vec![ArtifactType::of::<Manifest>()]
    }

    async fn load(&self, ctx: &LoadContext<'_>) -> Result<SceneHandle, LoadError> {
        let manifest = ctx.artifact::<Manifest>()?;
        self.journal
            .record(format!("activate_scene:saw {} bundles", manifest.bundles.len()));
        Ok(SceneHandle {
            bundle_count: manifest.bundles.len(),
        })
    }
}

#[derive(Clone)]
pub(crate) enum AudioBehavior {
    Succeed,
    Fail(&'static str),
    /// Awaits a device that shows up after this long.
    WaitForDevice(Duration),
}

pub(crate) struct InitAudio {
    pub(crate) journal: Journal,
    pub(crate) behavior: AudioBehavior,
}

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub(crate) struct DeviceError(pub(crate) &'static str);

#[async_trait]
impl EmptyLoadingStep for InitAudio {
    fn name(&self) -> &str {
        "init_audio"
    }

    async fn execute(&self, ctx: &LoadContext<'_>) -> Result<(), LoadError> {
        self.journal.record("init_audio:start");
        match &self.behavior {
            AudioBehavior::Succeed => {}
            AudioBehavior::Fail(msg) => {
                return Err(
                    LoadFailure::from_cause(FailureKind::ResourceMissing, DeviceError(*msg)).into(),
                );
            }
            AudioBehavior::WaitForDevice(after) => {
                let after = *after;
                ctx.suspend(async move {
                    tokio::time::sleep(after).await;
                    Ok(())
                })
                .await?;
            }
        }
        self.journal.record("init_audio:end");
        Ok(())
    }
}

/// Declares `Manifest` but hands back an `EmptyArtifact`.
pub(crate) struct MislabeledStep;

#[async_trait]
impl DynStep for MislabeledStep {
    fn name(&self) -> &str {
        "mislabeled"
    }

    fn artifact_type(&self) -> ArtifactType {
        ArtifactType::of::<Manifest>()
    }

    fn requires(&self) -> Vec<ArtifactType> {
        Vec::new()
    }

    async fn load_dyn(&self, _ctx: &LoadContext<'_>) -> Result<Arc<dyn DynArtifact>, LoadError> {
        Ok(Arc::new(EmptyArtifact))
    }
}
