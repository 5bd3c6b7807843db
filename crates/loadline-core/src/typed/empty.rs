//! EmptyLoadingStep - artifact を生成しない（副作用だけの）step
//!
//! 継承ではなく合成で表現します:
//! - `EmptyLoadingStep`: `execute` だけを実装する trait
//! - `EmptyStep<S>`: それを `LoadingStep<Output = EmptyArtifact>` に変換するアダプタ
//! - `action()`: async クロージャをそのまま step にするヘルパー

use std::future::Future;

use async_trait::async_trait;

use crate::domain::{ArtifactType, EmptyArtifact, LoadError};
use crate::ports::CancelToken;
use crate::typed::context::LoadContext;
use crate::typed::step::LoadingStep;

/// EmptyLoadingStep は初期化やウォームアップなど、データを返さない step
///
/// # 使用例
/// ```ignore
/// struct InitAudio;
///
/// #[async_trait]
/// impl EmptyLoadingStep for InitAudio {
///     fn name(&self) -> &str {
///         "init_audio"
///     }
///
///     async fn execute(&self, ctx: &LoadContext<'_>) -> Result<(), LoadError> {
///         let device = ctx.suspend(open_device()).await?;
///         device.warm_up();
///         Ok(())
///     }
/// }
///
/// builder.empty(InitAudio);
/// ```
#[async_trait]
pub trait EmptyLoadingStep: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn requires(&self) -> Vec<ArtifactType> {
        Vec::new()
    }

    async fn execute(&self, ctx: &LoadContext<'_>) -> Result<(), LoadError>;
}

/// Adapter: any `EmptyLoadingStep` is a `LoadingStep` producing `EmptyArtifact`.
pub struct EmptyStep<S> {
    inner: S,
}

impl<S: EmptyLoadingStep> EmptyStep<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: EmptyLoadingStep> LoadingStep for EmptyStep<S> {
    type Output = EmptyArtifact;

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn requires(&self) -> Vec<ArtifactType> {
        self.inner.requires()
    }

    async fn load(&self, ctx: &LoadContext<'_>) -> Result<EmptyArtifact, LoadError> {
        ctx.suspend(self.inner.execute(ctx)).await?;
        Ok(EmptyArtifact)
    }
}

/// A side-effect step built from an async closure. See [`action`].
pub struct ActionStep<F> {
    name: String,
    f: F,
}

/// Wrap `f` into an `EmptyLoadingStep` named `name`.
///
/// The closure receives the run's cancel token; it is awaited as a
/// suspension point, so cancellation is observed even if `f` ignores it.
///
/// ```ignore
/// builder.empty(action("warm_shaders", |_cancel| async {
///     compile_shaders().await.map_err(|e| LoadFailure::from_cause(FailureKind::Other, e))?;
///     Ok(())
/// }));
/// ```
pub fn action<F, Fut>(name: impl Into<String>, f: F) -> ActionStep<F>
where
    F: Fn(CancelToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), LoadError>> + Send + 'static,
{
    ActionStep {
        name: name.into(),
        f,
    }
}

#[async_trait]
impl<F, Fut> EmptyLoadingStep for ActionStep<F>
where
    F: Fn(CancelToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), LoadError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &LoadContext<'_>) -> Result<(), LoadError> {
        (self.f)(ctx.cancel_token().clone()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FailureKind, LoadFailure, RunId};
    use crate::ports::CancelSource;
    use crate::typed::store::ArtifactStore;
    use std::error::Error as _;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use ulid::Ulid;

    #[derive(Debug, thiserror::Error)]
    #[error("device not found")]
    struct DeviceNotFound;

    enum Behavior {
        Succeed,
        Fail,
        WaitForDevice,
    }

    struct InitAudio {
        behavior: Behavior,
        calls: Arc<AtomicU32>,
    }

    impl InitAudio {
        fn new(behavior: Behavior) -> Self {
            Self {
                behavior,
                calls: Arc::new(AtomicU32::new(0)),
            }
        }
    }

    #[async_trait]
    impl EmptyLoadingStep for InitAudio {
        fn name(&self) -> &str {
            "init_audio"
        }

        async fn execute(&self, _ctx: &LoadContext<'_>) -> Result<(), LoadError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.behavior {
                Behavior::Succeed => Ok(()),
                Behavior::Fail => {
                    Err(LoadFailure::from_cause(FailureKind::ResourceMissing, DeviceNotFound).into())
                }
                // ignores cancellation on purpose; the adapter must still observe it
                Behavior::WaitForDevice => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
            }
        }
    }

    fn run_id() -> RunId {
        RunId::from_ulid(Ulid::new())
    }

    #[tokio::test]
    async fn successful_execute_yields_empty_artifact() {
        let step = EmptyStep::new(InitAudio::new(Behavior::Succeed));
        let store = ArtifactStore::new();
        let token = CancelToken::never();
        let ctx = LoadContext::new(run_id(), step.name(), &store, &token);

        let artifact = step.load(&ctx).await.unwrap();
        assert_eq!(artifact, EmptyArtifact);
        assert!(step.artifact_type().is::<EmptyArtifact>());
        assert_eq!(step.inner().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_execute_propagates_cause() {
        let step = EmptyStep::new(InitAudio::new(Behavior::Fail));
        let store = ArtifactStore::new();
        let token = CancelToken::never();
        let ctx = LoadContext::new(run_id(), step.name(), &store, &token);

        let err = step.load(&ctx).await.unwrap_err();
        let failure = err.as_failure().expect("load failure");
        assert_eq!(failure.message(), "device not found");
        assert!(failure.source().unwrap().is::<DeviceNotFound>());
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_while_suspended_is_cancelled() {
        let step = EmptyStep::new(InitAudio::new(Behavior::WaitForDevice));
        let store = ArtifactStore::new();
        let source = CancelSource::new();
        let token = source.token();
        let ctx = LoadContext::new(run_id(), step.name(), &store, &token);

        let cancel = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            source.cancel();
        };
        let (res, ()) = tokio::join!(step.load(&ctx), cancel);
        assert!(matches!(res, Err(LoadError::Cancelled)));
    }

    #[tokio::test]
    async fn action_receives_cancel_token() {
        let step = EmptyStep::new(action("warm_shaders", |cancel: CancelToken| async move {
            if cancel.is_cancelled() {
                return Err(LoadError::Cancelled);
            }
            Ok(())
        }));
        assert_eq!(step.name(), "warm_shaders");

        let store = ArtifactStore::new();
        let token = CancelToken::never();
        let ctx = LoadContext::new(run_id(), step.name(), &store, &token);
        assert_eq!(step.load(&ctx).await.unwrap(), EmptyArtifact);
    }
}
