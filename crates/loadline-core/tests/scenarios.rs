//! End-to-end runs through the public API only.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use loadline_core::domain::RunEvent;
use loadline_core::impls::ChannelEventSink;
use loadline_core::{
    Artifact, ArtifactType, CancelSource, CancelToken, EmptyArtifact, EmptyLoadingStep,
    FailureKind, LoadContext, LoadError, LoadFailure, LoadingStep, PipelineBuilder,
    PipelineConfig, RunError, RunState, StepState, action,
};

#[derive(Debug)]
struct Catalog {
    textures: Vec<&'static str>,
}

impl Artifact for Catalog {
    const KIND: &'static str = "it.catalog";
}

#[derive(Debug, PartialEq)]
struct Level {
    name: String,
    textures: usize,
}

impl Artifact for Level {
    const KIND: &'static str = "it.level";
}

struct ReadCatalog;

#[async_trait]
impl LoadingStep for ReadCatalog {
    type Output = Catalog;

    fn name(&self) -> &str {
        "read_catalog"
    }

    async fn load(&self, ctx: &LoadContext<'_>) -> Result<Catalog, LoadError> {
        ctx.suspend(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok(())
        })
        .await?;
        Ok(Catalog {
            textures: vec!["grass", "stone", "water"],
        })
    }
}

struct BuildLevel;

#[async_trait]
impl LoadingStep for BuildLevel {
    type Output = Level;

    fn name(&self) -> &str {
        "build_level"
    }

    fn requires(&self) -> Vec<ArtifactType> {
        vec![ArtifactType::of::<Catalog>()]
    }

    async fn load(&self, ctx: &LoadContext<'_>) -> Result<Level, LoadError> {
        let catalog = ctx.artifact::<Catalog>()?;
        Ok(Level {
            name: "meadow".to_string(),
            textures: catalog.textures.len(),
        })
    }
}

/// Opens a controller; fails when none is attached.
struct OpenController {
    attached: bool,
    opened: Arc<AtomicBool>,
}

#[async_trait]
impl EmptyLoadingStep for OpenController {
    fn name(&self) -> &str {
        "open_controller"
    }

    async fn execute(&self, _ctx: &LoadContext<'_>) -> Result<(), LoadError> {
        if !self.attached {
            return Err(
                LoadFailure::new(FailureKind::ResourceMissing, "no controller attached").into(),
            );
        }
        self.opened.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn builder(attached: bool, opened: &Arc<AtomicBool>) -> PipelineBuilder {
    PipelineBuilder::new()
        .step(ReadCatalog)
        .empty(OpenController {
            attached,
            opened: opened.clone(),
        })
        .step(BuildLevel)
}

#[tokio::test(start_paused = true)]
async fn full_load_produces_every_artifact() {
    let opened = Arc::new(AtomicBool::new(false));
    let outcome = builder(true, &opened)
        .expect_artifacts(&["it.level"])
        .build()
        .unwrap()
        .run(CancelToken::never())
        .await;

    assert!(outcome.report.succeeded());
    assert!(opened.load(Ordering::SeqCst));

    let artifacts = outcome.into_result().unwrap();
    assert_eq!(
        artifacts.steps(),
        vec!["read_catalog", "open_controller", "build_level"]
    );
    assert_eq!(artifacts.get::<EmptyArtifact>("open_controller").unwrap(), &EmptyArtifact);
    assert_eq!(
        artifacts.latest::<Level>(),
        Some(&Level {
            name: "meadow".to_string(),
            textures: 3
        })
    );
}

#[tokio::test(start_paused = true)]
async fn config_file_can_tolerate_a_side_effect_step() {
    let config = PipelineConfig::from_toml_str(
        r#"
        tolerate = ["open_controller"]
        step_timeout_ms = 5000
        "#,
    )
    .unwrap();
    let opened = Arc::new(AtomicBool::new(false));

    let outcome = builder(false, &opened)
        .config(config)
        .build()
        .unwrap()
        .run(CancelToken::never())
        .await;

    assert_eq!(outcome.report.state, RunState::Completed);
    assert_eq!(outcome.report.steps_in(StepState::Failed), vec!["open_controller"]);
    assert!(outcome.artifacts.contains("build_level"));
    assert!(!outcome.artifacts.contains("open_controller"));
}

#[tokio::test(start_paused = true)]
async fn failure_without_tolerance_surfaces_the_cause() {
    let opened = Arc::new(AtomicBool::new(false));
    let err = builder(false, &opened)
        .build()
        .unwrap()
        .run(CancelToken::never())
        .await
        .into_result()
        .unwrap_err();

    assert_eq!(err.step(), Some("open_controller"));
    match err {
        RunError::StepFailed { source, .. } => {
            let failure = source.as_failure().unwrap();
            assert_eq!(failure.kind(), FailureKind::ResourceMissing);
            assert_eq!(failure.message(), "no controller attached");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn cooperative_action_observes_cancellation() {
    let source = CancelSource::new();

    let run = PipelineBuilder::new()
        .step(ReadCatalog)
        .empty(action("stream_music", |cancel: CancelToken| async move {
            tokio::select! {
                _ = cancel.cancelled() => Err(LoadError::Cancelled),
                _ = tokio::time::sleep(Duration::from_secs(600)) => Ok(()),
            }
        }))
        .step(BuildLevel)
        .build()
        .unwrap()
        .run(source.token());
    let cancel = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        source.cancel();
    };

    let (outcome, ()) = tokio::join!(run, cancel);

    assert_eq!(outcome.report.state, RunState::Cancelled);
    assert_eq!(outcome.report.step("stream_music").unwrap().state, StepState::Cancelled);
    assert_eq!(outcome.report.step("build_level").unwrap().state, StepState::Created);
    assert_eq!(outcome.artifacts.steps(), vec!["read_catalog"]);
}

#[tokio::test(start_paused = true)]
async fn progress_events_reach_a_channel() {
    let (sink, mut rx) = ChannelEventSink::new();
    let opened = Arc::new(AtomicBool::new(false));
    let outcome = builder(true, &opened)
        .event_sink(Arc::new(sink))
        .build()
        .unwrap()
        .run(CancelToken::never())
        .await;

    let mut completed = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let RunEvent::StepCompleted { step, artifact, .. } = event {
            completed.push(format!("{step}:{artifact}"));
        }
    }
    assert_eq!(
        completed,
        vec![
            "read_catalog:it.catalog",
            "open_controller:empty",
            "build_level:it.level"
        ]
    );

    let json = serde_json::to_value(&outcome.report).unwrap();
    assert_eq!(json["state"], "COMPLETED");
    assert_eq!(json["steps"][1]["artifact"], "empty");
}
