//! loadline demo: loads a game scene through a four-step pipeline
//!
//! ```text
//! fetch_manifest → init_audio → warm_shaders → activate_scene
//! ```
//!
//! 使用例:
//!   loadline-cli --fail init_audio
//!   loadline-cli --cancel-after-ms 300 --log-level debug
//!   loadline-cli --config pipeline.toml

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::Parser;
use loadline_core::domain::RunEvent;
use loadline_core::impls::ChannelEventSink;
use loadline_core::{
    Artifact, ArtifactType, CancelSource, CancelToken, EmptyLoadingStep, FailureKind,
    LoadContext, LoadError, LoadFailure, LoadingStep, PipelineBuilder, PipelineConfig, RunState,
    action, async_trait,
};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "loadline", version, about = "Run the demo scene-loading pipeline")]
struct Args {
    /// TOML file with tolerate / step_timeout_ms / expect_artifacts
    #[arg(long)]
    config: Option<PathBuf>,

    /// Make the named step fail (repeatable)
    #[arg(long = "fail", value_name = "STEP")]
    fail: Vec<String>,

    /// Cancel the run after this many milliseconds
    #[arg(long)]
    cancel_after_ms: Option<u64>,

    /// Simulated latency of each step
    #[arg(long, default_value = "200")]
    step_delay_ms: u64,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Debug, Serialize)]
struct Manifest {
    scene: String,
    bundles: Vec<String>,
}

impl Artifact for Manifest {
    const KIND: &'static str = "assets.manifest";
}

#[derive(Debug, Serialize)]
struct SceneHandle {
    scene: String,
    bundles_mounted: usize,
}

impl Artifact for SceneHandle {
    const KIND: &'static str = "scene.handle";
}

/// 失敗させる step 名の集合
#[derive(Clone, Default)]
struct Faults(Arc<HashSet<String>>);

impl Faults {
    fn check(&self, step: &str, kind: FailureKind) -> Result<(), LoadError> {
        if self.0.contains(step) {
            return Err(LoadError::failed(kind, format!("injected failure in {step}")));
        }
        Ok(())
    }
}

struct FetchManifest {
    delay: Duration,
    faults: Faults,
}

#[async_trait]
impl LoadingStep for FetchManifest {
    type Output = Manifest;

    fn name(&self) -> &str {
        "fetch_manifest"
    }

    async fn load(&self, ctx: &LoadContext<'_>) -> Result<Manifest, LoadError> {
        ctx.suspend(async {
            tokio::time::sleep(self.delay).await;
            Ok(())
        })
        .await?;
        self.faults.check(self.name(), FailureKind::MalformedInput)?;
        Ok(Manifest {
            scene: "harbor".to_string(),
            bundles: vec!["core".into(), "harbor.geometry".into(), "harbor.audio".into()],
        })
    }
}

struct InitAudio {
    delay: Duration,
    faults: Faults,
}

#[async_trait]
impl EmptyLoadingStep for InitAudio {
    fn name(&self) -> &str {
        "init_audio"
    }

    async fn execute(&self, ctx: &LoadContext<'_>) -> Result<(), LoadError> {
        ctx.suspend(async {
            tokio::time::sleep(self.delay).await;
            Ok(())
        })
        .await?;
        self.faults.check(self.name(), FailureKind::ResourceMissing)
    }
}

struct ActivateScene {
    faults: Faults,
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
        self.faults.check(self.name(), FailureKind::DependencyUnavailable)?;
        Ok(SceneHandle {
            scene: manifest.scene.clone(),
            bundles_mounted: manifest.bundles.len(),
        })
    }
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_tracing(&args.log_level);

    let config = match &args.config {
        Some(path) => PipelineConfig::from_path(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    // (A) step を組み立てる
    let delay = Duration::from_millis(args.step_delay_ms);
    let faults = Faults(Arc::new(args.fail.iter().cloned().collect()));
    let shader_faults = faults.clone();
    let (sink, mut events) = ChannelEventSink::new();

    let pipeline = PipelineBuilder::new()
        .step(FetchManifest {
            delay,
            faults: faults.clone(),
        })
        .empty(InitAudio {
            delay,
            faults: faults.clone(),
        })
        .empty(action("warm_shaders", move |cancel: CancelToken| {
            let faults = shader_faults.clone();
            async move {
                tokio::select! {
                    _ = cancel.cancelled() => return Err(LoadError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
                faults
                    .check("warm_shaders", FailureKind::Other)
                    .map_err(|e| match e.as_failure() {
                        Some(f) => LoadFailure::new(f.kind(), "shader cache corrupt").into(),
                        None => e,
                    })
            }
        }))
        .step(ActivateScene { faults })
        .expect_artifacts(&["scene.handle"])
        .config(config)
        .event_sink(Arc::new(sink))
        .build()
        .context("invalid pipeline wiring")?;

    // (B) 進捗表示
    let progress = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match &event {
                RunEvent::StepCompleted { step, elapsed_ms, .. } => {
                    info!(step = %step, elapsed_ms, "progress: done")
                }
                RunEvent::StepFailed {
                    step,
                    tolerated: true,
                    ..
                } => warn!(step = %step, "progress: skipped"),
                _ => {}
            }
        }
    });

    // (C) キャンセル: タイマーまたは Ctrl-C
    let cancel = CancelSource::new();
    let token = cancel.token();
    let cancel_after = args.cancel_after_ms.map(Duration::from_millis);
    tokio::spawn(async move {
        let timer = async {
            match cancel_after {
                Some(after) => tokio::time::sleep(after).await,
                None => std::future::pending().await,
            }
        };
        tokio::select! {
            _ = timer => info!("cancel timer fired"),
            _ = tokio::signal::ctrl_c() => info!("interrupted"),
        }
        cancel.cancel();
    });

    // (D) 実行
    let outcome = pipeline.run(token).await;
    // sink は pipeline と一緒に drop 済みなので progress は終了する
    let _ = progress.await;

    println!("{}", serde_json::to_string_pretty(&outcome.report)?);
    if let Some(scene) = outcome.artifacts.latest::<SceneHandle>() {
        println!("{}", serde_json::to_string_pretty(scene)?);
    }
    if let Some(err) = outcome.error() {
        warn!(error = %err, "run did not complete");
    }

    Ok(match outcome.report.state {
        RunState::Completed => ExitCode::SUCCESS,
        RunState::Cancelled => ExitCode::from(130),
        _ => ExitCode::FAILURE,
    })
}
