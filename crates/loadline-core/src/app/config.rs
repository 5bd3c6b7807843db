//! PipelineConfig - run ポリシーの設定
//!
//! TOML から読み込めます。省略した項目はデフォルト値になります。
//!
//! ```toml
//! tolerate = ["warm_shaders"]
//! step_timeout_ms = 30000
//! expect_artifacts = ["assets.manifest", "scene.handle"]
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Steps whose `LoadFailure` does not abort the run.
    pub tolerate: Vec<String>,

    /// Per-step time limit; exceeding it is a `LoadFailure` of kind `Timeout`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_timeout_ms: Option<u64>,

    /// Artifact kinds some step must produce (checked at build time).
    pub expect_artifacts: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

impl PipelineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn step_timeout(&self) -> Option<Duration> {
        self.step_timeout_ms.map(Duration::from_millis)
    }

    pub fn tolerates(&self, step: &str) -> bool {
        self.tolerate.iter().any(|s| s == step)
    }
}
