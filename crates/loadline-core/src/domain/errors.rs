//! Errors - ステップ実行エラーの分類
//!
//! - `LoadFailure`: 下位の処理が artifact を生成できなかった
//! - `Cancelled`: run がキャンセルされた（バグではない）
//! - `TypeMismatch`: 宣言した artifact 型と実際の型が違う（契約違反）

use std::error::Error as StdError;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::artifact::ArtifactType;

/// FailureKind は LoadFailure の分類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    ResourceMissing,
    MalformedInput,
    DependencyUnavailable,
    Timeout,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::ResourceMissing => "resource missing",
            FailureKind::MalformedInput => "malformed input",
            FailureKind::DependencyUnavailable => "dependency unavailable",
            FailureKind::Timeout => "timeout",
            FailureKind::Other => "other",
        };
        f.write_str(s)
    }
}

/// LoadFailure は step の下位処理の失敗
///
/// 元の原因は `source()` で辿れます。
#[derive(Debug)]
pub struct LoadFailure {
    kind: FailureKind,
    message: String,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl LoadFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Other, message)
    }

    /// Wrap an underlying error; its text becomes the message.
    pub fn from_cause<E>(kind: FailureKind, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            kind,
            message: cause.to_string(),
            source: Some(Box::new(cause)),
        }
    }

    pub fn with_source<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(cause));
        self
    }

    pub fn kind(&self) -> FailureKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Message of the innermost cause, or this failure's own message.
    pub fn root_cause(&self) -> String {
        let mut current: &(dyn StdError + 'static) = match &self.source {
            Some(source) => source.as_ref() as &(dyn StdError + 'static),
            None => return self.message.clone(),
        };
        while let Some(next) = current.source() {
            current = next;
        }
        current.to_string()
    }
}

impl fmt::Display for LoadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "load failed ({}): {}", self.kind, self.message)
    }
}

impl StdError for LoadFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}

/// LoadError は `load` / `execute` の結果エラー
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(transparent)]
    Failed(#[from] LoadFailure),

    #[error("cancelled")]
    Cancelled,

    #[error("step '{step}' declared artifact '{declared}' but produced '{actual}'")]
    TypeMismatch {
        step: String,
        declared: ArtifactType,
        actual: ArtifactType,
    },
}

impl LoadError {
    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        LoadError::Failed(LoadFailure::new(kind, message))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, LoadError::Cancelled)
    }

    pub fn as_failure(&self) -> Option<&LoadFailure> {
        match self {
            LoadError::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}
