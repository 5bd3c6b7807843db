//! App - アプリケーション層
//!
//! typed / ports を組み合わせて pipeline を構築・実行します。
//!
//! # 主要コンポーネント
//! - **PipelineBuilder**: step の登録と起動時検証
//! - **Pipeline**: step の逐次実行、artifact の記録、失敗・キャンセルの伝播
//! - **PipelineConfig**: TOML で与える run ポリシー

pub mod builder;
pub mod config;
pub mod pipeline;

#[cfg(test)]
pub(crate) mod test_support;

// 主要な型を再エクスポート
pub use self::builder::{BuildError, PipelineBuilder};
pub use self::config::{ConfigError, PipelineConfig};
pub use self::pipeline::{FailurePolicy, Pipeline, RunError, RunOutcome};
