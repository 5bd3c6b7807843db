//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **NoopEventSink**: デフォルト（何もしない）
//! - **MemoryEventSink**: テスト・デバッグ用にイベントを記録
//! - **ChannelEventSink**: ホスト側（進捗表示など）へ mpsc で配送

pub mod event_sinks;

// 主要な型を再エクスポート
pub use self::event_sinks::{ChannelEventSink, MemoryEventSink, NoopEventSink};
