//! Ports - 抽象化レイヤー
//!
//! pipeline が外部に依存する部分（時刻、ID 生成、イベント配送、キャンセル）
//! を trait / 小さな型として定義し、実装の詳細を隠蔽します。

pub mod cancel;
pub mod clock;
pub mod event_sink;
pub mod id_generator;

// 主要な trait を再エクスポート
pub use self::cancel::{CancelSource, CancelToken};
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::event_sink::EventSink;
pub use self::id_generator::{IdGenerator, UlidGenerator};
