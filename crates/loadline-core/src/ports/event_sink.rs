//! EventSink port - run イベントの記録
//!
//! 実装は `impls::event_sinks` にあります。

use crate::domain::RunEvent;

/// EventSink は RunEvent を受け取る
///
/// pipeline は run を進めながら同期的に呼び出します。
/// 重い処理はここで行わず、別タスクに渡してください。
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &RunEvent);
}
