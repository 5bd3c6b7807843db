//! Typed - 型付き step API
//!
//! 生成する artifact 型を型で固定し、pipeline との受け渡しを静的に保証します。
//!
//! # 二層構造
//! - **表層（Typed）**: `LoadingStep`, `EmptyLoadingStep` - 型安全
//! - **内部（Dyn）**: `DynStep` - object-safe, type erasure

pub mod context;
pub mod empty;
pub mod erased;
pub mod step;
pub mod store;

// 主要な trait/型 を再エクスポート
pub use self::context::LoadContext;
pub use self::empty::{ActionStep, EmptyLoadingStep, EmptyStep, action};
pub use self::erased::{DynStep, TypedStep};
pub use self::step::LoadingStep;
pub use self::store::{ArtifactStore, LookupError};
