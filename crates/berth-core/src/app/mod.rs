//! App - アプリケーション層
//!
//! このモジュールは、ports を組み合わせて app のライフサイクルを実装します。
//!
//! # 主要コンポーネント
//! - **PlatformBuilder**: ワイヤリング（Fail-fast）
//! - **AppManager**: create / destroy / clone / rename / lock
//! - **ConfirmationGate**: 破壊的操作の確認
//! - **Console**: ユーザー向けの行出力
//! - **report / triggers / cleanup / deployed / containers**: AppManager の追加操作

pub mod builder;
pub mod cleanup;
pub mod commands;
pub mod confirm;
pub mod console;
pub mod containers;
pub mod deployed;
pub mod lifecycle;
pub mod report;
pub mod triggers;


// 主要な型を再エクスポート
pub use self::builder::{BuildError, PlatformBuilder};
pub use self::confirm::ConfirmationGate;
pub use self::console::Console;
pub use self::lifecycle::{AppManager, Settings};
pub use self::report::{ReportArgs, ReportFormat};
pub use self::triggers::{CoreReaction, core_registry, register_core_reactions};
