//! Ports - 抽象化レイヤー
//!
//! このモジュールは Hexagonal Architecture の「ポート」を定義します。
//! 各 trait は外部システム（trigger 実装, property ファイル, docker, 端末）への
//! インターフェースを提供し、実装の詳細を隠蔽します。
//!
//! # 設計原則
//! - PropertyStore と app root が source of truth（正本）
//! - trigger の中身は不透明。呼び出し契約だけを扱う
//! - テストでは impls の in-memory 実装に差し替える

pub mod clock;
pub mod container_runtime;
pub mod output;
pub mod prompt;
pub mod property_store;
pub mod trigger_runner;

// 主要な trait を再エクスポート
pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::container_runtime::ContainerRuntime;
pub use self::output::{OutputSink, OutputStream};
pub use self::prompt::Prompt;
pub use self::property_store::PropertyStore;
pub use self::trigger_runner::TriggerRunner;
