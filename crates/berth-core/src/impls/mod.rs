//! Impls - ports の実装
//!
//! # 本番用
//! - **TriggerRegistry** + **ScriptHandler**: plugin hook の起動
//! - **FilePropertyStore**: ファイルベースの正本
//! - **DockerCli**: docker バイナリ経由のコンテナ操作
//! - **TerminalPrompt** / **StdioSink**: 端末入出力
//!
//! # テスト用
//! - **FnHandler**, **RecordingRunner**: 偽 plugin と呼び出し記録
//! - **InMemoryPropertyStore**, **InMemoryRuntime**
//! - **ScriptedPrompt**, **CollectingSink**

pub mod docker;
pub mod file_store;
pub mod memory_runtime;
pub mod memory_store;
pub mod output;
pub mod prompt;
pub mod recording;
pub mod registry;
pub mod script;

// 主要な型を再エクスポート
pub use self::docker::DockerCli;
pub use self::file_store::FilePropertyStore;
pub use self::memory_runtime::InMemoryRuntime;
pub use self::memory_store::InMemoryPropertyStore;
pub use self::output::{BufferedSink, CollectingSink, StdioSink};
pub use self::prompt::{ScriptedPrompt, TerminalPrompt};
pub use self::recording::RecordingRunner;
pub use self::registry::{FnHandler, TriggerHandler, TriggerRegistry};
pub use self::script::ScriptHandler;
