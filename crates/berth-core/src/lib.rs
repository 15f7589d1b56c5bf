//! berth-core
//!
//! Control-plane core of the berth app platform.
//!
//! # モジュール構成
//! - **domain**: ドメインモデル（app name, app view, trigger, image, errors）
//! - **ports**: 抽象化レイヤー（TriggerRunner, PropertyStore, ContainerRuntime, Prompt, OutputSink, Clock）
//! - **impls**: ports の実装（TriggerRegistry, FilePropertyStore, DockerCli, in-memory 版）
//! - **dispatch**: trigger 呼び出し（fire-and-forget / capturing）
//! - **resolve**: scheduler と deploy image の並列解決
//! - **app**: ライフサイクル、確認ゲート、report、ワイヤリング
//! - **config**: 環境変数からの設定

pub mod app;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod resolve;
