//! TriggerRunner port - trigger 名から実装を探して実行する
//!
//! コアはプラグイン実装がいくつあるかを知らない。
//! 「名前 + 引数 → 出力 or 失敗」が契約のすべて。
//!
//! # 実装
//! - **TriggerRegistry**: 起動時に構築する名前 → handler 列のマップ
//! - **RecordingRunner**: 呼び出し履歴を記録するテスト用ラッパー

use async_trait::async_trait;

use crate::domain::{BerthError, StreamMode, TriggerInvocation, TriggerOutput};

/// TriggerRunner は 1 回の論理的な trigger 呼び出しを実行
///
/// # エラーの区別
/// - `Err`: 実行そのものができなかった（spawn 失敗など）
/// - `Ok(output)` で `status != 0`: hook が失敗を返した
#[async_trait]
pub trait TriggerRunner: Send + Sync {
    async fn run(
        &self,
        invocation: &TriggerInvocation,
        mode: StreamMode,
    ) -> Result<TriggerOutput, BerthError>;

    /// Whether any implementation is registered under `name`.
    fn has_trigger(&self, name: &str) -> bool;
}
