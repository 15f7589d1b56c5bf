//! PropertyStore port - (scope, app, key) → value の永続ストア
//!
//! PropertyStore は app のメタデータの正本（source of truth）です。
//! App ビューより長生きする。
//!
//! # 実装
//! - **FilePropertyStore**: `<root>/<scope>/<app>/<key>` にファイルで保存
//! - **InMemoryPropertyStore**: テスト用
//!
//! グローバルなプロパティは app 名の代わりに `GLOBAL_APP` を使う。

use async_trait::async_trait;

use crate::domain::BerthError;

/// PropertyStore は scope ごとの key/value を管理
///
/// # 値の形
/// - 単一値: `write` / `get`
/// - 順序付きリスト: `write_list` / `get_list`（例: created-at の履歴）
///
/// 存在しないキーの `get` はエラーではなく空文字列を返す。
#[async_trait]
pub trait PropertyStore: Send + Sync {
    async fn write(&self, scope: &str, app: &str, key: &str, value: &str)
    -> Result<(), BerthError>;

    async fn write_list(
        &self,
        scope: &str,
        app: &str,
        key: &str,
        values: &[String],
    ) -> Result<(), BerthError>;

    async fn get(&self, scope: &str, app: &str, key: &str) -> Result<String, BerthError>;

    async fn get_default(
        &self,
        scope: &str,
        app: &str,
        key: &str,
        default: &str,
    ) -> Result<String, BerthError> {
        let value = self.get(scope, app, key).await?;
        if value.is_empty() {
            return Ok(default.to_string());
        }
        Ok(value)
    }

    async fn get_list(&self, scope: &str, app: &str, key: &str)
    -> Result<Vec<String>, BerthError>;

    async fn exists(&self, scope: &str, app: &str, key: &str) -> Result<bool, BerthError>;

    async fn delete(&self, scope: &str, app: &str, key: &str) -> Result<(), BerthError>;

    /// Remove every key of `app` in `scope`.
    async fn destroy_scope(&self, scope: &str, app: &str) -> Result<(), BerthError>;

    /// Copy every key of `old` onto `new` in `scope`; `old` is left intact.
    async fn clone_scope(&self, scope: &str, old: &str, new: &str) -> Result<(), BerthError>;

    /// Prepare storage for `scope` (idempotent).
    async fn setup_scope(&self, scope: &str) -> Result<(), BerthError>;
}
