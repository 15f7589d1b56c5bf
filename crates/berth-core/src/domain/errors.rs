//! Errors - エラー型と分類
//!
//! コアの全操作はこの `BerthError` を返します。
//! CLI 層は `exit_code()` を見て終了コードを決めます。

use thiserror::Error;

/// Exit code used for every error that does not declare its own.
pub const GENERIC_EXIT_CODE: i32 = 1;

/// Exit code carried by [`BerthError::AppNotFound`].
pub const APP_NOT_FOUND_EXIT_CODE: i32 = 20;

/// BerthError はコアのドメインエラー
///
/// # 分類
/// - Validation: 名前やフラグの形式エラー
/// - AppNotFound / AppExists: 存在チェックの失敗
/// - ConfirmationDeclined: 破壊的操作の中断（呼び出し側でプロセス終了）
/// - ExternalTool: trigger や docker の stderr をそのまま包む
#[derive(Debug, Error)]
pub enum BerthError {
    #[error("{0}")]
    Validation(String),

    #[error("App {0} does not exist")]
    AppNotFound(String),

    #[error("Name is already taken")]
    AppExists(String),

    /// Carries the target name; the message is fixed.
    #[error("Confirmation did not match test. Aborted.")]
    ConfirmationDeclined(String),

    #[error("You haven't deployed any applications yet")]
    NoApps,

    #[error("{message}")]
    ExternalTool { tool: String, message: String },

    #[error("App image ({0}) not found")]
    ImageNotFound(String),

    #[error("Re-enable app auto-creation or create an app with 'berth apps:create {0}'")]
    AutocreateDisabled(String),

    #[error("property store: {0}")]
    Store(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BerthError {
    /// Wrap a failed trigger or tool run.
    ///
    /// `message` is the captured stderr; it is trimmed so the diagnostic stays
    /// on a single line when the tool ends with a newline.
    pub fn external(tool: impl Into<String>, message: impl AsRef<str>) -> Self {
        Self::ExternalTool {
            tool: tool.into(),
            message: message.as_ref().trim().to_string(),
        }
    }

    /// Process exit code the outer layer should use for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            BerthError::AppNotFound(_) => APP_NOT_FOUND_EXIT_CODE,
            _ => GENERIC_EXIT_CODE,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, BerthError::AppNotFound(_))
    }
}
