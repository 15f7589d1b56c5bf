//! ConfirmationGate - 破壊的操作の前の確認
//!
//! 入力が対象名と完全一致しなければ `ConfirmationDeclined` を返す。
//! 呼び出し側はこれを無視せず、最上位でプロセスを終了する。

use std::sync::Arc;

use crate::app::console::Console;
use crate::domain::BerthError;
use crate::ports::Prompt;

pub const CONFIRM_PROMPT: &str = "> ";

#[derive(Clone)]
pub struct ConfirmationGate {
    prompt: Arc<dyn Prompt>,
    console: Console,
}

impl ConfirmationGate {
    pub fn new(prompt: Arc<dyn Prompt>, console: Console) -> Self {
        Self { prompt, console }
    }

    pub fn with_console(&self, console: Console) -> Self {
        Self {
            prompt: Arc::clone(&self.prompt),
            console,
        }
    }

    /// Ask the operator to type `name` before destroying `kind` `name`.
    ///
    /// A read failure is an I/O error, not a decline.
    pub async fn confirm_destructive(&self, name: &str, kind: &str) -> Result<(), BerthError> {
        self.console.warn("WARNING: Potentially Destructive Action");
        self.console
            .warn(&format!("This command will destroy {kind} {name}."));
        self.console.warn(&format!("To proceed, type \"{name}\""));

        let prompt = Arc::clone(&self.prompt);
        let response = tokio::task::spawn_blocking(move || prompt.read_line(CONFIRM_PROMPT))
            .await
            .map_err(|e| BerthError::Io(std::io::Error::other(e)))??;

        if response.trim() != name {
            tracing::info!(target_name = name, "destructive confirmation declined");
            return Err(BerthError::ConfirmationDeclined(name.to_string()));
        }
        Ok(())
    }
}
