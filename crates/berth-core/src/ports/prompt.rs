//! Prompt port - 対話入力
//!
//! 確認ゲートが 1 行を読むためだけに使う。

use std::io;

/// Reads a single line of operator input.
///
/// Blocking; callers run it off the async executor.
pub trait Prompt: Send + Sync {
    fn read_line(&self, prompt: &str) -> io::Result<String>;
}
