//! OutputSink port - ユーザー向け出力の書き込み先
//!
//! プロセス全体の stdout を差し替える代わりに、
//! 書き込み先をこの trait として呼び出しに渡す。
//! 並行する呼び出し同士が干渉しない。

/// Which user-facing stream a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

pub trait OutputSink: Send + Sync {
    fn write_line(&self, stream: OutputStream, line: &str);

    /// A buffering sink holds stdout back; child processes must not write
    /// to the real terminal while one is active.
    fn is_buffering(&self) -> bool {
        false
    }
}
