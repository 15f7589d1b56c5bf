//! OutputSink 実装
//!
//! - **StdioSink**: プロセスの stdout / stderr にそのまま書く
//! - **BufferedSink**: stdout を保持し、失敗時に replay できる
//! - **CollectingSink**: テスト用。全行を記録する

use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::ports::{OutputSink, OutputStream};

#[derive(Debug, Default, Clone, Copy)]
pub struct StdioSink;

impl OutputSink for StdioSink {
    fn write_line(&self, stream: OutputStream, line: &str) {
        // a closed pipe is not worth failing a lifecycle step over
        let _ = match stream {
            OutputStream::Stdout => writeln!(std::io::stdout().lock(), "{line}"),
            OutputStream::Stderr => writeln!(std::io::stderr().lock(), "{line}"),
        };
    }
}

/// Holds stdout lines back; stderr lines go straight to `inner`.
pub struct BufferedSink {
    inner: Arc<dyn OutputSink>,
    held: Mutex<Vec<String>>,
}

impl BufferedSink {
    pub fn new(inner: Arc<dyn OutputSink>) -> Self {
        Self {
            inner,
            held: Mutex::new(Vec::new()),
        }
    }

    /// Write every held stdout line to `inner` and clear the buffer.
    pub fn replay(&self) {
        let lines = std::mem::take(&mut *self.held());
        for line in lines {
            self.inner.write_line(OutputStream::Stdout, &line);
        }
    }

    /// Drop the held lines without writing them.
    pub fn discard(&self) {
        self.held().clear();
    }

    pub fn held_lines(&self) -> Vec<String> {
        self.held().clone()
    }

    fn held(&self) -> MutexGuard<'_, Vec<String>> {
        self.held.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl OutputSink for BufferedSink {
    fn write_line(&self, stream: OutputStream, line: &str) {
        match stream {
            OutputStream::Stdout => self.held().push(line.to_string()),
            OutputStream::Stderr => self.inner.write_line(stream, line),
        }
    }

    fn is_buffering(&self) -> bool {
        true
    }
}

/// Records every line with its stream.
#[derive(Default)]
pub struct CollectingSink {
    lines: Mutex<Vec<(OutputStream, String)>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(OutputStream, String)> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn stdout(&self) -> Vec<String> {
        self.filtered(OutputStream::Stdout)
    }

    pub fn stderr(&self) -> Vec<String> {
        self.filtered(OutputStream::Stderr)
    }

    fn filtered(&self, wanted: OutputStream) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|(stream, _)| *stream == wanted)
            .map(|(_, line)| line)
            .collect()
    }
}

impl OutputSink for CollectingSink {
    fn write_line(&self, stream: OutputStream, line: &str) {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((stream, line.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buffered_sink_holds_stdout_and_passes_stderr() {
        let collected = Arc::new(CollectingSink::new());
        let buffered = BufferedSink::new(collected.clone());

        buffered.write_line(OutputStream::Stdout, "-----> Creating web...");
        buffered.write_line(OutputStream::Stderr, " !     something odd");

        assert!(collected.stdout().is_empty());
        assert_eq!(collected.stderr(), vec![" !     something odd"]);

        buffered.replay();
        assert_eq!(collected.stdout(), vec!["-----> Creating web..."]);
        assert!(buffered.held_lines().is_empty());
    }

    #[test]
    fn discarded_lines_never_reach_the_inner_sink() {
        let collected = Arc::new(CollectingSink::new());
        let buffered = BufferedSink::new(collected.clone());
        buffered.write_line(OutputStream::Stdout, "hidden");
        buffered.discard();
        buffered.replay();
        assert!(collected.lines().is_empty());
    }
}
