//! Console - ユーザー向けの行出力
//!
//! tracing のログとは別物。`-----> ` などの接頭辞付きの行を
//! OutputSink に書く。quiet 系は quiet フラグで落とす。

use std::sync::Arc;

use crate::ports::{OutputSink, OutputStream};

const INFO1_PREFIX: &str = "-----> ";
const INFO2_PREFIX: &str = "=====> ";
const VERBOSE_PREFIX: &str = "       ";
const WARN_PREFIX: &str = " !     ";

#[derive(Clone)]
pub struct Console {
    sink: Arc<dyn OutputSink>,
    quiet: bool,
}

impl Console {
    pub fn new(sink: Arc<dyn OutputSink>, quiet: bool) -> Self {
        Self { sink, quiet }
    }

    /// Same quiet setting, different sink.
    pub fn with_sink(&self, sink: Arc<dyn OutputSink>) -> Self {
        Self {
            sink,
            quiet: self.quiet,
        }
    }

    pub fn sink(&self) -> &Arc<dyn OutputSink> {
        &self.sink
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    pub fn is_buffering(&self) -> bool {
        self.sink.is_buffering()
    }

    pub fn info1(&self, message: &str) {
        self.prefixed(OutputStream::Stdout, INFO1_PREFIX, message);
    }

    pub fn info1_quiet(&self, message: &str) {
        if !self.quiet {
            self.info1(message);
        }
    }

    pub fn info2(&self, message: &str) {
        self.prefixed(OutputStream::Stdout, INFO2_PREFIX, message);
    }

    pub fn info2_quiet(&self, message: &str) {
        if !self.quiet {
            self.info2(message);
        }
    }

    pub fn verbose(&self, message: &str) {
        self.prefixed(OutputStream::Stdout, VERBOSE_PREFIX, message);
    }

    pub fn verbose_quiet(&self, message: &str) {
        if !self.quiet {
            self.verbose(message);
        }
    }

    pub fn warn(&self, message: &str) {
        self.prefixed(OutputStream::Stderr, WARN_PREFIX, message);
    }

    /// Unprefixed line, e.g. report values or forwarded child output.
    pub fn raw(&self, stream: OutputStream, line: &str) {
        self.sink.write_line(stream, line);
    }

    fn prefixed(&self, stream: OutputStream, prefix: &str, message: &str) {
        for line in message.lines() {
            self.sink.write_line(stream, &format!("{prefix}{line}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impls::CollectingSink;

    #[test]
    fn prefixes_and_streams() {
        let sink = Arc::new(CollectingSink::new());
        let console = Console::new(sink.clone(), false);

        console.info1("Creating web...");
        console.info2("web app information");
        console.verbose("detail");
        console.warn("careful");

        assert_eq!(
            sink.stdout(),
            vec!["-----> Creating web...", "=====> web app information", "       detail"]
        );
        assert_eq!(sink.stderr(), vec![" !     careful"]);
    }

    #[test]
    fn quiet_variants_are_dropped_when_quiet() {
        let sink = Arc::new(CollectingSink::new());
        let console = Console::new(sink.clone(), true);

        console.info1_quiet("hidden");
        console.info2_quiet("hidden");
        console.verbose_quiet("hidden");
        console.info1("shown");

        assert_eq!(sink.stdout(), vec!["-----> shown"]);
    }
}
