//! Dispatcher - trigger 呼び出しの 2 つのモード
//!
//! - `invoke`: fire-and-forget。呼び出し元の stdout/stderr を継承する
//! - `invoke_capturing`: stdout/stderr をメモリに取り込み、stdout を返す
//!
//! どちらも非ゼロ終了を `BerthError::ExternalTool` にする。
//! hook がいくつあるかは TriggerRunner 側の関心事。

use std::sync::Arc;

use crate::app::console::Console;
use crate::domain::{BerthError, StreamMode, TriggerInvocation, TriggerOutput};
use crate::ports::{OutputStream, TriggerRunner};

/// Log target for echoed trigger output.
pub const TRIGGER_TRACE_TARGET: &str = "berth::trigger";

#[derive(Clone)]
pub struct Dispatcher {
    runner: Arc<dyn TriggerRunner>,
    console: Console,
    trace: bool,
}

impl Dispatcher {
    pub fn new(runner: Arc<dyn TriggerRunner>, console: Console, trace: bool) -> Self {
        Self {
            runner,
            console,
            trace,
        }
    }

    /// Same runner, different console (used for output suppression).
    pub fn with_console(&self, console: Console) -> Self {
        Self {
            runner: Arc::clone(&self.runner),
            console,
            trace: self.trace,
        }
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn runner(&self) -> &Arc<dyn TriggerRunner> {
        &self.runner
    }

    pub fn has_trigger(&self, name: &str) -> bool {
        self.runner.has_trigger(name)
    }

    /// Run a trigger for its side effects.
    ///
    /// While the console is buffering, child output is captured and forwarded
    /// into the sink instead of reaching the terminal.
    pub async fn invoke<I, S>(&self, name: &str, args: I) -> Result<(), BerthError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let invocation = TriggerInvocation::new(name, args);
        tracing::debug!(trigger = %invocation.name, args = ?invocation.args, "invoke");

        if !self.console.is_buffering() {
            let output = self.runner.run(&invocation, StreamMode::Inherit).await?;
            return check_status(&invocation, &output);
        }

        let output = self.runner.run(&invocation, StreamMode::Capture).await?;
        self.echo(&invocation, &output);
        for line in output.stdout_text().lines() {
            self.console.raw(OutputStream::Stdout, line);
        }
        if output.is_success() {
            for line in output.stderr_text().lines() {
                self.console.raw(OutputStream::Stderr, line);
            }
        }
        check_status(&invocation, &output)
    }

    /// Run a trigger and return its stdout bytes.
    ///
    /// A non-zero exit yields an error whose message is the trimmed stderr.
    pub async fn invoke_capturing<I, S>(&self, name: &str, args: I) -> Result<Vec<u8>, BerthError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let invocation = TriggerInvocation::new(name, args);
        tracing::debug!(trigger = %invocation.name, args = ?invocation.args, "invoke (capturing)");

        let output = self.runner.run(&invocation, StreamMode::Capture).await?;
        self.echo(&invocation, &output);
        check_status(&invocation, &output)?;
        Ok(output.stdout)
    }

    /// `invoke_capturing` with the output decoded and trimmed.
    pub async fn capture_text<I, S>(&self, name: &str, args: I) -> Result<String, BerthError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let stdout = self.invoke_capturing(name, args).await?;
        Ok(String::from_utf8_lossy(&stdout).trim().to_string())
    }

    fn echo(&self, invocation: &TriggerInvocation, output: &TriggerOutput) {
        if !self.trace {
            return;
        }
        for line in output.stdout_text().lines() {
            tracing::debug!(target: TRIGGER_TRACE_TARGET, trigger = %invocation.name, stream = "stdout", "{line}");
        }
        for line in output.stderr_text().lines() {
            tracing::debug!(target: TRIGGER_TRACE_TARGET, trigger = %invocation.name, stream = "stderr", "{line}");
        }
    }
}

fn check_status(invocation: &TriggerInvocation, output: &TriggerOutput) -> Result<(), BerthError> {
    if output.is_success() {
        return Ok(());
    }
    let stderr = output.stderr_text();
    if stderr.trim().is_empty() {
        return Err(BerthError::external(
            &invocation.name,
            format!("{} failed with exit status {}", invocation.name, output.status),
        ));
    }
    Err(BerthError::external(&invocation.name, stderr))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use crate::impls::{BufferedSink, CollectingSink, RecordingRunner, TriggerRegistry};

    fn registry() -> TriggerRegistry {
        let mut registry = TriggerRegistry::new();
        registry.register_fn("scheduler-detect", |args: &[String]| {
            TriggerOutput::success(format!("  k8s-{}\n", args[0]))
        });
        registry.register_fn("pre-delete", |_: &[String]| {
            TriggerOutput::failure(2, "  app is protected \n")
        });
        registry.register_fn("silent-fail", |_: &[String]| TriggerOutput::failure(5, ""));
        registry.register_fn("post-create", |_: &[String]| {
            TriggerOutput::success("hook says hi\n")
        });
        registry
    }

    fn dispatcher_with(sink: Arc<dyn crate::ports::OutputSink>) -> (Dispatcher, Arc<RecordingRunner>) {
        let runner = Arc::new(RecordingRunner::new(Arc::new(registry())));
        let dispatcher = Dispatcher::new(runner.clone(), Console::new(sink, false), true);
        (dispatcher, runner)
    }

    #[tokio::test]
    async fn capturing_returns_stdout() {
        let (dispatcher, _) = dispatcher_with(Arc::new(CollectingSink::new()));
        let out = dispatcher.capture_text("scheduler-detect", ["web"]).await.unwrap();
        assert_eq!(out, "k8s-web");
    }

    #[tokio::test]
    async fn failure_message_is_trimmed_stderr() {
        let (dispatcher, _) = dispatcher_with(Arc::new(CollectingSink::new()));
        let err = dispatcher.invoke_capturing("pre-delete", ["web"]).await.unwrap_err();
        assert!(matches!(err, BerthError::ExternalTool { ref tool, .. } if tool == "pre-delete"));
        assert_eq!(err.to_string(), "app is protected");
    }

    #[tokio::test]
    async fn failure_without_stderr_names_the_status() {
        let (dispatcher, _) = dispatcher_with(Arc::new(CollectingSink::new()));
        let err = dispatcher.invoke("silent-fail", ["web"]).await.unwrap_err();
        assert_eq!(err.to_string(), "silent-fail failed with exit status 5");
    }

    #[tokio::test]
    async fn invoke_inherits_streams_unless_buffering() {
        let collected = Arc::new(CollectingSink::new());
        let (dispatcher, runner) = dispatcher_with(collected.clone());
        dispatcher.invoke("post-create", ["web"]).await.unwrap();
        assert_eq!(runner.modes_for("post-create"), vec![StreamMode::Inherit]);

        let buffered = Arc::new(BufferedSink::new(collected.clone()));
        let quiet = dispatcher.with_console(dispatcher.console().with_sink(buffered.clone()));
        quiet.invoke("post-create", ["web"]).await.unwrap();

        assert_eq!(
            runner.modes_for("post-create"),
            vec![StreamMode::Inherit, StreamMode::Capture]
        );
        assert!(collected.stdout().is_empty());
        assert_eq!(buffered.held_lines(), vec!["hook says hi"]);
    }

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Run one capturing call with a debug-level fmt subscriber installed.
    async fn traced_output(trace: bool) -> String {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let runner = Arc::new(registry());
        let console = Console::new(Arc::new(CollectingSink::new()), false);
        let dispatcher = Dispatcher::new(runner, console, trace);
        dispatcher.capture_text("scheduler-detect", ["web"]).await.unwrap();
        let _ = dispatcher.invoke_capturing("pre-delete", ["web"]).await;

        let bytes = logs.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }

    #[tokio::test]
    async fn trace_echoes_captured_lines_tagged_by_trigger() {
        let logs = traced_output(true).await;

        let echoed: Vec<&str> = logs
            .lines()
            .filter(|line| line.contains(TRIGGER_TRACE_TARGET))
            .collect();
        assert_eq!(echoed.len(), 2, "{logs}");
        assert!(echoed[0].contains("trigger=scheduler-detect"));
        assert!(echoed[0].contains("k8s-web"));
        assert!(echoed[1].contains("trigger=pre-delete"));
        assert!(echoed[1].contains("app is protected"));
    }

    #[tokio::test]
    async fn no_echo_without_trace() {
        let logs = traced_output(false).await;
        assert!(!logs.contains(TRIGGER_TRACE_TARGET), "{logs}");
        assert!(!logs.contains("k8s-web"), "{logs}");
    }
}
