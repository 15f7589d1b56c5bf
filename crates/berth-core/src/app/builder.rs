//! PlatformBuilder - ports のワイヤリング
//!
//! # Fail-fast 設計
//! - 必須コンポーネント（apps root, runner, store, runtime, prompt, sink）を集める
//! - build() 時に不足をまとめて BuildError で返す
//! - Clock は省略時 SystemClock

use std::path::PathBuf;
use std::sync::Arc;

use crate::app::confirm::ConfirmationGate;
use crate::app::console::Console;
use crate::app::lifecycle::{AppManager, Settings};
use crate::app::triggers::register_core_reactions;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::domain::BerthError;
use crate::impls::{DockerCli, FilePropertyStore, StdioSink, TerminalPrompt, TriggerRegistry};
use crate::ports::{
    Clock, ContainerRuntime, OutputSink, Prompt, PropertyStore, SystemClock, TriggerRunner,
};

/// BuildError はワイヤリング時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing components: {0:?}. These must be provided before build().")]
    MissingComponents(Vec<&'static str>),

    #[error("plugin discovery failed: {0}")]
    Discovery(#[source] BerthError),
}

/// PlatformBuilder は AppManager を構築
///
/// # 使用例
/// ```ignore
/// let manager = PlatformBuilder::new()
///     .apps_root("/home/berth")
///     .runner(Arc::new(registry))
///     .store(Arc::new(InMemoryPropertyStore::new()))
///     .runtime(Arc::new(InMemoryRuntime::new()))
///     .prompt(Arc::new(ScriptedPrompt::new(["web"])))
///     .sink(Arc::new(CollectingSink::new()))
///     .build()?;
/// ```
#[derive(Default)]
pub struct PlatformBuilder {
    apps_root: Option<PathBuf>,
    runner: Option<Arc<dyn TriggerRunner>>,
    store: Option<Arc<dyn PropertyStore>>,
    runtime: Option<Arc<dyn ContainerRuntime>>,
    prompt: Option<Arc<dyn Prompt>>,
    sink: Option<Arc<dyn OutputSink>>,
    clock: Option<Arc<dyn Clock>>,
    quiet: bool,
    trace: bool,
    settings: Settings,
}

impl PlatformBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Production wiring: file store, docker, terminal, and a registry of
    /// the core reactions followed by discovered plugin hooks.
    pub fn from_config(config: &Config) -> Result<Self, BuildError> {
        let store: Arc<dyn PropertyStore> =
            Arc::new(FilePropertyStore::new(&config.property_root));

        let mut registry = TriggerRegistry::new();
        register_core_reactions(&mut registry, Arc::clone(&store));
        registry.extend(TriggerRegistry::discover(&config.plugin_path).map_err(BuildError::Discovery)?);
        tracing::debug!(triggers = registry.len(), "trigger registry ready");

        let mut docker = DockerCli::new(&config.docker_bin);
        if let Some(label) = &config.container_label {
            docker = docker.with_container_label(label);
        }

        Ok(Self::new()
            .apps_root(&config.apps_root)
            .runner(Arc::new(registry))
            .store(store)
            .runtime(Arc::new(docker))
            .prompt(Arc::new(TerminalPrompt))
            .sink(Arc::new(StdioSink))
            .quiet(config.quiet)
            .trace(config.trace)
            .settings(Settings {
                force_delete: config.force_delete,
                skip_cleanup: config.skip_cleanup,
                auth_user: config.auth_user.clone(),
                auth_name: config.auth_name.clone(),
            }))
    }

    pub fn apps_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.apps_root = Some(root.into());
        self
    }

    pub fn runner(mut self, runner: Arc<dyn TriggerRunner>) -> Self {
        self.runner = Some(runner);
        self
    }

    pub fn store(mut self, store: Arc<dyn PropertyStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn runtime(mut self, runtime: Arc<dyn ContainerRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    pub fn prompt(mut self, prompt: Arc<dyn Prompt>) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    pub fn trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// 不足コンポーネントがあれば BuildError::MissingComponents
    pub fn build(self) -> Result<AppManager, BuildError> {
        let mut missing = Vec::new();
        if self.apps_root.is_none() {
            missing.push("apps_root");
        }
        if self.runner.is_none() {
            missing.push("runner");
        }
        if self.store.is_none() {
            missing.push("store");
        }
        if self.runtime.is_none() {
            missing.push("runtime");
        }
        if self.prompt.is_none() {
            missing.push("prompt");
        }
        if self.sink.is_none() {
            missing.push("sink");
        }

        let (Some(apps_root), Some(runner), Some(store), Some(runtime), Some(prompt), Some(sink)) = (
            self.apps_root,
            self.runner,
            self.store,
            self.runtime,
            self.prompt,
            self.sink,
        ) else {
            return Err(BuildError::MissingComponents(missing));
        };

        let console = Console::new(sink, self.quiet);
        let dispatcher = Dispatcher::new(runner, console.clone(), self.trace);
        let gate = ConfirmationGate::new(prompt, console);
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));

        Ok(AppManager::new(
            apps_root,
            dispatcher,
            store,
            runtime,
            gate,
            clock,
            self.settings,
        ))
    }
}
