//! TriggerRegistry - trigger 名 → handler 列のマップ
//!
//! # 設計
//! - 起動時に構築（mutable）
//! - 実行時は不変（immutable）で共有
//!
//! 呼び出しのたびにファイルシステムを探さないので、
//! 同じ構成なら常に同じ handler が同じ順序で動く。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{BerthError, StreamMode, TriggerInvocation, TriggerOutput};
use crate::ports::TriggerRunner;

/// One concrete implementation of a trigger.
#[async_trait]
pub trait TriggerHandler: Send + Sync {
    async fn handle(&self, args: &[String], mode: StreamMode)
    -> Result<TriggerOutput, BerthError>;
}

/// In-process handler built from a closure.
///
/// Used for built-in static answers and as the fake plugin in tests.
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: Fn(&[String]) -> TriggerOutput + Send + Sync + 'static,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

#[async_trait]
impl<F> TriggerHandler for FnHandler<F>
where
    F: Fn(&[String]) -> TriggerOutput + Send + Sync + 'static,
{
    async fn handle(
        &self,
        args: &[String],
        _mode: StreamMode,
    ) -> Result<TriggerOutput, BerthError> {
        Ok((self.f)(args))
    }
}

/// Registry of trigger handlers (trigger name -> ordered handlers).
#[derive(Default)]
pub struct TriggerRegistry {
    handlers: HashMap<String, Vec<Arc<dyn TriggerHandler>>>,
}

impl TriggerRegistry {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Append a handler for `name`. Handlers run in registration order.
    pub fn register(&mut self, name: impl Into<String>, handler: Arc<dyn TriggerHandler>) {
        self.handlers.entry(name.into()).or_default().push(handler);
    }

    /// Shorthand for registering an [`FnHandler`].
    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F)
    where
        F: Fn(&[String]) -> TriggerOutput + Send + Sync + 'static,
    {
        self.register(name, Arc::new(FnHandler::new(f)));
    }

    /// Append every handler of `other` after the ones already registered.
    pub fn extend(&mut self, other: TriggerRegistry) {
        for (name, handlers) in other.handlers {
            self.handlers.entry(name).or_default().extend(handlers);
        }
    }

    pub fn handlers(&self, name: &str) -> &[Arc<dyn TriggerHandler>] {
        self.handlers.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Registered trigger names, sorted.
    pub fn trigger_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[async_trait]
impl TriggerRunner for TriggerRegistry {
    /// Run every handler for the trigger in order.
    ///
    /// Output is concatenated; the first non-zero status stops the sequence.
    /// A trigger nobody implements succeeds with empty output.
    async fn run(
        &self,
        invocation: &TriggerInvocation,
        mode: StreamMode,
    ) -> Result<TriggerOutput, BerthError> {
        let mut combined = TriggerOutput::default();
        for handler in self.handlers(&invocation.name) {
            let output = handler.handle(&invocation.args, mode).await?;
            combined.stdout.extend_from_slice(&output.stdout);
            combined.stderr.extend_from_slice(&output.stderr);
            if !output.is_success() {
                combined.status = output.status;
                break;
            }
        }
        Ok(combined)
    }

    fn has_trigger(&self, name: &str) -> bool {
        !self.handlers(name).is_empty()
    }
}
