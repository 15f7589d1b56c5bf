//! RecordingRunner - 呼び出し履歴を記録する TriggerRunner ラッパー
//!
//! パイプラインが trigger をどの順序で発火したかをテストで確認するために使う。

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use crate::domain::{BerthError, StreamMode, TriggerInvocation, TriggerOutput};
use crate::ports::TriggerRunner;

pub struct RecordingRunner {
    inner: Arc<dyn TriggerRunner>,
    calls: Mutex<Vec<(TriggerInvocation, StreamMode)>>,
}

impl RecordingRunner {
    pub fn new(inner: Arc<dyn TriggerRunner>) -> Self {
        Self {
            inner,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every invocation seen so far, in call order.
    pub fn invocations(&self) -> Vec<TriggerInvocation> {
        self.calls().iter().map(|(inv, _)| inv.clone()).collect()
    }

    /// Trigger names seen so far, in call order.
    pub fn names(&self) -> Vec<String> {
        self.calls().iter().map(|(inv, _)| inv.name.clone()).collect()
    }

    pub fn modes_for(&self, name: &str) -> Vec<StreamMode> {
        self.calls()
            .iter()
            .filter(|(inv, _)| inv.name == name)
            .map(|(_, mode)| *mode)
            .collect()
    }

    fn calls(&self) -> MutexGuard<'_, Vec<(TriggerInvocation, StreamMode)>> {
        // a poisoned log is still a valid log
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TriggerRunner for RecordingRunner {
    async fn run(
        &self,
        invocation: &TriggerInvocation,
        mode: StreamMode,
    ) -> Result<TriggerOutput, BerthError> {
        self.calls().push((invocation.clone(), mode));
        self.inner.run(invocation, mode).await
    }

    fn has_trigger(&self, name: &str) -> bool {
        self.inner.has_trigger(name)
    }
}
