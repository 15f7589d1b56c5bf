//! SchedulerResolver - app の実効 scheduler を決める
//!
//! # 優先順位
//! 1. app 単位の `scheduler-detect [app]` の非空出力
//! 2. グローバルの `scheduler-detect [--global]` の非空出力
//! 3. `docker-local`
//!
//! 2 つの問い合わせは同時に走らせ、両方を待つ。
//! どちらのエラーも「結果なし」として扱う。

use crate::dispatch::Dispatcher;
use crate::domain::{GLOBAL_APP, SchedulerName};

pub const SCHEDULER_DETECT: &str = "scheduler-detect";

#[derive(Clone)]
pub struct SchedulerResolver {
    dispatcher: Dispatcher,
}

impl SchedulerResolver {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    /// `app` may be [`GLOBAL_APP`], in which case only the global query runs.
    pub async fn resolve(&self, app: &str) -> SchedulerName {
        let app_query = async {
            if app == GLOBAL_APP {
                return String::new();
            }
            self.detect(app).await
        };
        let global_query = self.detect(GLOBAL_APP);

        let (app_scheduler, global_scheduler) = tokio::join!(app_query, global_query);

        let scheduler = if !app_scheduler.is_empty() {
            SchedulerName::new(app_scheduler)
        } else if !global_scheduler.is_empty() {
            SchedulerName::new(global_scheduler)
        } else {
            SchedulerName::default()
        };
        tracing::debug!(app, %scheduler, "resolved scheduler");
        scheduler
    }

    async fn detect(&self, target: &str) -> String {
        match self.dispatcher.capture_text(SCHEDULER_DETECT, [target]).await {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(target_app = target, error = %err, "scheduler-detect failed");
                String::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use rstest::rstest;
    use tokio::sync::Barrier;

    use crate::app::console::Console;
    use crate::domain::{BerthError, StreamMode, TriggerOutput};
    use crate::impls::{CollectingSink, RecordingRunner, TriggerHandler, TriggerRegistry};

    fn resolver_for(registry: TriggerRegistry) -> (SchedulerResolver, Arc<RecordingRunner>) {
        let runner = Arc::new(RecordingRunner::new(Arc::new(registry)));
        let console = Console::new(Arc::new(CollectingSink::new()), false);
        let dispatcher = Dispatcher::new(runner.clone(), console, false);
        (SchedulerResolver::new(dispatcher), runner)
    }

    fn answering(app_answer: TriggerOutput, global_answer: TriggerOutput) -> TriggerRegistry {
        let mut registry = TriggerRegistry::new();
        registry.register_fn(SCHEDULER_DETECT, move |args: &[String]| {
            if args[0] == GLOBAL_APP {
                global_answer.clone()
            } else {
                app_answer.clone()
            }
        });
        registry
    }

    #[rstest]
    #[case::app_wins(TriggerOutput::success("nomad\n"), TriggerOutput::success("k8s\n"), "nomad")]
    #[case::global_fallback(TriggerOutput::success(""), TriggerOutput::success("k8s\n"), "k8s")]
    #[case::both_empty(TriggerOutput::success(""), TriggerOutput::success("  \n"), "docker-local")]
    #[case::app_error_ignored(TriggerOutput::failure(1, "boom"), TriggerOutput::success("k8s"), "k8s")]
    #[case::both_fail(TriggerOutput::failure(1, "x"), TriggerOutput::failure(1, "y"), "docker-local")]
    #[tokio::test]
    async fn precedence(
        #[case] app_answer: TriggerOutput,
        #[case] global_answer: TriggerOutput,
        #[case] expected: &str,
    ) {
        let (resolver, _) = resolver_for(answering(app_answer, global_answer));
        assert_eq!(resolver.resolve("web").await, expected);
    }

    #[tokio::test]
    async fn global_pseudo_app_skips_the_app_query() {
        let (resolver, runner) = resolver_for(answering(
            TriggerOutput::success("nomad"),
            TriggerOutput::success("k8s"),
        ));

        assert_eq!(resolver.resolve(GLOBAL_APP).await, "k8s");
        let invocations = runner.invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].args, vec![GLOBAL_APP.to_string()]);
    }

    struct Rendezvous(Barrier);

    #[async_trait]
    impl TriggerHandler for Rendezvous {
        async fn handle(
            &self,
            args: &[String],
            _mode: StreamMode,
        ) -> Result<TriggerOutput, BerthError> {
            self.0.wait().await;
            if args[0] == GLOBAL_APP {
                Ok(TriggerOutput::success("k8s"))
            } else {
                Ok(TriggerOutput::success(""))
            }
        }
    }

    #[tokio::test]
    async fn both_queries_run_concurrently() {
        // each query blocks until the other one has started
        let mut registry = TriggerRegistry::new();
        registry.register(SCHEDULER_DETECT, Arc::new(Rendezvous(Barrier::new(2))));
        let (resolver, _) = resolver_for(registry);

        let resolved = tokio::time::timeout(Duration::from_secs(5), resolver.resolve("web"))
            .await
            .expect("queries ran sequentially");
        assert_eq!(resolved, "k8s");
    }
}
