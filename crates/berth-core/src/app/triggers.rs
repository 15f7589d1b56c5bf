//! Core trigger reactions
//!
//! コア自身が trigger に反応する処理。
//! - ストアだけで完結する反応は in-process handler として registry に登録
//! - `berth trigger <name> ...` からも同じ処理を呼べる

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::app::lifecycle::AppManager;
use crate::domain::property::{
    APPS_SCOPE, COMMON_SCOPE, CREATED_AT, DEPLOY_SOURCE, DEPLOY_SOURCE_METADATA, DEPLOYED,
};
use crate::domain::{AppName, BerthError, StreamMode, TriggerOutput};
use crate::impls::{TriggerHandler, TriggerRegistry};
use crate::ports::PropertyStore;

/// Store-only reactions the core registers ahead of plugin hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreReaction {
    PostDelete,
    PostAppCloneSetup,
    PostAppRenameSetup,
    DeploySourceSet,
    CorePostDeploy,
}

impl CoreReaction {
    pub const ALL: [CoreReaction; 5] = [
        CoreReaction::PostDelete,
        CoreReaction::PostAppCloneSetup,
        CoreReaction::PostAppRenameSetup,
        CoreReaction::DeploySourceSet,
        CoreReaction::CorePostDeploy,
    ];

    pub fn trigger_name(self) -> &'static str {
        match self {
            CoreReaction::PostDelete => "post-delete",
            CoreReaction::PostAppCloneSetup => "post-app-clone-setup",
            CoreReaction::PostAppRenameSetup => "post-app-rename-setup",
            CoreReaction::DeploySourceSet => "deploy-source-set",
            CoreReaction::CorePostDeploy => "core-post-deploy",
        }
    }

    pub fn from_trigger(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.trigger_name() == name)
    }

    fn required_args(self) -> usize {
        match self {
            CoreReaction::PostDelete | CoreReaction::CorePostDeploy => 1,
            CoreReaction::PostAppCloneSetup
            | CoreReaction::PostAppRenameSetup
            | CoreReaction::DeploySourceSet => 2,
        }
    }

    /// Leading arguments that name apps.
    fn app_args(self) -> usize {
        match self {
            CoreReaction::PostAppCloneSetup | CoreReaction::PostAppRenameSetup => 2,
            _ => 1,
        }
    }

    pub async fn apply(self, store: &dyn PropertyStore, args: &[String]) -> Result<(), BerthError> {
        if args.len() < self.required_args() {
            return Err(BerthError::Validation(format!(
                "{} expects at least {} argument(s)",
                self.trigger_name(),
                self.required_args()
            )));
        }
        // names become property paths; nothing is touched for a bad one
        let apps = args[..self.app_args()]
            .iter()
            .map(|arg| AppName::parse_existing(arg))
            .collect::<Result<Vec<_>, _>>()?;

        match self {
            CoreReaction::PostDelete => {
                let app = apps[0].as_str();
                for scope in [APPS_SCOPE, COMMON_SCOPE] {
                    if let Err(err) = store.destroy_scope(scope, app).await {
                        tracing::warn!(app, scope, error = %err, "failed to remove properties");
                    }
                }
                Ok(())
            }
            CoreReaction::PostAppCloneSetup => {
                let (old, new) = (apps[0].as_str(), apps[1].as_str());
                store.clone_scope(COMMON_SCOPE, old, new).await?;
                // the clone has not been deployed yet
                store.delete(COMMON_SCOPE, new, DEPLOYED).await
            }
            CoreReaction::PostAppRenameSetup => {
                let (old, new) = (apps[0].as_str(), apps[1].as_str());
                store.clone_scope(COMMON_SCOPE, old, new).await?;
                store.destroy_scope(COMMON_SCOPE, old).await
            }
            CoreReaction::DeploySourceSet => {
                let app = apps[0].as_str();
                let metadata = args.get(2).map(String::as_str).unwrap_or_default();
                store.write(APPS_SCOPE, app, DEPLOY_SOURCE, &args[1]).await?;
                store
                    .write(APPS_SCOPE, app, DEPLOY_SOURCE_METADATA, metadata)
                    .await
            }
            CoreReaction::CorePostDeploy => {
                store.write(COMMON_SCOPE, apps[0].as_str(), DEPLOYED, "true").await
            }
        }
    }
}

/// A [`CoreReaction`] bound to a store, runnable from a registry.
pub struct CoreReactionHandler {
    reaction: CoreReaction,
    store: Arc<dyn PropertyStore>,
}

#[async_trait]
impl TriggerHandler for CoreReactionHandler {
    async fn handle(
        &self,
        args: &[String],
        _mode: StreamMode,
    ) -> Result<TriggerOutput, BerthError> {
        match self.reaction.apply(self.store.as_ref(), args).await {
            Ok(()) => Ok(TriggerOutput::default()),
            Err(err) => Ok(TriggerOutput::failure(1, err.to_string())),
        }
    }
}

/// Register every core reaction; call before adding plugin hooks.
pub fn register_core_reactions(registry: &mut TriggerRegistry, store: Arc<dyn PropertyStore>) {
    for reaction in CoreReaction::ALL {
        registry.register(
            reaction.trigger_name(),
            Arc::new(CoreReactionHandler {
                reaction,
                store: Arc::clone(&store),
            }),
        );
    }
}

/// A registry holding only the core reactions.
pub fn core_registry(store: Arc<dyn PropertyStore>) -> TriggerRegistry {
    let mut registry = TriggerRegistry::new();
    register_core_reactions(&mut registry, store);
    registry
}

impl AppManager {
    /// Entry point for `berth trigger <name> [args...]`.
    pub async fn handle_trigger(&self, name: &str, args: &[String]) -> Result<(), BerthError> {
        if let Some(reaction) = CoreReaction::from_trigger(name) {
            return reaction.apply(self.store().as_ref(), args).await;
        }

        let first = || {
            args.first()
                .map(String::as_str)
                .ok_or_else(|| BerthError::Validation(format!("{name} expects an app name")))
        };
        match name {
            "install" => self.install().await,
            "app-create" => self.create(first()?).await.map(|_| ()),
            "app-destroy" => self.destroy(first()?, false).await,
            "app-exists" => self.exists_command(first()?).await,
            "app-maybe-create" => self.maybe_create_app(first()?).await,
            _ => Err(BerthError::Validation(format!("Unknown trigger: {name}"))),
        }
    }

    /// Prepare property scopes and backfill data for apps that predate them.
    pub async fn install(&self) -> Result<(), BerthError> {
        for scope in [APPS_SCOPE, COMMON_SCOPE] {
            self.store().setup_scope(scope).await.map_err(|err| {
                BerthError::Store(format!("Unable to install the apps plugin: {err}"))
            })?;
        }

        let apps = match self.list_apps(false).await {
            Ok(apps) => apps,
            Err(BerthError::NoApps) => return Ok(()),
            Err(err) => return Err(err),
        };

        let apps: Vec<String> = apps
            .into_iter()
            .filter(|app| match AppName::parse_existing(app) {
                Ok(_) => true,
                Err(err) => {
                    tracing::warn!(app = %app, error = %err, "skipping directory with an invalid app name");
                    false
                }
            })
            .collect();

        for app in &apps {
            if self.store().exists(APPS_SCOPE, app, CREATED_AT).await? {
                continue;
            }
            let created_at = match tokio::fs::metadata(self.apps_root().join(app))
                .await
                .and_then(|m| m.modified())
            {
                Ok(modified) => DateTime::<Utc>::from(modified),
                Err(_) => self.clock().now(),
            };
            tracing::info!(app = %app, created_at = created_at.timestamp(), "backfilled created-at");
            self.store()
                .write(APPS_SCOPE, app, CREATED_AT, &created_at.timestamp().to_string())
                .await?;
        }

        for app in &apps {
            if let Err(err) = self.is_deployed(app).await {
                tracing::warn!(app = %app, error = %err, "could not compute deployed flag");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TriggerInvocation;
    use crate::impls::{FilePropertyStore, InMemoryPropertyStore};
    use crate::ports::TriggerRunner;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[tokio::test]
    async fn post_delete_removes_both_scopes() {
        let store = Arc::new(InMemoryPropertyStore::new());
        store.write(APPS_SCOPE, "web", CREATED_AT, "1").await.unwrap();
        store.write(COMMON_SCOPE, "web", DEPLOYED, "true").await.unwrap();

        let registry = core_registry(store.clone());
        let out = registry
            .run(&TriggerInvocation::new("post-delete", ["web", "v1"]), StreamMode::Capture)
            .await
            .unwrap();

        assert!(out.is_success());
        assert!(store.snapshot(APPS_SCOPE, "web").is_empty());
        assert!(store.snapshot(COMMON_SCOPE, "web").is_empty());
    }

    #[tokio::test]
    async fn clone_setup_resets_the_deployed_memo() {
        let store = InMemoryPropertyStore::new();
        store.write(COMMON_SCOPE, "a", DEPLOYED, "true").await.unwrap();
        store.write(COMMON_SCOPE, "a", "ps-scale", "web=1").await.unwrap();

        CoreReaction::PostAppCloneSetup
            .apply(&store, &args(&["a", "b"]))
            .await
            .unwrap();

        assert_eq!(store.get(COMMON_SCOPE, "b", "ps-scale").await.unwrap(), "web=1");
        assert!(!store.exists(COMMON_SCOPE, "b", DEPLOYED).await.unwrap());
        assert_eq!(store.get(COMMON_SCOPE, "a", DEPLOYED).await.unwrap(), "true");
    }

    #[tokio::test]
    async fn rename_setup_moves_the_common_scope() {
        let store = InMemoryPropertyStore::new();
        store.write(COMMON_SCOPE, "a", DEPLOYED, "true").await.unwrap();

        CoreReaction::PostAppRenameSetup
            .apply(&store, &args(&["a", "b"]))
            .await
            .unwrap();

        assert_eq!(store.get(COMMON_SCOPE, "b", DEPLOYED).await.unwrap(), "true");
        assert!(store.snapshot(COMMON_SCOPE, "a").is_empty());
    }

    #[tokio::test]
    async fn deploy_source_set_writes_both_keys() {
        let store = InMemoryPropertyStore::new();
        CoreReaction::DeploySourceSet
            .apply(&store, &args(&["web", "git-push", "abc123"]))
            .await
            .unwrap();

        assert_eq!(store.get(APPS_SCOPE, "web", DEPLOY_SOURCE).await.unwrap(), "git-push");
        assert_eq!(
            store.get(APPS_SCOPE, "web", DEPLOY_SOURCE_METADATA).await.unwrap(),
            "abc123"
        );
    }

    #[tokio::test]
    async fn missing_arguments_fail_the_handler() {
        let registry = core_registry(Arc::new(InMemoryPropertyStore::new()));
        let out = registry
            .run(&TriggerInvocation::new("core-post-deploy", Vec::<String>::new()), StreamMode::Capture)
            .await
            .unwrap();
        assert_eq!(out.status, 1);
        assert_eq!(out.stderr_text(), "core-post-deploy expects at least 1 argument(s)");
    }

    #[tokio::test]
    async fn invalid_app_names_leave_other_apps_alone() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePropertyStore::new(dir.path());
        store.write(APPS_SCOPE, "other", CREATED_AT, "1").await.unwrap();
        store.write(COMMON_SCOPE, "other", DEPLOYED, "true").await.unwrap();

        for name in ["", ".."] {
            let err = CoreReaction::PostDelete
                .apply(&store, &args(&[name]))
                .await
                .unwrap_err();
            assert!(matches!(err, BerthError::Validation(_)), "{name:?}: {err}");

            let err = CoreReaction::PostAppRenameSetup
                .apply(&store, &args(&["other", name]))
                .await
                .unwrap_err();
            assert!(matches!(err, BerthError::Validation(_)), "{name:?}: {err}");

            assert!(CoreReaction::CorePostDeploy.apply(&store, &args(&[name])).await.is_err());
        }

        assert_eq!(store.get(APPS_SCOPE, "other", CREATED_AT).await.unwrap(), "1");
        assert_eq!(store.get(COMMON_SCOPE, "other", DEPLOYED).await.unwrap(), "true");
    }

    #[tokio::test]
    async fn invalid_app_name_fails_the_registered_handler() {
        let registry = core_registry(Arc::new(InMemoryPropertyStore::new()));
        let out = registry
            .run(&TriggerInvocation::new("post-delete", [""]), StreamMode::Capture)
            .await
            .unwrap();
        assert_eq!(out.status, 1);
        assert_eq!(out.stderr_text(), "Please specify an app to run the command on");
    }

    #[test]
    fn reactions_round_trip_through_trigger_names() {
        for reaction in CoreReaction::ALL {
            assert_eq!(CoreReaction::from_trigger(reaction.trigger_name()), Some(reaction));
        }
        assert_eq!(CoreReaction::from_trigger("post-create"), None);
    }
}
