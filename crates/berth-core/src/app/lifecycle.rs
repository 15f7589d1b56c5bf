//! AppManager - app のライフサイクル
//!
//! # 状態
//! absent → active ⇄ active-locked → (destroying) → absent
//!
//! # 正本
//! - app root ディレクトリの有無が存在の正本
//! - プロパティは PropertyStore。root と最終的に一致させる
//!
//! 各ステップの前後で trigger を発火し、他の plugin に反応させる。
//! パイプラインは trigger の失敗で止まり、警告では止まらない。

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::confirm::ConfirmationGate;
use crate::app::console::Console;
use crate::dispatch::Dispatcher;
use crate::domain::property::{APPS_SCOPE, CREATED_AT};
use crate::domain::{App, AppName, BerthError};
use crate::impls::BufferedSink;
use crate::ports::{Clock, ContainerRuntime, PropertyStore};
use crate::resolve::{ImageResolver, SchedulerResolver};

/// Global config key that turns off implicit app creation.
pub const DISABLE_AUTOCREATION_KEY: &str = "BERTH_DISABLE_APP_AUTOCREATION";

pub const USER_AUTH_APP: &str = "user-auth-app";

/// Environment-derived switches that change lifecycle behavior.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Skip the confirmation gate on destroy.
    pub force_delete: bool,
    /// Skip non-forced cleanup passes.
    pub skip_cleanup: bool,
    /// Identity passed to `user-auth-app`.
    pub auth_user: String,
    pub auth_name: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            force_delete: false,
            skip_cleanup: false,
            auth_user: String::new(),
            auth_name: "default".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct AppManager {
    apps_root: PathBuf,
    dispatcher: Dispatcher,
    store: Arc<dyn PropertyStore>,
    runtime: Arc<dyn ContainerRuntime>,
    gate: ConfirmationGate,
    clock: Arc<dyn Clock>,
    settings: Settings,
}

impl AppManager {
    pub(crate) fn new(
        apps_root: PathBuf,
        dispatcher: Dispatcher,
        store: Arc<dyn PropertyStore>,
        runtime: Arc<dyn ContainerRuntime>,
        gate: ConfirmationGate,
        clock: Arc<dyn Clock>,
        settings: Settings,
    ) -> Self {
        Self {
            apps_root,
            dispatcher,
            store,
            runtime,
            gate,
            clock,
            settings,
        }
    }

    /// Same wiring, output routed to `console`.
    pub fn with_console(&self, console: Console) -> Self {
        Self {
            dispatcher: self.dispatcher.with_console(console.clone()),
            gate: self.gate.with_console(console),
            ..self.clone()
        }
    }

    pub fn apps_root(&self) -> &Path {
        &self.apps_root
    }

    pub fn console(&self) -> &Console {
        self.dispatcher.console()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn store(&self) -> &Arc<dyn PropertyStore> {
        &self.store
    }

    pub fn runtime(&self) -> &Arc<dyn ContainerRuntime> {
        &self.runtime
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn scheduler_resolver(&self) -> SchedulerResolver {
        SchedulerResolver::new(self.dispatcher.clone())
    }

    pub fn image_resolver(&self) -> ImageResolver {
        ImageResolver::new(self.dispatcher.clone(), Arc::clone(&self.runtime))
    }

    /// Transient view; does not check existence.
    pub fn app(&self, name: AppName) -> App {
        App::new(&self.apps_root, name)
    }

    /// Confirm that `name` names an existing app visible to the caller.
    ///
    /// Accepts legacy names so apps created under the old rule stay reachable.
    pub async fn verify_app(&self, name: &str) -> Result<App, BerthError> {
        let name = AppName::parse_existing(name)?;
        let app = self.app(name);
        if !app.root_exists() {
            return Err(BerthError::AppNotFound(app.name().to_string()));
        }

        let visible = self
            .filter_apps(vec![app.name().to_string()])
            .await
            .unwrap_or_default();
        if visible.len() != 1 {
            return Err(BerthError::AppNotFound(app.name().to_string()));
        }
        Ok(app)
    }

    /// Create an app: root directory, `created-at`, then `post-create`.
    ///
    /// Best effort; a failed step leaves earlier steps in place.
    pub async fn create(&self, name: &str) -> Result<App, BerthError> {
        let name = AppName::parse(name)?;
        if self.verify_app(name.as_str()).await.is_ok() {
            return Err(BerthError::AppExists(name.to_string()));
        }

        self.console().info1_quiet(&format!("Creating {name}..."));
        let app = self.app(name);
        self.create_root(&app).await?;
        self.dispatcher
            .invoke("post-create", [app.name().as_str()])
            .await?;
        tracing::info!(app = %app.name(), "app created");
        Ok(app)
    }

    /// Create the root and stamp a fresh `created-at`.
    pub(crate) async fn create_root(&self, app: &App) -> Result<(), BerthError> {
        tokio::fs::create_dir_all(app.root()).await?;
        self.stamp_created_at(app).await
    }

    /// Overwrite `created-at` with the current unix time.
    pub(crate) async fn stamp_created_at(&self, app: &App) -> Result<(), BerthError> {
        let now = self.clock.now().timestamp().to_string();
        self.store
            .write(APPS_SCOPE, app.name().as_str(), CREATED_AT, &now)
            .await
    }

    /// Create the app unless it exists or auto-creation is disabled.
    ///
    /// Ordinary output of the nested create is held back and only shown
    /// when it fails.
    pub async fn maybe_create_app(&self, name: &str) -> Result<(), BerthError> {
        if self.verify_app(name).await.is_ok() {
            return Ok(());
        }

        let disabled = self
            .dispatcher
            .capture_text("config-get-global", [DISABLE_AUTOCREATION_KEY])
            .await
            .unwrap_or_default();
        if disabled == "true" {
            self.console().warn("App auto-creation disabled.");
            return Err(BerthError::AutocreateDisabled(name.to_string()));
        }

        let buffered = Arc::new(BufferedSink::new(Arc::clone(self.console().sink())));
        let quiet = self.with_console(self.console().with_sink(buffered.clone()));
        match quiet.create(name).await {
            Ok(_) => {
                buffered.discard();
                Ok(())
            }
            Err(err) => {
                buffered.replay();
                Err(err)
            }
        }
    }

    /// Destroy an app and everything attached to it.
    ///
    /// Trigger order: pre-delete, scheduler-stop, scheduler-post-delete,
    /// post-delete, (image removal, cleanup), scheduler-retire; then the
    /// root is removed.
    pub async fn destroy(&self, name: &str, force: bool) -> Result<(), BerthError> {
        let app = self.verify_app(name).await?;
        let app_name = app.name().as_str();

        if !force && !self.settings.force_delete {
            self.gate.confirm_destructive(app_name, "app").await?;
        }

        self.console()
            .info1(&format!("Destroying {app_name} (including all add-ons)"));

        let image_tag = self
            .image_resolver()
            .running_image_tag(app.name(), "")
            .await
            .unwrap_or_default();
        self.dispatcher
            .invoke("pre-delete", [app_name, image_tag.as_str()])
            .await?;

        let scheduler = self.scheduler_resolver().resolve(app_name).await;
        self.dispatcher
            .invoke("scheduler-stop", [scheduler.as_str(), app_name, "true"])
            .await?;
        self.dispatcher
            .invoke(
                "scheduler-post-delete",
                [scheduler.as_str(), app_name, image_tag.as_str()],
            )
            .await?;
        self.dispatcher
            .invoke("post-delete", [app_name, image_tag.as_str()])
            .await?;

        if let Err(err) = self.runtime.remove_app_images(app.name()).await {
            tracing::warn!(app = app_name, error = %err, "removing app images failed");
        }

        if let Err(err) = self.docker_cleanup(app_name, true).await {
            tracing::warn!(app = app_name, error = %err, "cleanup after destroy failed");
        }

        self.console().info1("Retiring old containers and images");
        self.dispatcher
            .invoke("scheduler-retire", [scheduler.as_str(), app_name])
            .await?;

        self.remove_root(&app).await;
        tracing::info!(app = app_name, "app destroyed");
        Ok(())
    }

    /// Remove the app root. A missing root is fine; other failures are warnings.
    pub(crate) async fn remove_root(&self, app: &App) {
        match tokio::fs::remove_dir_all(app.root()).await {
            Err(err) if err.kind() != ErrorKind::NotFound => {
                self.console().warn(&format!(
                    "Unable to remove {}: {err}",
                    app.root().display()
                ));
            }
            _ => {}
        }
    }

    /// Duplicate the `apps` property scope; the source is left intact.
    pub async fn clone_app(&self, old: &AppName, new: &AppName) -> Result<(), BerthError> {
        self.store
            .clone_scope(APPS_SCOPE, old.as_str(), new.as_str())
            .await
    }

    /// Move the `apps` property scope from `old` to `new`.
    pub async fn rename_app(&self, old: &AppName, new: &AppName) -> Result<(), BerthError> {
        self.clone_app(old, new).await?;
        self.store.destroy_scope(APPS_SCOPE, old.as_str()).await
    }

    pub async fn lock(&self, app: &App) -> Result<(), BerthError> {
        tokio::fs::write(app.lock_path(), b"").await?;
        Ok(())
    }

    /// Returns whether a lock was present.
    pub async fn unlock(&self, app: &App) -> Result<bool, BerthError> {
        match tokio::fs::remove_file(app.lock_path()).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub fn is_locked(&self, app: &App) -> bool {
        app.is_locked()
    }

    /// App names under the root, sorted; hidden entries are skipped.
    ///
    /// With `filtered`, the list also passes through `user-auth-app`.
    pub async fn list_apps(&self, filtered: bool) -> Result<Vec<String>, BerthError> {
        let mut entries = match tokio::fs::read_dir(&self.apps_root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(BerthError::NoApps),
            Err(err) => return Err(err.into()),
        };

        let mut apps = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if entry.file_type().await.map(|t| t.is_dir()).unwrap_or(false) {
                apps.push(name);
            }
        }
        apps.sort();

        if filtered {
            apps = self.filter_apps(apps).await?;
        }
        if apps.is_empty() {
            return Err(BerthError::NoApps);
        }
        Ok(apps)
    }

    async fn filter_apps(&self, apps: Vec<String>) -> Result<Vec<String>, BerthError> {
        if !self.dispatcher.has_trigger(USER_AUTH_APP) {
            return Ok(apps);
        }

        let mut args = vec![
            self.settings.auth_user.clone(),
            self.settings.auth_name.clone(),
        ];
        args.extend(apps);
        let output = self
            .dispatcher
            .capture_text(USER_AUTH_APP, args)
            .await
            .unwrap_or_default();

        let visible: Vec<String> = output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        if visible.is_empty() {
            return Err(BerthError::NoApps);
        }
        Ok(visible)
    }
}
