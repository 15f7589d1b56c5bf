//! Command orchestration - CLI から呼ばれる複合操作
//!
//! lifecycle の単一操作を組み合わせ、前後の trigger を発火する。

use crate::app::lifecycle::AppManager;
use crate::domain::{AppName, BerthError};
use crate::ports::OutputStream;

impl AppManager {
    pub async fn create_command(&self, name: &str) -> Result<(), BerthError> {
        self.create(name).await.map(|_| ())
    }

    pub async fn destroy_command(&self, name: &str, force: bool) -> Result<(), BerthError> {
        self.destroy(name, force).await
    }

    /// Clone `old` into a new app `new`.
    ///
    /// With `ignore_existing`, an existing `new` is a warning, not an error.
    pub async fn clone_command(
        &self,
        old: &str,
        new: &str,
        skip_deploy: bool,
        ignore_existing: bool,
    ) -> Result<(), BerthError> {
        let old_app = self.verify_app(old).await?;
        if self.verify_app(new).await.is_ok() {
            if ignore_existing {
                self.console()
                    .warn(&format!("Name is already taken: {new}"));
                return Ok(());
            }
            return Err(BerthError::AppExists(new.to_string()));
        }
        let new_name = AppName::parse(new)?;
        let old_name = old_app.name().clone();

        self.console()
            .info1(&format!("Cloning {old_name} to {new_name}"));
        let new_app = self.app(new_name.clone());
        tokio::fs::create_dir_all(new_app.root()).await?;
        self.clone_app(&old_name, &new_name).await?;
        // the clone carries the source's history; the new app gets its own
        self.stamp_created_at(&new_app).await?;

        let pair = [old_name.as_str(), new_name.as_str()];
        self.dispatcher()
            .invoke("post-app-clone-setup", pair)
            .await?;
        if !skip_deploy {
            self.dispatcher().invoke("deploy", [new_name.as_str()]).await?;
        }
        self.dispatcher().invoke("post-app-clone", pair).await?;
        tracing::info!(old = %old_name, new = %new_name, "app cloned");
        Ok(())
    }

    /// Rename `old` to `new`, moving properties and stopping old containers.
    pub async fn rename_command(
        &self,
        old: &str,
        new: &str,
        skip_deploy: bool,
    ) -> Result<(), BerthError> {
        let old_app = self.verify_app(old).await?;
        if self.verify_app(new).await.is_ok() {
            return Err(BerthError::AppExists(new.to_string()));
        }
        let new_name = AppName::parse(new)?;
        let old_name = old_app.name().clone();
        let pair = [old_name.as_str(), new_name.as_str()];

        self.dispatcher().invoke("pre-app-rename", pair).await?;

        self.console()
            .info1(&format!("Renaming {old_name} to {new_name}"));
        let new_app = self.app(new_name.clone());
        tokio::fs::create_dir_all(new_app.root()).await?;
        self.rename_app(&old_name, &new_name).await?;

        self.dispatcher()
            .invoke("post-app-rename-setup", pair)
            .await?;

        let scheduler = self.scheduler_resolver().resolve(old_name.as_str()).await;
        self.dispatcher()
            .invoke("scheduler-stop", [scheduler.as_str(), old_name.as_str(), "true"])
            .await?;
        self.remove_root(&old_app).await;

        if !skip_deploy {
            self.dispatcher().invoke("deploy", [new_name.as_str()]).await?;
        }
        self.dispatcher().invoke("post-app-rename", pair).await?;
        tracing::info!(old = %old_name, new = %new_name, "app renamed");
        Ok(())
    }

    pub async fn lock_command(&self, name: &str) -> Result<(), BerthError> {
        let app = self.verify_app(name).await?;
        self.lock(&app).await?;
        self.console().info1("Deploy lock created");
        Ok(())
    }

    pub async fn unlock_command(&self, name: &str) -> Result<(), BerthError> {
        let app = self.verify_app(name).await?;
        if self.unlock(&app).await? {
            self.console().info1("Deploy lock removed");
        } else {
            self.console().warn("Deploy lock does not exist");
        }
        Ok(())
    }

    /// Succeeds only when the app is locked.
    pub async fn locked_command(&self, name: &str) -> Result<(), BerthError> {
        let app = self.verify_app(name).await?;
        if !self.is_locked(&app) {
            return Err(BerthError::Validation("Deploy lock does not exist".into()));
        }
        Ok(())
    }

    pub async fn exists_command(&self, name: &str) -> Result<(), BerthError> {
        self.verify_app(name).await.map(|_| ())
    }

    pub async fn list_command(&self) -> Result<(), BerthError> {
        let apps = self.list_apps(true).await?;
        self.console().info2_quiet("My Apps");
        for app in apps {
            self.console().raw(OutputStream::Stdout, &app);
        }
        Ok(())
    }
}
