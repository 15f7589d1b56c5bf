//! ContainerRuntime port - docker などのコンテナランタイムへの単発呼び出し
//!
//! コアは low-level なコンテナ管理をしない。
//! イメージの存在確認・掃除・起動確認だけをここ経由で依頼する。

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{AppName, BerthError};

#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Whether `image` names an existing image (an inspection call).
    async fn image_exists(&self, image: &str) -> Result<bool, BerthError>;

    async fn container_is_running(&self, container_id: &str) -> Result<bool, BerthError>;

    /// Remove exited/dead containers and dangling/unused images.
    ///
    /// `None` cleans globally; `Some(app)` limits the pass to that app's labels.
    async fn cleanup(&self, app: Option<&AppName>) -> Result<(), BerthError>;

    /// Remove every image of a destroyed app.
    ///
    /// Covers images carrying the app-name label and images in the app's
    /// default repository (`berth/<app>`), labelled or not.
    async fn remove_app_images(&self, app: &AppName) -> Result<(), BerthError>;

    /// Sleep once for `delay`, then check that the container is running.
    ///
    /// This is a single check, not a retry loop.
    async fn wait_until_ready(&self, container_id: &str, delay: Duration) -> Result<(), BerthError> {
        tokio::time::sleep(delay).await;
        if !self.container_is_running(container_id).await? {
            return Err(BerthError::external(
                "container",
                format!("Container {container_id} is not running"),
            ));
        }
        Ok(())
    }
}
