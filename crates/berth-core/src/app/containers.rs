//! イメージ名とコンテナ起動確認
//!
//! deploy 系 plugin が使う単発の問い合わせ。trigger は発火しない。

use std::time::Duration;

use crate::app::lifecycle::AppManager;
use crate::domain::{BerthError, ImageReference};

impl AppManager {
    /// Image name of an existing app, without asking deployment triggers.
    ///
    /// An empty `repo` means `berth/<app>`. An explicit `tag` must name an
    /// existing image.
    pub async fn app_image_name(
        &self,
        name: &str,
        tag: &str,
        repo: &str,
    ) -> Result<ImageReference, BerthError> {
        let app = self.verify_app(name).await?;
        self.image_resolver().app_image_name(app.name(), tag, repo).await
    }

    /// Sleep `delay` once, then require the container to be running.
    pub async fn wait_for_container(
        &self,
        container_id: &str,
        delay: Duration,
    ) -> Result<(), BerthError> {
        tracing::debug!(container = container_id, delay_secs = delay.as_secs(), "waiting for container");
        self.runtime().wait_until_ready(container_id, delay).await
    }
}
