//! Cleanup pass - 停止済みコンテナと不要イメージの掃除
//!
//! force でなければ app / global の `BERTH_SKIP_CLEANUP` 設定と
//! 環境変数を見て、スキップすることがある。

use crate::app::lifecycle::AppManager;
use crate::domain::{AppName, BerthError, GLOBAL_APP};

pub const SKIP_CLEANUP_KEY: &str = "BERTH_SKIP_CLEANUP";

impl AppManager {
    /// `app` may be [`GLOBAL_APP`] or empty for a global pass.
    pub async fn docker_cleanup(&self, app: &str, force: bool) -> Result<(), BerthError> {
        let target = if app.is_empty() || app == GLOBAL_APP {
            None
        } else {
            Some(AppName::parse_existing(app)?)
        };
        if !force && self.cleanup_skipped(app).await {
            self.console()
                .info1("BERTH_SKIP_CLEANUP set. Skipping berth cleanup");
            return Ok(());
        }

        self.console().info1("Cleaning up...");
        self.runtime().cleanup(target.as_ref()).await
    }

    async fn cleanup_skipped(&self, app: &str) -> bool {
        if self.settings().skip_cleanup {
            return true;
        }
        if app.is_empty() {
            return false;
        }

        let answer = if app == GLOBAL_APP {
            self.dispatcher()
                .capture_text("config-get-global", [SKIP_CLEANUP_KEY])
                .await
        } else {
            self.dispatcher()
                .capture_text("config-get", [app, SKIP_CLEANUP_KEY])
                .await
        };
        answer.is_ok_and(|value| value == "true")
    }
}
