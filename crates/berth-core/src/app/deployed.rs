//! Deployed フラグのメモ化
//!
//! `common/<app>/deployed` が空のときだけ scheduler に問い合わせ、
//! 結果を書き戻す。以後はストアの値をそのまま読む。

use crate::app::lifecycle::AppManager;
use crate::domain::{AppName, BerthError};
use crate::domain::property::{COMMON_SCOPE, DEPLOYED};

pub const SCHEDULER_IS_DEPLOYED: &str = "scheduler-is-deployed";

impl AppManager {
    pub async fn is_deployed(&self, app: &str) -> Result<bool, BerthError> {
        let name = AppName::parse_existing(app)?;
        let app = name.as_str();
        let mut deployed = self.store().get(COMMON_SCOPE, app, DEPLOYED).await?;
        if deployed.is_empty() {
            let scheduler = self.scheduler_resolver().resolve(app).await;
            let answer = self
                .dispatcher()
                .invoke_capturing(SCHEDULER_IS_DEPLOYED, [scheduler.as_str(), app])
                .await;
            deployed = if answer.is_ok() { "true" } else { "false" }.to_string();
            tracing::debug!(app, %scheduler, deployed = %deployed, "memoized deployed flag");
            self.store()
                .write(COMMON_SCOPE, app, DEPLOYED, &deployed)
                .await?;
        }
        Ok(deployed == "true")
    }
}
