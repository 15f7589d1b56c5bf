//! apps:report - app 情報の表示
//!
//! # 形式
//! - stdout: `=====> <app> app information` の見出しと整列した行
//! - json: `--` を外したキーの 1 オブジェクト
//! - info flag 指定時: その値だけ

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::app::lifecycle::AppManager;
use crate::domain::property::{APPS_SCOPE, CREATED_AT, DEPLOY_SOURCE, DEPLOY_SOURCE_METADATA};
use crate::domain::{App, BerthError};
use crate::ports::OutputStream;

const MIN_LABEL_WIDTH: usize = 31;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Stdout,
    Json,
}

impl FromStr for ReportFormat {
    type Err = BerthError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "stdout" => Ok(ReportFormat::Stdout),
            "json" => Ok(ReportFormat::Json),
            _ => Err(BerthError::Validation(
                "Invalid --format value specified".into(),
            )),
        }
    }
}

/// Parsed `apps:report` arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportArgs {
    pub app: Option<String>,
    pub format: ReportFormat,
    pub info_flag: Option<String>,
}

impl ReportArgs {
    /// Split raw arguments into app name, `--format <value>` and one info flag.
    pub fn parse(args: &[String]) -> Result<Self, BerthError> {
        let mut parsed = ReportArgs::default();
        let mut info_flags = Vec::new();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            if arg == "--format" {
                let value = iter.next().ok_or_else(|| {
                    BerthError::Validation("--format requires a value".into())
                })?;
                parsed.format = value.parse()?;
            } else if let Some(value) = arg.strip_prefix("--format=") {
                parsed.format = value.parse()?;
            } else if arg.starts_with("--") {
                info_flags.push(arg.clone());
            } else if parsed.app.is_none() {
                parsed.app = Some(arg.clone());
            }
        }

        if info_flags.len() > 1 {
            return Err(BerthError::Validation(
                "apps:report command allows only a single flag".into(),
            ));
        }
        parsed.info_flag = info_flags.pop();
        Ok(parsed)
    }
}

/// `--app-created-at` → `App created at`
fn humanize(flag: &str) -> String {
    let label = flag.trim_start_matches("--").replace(['-', '.'], " ");
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl AppManager {
    pub async fn report(&self, args: &ReportArgs) -> Result<(), BerthError> {
        match &args.app {
            Some(app) => {
                self.report_single(app, args.format, args.info_flag.as_deref())
                    .await
            }
            None => {
                for app in self.list_apps(true).await? {
                    self.report_single(&app, args.format, args.info_flag.as_deref())
                        .await?;
                }
                Ok(())
            }
        }
    }

    /// Every report flag and its value for `app`.
    pub async fn collect_report(&self, app: &App) -> Result<BTreeMap<String, String>, BerthError> {
        let name = app.name().as_str();
        let created_at = self.store().get_list(APPS_SCOPE, name, CREATED_AT).await?;
        let deploy_source = self.store().get(APPS_SCOPE, name, DEPLOY_SOURCE).await?;
        let metadata = self
            .store()
            .get(APPS_SCOPE, name, DEPLOY_SOURCE_METADATA)
            .await?;

        Ok(BTreeMap::from([
            ("--app-created-at".to_string(), created_at.join(",")),
            ("--app-deploy-source".to_string(), deploy_source),
            ("--app-deploy-source-metadata".to_string(), metadata),
            ("--app-dir".to_string(), app.root().display().to_string()),
            ("--app-locked".to_string(), app.is_locked().to_string()),
        ]))
    }

    async fn report_single(
        &self,
        name: &str,
        format: ReportFormat,
        info_flag: Option<&str>,
    ) -> Result<(), BerthError> {
        let app = self.verify_app(name).await?;
        let values = self.collect_report(&app).await?;

        if format != ReportFormat::Stdout && info_flag.is_some() {
            return Err(BerthError::Validation(
                "--format flag cannot be specified when specifying an info flag".into(),
            ));
        }

        let console = self.console();
        if format == ReportFormat::Json {
            let data: BTreeMap<&str, &str> = values
                .iter()
                .map(|(k, v)| (k.trim_start_matches("--"), v.as_str()))
                .collect();
            let json = serde_json::to_string(&data)
                .map_err(|e| BerthError::Validation(format!("failed to encode report: {e}")))?;
            console.raw(OutputStream::Stdout, &json);
            return Ok(());
        }

        let Some(flag) = info_flag else {
            let width = values
                .keys()
                .map(String::len)
                .max()
                .unwrap_or_default()
                .max(MIN_LABEL_WIDTH);
            console.info2_quiet(&format!("{} app information", app.name()));
            for (key, value) in &values {
                let label = format!("{}:", humanize(key));
                console.verbose(&format!("{label:<width$}{value}"));
            }
            return Ok(());
        };

        match values.get(flag) {
            Some(value) => {
                console.raw(OutputStream::Stdout, value);
                Ok(())
            }
            None => {
                let valid: Vec<&str> = values.keys().map(String::as_str).collect();
                Err(BerthError::Validation(format!(
                    "Invalid flag passed, valid flags: {}",
                    valid.join(", ")
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[rstest]
    #[case::app_dir("--app-dir", "App dir")]
    #[case::created_at("--app-created-at", "App created at")]
    #[case::metadata("--app-deploy-source-metadata", "App deploy source metadata")]
    fn labels_are_humanized(#[case] flag: &str, #[case] expected: &str) {
        assert_eq!(humanize(flag), expected);
    }

    #[test]
    fn parses_app_format_and_flag() {
        let parsed = ReportArgs::parse(&strings(&["web", "--format", "json"])).unwrap();
        assert_eq!(parsed.app.as_deref(), Some("web"));
        assert_eq!(parsed.format, ReportFormat::Json);
        assert_eq!(parsed.info_flag, None);

        let parsed = ReportArgs::parse(&strings(&["web", "--app-dir"])).unwrap();
        assert_eq!(parsed.info_flag.as_deref(), Some("--app-dir"));
        assert_eq!(parsed.format, ReportFormat::Stdout);
    }

    #[test]
    fn rejects_bad_format_and_multiple_flags() {
        let err = ReportArgs::parse(&strings(&["--format", "yaml"])).unwrap_err();
        assert_eq!(err.to_string(), "Invalid --format value specified");

        let err = ReportArgs::parse(&strings(&["web", "--app-dir", "--app-locked"])).unwrap_err();
        assert_eq!(err.to_string(), "apps:report command allows only a single flag");
    }
}
