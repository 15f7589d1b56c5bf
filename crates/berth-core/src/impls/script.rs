//! ScriptHandler - 実行ファイルとしてのプラグイン hook
//!
//! `<plugin_path>/enabled/<plugin>/<trigger>` に置かれた実行ファイルを
//! 起動時に一度だけ探して TriggerRegistry に登録する。

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::process::Command;

use super::registry::{TriggerHandler, TriggerRegistry};
use crate::domain::{BerthError, StreamMode, TriggerOutput};

/// Runs one hook executable as a child process.
#[derive(Debug, Clone)]
pub struct ScriptHandler {
    path: PathBuf,
}

impl ScriptHandler {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl TriggerHandler for ScriptHandler {
    async fn handle(
        &self,
        args: &[String],
        mode: StreamMode,
    ) -> Result<TriggerOutput, BerthError> {
        let mut cmd = Command::new(&self.path);
        cmd.args(args);

        match mode {
            StreamMode::Inherit => {
                let status = cmd
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .await
                    .map_err(|e| spawn_error(&self.path, e))?;
                Ok(TriggerOutput {
                    status: status.code().unwrap_or(-1),
                    ..TriggerOutput::default()
                })
            }
            StreamMode::Capture => {
                // output() owns both pipes and drops them on every return path
                let output = cmd
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .output()
                    .await
                    .map_err(|e| spawn_error(&self.path, e))?;
                Ok(TriggerOutput {
                    status: output.status.code().unwrap_or(-1),
                    stdout: output.stdout,
                    stderr: output.stderr,
                })
            }
        }
    }
}

fn spawn_error(path: &Path, err: std::io::Error) -> BerthError {
    BerthError::external(
        path.display().to_string(),
        format!("failed to run {}: {err}", path.display()),
    )
}

impl TriggerRegistry {
    /// Build a registry from `<plugin_path>/enabled/*/<trigger>` executables.
    ///
    /// Plugins are visited in directory-name order, so `00_core` hooks run
    /// before `20_proxy` hooks for the same trigger. A missing `enabled`
    /// directory yields an empty registry.
    pub fn discover(plugin_path: &Path) -> Result<Self, BerthError> {
        let mut registry = TriggerRegistry::new();
        let enabled = plugin_path.join("enabled");
        if !enabled.is_dir() {
            tracing::debug!(path = %enabled.display(), "no enabled plugins directory");
            return Ok(registry);
        }

        for plugin_dir in sorted_entries(&enabled)? {
            if !plugin_dir.is_dir() {
                continue;
            }
            for hook in sorted_entries(&plugin_dir)? {
                if !is_executable(&hook) {
                    continue;
                }
                let Some(trigger) = hook.file_name().and_then(|n| n.to_str()) else {
                    continue;
                };
                tracing::debug!(trigger, hook = %hook.display(), "registered trigger hook");
                registry.register(trigger.to_string(), Arc::new(ScriptHandler::new(&hook)));
            }
        }

        Ok(registry)
    }
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, BerthError> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();
    Ok(entries)
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
