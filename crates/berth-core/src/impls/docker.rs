//! DockerCli - docker バイナリを呼び出す ContainerRuntime
//!
//! 掃除は best-effort。個々のコマンドの失敗は warn ログにとどめる。

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::domain::{AppName, BerthError, default_repository};
use crate::ports::ContainerRuntime;

/// Label carried by every container the platform starts.
pub const DEFAULT_CONTAINER_LABEL: &str = "com.berth.container-type=deploy";

/// Label key naming the owning app on containers and images.
pub const APP_NAME_LABEL: &str = "com.berth.app-name";

#[derive(Debug, Clone)]
pub struct DockerCli {
    bin: String,
    container_label: String,
}

impl DockerCli {
    pub fn new(bin: impl Into<String>) -> Self {
        Self {
            bin: bin.into(),
            container_label: DEFAULT_CONTAINER_LABEL.to_string(),
        }
    }

    pub fn with_container_label(mut self, label: impl Into<String>) -> Self {
        self.container_label = label.into();
        self
    }

    pub fn bin(&self) -> &str {
        &self.bin
    }

    /// Run docker with captured output; non-zero exit becomes an error
    /// carrying the trimmed stderr.
    async fn output(&self, args: &[String]) -> Result<String, BerthError> {
        tracing::debug!(bin = %self.bin, ?args, "docker");
        let output = Command::new(&self.bin)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| BerthError::external(&self.bin, format!("failed to run {}: {e}", self.bin)))?;

        if !output.status.success() {
            return Err(BerthError::external(
                &self.bin,
                String::from_utf8_lossy(&output.stderr),
            ));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    async fn list_ids(&self, args: Vec<String>) -> Vec<String> {
        match self.output(&args).await {
            Ok(out) => out
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(err) => {
                tracing::warn!(error = %err, "docker list failed");
                Vec::new()
            }
        }
    }

    async fn run_quietly(&self, args: Vec<String>) {
        if let Err(err) = self.output(&args).await {
            tracing::warn!(error = %err, ?args, "docker cleanup step failed");
        }
    }

    async fn list_containers(&self, status: &str, app: Option<&AppName>) -> Vec<String> {
        let mut args = strings([
            "container",
            "list",
            "--quiet",
            "--all",
            "--filter",
        ]);
        args.push(format!("status={status}"));
        args.push("--filter".into());
        args.push(format!("label={}", self.container_label));
        if let Some(app) = app {
            args.push("--filter".into());
            args.push(app_label_filter(app));
        }
        self.list_ids(args).await
    }

    async fn list_dangling_images(&self, app: Option<&AppName>) -> Vec<String> {
        let mut args = strings(["image", "list", "--quiet", "--filter", "dangling=true"]);
        if let Some(app) = app {
            args.push("--filter".into());
            args.push(app_label_filter(app));
        }
        self.list_ids(args).await
    }

    async fn list_app_images(&self, app: &AppName) -> Vec<String> {
        let mut args = strings(["image", "list", "--quiet", "--filter"]);
        args.push(app_label_filter(app));
        let mut images = self.list_ids(args).await;

        let mut args = strings(["image", "list", "--quiet"]);
        args.push(default_repository(app));
        images.extend(self.list_ids(args).await);

        images.sort();
        images.dedup();
        images
    }
}

fn strings<const N: usize>(parts: [&str; N]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn app_label_filter(app: &AppName) -> String {
    format!("label={APP_NAME_LABEL}={app}")
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    async fn image_exists(&self, image: &str) -> Result<bool, BerthError> {
        let args = strings(["image", "inspect", image]);
        Ok(self.output(&args).await.is_ok())
    }

    async fn container_is_running(&self, container_id: &str) -> Result<bool, BerthError> {
        let args = strings([
            "container",
            "inspect",
            "--format",
            "{{.State.Running}}",
            container_id,
        ]);
        match self.output(&args).await {
            Ok(out) => Ok(out.trim() == "true"),
            Err(_) => Ok(false),
        }
    }

    async fn cleanup(&self, app: Option<&AppName>) -> Result<(), BerthError> {
        let mut containers = self.list_containers("exited", app).await;
        containers.extend(self.list_containers("dead", app).await);
        if !containers.is_empty() {
            let mut args = strings(["container", "rm"]);
            args.extend(containers);
            self.run_quietly(args).await;
        }

        let images = self.list_dangling_images(app).await;
        if !images.is_empty() {
            let mut args = strings(["image", "rm"]);
            args.extend(images);
            self.run_quietly(args).await;
        }

        if let Some(app) = app {
            let mut args = strings(["image", "prune", "--all", "--force", "--filter"]);
            args.push(app_label_filter(app));
            self.run_quietly(args).await;
        }
        Ok(())
    }

    async fn remove_app_images(&self, app: &AppName) -> Result<(), BerthError> {
        let images = self.list_app_images(app).await;
        if !images.is_empty() {
            let mut args = strings(["image", "rm"]);
            args.extend(images);
            self.run_quietly(args).await;
        }
        Ok(())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    /// A fake docker that appends its argv to `log` and answers from a script body.
    fn fake_docker(dir: &Path, body: &str) -> String {
        let path = dir.join("docker");
        let log = dir.join("calls.log");
        std::fs::write(
            &path,
            format!("#!/bin/sh\necho \"$@\" >> {}\n{body}\n", log.display()),
        )
        .unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.display().to_string()
    }

    fn calls(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn image_exists_follows_inspect_status() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_docker(dir.path(), "[ \"$3\" = \"berth/web:v1\" ]");
        let docker = DockerCli::new(bin);

        assert!(docker.image_exists("berth/web:v1").await.unwrap());
        assert!(!docker.image_exists("berth/web:v2").await.unwrap());
    }

    #[tokio::test]
    async fn running_check_reads_state() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_docker(dir.path(), "echo true");
        let docker = DockerCli::new(bin);
        assert!(docker.container_is_running("abc").await.unwrap());
    }

    #[tokio::test]
    async fn app_cleanup_removes_and_prunes_labelled_objects() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_docker(
            dir.path(),
            "case \"$1 $2\" in \"container list\"|\"image list\") echo id-1 ;; esac",
        );
        let docker = DockerCli::new(bin);
        let app = AppName::parse("web").unwrap();

        docker.cleanup(Some(&app)).await.unwrap();

        let calls = calls(dir.path());
        assert!(calls.iter().any(|c| c == "container rm id-1 id-1"));
        assert!(calls.iter().any(|c| c == "image rm id-1"));
        assert!(calls
            .iter()
            .any(|c| c == "image prune --all --force --filter label=com.berth.app-name=web"));
    }

    #[tokio::test]
    async fn app_images_are_removed_by_label_and_repository() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_docker(
            dir.path(),
            r#"case "$*" in
  "image list --quiet --filter label=com.berth.app-name=web") printf 'img-a\nimg-shared\n' ;;
  "image list --quiet berth/web") printf 'img-b\nimg-shared\n' ;;
esac"#,
        );
        let docker = DockerCli::new(bin);
        let app = AppName::parse("web").unwrap();

        docker.remove_app_images(&app).await.unwrap();

        let calls = calls(dir.path());
        assert!(calls.iter().any(|c| c == "image list --quiet berth/web"));
        assert_eq!(
            calls.iter().filter(|c| c.starts_with("image rm")).collect::<Vec<_>>(),
            vec!["image rm img-a img-b img-shared"]
        );
    }

    #[tokio::test]
    async fn no_app_images_means_no_removal() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_docker(dir.path(), "true");
        let docker = DockerCli::new(bin);

        docker
            .remove_app_images(&AppName::parse("web").unwrap())
            .await
            .unwrap();

        assert!(calls(dir.path()).iter().all(|c| !c.starts_with("image rm")));
    }

    #[tokio::test]
    async fn global_cleanup_skips_prune() {
        let dir = tempfile::tempdir().unwrap();
        let bin = fake_docker(dir.path(), "true");
        let docker = DockerCli::new(bin);

        docker.cleanup(None).await.unwrap();

        assert!(calls(dir.path()).iter().all(|c| !c.starts_with("image prune")));
    }
}
