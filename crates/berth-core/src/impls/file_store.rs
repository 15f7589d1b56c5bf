//! FilePropertyStore - ファイルベースの PropertyStore
//!
//! # レイアウト
//! - `<root>/<scope>/<app>/<key>` に 1 キー 1 ファイル
//! - グローバルは `<root>/<scope>/--global/<key>`
//! - リストは 1 行 1 値
//!
//! 書き込みは一時ファイル + rename で置き換える。
//! scope / app は 1 つのパス要素でなければならない（空や `..` は拒否）。

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::domain::BerthError;
use crate::ports::PropertyStore;

#[derive(Debug, Clone)]
pub struct FilePropertyStore {
    root: PathBuf,
}

impl FilePropertyStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn scope_dir(&self, scope: &str, app: &str) -> Result<PathBuf, BerthError> {
        Ok(self.root.join(segment(scope)?).join(segment(app)?))
    }

    fn key_path(&self, scope: &str, app: &str, key: &str) -> Result<PathBuf, BerthError> {
        Ok(self.scope_dir(scope, app)?.join(segment(key)?))
    }

    async fn write_contents(
        &self,
        scope: &str,
        app: &str,
        key: &str,
        contents: &str,
    ) -> Result<(), BerthError> {
        let dir = self.scope_dir(scope, app)?;
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|err| store_error("create", &dir, err))?;

        let path = dir.join(segment(key)?);
        let tmp = dir.join(format!(".{key}.tmp-{}", std::process::id()));

        let mut file = tokio::fs::File::create(&tmp)
            .await
            .map_err(|err| store_error("create", &tmp, err))?;
        file.write_all(contents.as_bytes())
            .await
            .map_err(|err| store_error("write", &tmp, err))?;
        file.flush()
            .await
            .map_err(|err| store_error("flush", &tmp, err))?;
        drop(file);

        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|err| store_error("move", &path, err))
    }

    async fn read_contents(
        &self,
        scope: &str,
        app: &str,
        key: &str,
    ) -> Result<Option<String>, BerthError> {
        let path = self.key_path(scope, app, key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(store_error("read", &path, err)),
        }
    }
}

/// Accept `value` only when it is exactly one normal path component.
fn segment(value: &str) -> Result<&str, BerthError> {
    let mut components = Path::new(value).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(value),
        _ => Err(BerthError::Store(format!("invalid path segment {value:?}"))),
    }
}

fn store_error(action: &str, path: &Path, err: std::io::Error) -> BerthError {
    BerthError::Store(format!("failed to {action} {}: {err}", path.display()))
}

#[async_trait]
impl PropertyStore for FilePropertyStore {
    async fn write(
        &self,
        scope: &str,
        app: &str,
        key: &str,
        value: &str,
    ) -> Result<(), BerthError> {
        self.write_contents(scope, app, key, value).await
    }

    async fn write_list(
        &self,
        scope: &str,
        app: &str,
        key: &str,
        values: &[String],
    ) -> Result<(), BerthError> {
        let mut contents = values.join("\n");
        if !contents.is_empty() {
            contents.push('\n');
        }
        self.write_contents(scope, app, key, &contents).await
    }

    async fn get(&self, scope: &str, app: &str, key: &str) -> Result<String, BerthError> {
        Ok(self
            .read_contents(scope, app, key)
            .await?
            .map(|contents| contents.lines().next().unwrap_or_default().to_string())
            .unwrap_or_default())
    }

    async fn get_list(
        &self,
        scope: &str,
        app: &str,
        key: &str,
    ) -> Result<Vec<String>, BerthError> {
        Ok(self
            .read_contents(scope, app, key)
            .await?
            .map(|contents| {
                contents
                    .lines()
                    .filter(|line| !line.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn exists(&self, scope: &str, app: &str, key: &str) -> Result<bool, BerthError> {
        let path = self.key_path(scope, app, key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|err| store_error("stat", &path, err))
    }

    async fn delete(&self, scope: &str, app: &str, key: &str) -> Result<(), BerthError> {
        let path = self.key_path(scope, app, key)?;
        match tokio::fs::remove_file(&path).await {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(store_error("remove", &path, err)),
            _ => Ok(()),
        }
    }

    async fn destroy_scope(&self, scope: &str, app: &str) -> Result<(), BerthError> {
        let dir = self.scope_dir(scope, app)?;
        match tokio::fs::remove_dir_all(&dir).await {
            Err(err) if err.kind() != ErrorKind::NotFound => Err(store_error("remove", &dir, err)),
            _ => Ok(()),
        }
    }

    async fn clone_scope(&self, scope: &str, old: &str, new: &str) -> Result<(), BerthError> {
        let source = self.scope_dir(scope, old)?;
        let mut entries = match tokio::fs::read_dir(&source).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(()),
            Err(err) => return Err(store_error("read", &source, err)),
        };

        let target = self.scope_dir(scope, new)?;
        tokio::fs::create_dir_all(&target)
            .await
            .map_err(|err| store_error("create", &target, err))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|err| store_error("read", &source, err))?
        {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let dest = target.join(entry.file_name());
            tokio::fs::copy(&path, &dest)
                .await
                .map_err(|err| store_error("copy", &path, err))?;
        }
        Ok(())
    }

    async fn setup_scope(&self, scope: &str) -> Result<(), BerthError> {
        let dir = self.root.join(segment(scope)?);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|err| store_error("create", &dir, err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::GLOBAL_APP;

    #[tokio::test]
    async fn values_land_in_one_file_per_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePropertyStore::new(dir.path());

        store.write("apps", "web", "deploy-source", "git").await.unwrap();
        store
            .write("apps", GLOBAL_APP, "deploy-source", "global")
            .await
            .unwrap();

        let on_disk = std::fs::read_to_string(dir.path().join("apps/web/deploy-source")).unwrap();
        assert_eq!(on_disk, "git");
        assert_eq!(store.get("apps", "web", "deploy-source").await.unwrap(), "git");
        assert!(dir.path().join("apps/--global/deploy-source").is_file());
    }

    #[tokio::test]
    async fn lists_are_one_value_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePropertyStore::new(dir.path());
        let history = vec!["1700000000".to_string(), "1700000500".to_string()];

        store.write_list("apps", "web", "created-at", &history).await.unwrap();

        assert_eq!(store.get_list("apps", "web", "created-at").await.unwrap(), history);
        assert_eq!(store.get("apps", "web", "created-at").await.unwrap(), "1700000000");
    }

    #[tokio::test]
    async fn missing_keys_and_scopes_are_not_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePropertyStore::new(dir.path());

        assert_eq!(store.get("apps", "ghost", "deploy-source").await.unwrap(), "");
        assert!(store.get_list("apps", "ghost", "created-at").await.unwrap().is_empty());
        assert!(!store.exists("apps", "ghost", "created-at").await.unwrap());
        store.delete("apps", "ghost", "created-at").await.unwrap();
        store.destroy_scope("apps", "ghost").await.unwrap();
        store.clone_scope("apps", "ghost", "other").await.unwrap();
    }

    #[tokio::test]
    async fn clone_copies_every_key_and_keeps_the_source() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePropertyStore::new(dir.path());
        store.write("apps", "a", "deploy-source", "git").await.unwrap();
        store.write("apps", "a", "deploy-source-metadata", "main").await.unwrap();

        store.clone_scope("apps", "a", "b").await.unwrap();
        store.destroy_scope("apps", "a").await.unwrap();

        assert_eq!(store.get("apps", "b", "deploy-source").await.unwrap(), "git");
        assert_eq!(store.get("apps", "b", "deploy-source-metadata").await.unwrap(), "main");
        assert!(!dir.path().join("apps/a").exists());
    }

    #[tokio::test]
    async fn names_that_escape_the_scope_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePropertyStore::new(dir.path());
        store.write("apps", "other", "created-at", "1").await.unwrap();

        for app in ["", "..", ".", "a/b"] {
            let err = store.destroy_scope("apps", app).await.unwrap_err();
            assert!(matches!(err, BerthError::Store(_)), "{app:?}: {err}");
            assert!(store.write("apps", app, "deployed", "true").await.is_err());
        }
        assert!(store.clone_scope("apps", "other", "..").await.is_err());

        assert_eq!(store.get("apps", "other", "created-at").await.unwrap(), "1");
        assert!(!dir.path().join("deployed").exists());
    }
}
