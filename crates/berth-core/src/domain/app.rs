//! App - app の一時的なビュー
//!
//! App は保持しない。必要なときに root から都度組み立てる。
//! 永続的な正本は filesystem の root と PropertyStore。

use std::path::{Path, PathBuf};

use super::app_name::AppName;

/// Marker file whose presence means "locked for deployment".
pub const LOCK_FILE: &str = ".deploy.lock";

/// Transient view of an app on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct App {
    name: AppName,
    root: PathBuf,
}

impl App {
    /// Derive the view from the configured apps root.
    pub fn new(apps_root: &Path, name: AppName) -> Self {
        let root = apps_root.join(name.as_str());
        Self { name, root }
    }

    pub fn name(&self) -> &AppName {
        &self.name
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// The root directory's existence is the canonical existence fact.
    pub fn root_exists(&self) -> bool {
        self.root.is_dir()
    }

    /// Pure existence check of the marker file.
    pub fn is_locked(&self) -> bool {
        self.lock_path().exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_is_derived_from_apps_root_and_name() {
        let app = App::new(Path::new("/home/berth"), AppName::parse("web").unwrap());
        assert_eq!(app.root(), Path::new("/home/berth/web"));
        assert_eq!(app.lock_path(), Path::new("/home/berth/web/.deploy.lock"));
    }

    #[test]
    fn lock_reflects_marker_presence() {
        let dir = tempfile::tempdir().unwrap();
        let app = App::new(dir.path(), AppName::parse("web").unwrap());
        std::fs::create_dir_all(app.root()).unwrap();
        assert!(app.root_exists());
        assert!(!app.is_locked());

        std::fs::write(app.lock_path(), b"").unwrap();
        assert!(app.is_locked());
    }
}
