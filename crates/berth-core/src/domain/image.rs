//! Image reference (`<remote><repository>:<tag>`).

use std::fmt;

use super::app_name::AppName;

/// Tag used when neither a trigger nor the caller supplies one.
pub const DEFAULT_TAG: &str = "latest";

/// Central definition of the per-app image repository pattern.
pub fn default_repository(app: &AppName) -> String {
    format!("berth/{app}")
}

/// An image reference, optionally prefixed by a remote registry.
///
/// The remote prefix is kept verbatim: triggers return it with its trailing
/// separator (e.g. `registry.example.com/`), so rendering is plain
/// concatenation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    pub remote: String,
    pub repository: String,
    pub tag: String,
}

impl ImageReference {
    pub fn new(repository: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            remote: String::new(),
            repository: repository.into(),
            tag: tag.into(),
        }
    }

    pub fn with_remote(mut self, remote: impl Into<String>) -> Self {
        self.remote = remote.into();
        self
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}:{}", self.remote, self.repository, self.tag)
    }
}
