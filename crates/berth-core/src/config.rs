//! Config - 環境変数からの設定
//!
//! `from_lookup` は任意の lookup 関数を受け取るのでテストで差し替えられる。

use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_LIB_ROOT: &str = "/var/lib/berth";
pub const DEFAULT_DOCKER_BIN: &str = "docker";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} not set!")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// `BERTH_ROOT`: one directory per app.
    pub apps_root: PathBuf,
    /// `BERTH_LIB_ROOT`
    pub lib_root: PathBuf,
    /// `<lib_root>/config`
    pub property_root: PathBuf,
    /// `PLUGIN_PATH`, default `<lib_root>/plugins`
    pub plugin_path: PathBuf,
    pub force_delete: bool,
    pub quiet: bool,
    pub trace: bool,
    pub skip_cleanup: bool,
    pub docker_bin: String,
    pub container_label: Option<String>,
    pub auth_user: String,
    pub auth_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        let apps_root = get("BERTH_ROOT")
            .map(PathBuf::from)
            .ok_or(ConfigError::Missing("BERTH_ROOT"))?;
        let lib_root = get("BERTH_LIB_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_LIB_ROOT));
        let plugin_path = get("PLUGIN_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| lib_root.join("plugins"));

        Ok(Self {
            property_root: lib_root.join("config"),
            apps_root,
            lib_root,
            plugin_path,
            force_delete: get("BERTH_APPS_FORCE_DELETE").as_deref() == Some("1"),
            quiet: get("BERTH_QUIET_OUTPUT").is_some(),
            trace: get("BERTH_TRACE").as_deref() == Some("1"),
            skip_cleanup: get("BERTH_SKIP_CLEANUP").as_deref() == Some("true"),
            docker_bin: get("DOCKER_BIN").unwrap_or_else(|| DEFAULT_DOCKER_BIN.to_string()),
            container_label: get("BERTH_CONTAINER_LABEL"),
            auth_user: get("SSH_USER").or_else(|| get("USER")).unwrap_or_default(),
            auth_name: get("SSH_NAME")
                .or_else(|| get("NAME"))
                .unwrap_or_else(|| "default".to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn root_is_required() {
        assert_eq!(config(&[]).unwrap_err(), ConfigError::Missing("BERTH_ROOT"));
        assert_eq!(config(&[]).unwrap_err().to_string(), "BERTH_ROOT not set!");
    }

    #[test]
    fn defaults_derive_from_lib_root() {
        let cfg = config(&[("BERTH_ROOT", "/home/berth")]).unwrap();
        assert_eq!(cfg.apps_root, PathBuf::from("/home/berth"));
        assert_eq!(cfg.property_root, PathBuf::from("/var/lib/berth/config"));
        assert_eq!(cfg.plugin_path, PathBuf::from("/var/lib/berth/plugins"));
        assert_eq!(cfg.docker_bin, "docker");
        assert_eq!(cfg.auth_name, "default");
        assert!(!cfg.force_delete && !cfg.quiet && !cfg.trace && !cfg.skip_cleanup);
    }

    #[test]
    fn flags_and_identity_fallbacks() {
        let cfg = config(&[
            ("BERTH_ROOT", "/home/berth"),
            ("BERTH_LIB_ROOT", "/srv/berth"),
            ("BERTH_APPS_FORCE_DELETE", "1"),
            ("BERTH_QUIET_OUTPUT", "yes"),
            ("BERTH_TRACE", "1"),
            ("BERTH_SKIP_CLEANUP", "true"),
            ("DOCKER_BIN", "podman"),
            ("USER", "deploy"),
            ("NAME", "alice"),
        ])
        .unwrap();
        assert_eq!(cfg.property_root, PathBuf::from("/srv/berth/config"));
        assert!(cfg.force_delete && cfg.quiet && cfg.trace && cfg.skip_cleanup);
        assert_eq!(cfg.docker_bin, "podman");
        assert_eq!(cfg.auth_user, "deploy");
        assert_eq!(cfg.auth_name, "alice");
    }

    #[test]
    fn force_delete_needs_exactly_one() {
        let cfg = config(&[("BERTH_ROOT", "/r"), ("BERTH_APPS_FORCE_DELETE", "true")]).unwrap();
        assert!(!cfg.force_delete);
    }
}
