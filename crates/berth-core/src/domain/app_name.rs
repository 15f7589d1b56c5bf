//! AppName - app 名の命名規約
//!
//! # 命名規約
//! - 先頭は小文字英数字
//! - 大文字・コロン・アンダースコア・スラッシュは使えない
//! - 旧規約（アンダースコア可）は既存 app の存在確認でのみ許可

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use super::errors::BerthError;

/// Pseudo app name used by triggers that act on global settings.
pub const GLOBAL_APP: &str = "--global";

static CURRENT_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][^/:_A-Z]*$").expect("valid app name pattern"));

static LEGACY_RULE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9][^/:A-Z]*$").expect("valid legacy app name pattern"));

/// A validated app name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AppName(String);

impl AppName {
    /// Validate against the current naming rule.
    ///
    /// Every state-changing operation goes through this.
    pub fn parse(value: &str) -> Result<Self, BerthError> {
        if value.is_empty() {
            return Err(missing_name());
        }
        if CURRENT_RULE.is_match(value) {
            return Ok(Self(value.to_string()));
        }
        Err(BerthError::Validation(
            "App name must begin with lowercase alphanumeric character, and cannot include uppercase characters, colons, or underscores".into(),
        ))
    }

    /// Validate against either the current or the legacy rule.
    ///
    /// Apps created before underscores were banned must stay reachable, so
    /// existence checks accept both. The error reported is the current rule's.
    pub fn parse_existing(value: &str) -> Result<Self, BerthError> {
        let current = Self::parse(value);
        if current.is_err() && !value.is_empty() && LEGACY_RULE.is_match(value) {
            return Ok(Self(value.to_string()));
        }
        current
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for AppName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn missing_name() -> BerthError {
    BerthError::Validation("Please specify an app to run the command on".into())
}
