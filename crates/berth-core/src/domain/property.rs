//! Property scopes and keys written by the core.

/// Scope holding app bookkeeping.
pub const APPS_SCOPE: &str = "apps";

/// Scope holding cross-plugin flags such as the deployed memo.
pub const COMMON_SCOPE: &str = "common";

/// Ordered history of creation timestamps (unix seconds).
pub const CREATED_AT: &str = "created-at";

pub const DEPLOY_SOURCE: &str = "deploy-source";

pub const DEPLOY_SOURCE_METADATA: &str = "deploy-source-metadata";

/// Memoized `"true"`/`"false"`; empty means "not computed yet".
pub const DEPLOYED: &str = "deployed";
