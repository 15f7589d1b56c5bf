//! Scheduler backend names.

use std::fmt;

/// Scheduler used when neither the app nor the global setting names one.
pub const DEFAULT_SCHEDULER: &str = "docker-local";

/// Opaque name of a pluggable scheduler backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchedulerName(String);

impl SchedulerName {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SchedulerName {
    fn default() -> Self {
        Self(DEFAULT_SCHEDULER.to_string())
    }
}

impl fmt::Display for SchedulerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<&str> for SchedulerName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}
