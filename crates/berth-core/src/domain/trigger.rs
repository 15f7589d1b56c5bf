//! Trigger - 拡張ポイントの呼び出し単位
//!
//! trigger は「名前 + 引数列」で呼び出し、
//! 「終了ステータス + stdout + stderr」を受け取ります。

use std::fmt;

/// How a trigger's standard streams are wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// The hook writes straight to the caller's stdout/stderr.
    Inherit,
    /// stdout/stderr are captured into the returned [`TriggerOutput`].
    Capture,
}

/// A request to run one named trigger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerInvocation {
    pub name: String,
    pub args: Vec<String>,
}

impl TriggerInvocation {
    pub fn new<I, S>(name: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl fmt::Display for TriggerInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:?}", self.name, self.args)
    }
}

/// What a trigger run produced.
///
/// In [`StreamMode::Inherit`] the byte buffers are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerOutput {
    pub status: i32,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl TriggerOutput {
    pub fn success(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 0,
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    pub fn failure(status: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 0
    }

    pub fn stdout_text(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_text(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }
}
