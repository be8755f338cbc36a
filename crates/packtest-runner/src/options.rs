use std::collections::BTreeMap;
use std::path::PathBuf;

/// Tolerances and overrides for one runner invocation.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub(crate) expect_error: bool,
    pub(crate) expect_stderr: bool,
    pub(crate) cwd: Option<PathBuf>,
    pub(crate) env_overrides: BTreeMap<String, String>,
    pub(crate) quiet: bool,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Tolerate a non-zero exit code (implies tolerating stderr output).
    pub fn expect_error(mut self) -> Self {
        self.expect_error = true;
        self
    }

    /// Tolerate non-empty stderr on an otherwise successful run.
    pub fn expect_stderr(mut self) -> Self {
        self.expect_stderr = true;
        self
    }

    /// Working directory override, resolved against the environment root.
    pub fn cwd(mut self, path: impl Into<PathBuf>) -> Self {
        self.cwd = Some(path.into());
        self
    }

    /// Per-run variable merged over the environment's inherited map.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_overrides.insert(key.into(), value.into());
        self
    }

    /// Suppress echoing captured output to the test log.
    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }
}
