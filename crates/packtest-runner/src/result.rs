use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use packtest_core::FsDiff;

/// Immutable snapshot of one runner invocation: captured output plus the
/// filesystem changes observed inside the environment.
///
/// The three path sets are root-relative, pairwise disjoint, and together
/// cover every path whose fingerprint changed during the run.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub files_created: BTreeSet<PathBuf>,
    pub files_updated: BTreeSet<PathBuf>,
    pub files_deleted: BTreeSet<PathBuf>,
    pub duration: Duration,
}

impl RunResult {
    pub(crate) fn from_diff(
        exit_code: i32,
        stdout: String,
        stderr: String,
        diff: FsDiff,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            files_created: diff.created,
            files_updated: diff.updated,
            files_deleted: diff.deleted,
            duration,
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn no_filesystem_changes(&self) -> bool {
        self.files_created.is_empty()
            && self.files_updated.is_empty()
            && self.files_deleted.is_empty()
    }

    pub fn created(&self, relative: impl AsRef<Path>) -> bool {
        self.files_created.contains(relative.as_ref())
    }

    pub fn updated(&self, relative: impl AsRef<Path>) -> bool {
        self.files_updated.contains(relative.as_ref())
    }

    pub fn deleted(&self, relative: impl AsRef<Path>) -> bool {
        self.files_deleted.contains(relative.as_ref())
    }

    /// Every created path that sits under `base`, in sorted order.
    pub fn created_under(&self, base: impl AsRef<Path>) -> Vec<&PathBuf> {
        let base = base.as_ref();
        self.files_created
            .iter()
            .filter(|path| path.starts_with(base))
            .collect()
    }

    pub fn stdout_lines(&self) -> Vec<&str> {
        self.stdout.lines().collect()
    }
}
