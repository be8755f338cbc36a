use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Directory layout of one isolated test environment.
///
/// `site/` is the default install destination of the tool under test,
/// `scratch/` holds per-test fixture material, `bin/` is reserved for
/// exposed executables and `logs/` collects run transcripts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvLayout {
    root: PathBuf,
}

impl EnvLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn site_dir(&self) -> PathBuf {
        self.root.join("site")
    }

    pub fn scratch_dir(&self) -> PathBuf {
        self.root.join("scratch")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }

    pub fn package_dir(&self, name: &str) -> PathBuf {
        self.site_dir().join(name)
    }

    pub fn marker_dir(&self, name: &str, version: &str) -> PathBuf {
        self.site_dir().join(format!("{name}-{version}.info"))
    }

    /// Root-relative form of [`Self::package_dir`], the shape paths take in
    /// a run result's created/updated/deleted sets.
    pub fn rel_package_dir(&self, name: &str) -> PathBuf {
        PathBuf::from("site").join(name)
    }

    pub fn rel_marker_dir(&self, name: &str, version: &str) -> PathBuf {
        PathBuf::from("site").join(format!("{name}-{version}.info"))
    }

    pub fn rel_receipt_path(&self, name: &str, version: &str) -> PathBuf {
        self.rel_marker_dir(name, version).join("RECEIPT")
    }

    pub fn ensure_base_dirs(&self) -> Result<()> {
        for dir in [
            self.site_dir(),
            self.scratch_dir(),
            self.bin_dir(),
            self.logs_dir(),
        ] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}
