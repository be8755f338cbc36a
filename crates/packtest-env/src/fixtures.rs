use std::path::{Path, PathBuf};

use anyhow::Result;

/// Read-only accessor over a directory of fixture package sources.
///
/// Passed to tests explicitly instead of living in ambient state; it never
/// mutates the tree it points at.
#[derive(Debug, Clone)]
pub struct FixtureData {
    root: PathBuf,
}

impl FixtureData {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            anyhow::bail!("fixture root is not a directory: {}", root.display());
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of one named fixture package source directory.
    pub fn package_dir(&self, name: &str) -> Result<PathBuf> {
        let path = self.root.join(name);
        if !path.is_dir() {
            anyhow::bail!(
                "fixture package '{name}' not found under {}",
                self.root.display()
            );
        }
        Ok(path)
    }
}
