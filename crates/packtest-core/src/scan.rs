use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::fingerprint::Fingerprint;

/// Snapshot of a directory tree: relative path of every entry mapped to its
/// fingerprint at scan time.
pub type Manifest = BTreeMap<PathBuf, Fingerprint>;

pub fn scan_tree(root: &Path) -> Result<Manifest> {
    if !root.is_dir() {
        anyhow::bail!("scan root is not a directory: {}", root.display());
    }

    let mut manifest = Manifest::new();
    let mut queue: VecDeque<PathBuf> = VecDeque::new();
    queue.push_back(root.to_path_buf());

    while let Some(dir) = queue.pop_front() {
        for entry in fs::read_dir(&dir)
            .with_context(|| format!("failed to read directory {}", dir.display()))?
        {
            let entry = entry?;
            let path = entry.path();
            let relative = path
                .strip_prefix(root)
                .with_context(|| {
                    format!(
                        "failed deriving relative path {} from {}",
                        path.display(),
                        root.display()
                    )
                })?
                .to_path_buf();

            let fingerprint = Fingerprint::of_path(&path)?;
            // Symlinked directories are recorded by target only, never walked.
            if fingerprint.is_directory() {
                queue.push_back(path);
            }
            manifest.insert(relative, fingerprint);
        }
    }

    Ok(manifest)
}

pub fn normalize_path_for_display(path: &Path) -> String {
    path.components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
