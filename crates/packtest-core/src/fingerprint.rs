use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};

/// Identity marker for one filesystem entry, used only to detect change.
///
/// Symlinks are fingerprinted by their link target, never by dereferenced
/// content, so symlink-preserving installs can be asserted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fingerprint {
    Directory,
    Symlink { target: PathBuf },
    File { sha256: String, len: u64 },
}

impl Fingerprint {
    pub fn of_path(path: &Path) -> Result<Self> {
        let metadata = fs::symlink_metadata(path)
            .with_context(|| format!("failed to stat {}", path.display()))?;

        if metadata.file_type().is_symlink() {
            let target = fs::read_link(path)
                .with_context(|| format!("failed to read symlink target {}", path.display()))?;
            return Ok(Self::Symlink { target });
        }

        if metadata.is_dir() {
            return Ok(Self::Directory);
        }

        let bytes =
            fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        Ok(Self::File {
            sha256: sha256_hex(&bytes),
            len: bytes.len() as u64,
        })
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, Self::Directory)
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
