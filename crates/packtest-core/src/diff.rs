use std::collections::BTreeSet;
use std::path::PathBuf;

use crate::scan::Manifest;

/// Classified outcome of comparing one tree scan against a baseline.
///
/// The three sets are pairwise disjoint and together cover every path whose
/// fingerprint differs from the baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FsDiff {
    pub created: BTreeSet<PathBuf>,
    pub updated: BTreeSet<PathBuf>,
    pub deleted: BTreeSet<PathBuf>,
}

impl FsDiff {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.updated.is_empty() && self.deleted.is_empty()
    }

    pub fn changed_path_count(&self) -> usize {
        self.created.len() + self.updated.len() + self.deleted.len()
    }
}

pub fn diff_manifests(baseline: &Manifest, current: &Manifest) -> FsDiff {
    let mut diff = FsDiff::default();

    for (path, fingerprint) in current {
        match baseline.get(path) {
            None => {
                diff.created.insert(path.clone());
            }
            Some(previous) if previous != fingerprint => {
                diff.updated.insert(path.clone());
            }
            Some(_) => {}
        }
    }

    for path in baseline.keys() {
        if !current.contains_key(path) {
            diff.deleted.insert(path.clone());
        }
    }

    diff
}
