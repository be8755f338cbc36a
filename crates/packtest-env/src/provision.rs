use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use packtest_core::{diff_manifests, scan_tree, FsDiff, Manifest};

use crate::layout::EnvLayout;

/// One disposable, exclusively-owned test environment.
///
/// The directory tree is structurally independent of every other
/// environment (unique per process and nanosecond), so test cases can run
/// in parallel without shared mutable paths. The tree is removed on drop.
#[derive(Debug)]
pub struct Environment {
    layout: EnvLayout,
    env_vars: BTreeMap<String, String>,
    baseline: Manifest,
}

impl Environment {
    /// Creates a fresh environment under `parent` and captures a baseline
    /// manifest immediately, before any command runs.
    pub fn provision(parent: &Path, name: &str) -> Result<Self> {
        Self::provision_inner(parent, name).with_context(|| {
            format!(
                "provisioning-failed: could not prepare environment '{name}' under {}",
                parent.display()
            )
        })
    }

    /// Same as [`Self::provision`] with the system temp directory as parent.
    pub fn provision_in_temp(name: &str) -> Result<Self> {
        Self::provision(&std::env::temp_dir(), name)
    }

    fn provision_inner(parent: &Path, name: &str) -> Result<Self> {
        let root = unique_environment_root(parent, name);
        if root.exists() {
            anyhow::bail!("environment root already exists: {}", root.display());
        }

        let layout = EnvLayout::new(root);
        layout.ensure_base_dirs()?;

        let baseline = scan_tree(layout.root())?;
        Ok(Self {
            layout,
            env_vars: BTreeMap::new(),
            baseline,
        })
    }

    pub fn layout(&self) -> &EnvLayout {
        &self.layout
    }

    pub fn root(&self) -> &Path {
        self.layout.root()
    }

    pub fn env_vars(&self) -> &BTreeMap<String, String> {
        &self.env_vars
    }

    /// Adds a variable to the map every run inherits.
    pub fn insert_env(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.env_vars.insert(key.into(), value.into());
    }

    pub fn baseline(&self) -> &Manifest {
        &self.baseline
    }

    /// Re-captures the baseline from the current tree state. The runner
    /// calls this before each spawn so every run diffs against the state it
    /// actually started from.
    pub fn refresh_baseline(&mut self) -> Result<()> {
        self.baseline = self.scan()?;
        Ok(())
    }

    pub fn scan(&self) -> Result<Manifest> {
        scan_tree(self.layout.root())
    }

    pub fn diff_against_baseline(&self) -> Result<FsDiff> {
        let current = self.scan()?;
        Ok(diff_manifests(&self.baseline, &current))
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(self.layout.root());
    }
}

fn unique_environment_root(parent: &Path, name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    parent.join(format!("packtest-{name}-{}-{nanos}", std::process::id()))
}
