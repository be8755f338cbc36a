//! Pure predicates over a [`RunResult`]. Each helper either passes or fails
//! with an `assertion-failed:` error naming the specific missing or
//! unexpected path/text, and has no other side effect.

use std::path::{Path, PathBuf};

use anyhow::Result;
use packtest_core::normalize_path_for_display;
use packtest_env::EnvLayout;
use packtest_runner::RunResult;

/// Asserts that a package landed under the default `site/` directory:
/// payload dir, versioned marker dir and its `RECEIPT`, plus any extra
/// payload files named relative to the package dir.
pub fn assert_installed(
    result: &RunResult,
    layout: &EnvLayout,
    name: &str,
    version: &str,
    extra_files: &[&str],
) -> Result<()> {
    let mut expected = vec![
        layout.rel_package_dir(name),
        layout.rel_marker_dir(name, version),
        layout.rel_receipt_path(name, version),
    ];
    for file in extra_files {
        expected.push(layout.rel_package_dir(name).join(file));
    }
    assert_all_created(result, &expected)
}

/// Same check against an install redirected by a target-directory option.
/// `target` is the environment-relative directory the tool was pointed at.
pub fn assert_installed_under(
    result: &RunResult,
    target: &Path,
    name: &str,
    version: &str,
    extra_files: &[&str],
) -> Result<()> {
    let marker = target.join(format!("{name}-{version}.info"));
    let mut expected = vec![
        target.join(name),
        marker.join("RECEIPT"),
        marker,
    ];
    for file in extra_files {
        expected.push(target.join(name).join(file));
    }
    assert_all_created(result, &expected)
}

/// Asserts that nothing under the package's site paths was created.
pub fn assert_not_installed(result: &RunResult, layout: &EnvLayout, name: &str) -> Result<()> {
    let package_dir = layout.rel_package_dir(name);
    let mut offending: Vec<&PathBuf> = result.created_under(&package_dir);
    let marker_prefix = format!("{name}-");
    offending.extend(result.files_created.iter().filter(|path| {
        path.parent() == Some(Path::new("site"))
            && path
                .file_name()
                .and_then(|value| value.to_str())
                .is_some_and(|value| value.starts_with(&marker_prefix) && value.ends_with(".info"))
    }));

    if offending.is_empty() {
        return Ok(());
    }
    anyhow::bail!(
        "assertion-failed: package '{name}' unexpectedly installed; created: {}",
        render_paths(&offending)
    );
}

pub fn assert_no_filesystem_changes(result: &RunResult) -> Result<()> {
    if result.no_filesystem_changes() {
        return Ok(());
    }
    anyhow::bail!(
        "assertion-failed: expected no filesystem changes (created: {}, updated: {}, deleted: {})",
        render_paths(&result.files_created.iter().collect::<Vec<_>>()),
        render_paths(&result.files_updated.iter().collect::<Vec<_>>()),
        render_paths(&result.files_deleted.iter().collect::<Vec<_>>()),
    );
}

/// Asserts that some stdout line equals `expected` exactly (after trimming
/// trailing whitespace), instead of substring-matching whole prose output.
pub fn stdout_contains_line(result: &RunResult, expected: &str) -> Result<()> {
    if result
        .stdout
        .lines()
        .any(|line| line.trim_end() == expected)
    {
        return Ok(());
    }
    anyhow::bail!(
        "assertion-failed: no stdout line equals {expected:?}\n--- stdout ---\n{}",
        result.stdout
    );
}

pub fn stderr_contains(result: &RunResult, needle: &str) -> Result<()> {
    if result.stderr.contains(needle) {
        return Ok(());
    }
    anyhow::bail!(
        "assertion-failed: stderr does not contain {needle:?}\n--- stderr ---\n{}",
        result.stderr
    );
}

fn assert_all_created(result: &RunResult, expected: &[PathBuf]) -> Result<()> {
    let missing: Vec<&PathBuf> = expected
        .iter()
        .filter(|path| !result.files_created.contains(*path))
        .collect();
    if missing.is_empty() {
        return Ok(());
    }
    anyhow::bail!(
        "assertion-failed: expected created paths missing: {} (created: {})",
        render_paths(&missing),
        render_paths(&result.files_created.iter().collect::<Vec<_>>()),
    );
}

fn render_paths(paths: &[&PathBuf]) -> String {
    if paths.is_empty() {
        return "[]".to_string();
    }
    let rendered: Vec<String> = paths
        .iter()
        .map(|path| normalize_path_for_display(path))
        .collect();
    format!("[{}]", rendered.join(", "))
}
