use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::Serialize;

/// Machine-readable record of one run, written under the environment's
/// `logs/` directory for post-mortem diagnosis.
#[derive(Debug, Serialize)]
pub struct RunTranscript {
    pub program: String,
    pub args: Vec<String>,
    pub exit_code: i32,
    pub duration_ms: u64,
    pub stdout_len_bytes: usize,
    pub stderr_len_bytes: usize,
    pub files_created: usize,
    pub files_updated: usize,
    pub files_deleted: usize,
}

pub(crate) fn write_run_transcript(logs_dir: &Path, transcript: &RunTranscript) -> Result<PathBuf> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let path = logs_dir.join(format!("run-{nanos}.json"));

    let payload = serde_json::to_string_pretty(transcript)
        .context("failed to serialize run transcript")?;
    fs::write(&path, payload)
        .with_context(|| format!("failed to write run transcript: {}", path.display()))?;
    Ok(path)
}
