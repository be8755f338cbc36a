use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use anyhow::{Context, Result};
use packtest_env::Environment;

use crate::options::RunOptions;
use crate::result::RunResult;
use crate::transcript::{write_run_transcript, RunTranscript};

/// Spawns one subprocess synchronously inside the environment and returns
/// the captured output together with the filesystem diff for this run.
///
/// The environment baseline is re-captured immediately before the spawn, so
/// the attached diff reflects exactly what this invocation changed. There
/// is no internal timeout; a child terminated from outside (for example by
/// the test runner) surfaces as a harness error.
pub fn run<I, S>(
    env: &mut Environment,
    program: &Path,
    args: I,
    options: &RunOptions,
) -> Result<RunResult>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<String> = args
        .into_iter()
        .map(|arg| arg.as_ref().to_string_lossy().into_owned())
        .collect();

    let cwd = resolve_cwd(env, options)?;
    env.refresh_baseline()?;

    let mut command = Command::new(program);
    command.args(&args).current_dir(&cwd);
    for (key, value) in env.env_vars() {
        command.env(key, value);
    }
    for (key, value) in &options.env_overrides {
        command.env(key, value);
    }

    let started = Instant::now();
    let output = command
        .output()
        .with_context(|| format!("failed to spawn {}", program.display()))?;
    let duration = started.elapsed();

    let exit_code = match output.status.code() {
        Some(code) => code,
        None => anyhow::bail!(
            "command terminated without an exit code (killed?): {}",
            program.display()
        ),
    };

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !options.quiet {
        for line in stdout.lines() {
            eprintln!("[packtest stdout] {line}");
        }
        for line in stderr.lines() {
            eprintln!("[packtest stderr] {line}");
        }
    }

    // Diff before the transcript lands so the transcript itself is never
    // part of this run's change set.
    let diff = env.diff_against_baseline()?;

    let transcript = RunTranscript {
        program: program.display().to_string(),
        args: args.clone(),
        exit_code,
        duration_ms: duration.as_millis() as u64,
        stdout_len_bytes: stdout.len(),
        stderr_len_bytes: stderr.len(),
        files_created: diff.created.len(),
        files_updated: diff.updated.len(),
        files_deleted: diff.deleted.len(),
    };
    write_run_transcript(&env.layout().logs_dir(), &transcript)?;

    if exit_code != 0 && !options.expect_error {
        anyhow::bail!(
            "unexpected-exit: {} {} exited with code {exit_code}\n--- stdout ---\n{stdout}--- stderr ---\n{stderr}",
            program.display(),
            args.join(" ")
        );
    }

    if !stderr.is_empty() && !options.expect_error && !options.expect_stderr {
        anyhow::bail!(
            "unexpected-stderr: {} {} wrote to stderr\n--- stderr ---\n{stderr}",
            program.display(),
            args.join(" ")
        );
    }

    Ok(RunResult::from_diff(exit_code, stdout, stderr, diff, duration))
}

fn resolve_cwd(env: &Environment, options: &RunOptions) -> Result<PathBuf> {
    let candidate = match &options.cwd {
        None => return Ok(env.root().to_path_buf()),
        Some(path) if path.is_absolute() => path.clone(),
        Some(path) => env.root().join(path),
    };

    if !candidate.is_dir() {
        anyhow::bail!("working directory does not exist: {}", candidate.display());
    }

    // `..` segments and symlinks make a lexical prefix test meaningless, so
    // compare the resolved paths.
    let resolved = fs::canonicalize(&candidate)
        .with_context(|| format!("failed to resolve working directory {}", candidate.display()))?;
    let root = fs::canonicalize(env.root())
        .with_context(|| format!("failed to resolve environment root {}", env.root().display()))?;
    if !resolved.starts_with(&root) {
        anyhow::bail!(
            "working directory escapes environment root: {} (root: {})",
            resolved.display(),
            root.display()
        );
    }
    Ok(resolved)
}
