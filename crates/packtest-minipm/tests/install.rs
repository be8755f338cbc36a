//! End-to-end suite: spawns the real `minipm` binary inside a disposable
//! environment and asserts on the resulting filesystem diff and output.

use std::fs;
use std::path::{Path, PathBuf};

use packtest_asserts::{
    assert_installed, assert_installed_under, assert_no_filesystem_changes, assert_not_installed,
    stderr_contains, stdout_contains_line,
};
use packtest_env::{Environment, FixtureData};
use packtest_runner::{run, RunOptions, RunResult};

fn minipm_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_minipm"))
}

fn provision(name: &str) -> Environment {
    let mut env = Environment::provision_in_temp(name).expect("must provision environment");
    let prefix = env.root().display().to_string();
    env.insert_env("MINIPM_PREFIX", prefix);
    env
}

fn minipm(env: &mut Environment, args: &[&str], options: &RunOptions) -> anyhow::Result<RunResult> {
    run(env, &minipm_bin(), args, options)
}

/// Writes a package source directory under `scratch/packages/<name>` and
/// returns the environment-relative path the CLI can be pointed at.
fn stage_package(
    env: &Environment,
    name: &str,
    version: &str,
    files: &[(&str, &str)],
) -> PathBuf {
    let source = env
        .layout()
        .scratch_dir()
        .join("packages")
        .join(name);
    fs::create_dir_all(&source).expect("must create package source dir");

    let mut manifest = format!("name = \"{name}\"\nversion = \"{version}\"\nfiles = [");
    for (relative, _) in files {
        manifest.push_str(&format!("\"{relative}\", "));
    }
    manifest.push_str("]\n");
    fs::write(source.join("pkg.toml"), manifest).expect("must write pkg.toml");

    for (relative, contents) in files {
        let path = source.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("must create payload parents");
        }
        fs::write(path, contents).expect("must write payload file");
    }

    PathBuf::from("scratch/packages").join(name)
}

#[test]
fn install_from_local_directory_creates_payload_and_marker() {
    let mut env = provision("install-local");
    let source = stage_package(&env, "simple", "1.0.0", &[("module.txt", "module body\n")]);

    let result = minipm(
        &mut env,
        &["install", source.to_str().expect("utf-8 path")],
        &RunOptions::new().quiet(),
    )
    .expect("install must succeed");

    assert_installed(&result, env.layout(), "simple", "1.0.0", &["module.txt"])
        .expect("marker paths must be created");
    let payload = fs::read_to_string(env.layout().package_dir("simple").join("module.txt"))
        .expect("payload must be readable from the site dir");
    assert_eq!(payload, "module body\n");
    stdout_contains_line(&result, "Installed simple 1.0.0 (1 file)")
        .expect("status line must be printed");
}

#[test]
fn install_resolves_spec_through_find_links() {
    let mut env = provision("install-spec");
    stage_package(&env, "simple", "1.0.0", &[("module.txt", "module body\n")]);

    // The fixture accessor is read-only; resolving through it proves the
    // staged tree is where the CLI will look.
    let fixtures = FixtureData::open(env.layout().scratch_dir().join("packages"))
        .expect("must open fixture root");
    fixtures
        .package_dir("simple")
        .expect("staged package must resolve");

    let result = minipm(
        &mut env,
        &[
            "install",
            "simple==1.0.0",
            "--find-links",
            "scratch/packages",
        ],
        &RunOptions::new().quiet(),
    )
    .expect("spec install must succeed");

    assert_installed(&result, env.layout(), "simple", "1.0.0", &["module.txt"])
        .expect("marker paths must be created");
}

#[test]
fn two_component_version_round_trips_through_marker_name() {
    let mut env = provision("install-short-version");
    stage_package(&env, "simple", "1.0", &[("module.txt", "module body\n")]);

    let result = minipm(
        &mut env,
        &["install", "simple==1.0", "--find-links", "scratch/packages"],
        &RunOptions::new().quiet(),
    )
    .expect("short-version install must succeed");

    assert_installed(&result, env.layout(), "simple", "1.0", &["module.txt"])
        .expect("marker paths must be created");
    assert!(
        env.layout().marker_dir("simple", "1.0").is_dir(),
        "marker directory must exist on disk"
    );
    stdout_contains_line(&result, "Installed simple 1.0 (1 file)")
        .expect("status line must quote the version verbatim");

    let result = minipm(
        &mut env,
        &["install", "simple==1.0", "--find-links", "scratch/packages"],
        &RunOptions::new().expect_stderr().quiet(),
    )
    .expect("repeat install must succeed with a warning");
    assert_no_filesystem_changes(&result).expect("repeat install must be a no-op");
}

#[test]
fn unresolvable_spec_fails_without_creating_paths() {
    let mut env = provision("install-spec-missing");
    stage_package(&env, "simple", "1.0.0", &[("module.txt", "module body\n")]);

    let result = minipm(
        &mut env,
        &[
            "install",
            "simple==9.9.9",
            "--find-links",
            "scratch/packages",
        ],
        &RunOptions::new().expect_error().quiet(),
    )
    .expect("expect_error must tolerate resolution failure");

    assert_ne!(result.exit_code, 0);
    stderr_contains(&result, "no candidate for simple==9.9.9").expect("diagnostic must name spec");
    assert_not_installed(&result, env.layout(), "simple").expect("nothing may be installed");
}

#[test]
fn repeated_install_without_upgrade_changes_nothing() {
    let mut env = provision("install-repeat");
    let source = stage_package(&env, "simple", "1.0.0", &[("module.txt", "module body\n")]);
    let source = source.to_str().expect("utf-8 path");

    minipm(&mut env, &["install", source], &RunOptions::new().quiet())
        .expect("first install must succeed");

    let result = minipm(
        &mut env,
        &["install", source],
        &RunOptions::new().expect_stderr().quiet(),
    )
    .expect("repeat install must succeed with a warning");

    stderr_contains(&result, "already installed").expect("warning must be printed");
    assert_no_filesystem_changes(&result).expect("repeat install must be a no-op");
}

#[test]
fn upgrade_replaces_installed_version() {
    let mut env = provision("install-upgrade");
    let old = stage_package(&env, "simple", "1.0.0", &[("module.txt", "old body\n")]);
    minipm(
        &mut env,
        &["install", old.to_str().expect("utf-8 path")],
        &RunOptions::new().quiet(),
    )
    .expect("must install 1.0.0");

    // A second source tree for the newer version, staged beside the first.
    let newer_source = env.layout().scratch_dir().join("packages-v2").join("simple");
    fs::create_dir_all(&newer_source).expect("must create source dir");
    fs::write(
        newer_source.join("pkg.toml"),
        "name = \"simple\"\nversion = \"2.0.0\"\nfiles = [\"module.txt\"]\n",
    )
    .expect("must write pkg.toml");
    fs::write(newer_source.join("module.txt"), "new body\n").expect("must write payload");

    let result = minipm(
        &mut env,
        &["install", "--upgrade", "scratch/packages-v2/simple"],
        &RunOptions::new().quiet(),
    )
    .expect("upgrade must succeed");

    assert!(
        result.updated("site/simple/module.txt"),
        "payload must be rewritten in place: {:?}",
        result.files_updated
    );
    assert!(result.created("site/simple-2.0.0.info"));
    assert!(result.deleted("site/simple-1.0.0.info"));
    stdout_contains_line(&result, "Upgraded simple 1.0.0 -> 2.0.0 (1 file)")
        .expect("status line must be printed");
}

#[test]
fn install_with_target_places_files_under_target_directory() {
    let mut env = provision("install-target");
    let source = stage_package(&env, "simple", "1.0.0", &[("module.txt", "module body\n")]);

    let result = minipm(
        &mut env,
        &[
            "install",
            "--target",
            "scratch/target",
            source.to_str().expect("utf-8 path"),
        ],
        &RunOptions::new().quiet(),
    )
    .expect("target install must succeed");

    assert_installed_under(
        &result,
        Path::new("scratch/target"),
        "simple",
        "1.0.0",
        &["module.txt"],
    )
    .expect("install must land under the target dir");
    assert_not_installed(&result, env.layout(), "simple")
        .expect("the default site dir must stay untouched");
}

#[test]
fn directory_without_manifest_is_not_installable() {
    let mut env = provision("install-no-manifest");
    let empty = env.layout().scratch_dir().join("empty");
    fs::create_dir_all(&empty).expect("must create empty dir");

    let result = minipm(
        &mut env,
        &["install", "scratch/empty"],
        &RunOptions::new().expect_error().quiet(),
    )
    .expect("expect_error must tolerate the failure");

    assert_ne!(result.exit_code, 0);
    stderr_contains(&result, "is not installable. File 'pkg.toml' not found.")
        .expect("diagnostic must name the missing manifest");
    assert!(
        result.files_created.is_empty(),
        "failed install must create nothing: {:?}",
        result.files_created
    );
}

#[test]
fn install_from_current_directory_dot() {
    let mut env = provision("install-curdir");
    let source = stage_package(&env, "simple", "1.0.0", &[("module.txt", "module body\n")]);

    let result = minipm(
        &mut env,
        &["install", "."],
        &RunOptions::new().cwd(source).quiet(),
    )
    .expect("install from '.' must succeed");

    assert_installed(&result, env.layout(), "simple", "1.0.0", &["module.txt"])
        .expect("marker paths must be created");
}

#[test]
fn uninstall_deletes_payload_and_marker() {
    let mut env = provision("uninstall");
    let source = stage_package(&env, "simple", "1.0.0", &[("module.txt", "module body\n")]);
    minipm(
        &mut env,
        &["install", source.to_str().expect("utf-8 path")],
        &RunOptions::new().quiet(),
    )
    .expect("must install");

    let result = minipm(&mut env, &["uninstall", "simple"], &RunOptions::new().quiet())
        .expect("uninstall must succeed");

    assert!(result.deleted("site/simple"));
    assert!(result.deleted("site/simple/module.txt"));
    assert!(result.deleted("site/simple-1.0.0.info"));
    assert!(result.deleted("site/simple-1.0.0.info/RECEIPT"));
    stdout_contains_line(&result, "Removed simple 1.0.0").expect("status line must be printed");

    let result = minipm(
        &mut env,
        &["uninstall", "simple"],
        &RunOptions::new().expect_error().quiet(),
    )
    .expect("second uninstall must report an error");
    assert_ne!(result.exit_code, 0);
    stderr_contains(&result, "package 'simple' is not installed")
        .expect("diagnostic must name the package");
}

#[test]
fn list_prints_installed_packages_sorted_by_name() {
    let mut env = provision("list");
    let zed = stage_package(&env, "zed", "0.2.0", &[]);
    let alpha = stage_package(&env, "alpha", "1.1.0", &[]);
    minipm(
        &mut env,
        &["install", zed.to_str().expect("utf-8 path")],
        &RunOptions::new().quiet(),
    )
    .expect("must install zed");
    minipm(
        &mut env,
        &["install", alpha.to_str().expect("utf-8 path")],
        &RunOptions::new().quiet(),
    )
    .expect("must install alpha");

    let result = minipm(&mut env, &["list"], &RunOptions::new().quiet())
        .expect("list must succeed");

    assert_eq!(result.stdout_lines(), vec!["alpha 1.1.0", "zed 0.2.0"]);
    assert_no_filesystem_changes(&result).expect("list must not write anything");
}
