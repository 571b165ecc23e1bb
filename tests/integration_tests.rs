//! Integration tests for the seedpool CLI

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn seedpool() -> Command {
    Command::cargo_bin("seedpool").unwrap()
}

/// Test CLI binary exists and responds to --help
#[test]
fn test_cli_help() {
    seedpool()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Adaptive parallel dispatcher"));
}

/// Test CLI responds to --version
#[test]
fn test_cli_version() {
    seedpool()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("seedpool"));
}

#[test]
fn test_version_command() {
    seedpool()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(concat!("seedpool v", env!("CARGO_PKG_VERSION"))));
}

/// Test invalid subcommand shows error
#[test]
fn test_invalid_subcommand() {
    seedpool()
        .arg("invalid-command")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_config_show_merges_repo_file() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("seedpool.toml"),
        "[dispatch]\nmax_threads = 6\n",
    )
    .unwrap();

    seedpool()
        .current_dir(temp_dir.path())
        .args(["config", "show", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"max_threads\": 6"));
}

#[test]
fn test_config_get_single_key() {
    let temp_dir = TempDir::new().unwrap();

    seedpool()
        .current_dir(temp_dir.path())
        .env("SEEDPOOL_DISPATCH__TICK_INTERVAL_MS", "75")
        .args(["config", "get", "dispatch.tick_interval_ms"])
        .assert()
        .success()
        .stdout(predicate::str::diff("75\n"));
}

#[test]
fn test_config_validate_rejects_bad_values() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("custom.yaml");
    fs::write(&config_path, "dispatch:\n  tick_interval_ms: 0\n").unwrap();

    seedpool()
        .current_dir(temp_dir.path())
        .args(["config", "validate", "--config"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("tick_interval_ms"));
}

#[test]
fn test_analyze_checkvars() {
    let temp_dir = TempDir::new().unwrap();
    let route = temp_dir.path().join("route.txt");
    fs::write(&route, "PATH\tA000001\nPATH\tA000001\n").unwrap();

    seedpool()
        .args(["analyze", "checkvars"])
        .arg(&route)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Bad Variables")
                .and(predicate::str::contains("2 A000001")),
        );
}

#[test]
fn test_analyze_range_over_outputs() {
    let temp_dir = TempDir::new().unwrap();
    for (seed, frames) in [(0, 100), (1, 50), (2, 70)] {
        fs::write(
            temp_dir.path().join(format!("{seed:03}.txt")),
            format!("FRAMES\t{frames}\n"),
        )
        .unwrap();
    }

    let assert = seedpool()
        .args(["analyze", "range"])
        .arg(temp_dir.path())
        .arg("1")
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let first = stdout.lines().next().unwrap();
    assert!(first.starts_with("  1 -   1:"), "unexpected first window: {first}");
}

#[test]
fn test_analyze_missing_directory_fails() {
    seedpool()
        .args(["analyze", "twins", "/definitely/not/here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_run_requires_a_valid_seed_list() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("seeds.txt"), "1 2 2").unwrap();

    seedpool()
        .current_dir(temp_dir.path())
        .args(["run", "paladin", "--seed-list", "seeds.txt", "--display", "log"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Duplicate seed"));
}

#[test]
fn test_run_fails_before_dispatch_when_program_is_missing() {
    let temp_dir = TempDir::new().unwrap();

    seedpool()
        .current_dir(temp_dir.path())
        .args([
            "run",
            "paladin",
            "--program",
            "/definitely/not/here/rosa",
            "--display",
            "log",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[cfg(unix)]
fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// Full dispatch through stand-in wrapper and program scripts
#[cfg(unix)]
#[test]
fn test_run_dispatches_every_seed() {
    let temp_dir = TempDir::new().unwrap();
    let wrapper = write_script(
        temp_dir.path(),
        "fake-time",
        r#"report="$2"
shift 4
"$@"
echo "0.10user 0.00system 0.05elapsed 99%CPU (0text+0data 262144max)k 0inputs+0outputs (0major+1minor)pagefaults 0swaps" > "$report""#,
    );
    let program = write_script(
        temp_dir.path(),
        "fake-rosa",
        r#"printf 'FRAMES\t%s\n' "$(( $4 * 10 + 5 ))""#,
    );
    fs::write(
        temp_dir.path().join("seedpool.toml"),
        format!(
            "[executable]\nprogram = {:?}\ntime_wrapper = {:?}\n",
            program.display().to_string(),
            wrapper.display().to_string()
        ),
    )
    .unwrap();
    fs::write(temp_dir.path().join("seeds.txt"), "0 1 2 3\n").unwrap();

    seedpool()
        .current_dir(temp_dir.path())
        .args([
            "run",
            "paladin",
            "--seed-list",
            "seeds.txt",
            "--output-dir",
            "out",
            "--max-threads",
            "4",
            "--tick-ms",
            "10",
            "--display",
            "log",
        ])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Seed 3 Complete")
                .and(predicate::str::contains("All seeds complete")),
        );

    for seed in 0..4 {
        let path = temp_dir.path().join(format!("out/{seed:03}.txt"));
        let output = fs::read_to_string(path).unwrap();
        assert_eq!(output, format!("FRAMES\t{}\n", seed * 10 + 5));
    }
    assert!(!temp_dir.path().join("out/004.txt").exists());
}
