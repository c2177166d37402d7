// e2e/cli.rs: the `flzma2` binary as a black box
//
// Runs the built binary with std::process::Command on temporary files and
// checks exit codes and the per-file report on stderr.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

fn flzma2_bin() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_flzma2"))
}

fn run(args: &[&str], dir: &Path) -> Output {
    Command::new(flzma2_bin())
        .args(args)
        .current_dir(dir)
        .env_remove("FLZMA2_NBWORKERS")
        .env_remove("FLZMA2_DEPTH")
        .output()
        .expect("failed to run flzma2")
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

/// A directory holding `a.txt` and `sub/b.txt`.
fn make_tree() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("a.txt"), "alpha beta gamma delta\n".repeat(400)).unwrap();
    fs::create_dir(dir.path().join("sub")).unwrap();
    fs::write(dir.path().join("sub/b.txt"), "one two three four\n".repeat(300)).unwrap();
    dir
}

// ── 1. Reports ───────────────────────────────────────────────────────────────

#[test]
fn reports_each_file() {
    let dir = make_tree();
    let out = run(&["-T", "2", "a.txt", "sub/b.txt"], dir.path());
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    let text = stderr(&out);
    assert!(text.contains("a.txt: 9200 bytes"), "{text}");
    assert!(text.contains("b.txt: 5700 bytes"), "{text}");
    assert!(text.contains("matches covering"), "{text}");
}

#[test]
fn quiet_prints_nothing() {
    let dir = make_tree();
    let out = run(&["-q", "a.txt"], dir.path());
    assert!(out.status.success());
    assert!(out.stderr.is_empty(), "{}", stderr(&out));
}

#[test]
fn verify_and_layout_flags() {
    let dir = make_tree();
    for flag in ["--bitpack", "--structured"] {
        let out = run(&["--verify", flag, "-d", "64", "a.txt"], dir.path());
        assert!(out.status.success(), "{flag}: {}", stderr(&out));
    }
}

#[test]
fn environment_sets_defaults() {
    let dir = make_tree();
    let out = Command::new(flzma2_bin())
        .args(["-vv", "a.txt"])
        .current_dir(dir.path())
        .env("FLZMA2_NBWORKERS", "3")
        .env("FLZMA2_DEPTH", "40")
        .output()
        .unwrap();
    assert!(out.status.success());
    let text = stderr(&out);
    assert!(text.contains("using 3 builder threads, depth 40"), "{text}");
}

// ── 2. Directories ───────────────────────────────────────────────────────────

#[test]
fn directory_needs_recursive() {
    let dir = make_tree();
    let out = run(&["."], dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("use -r"), "{}", stderr(&out));
}

#[test]
fn recursive_walks_directories() {
    let dir = make_tree();
    let out = run(&["-r", "."], dir.path());
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stderr(&out);
    let a = text.find("a.txt").expect("a.txt reported");
    let b = text.find("b.txt").expect("b.txt reported");
    assert!(a < b, "files reported in name order");
}

// ── 3. Failures ──────────────────────────────────────────────────────────────

#[test]
fn missing_file_exits_1() {
    let dir = TempDir::new().unwrap();
    let out = run(&["nope.bin"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("cannot open"), "{}", stderr(&out));
}

#[test]
fn bad_depth_exits_1() {
    let dir = make_tree();
    let out = run(&["-d", "300", "a.txt"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    assert!(stderr(&out).contains("bad usage"), "{}", stderr(&out));
}

#[test]
fn missing_arguments_is_a_usage_error() {
    let dir = TempDir::new().unwrap();
    let out = run(&[], dir.path());
    assert!(!out.status.success());
}

#[test]
fn version_flag() {
    let dir = TempDir::new().unwrap();
    let out = run(&["--version"], dir.path());
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains(env!("CARGO_PKG_VERSION")));
}
