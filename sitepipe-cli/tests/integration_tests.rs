//! Integration tests for the sitepipe CLI
//!
//! Tests end-to-end command behavior using the CLI binary.
//! Uses tempfile for isolated test directories.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

// ============================================================================
// Test Utilities
// ============================================================================

/// Get the path to the sitepipe binary (built by cargo)
fn sitepipe_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_sitepipe"))
}

/// Run sitepipe with the given args in the specified directory
fn run_sitepipe(dir: &Path, args: &[&str]) -> Output {
    sitepipe_binary()
        .current_dir(dir)
        .args(args)
        .output()
        .expect("Failed to execute sitepipe command")
}

/// Get stdout as string
fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Get stderr as string
fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("Failed to create parent dirs");
    }
    fs::write(path, content).expect("Failed to write file");
}

/// Create a minimal project: one stylesheet, one script, one page, and a
/// public file. No config file, so built-in defaults apply.
fn setup_sample_project(dir: &Path) {
    write_file(
        &dir.join("src/assets/styles/main.scss"),
        "$ink: #203040;\nbody { color: $ink; }\n",
    );
    write_file(
        &dir.join("src/assets/scripts/main.js"),
        "function greet(name) { return 'Hello, ' + name; }\n",
    );
    write_file(
        &dir.join("src/index.html"),
        "<html><body><h1>Sample</h1></body></html>\n",
    );
    write_file(&dir.join("public/robots.txt"), "User-agent: *\n");
}

// ============================================================================
// Build Command Tests
// ============================================================================

#[test]
fn test_build_produces_dist() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_sample_project(temp_dir.path());

    let output = run_sitepipe(temp_dir.path(), &["build"]);
    assert!(
        output.status.success(),
        "build should succeed, stderr: {}",
        stderr(&output)
    );

    let dist = temp_dir.path().join("dist");
    assert!(dist.join("index.html").is_file());
    assert!(dist.join("robots.txt").is_file());
    assert!(temp_dir
        .path()
        .join("temp/assets/styles/main.css")
        .is_file());

    let stdout_str = stdout(&output);
    assert!(
        stdout_str.contains("built-in defaults"),
        "should report the config source, got: {}",
        stdout_str
    );
    assert!(
        stdout_str.contains("Done:"),
        "should print a pipeline report, got: {}",
        stdout_str
    );
}

#[test]
fn test_build_reads_config_file() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_sample_project(temp_dir.path());
    write_file(
        &temp_dir.path().join("pages.config.toml"),
        "[build]\ndist = \"out\"\n",
    );

    let output = run_sitepipe(temp_dir.path(), &["build"]);
    assert!(
        output.status.success(),
        "build should succeed, stderr: {}",
        stderr(&output)
    );

    assert!(temp_dir.path().join("out/index.html").is_file());
    assert!(!temp_dir.path().join("dist").exists());
    assert!(
        stdout(&output).contains("pages.config.toml"),
        "should report the config file path"
    );
}

// ============================================================================
// Clean Command Tests
// ============================================================================

#[test]
fn test_clean_removes_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_sample_project(temp_dir.path());

    let output = run_sitepipe(temp_dir.path(), &["build"]);
    assert!(
        output.status.success(),
        "build should succeed, stderr: {}",
        stderr(&output)
    );
    assert!(temp_dir.path().join("dist").exists());

    let output = run_sitepipe(temp_dir.path(), &["clean"]);
    assert!(
        output.status.success(),
        "clean should succeed, stderr: {}",
        stderr(&output)
    );
    assert!(!temp_dir.path().join("dist").exists());
    assert!(!temp_dir.path().join("temp").exists());

    // Cleaning an already-clean project succeeds too
    let output = run_sitepipe(temp_dir.path(), &["clean"]);
    assert!(output.status.success());
}

// ============================================================================
// Useref Command Tests
// ============================================================================

#[test]
fn test_useref_rebundles_existing_output() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_sample_project(temp_dir.path());

    let output = run_sitepipe(temp_dir.path(), &["build"]);
    assert!(
        output.status.success(),
        "build should succeed, stderr: {}",
        stderr(&output)
    );
    let page = fs::read(temp_dir.path().join("dist/index.html")).expect("dist page");

    let output = run_sitepipe(temp_dir.path(), &["useref"]);
    assert!(
        output.status.success(),
        "useref should succeed, stderr: {}",
        stderr(&output)
    );
    let again = fs::read(temp_dir.path().join("dist/index.html")).expect("dist page");
    assert_eq!(page, again, "re-bundling should be byte-stable");
}

// ============================================================================
// Config Error Handling Tests
// ============================================================================

#[test]
fn test_strict_rejects_broken_config() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_sample_project(temp_dir.path());
    write_file(&temp_dir.path().join("pages.config.toml"), "[build\ndist = ");

    let output = run_sitepipe(temp_dir.path(), &["build", "--strict"]);
    assert!(
        !output.status.success(),
        "strict build should fail on a broken config"
    );
    assert!(
        stderr(&output).contains("invalid configuration"),
        "should name the config error, got: {}",
        stderr(&output)
    );
}

#[test]
fn test_broken_config_falls_back_without_strict() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_sample_project(temp_dir.path());
    write_file(&temp_dir.path().join("pages.config.toml"), "[build\ndist = ");

    let output = run_sitepipe(temp_dir.path(), &["build"]);
    assert!(
        output.status.success(),
        "non-strict build should fall back to defaults, stderr: {}",
        stderr(&output)
    );
    assert!(temp_dir.path().join("dist/index.html").is_file());
    assert!(
        stdout(&output).contains("built-in defaults"),
        "should report the fallback"
    );
}

// ============================================================================
// General CLI Tests
// ============================================================================

#[test]
fn test_no_command_prints_help() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let output = run_sitepipe(temp_dir.path(), &[]);

    assert!(output.status.success());
    assert!(
        stdout(&output).contains("Usage"),
        "should print usage, got: {}",
        stdout(&output)
    );
}

#[test]
fn test_build_fails_on_broken_stylesheet() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    setup_sample_project(temp_dir.path());
    write_file(
        &temp_dir.path().join("src/assets/styles/broken.scss"),
        "body { color: ",
    );

    let output = run_sitepipe(temp_dir.path(), &["build"]);
    assert!(
        !output.status.success(),
        "build should fail on a stylesheet syntax error"
    );
    assert!(
        stderr(&output).contains("style"),
        "should name the failing task, got: {}",
        stderr(&output)
    );
}
