//! End-to-end tests for the a11y-steps CLI
//!
//! These run the real binary against the `mock-bridge` binary serving a
//! scripted eog window, so the whole path is exercised: config loading,
//! bridge process, wire protocol, feature parsing and the step library.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Test context with paths and cleanup
struct TestContext {
    /// Scratch directory, removed on drop
    temp_dir: tempfile::TempDir,
    /// Path to the a11y-steps binary
    cli_bin: PathBuf,
    /// Path to fixtures directory
    fixtures_dir: PathBuf,
    /// Config file written for this test
    config_path: PathBuf,
}

impl TestContext {
    /// Create a context whose config points at the mock bridge
    fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let fixtures_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures");

        let bridge = PathBuf::from(env!("CARGO_BIN_EXE_mock-bridge"));
        let config_path = temp_dir.path().join("config.toml");

        let ctx = Self {
            temp_dir,
            cli_bin: PathBuf::from(env!("CARGO_BIN_EXE_a11y-steps")),
            fixtures_dir,
            config_path,
        };
        ctx.write_config(&bridge);
        ctx
    }

    fn write_config(&self, bridge: &Path) {
        let fixture = self.fixtures_dir.join("viewer.yaml");
        let config = format!(
            r#"
[application]
name = "eog"
launch_per_scenario = true

[bridge]
path = {bridge:?}
args = [{fixture:?}]

[timing]
poll_attempts = 10
poll_delay_ms = 0
settle_scale = 0.0
"#,
            bridge = bridge.display().to_string(),
            fixture = fixture.display().to_string(),
        );
        std::fs::write(&self.config_path, config).expect("Failed to write config");
    }

    fn fixture(&self, name: &str) -> PathBuf {
        self.fixtures_dir.join(name)
    }

    /// Run the CLI with the test config and an isolated environment
    fn run(&self, args: &[&str]) -> Output {
        Command::new(&self.cli_bin)
            .arg("--config")
            .arg(&self.config_path)
            .args(args)
            .env("XDG_CONFIG_HOME", self.temp_dir.path().join("config"))
            .env("XDG_DATA_HOME", self.temp_dir.path().join("data"))
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .output()
            .expect("Failed to run a11y-steps")
    }

    fn run_feature(&self, name: &str, extra: &[&str]) -> Output {
        let feature = self.fixture(name);
        let mut args = vec!["run", feature.to_str().expect("non-UTF-8 fixture path")];
        args.extend_from_slice(extra);
        self.run(&args)
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_steps_lists_every_phrase() {
    let ctx = TestContext::new();
    let output = ctx.run(&["steps"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert_eq!(out.lines().count(), 25, "stdout: {out}");
    assert!(out.contains("image size is {width:d}x{height:d}"));
    assert!(out.contains("Click \"{name}\" in GApplication menu"));
}

#[test]
fn test_resolve_shows_coerced_arguments() {
    let ctx = TestContext::new();

    let output = ctx.run(&["resolve", "image size is 800x600"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("width = 800"), "stdout: {out}");
    assert!(out.contains("height = 600"), "stdout: {out}");

    let output = ctx.run(&["resolve", "Do a barrel roll"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("No step matches"));

    let output = ctx.run(&["resolve", "sidepanel is collapsed"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("displayed, hidden"));
}

#[test]
fn test_about_dialog_feature() {
    let ctx = TestContext::new();
    let output = ctx.run_feature("about.feature", &[]);

    let out = stdout(&output);
    assert!(output.status.success(), "stdout: {out}\nstderr: {}", stderr(&output));
    assert!(out.contains("✓ GPL 2.0 link is displayed"));
    assert!(out.contains("2 of 2 scenarios passed"));
}

#[test]
fn test_viewer_feature_through_bridge() {
    let ctx = TestContext::new();
    let output = ctx.run_feature("viewer.feature", &["--verbose"]);

    let out = stdout(&output);
    assert!(output.status.success(), "stdout: {out}\nstderr: {}", stderr(&output));
    assert!(out.contains("✓ image size is 640x480"));
    assert!(out.contains("Sidebar starts hidden (state=hidden)"));
    assert!(out.contains("[assertion] image size is {width:d}x{height:d}"));
    assert!(out.contains("3 of 3 scenarios passed"));
}

#[test]
fn test_failing_step_reports_and_skips() {
    let ctx = TestContext::new();
    let output = ctx.run_feature("failing.feature", &[]);

    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("✗ image size is 800x600"), "stdout: {out}");
    assert!(out.contains("Image width differs (expected 800, got 640)"));
    assert!(out.contains("- image type is \"image/png\""));
    assert!(out.contains("0 of 1 scenarios passed"));
}

#[test]
fn test_tag_filter() {
    let ctx = TestContext::new();
    let output = ctx.run_feature("about.feature", &["--tags", "@about"]);

    let out = stdout(&output);
    assert!(output.status.success(), "stdout: {out}");
    assert!(out.contains("1 of 1 scenarios passed"));
    assert!(out.contains("1 filtered out by tags"));
    assert!(!out.contains("About dialog can be dismissed"));
}

#[test]
fn test_missing_bridge_fails_to_start() {
    let ctx = TestContext::new();
    ctx.write_config(Path::new("/nonexistent/a11y-bridge"));

    let output = ctx.run_feature("about.feature", &[]);
    assert_eq!(output.status.code(), Some(1));
    assert!(
        stderr(&output).contains("Accessibility bridge failed to start"),
        "stderr: {}",
        stderr(&output)
    );
}

#[test]
fn test_malformed_feature_is_reported() {
    let ctx = TestContext::new();
    let feature = ctx.temp_dir.path().join("broken.feature");
    std::fs::write(
        &feature,
        "Feature: broken\n\n  Scenario Outline: x\n    * Open \"<f>\" via menu\n",
    )
    .expect("Failed to write feature");

    let output = ctx.run(&["run", feature.to_str().expect("non-UTF-8 temp path")]);
    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("line 3"), "stdout: {out}");
}
