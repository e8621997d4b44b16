//! CLI contract tests for the `kernver` binary.

use std::path::Path;

use assert_cmd::Command;

fn write_config(dir: &Path, body: &str) -> std::path::PathBuf {
    let path = dir.join("kernver.toml");
    std::fs::write(&path, body).expect("write config");
    path
}

fn kernver(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("kernver").expect("binary built");
    cmd.arg("--config")
        .arg(config)
        .env_remove("RUST_LOG")
        .env_remove("KERNVER_KERNEL_VERSION")
        .env_remove("KERNVER_PROCFS")
        .env_remove("KERNVER_FORCE_SMALL_PROGS")
        .env_remove("KERNVER_FORCE_LARGE_PROGS");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("run kernver");
    assert!(output.status.success(), "kernver failed: {output:?}");
    String::from_utf8(output.stdout).expect("utf-8 stdout")
}

#[test]
fn version_reports_override() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "[kernel]\nversion = \"4.19.225-cloud\"\n");

    let json = stdout_of(kernver(&config).args(["version", "--json"]));
    let value: serde_json::Value = serde_json::from_str(&json).expect("json");

    assert_eq!(value["display"], "4.19.225-cloud");
    assert_eq!(value["source"], "override");
    assert_eq!(value["version"], 0x04_13_e1);
    assert_eq!(value["corrected"], 0x04_13_ff);
}

#[test]
fn select_prefers_v61() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(
        dir.path(),
        "[kernel]\nversion = \"6.1.0\"\n[probes]\nlarge_program_size = true\nsignal_helper = true\n",
    );

    let json = stdout_of(kernver(&config).args(["select", "--json"]));
    let value: serde_json::Value = serde_json::from_str(&json).expect("json");

    assert_eq!(value["variant"], "v61");
    assert_eq!(value["objects"]["base"], "bpf_generic_kprobe_v61.o");
    assert_eq!(value["objects"]["ret"], "bpf_generic_retkprobe_v61.o");
    assert_eq!(value["large_eligible"], true);
}

#[test]
fn select_text_output_with_force_small() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(
        dir.path(),
        "[kernel]\nversion = \"6.8.0\"\n[programs]\nforce_small = true\n",
    );

    let text = stdout_of(kernver(&config).arg("select"));

    assert!(text.contains("baseline"));
    assert!(text.contains("bpf_generic_kprobe.o"));
    assert!(text.contains("bpf_generic_retkprobe.o"));
}

#[test]
fn check_passes_for_ancient_minimum() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "");

    kernver(&config).args(["check", "1.0"]).assert().success();
}

#[test]
fn invalid_config_fails() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "[kernel]\nprocfs = \"\"\n");

    kernver(&config).arg("version").assert().failure();
}

#[test]
fn invalid_env_override_is_logged() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(dir.path(), "[kernel]\nversion = \"5.10.0\"\n");

    let output = kernver(&config)
        .env("KERNVER_FORCE_LARGE_PROGS", "maybe")
        .arg("version")
        .output()
        .expect("run kernver");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("ignoring invalid env override"),
        "stderr: {stderr}"
    );
}

#[test]
fn conflicting_force_flags_are_logged() {
    let dir = tempfile::tempdir().expect("tempdir");
    let config = write_config(
        dir.path(),
        "[kernel]\nversion = \"5.10.0\"\n[programs]\nforce_small = true\nforce_large = true\n",
    );

    let output = kernver(&config).arg("select").output().expect("run kernver");

    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("force_small takes precedence"),
        "stderr: {stderr}"
    );
}
