//! CLI-level end-to-end tests for the kc-drv binary.
//!
//! These drive the actual compiled binary through `assert_cmd`, the way
//! the compiler driver's own e2e suite does, rather than calling into the
//! command handlers directly.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use tempfile::{NamedTempFile, TempDir};

fn kc_drv_bin() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_kc-drv"))
}

fn write_fixture(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("failed to create temp fixture");
    file.write_all(json.as_bytes()).expect("failed to write fixture");
    file
}

#[test]
fn test_cli_help() {
    let mut cmd = Command::new(kc_drv_bin());
    cmd.arg("--help");

    cmd.assert().success().stdout(predicate::str::contains("Usage").or(predicate::str::contains("kc-drv")));
}

#[test]
fn test_cli_version() {
    let mut cmd = Command::new(kc_drv_bin());
    cmd.arg("--version");

    cmd.assert().success().stdout(predicate::str::contains("kc-drv").or(predicate::str::contains("0.")));
}

#[test]
fn test_cli_init_scaffolds_project() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");

    let mut cmd = Command::new(kc_drv_bin());
    cmd.arg("init").arg("--path").arg(temp_dir.path());

    cmd.assert().success();

    assert!(temp_dir.path().join("fixtures").is_dir());
    assert!(temp_dir.path().join("kc.toml").is_file());
}

#[test]
fn test_cli_init_refuses_nonempty_dir_without_force() {
    let temp_dir = TempDir::new().expect("failed to create temp dir");
    std::fs::write(temp_dir.path().join("existing.txt"), "content").unwrap();

    let mut cmd = Command::new(kc_drv_bin());
    cmd.arg("init").arg("--path").arg(temp_dir.path());

    cmd.assert().failure();
}

#[test]
fn test_cli_check_accepts_well_typed_expression() {
    let fixture = write_fixture(
        r#"{
            "bindings": [{"name": "x", "type": {"kind": "named", "data": "i32"}}],
            "expr": {
                "kind": "binary",
                "data": {
                    "op": "*",
                    "left": {"kind": "ident", "data": "x"},
                    "right": {"kind": "int", "data": 2}
                }
            }
        }"#,
    );

    let mut cmd = Command::new(kc_drv_bin());
    cmd.arg("check").arg(fixture.path());

    cmd.assert().success().stdout(predicate::str::contains("I32"));
}

#[test]
fn test_cli_check_reports_type_mismatch() {
    let fixture = write_fixture(
        r#"{
            "bindings": [{"name": "x", "type": {"kind": "named", "data": "bool"}}],
            "expr": {
                "kind": "binary",
                "data": {
                    "op": "+",
                    "left": {"kind": "ident", "data": "x"},
                    "right": {"kind": "int", "data": 1}
                }
            }
        }"#,
    );

    let mut cmd = Command::new(kc_drv_bin());
    cmd.arg("check").arg(fixture.path());

    cmd.assert().failure();
}

#[test]
fn test_cli_check_missing_fixture_file() {
    let mut cmd = Command::new(kc_drv_bin());
    cmd.arg("check").arg("/nonexistent/fixture.json");

    cmd.assert().failure();
}
