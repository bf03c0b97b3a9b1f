//! Integration tests for the Clear launcher.
//!
//! These tests invoke the `clearvm` binary as a subprocess against
//! modules written to a temp directory and check exit codes and stdout.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

#[allow(deprecated)]
fn clearvm() -> Command {
    Command::cargo_bin("clearvm").unwrap()
}

/// Write `bytes` as `<dir>/<stem>.clr.b` and return the stem path.
fn write_module(dir: &TempDir, stem: &str, bytes: &[u8]) -> PathBuf {
    let stem_path = dir.path().join(stem);
    fs::write(dir.path().join(format!("{stem}.clr.b")), bytes).unwrap();
    stem_path
}

/// The print-constant module: one CONST_STR "hello"; PUSH_CONST 0; PRINT.
const HELLO: &[u8] = &[
    0x01, 0x02, 0x05, 0x68, 0x65, 0x6C, 0x6C, 0x6F, 0x00, 0x00, 0x0D,
];

// ---- Usage ----

#[test]
fn no_args_prints_usage_and_exits_1() {
    clearvm()
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Usage: clearvm"));
}

#[test]
fn too_many_args_exits_1() {
    clearvm()
        .args(["one", "two"])
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("Usage: clearvm"));
}

// ---- Input handling ----

#[test]
fn missing_file_exits_1() {
    let dir = TempDir::new().unwrap();
    clearvm()
        .arg(dir.path().join("absent").to_str().unwrap())
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("|| cannot read"));
}

#[test]
fn empty_file_exits_1() {
    let dir = TempDir::new().unwrap();
    let stem = write_module(&dir, "empty", &[]);
    clearvm()
        .arg(stem.to_str().unwrap())
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("contains no instructions"));
}

#[test]
fn undecodable_module_exits_1() {
    let dir = TempDir::new().unwrap();
    // One constant promised, record truncated.
    let stem = write_module(&dir, "bad", &[0x01, 0x00, 0x02]);
    clearvm()
        .arg(stem.to_str().unwrap())
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::contains("|| truncated constant header"));
}

// ---- Execution ----

#[test]
fn run_prints_banner_and_output() {
    let dir = TempDir::new().unwrap();
    let stem = write_module(&dir, "hello", HELLO);
    clearvm()
        .arg(stem.to_str().unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("Running:"))
        .stdout(predicate::str::contains("hello\n"));
}

#[test]
fn appends_the_module_extension() {
    let dir = TempDir::new().unwrap();
    let stem = write_module(&dir, "extension_check", HELLO);
    // Passing the stem (no .clr.b) is the supported calling convention.
    assert!(!stem.to_str().unwrap().ends_with(".clr.b"));
    clearvm().arg(stem.to_str().unwrap()).assert().success();
}

#[test]
fn runtime_fault_exits_2_and_names_the_opcode() {
    let dir = TempDir::new().unwrap();
    // No constants; code is a bare POP on an empty stack.
    let stem = write_module(&dir, "fault", &[0x00, 0x0E]);
    clearvm()
        .arg(stem.to_str().unwrap())
        .assert()
        .failure()
        .code(2)
        .stdout(predicate::str::contains("|| OP_POP at offset 0"));
}

#[test]
fn output_before_a_fault_is_still_printed() {
    let dir = TempDir::new().unwrap();
    // Print "hello", then POP an empty stack.
    let mut bytes = HELLO.to_vec();
    bytes.push(0x0E);
    let stem = write_module(&dir, "partial", &bytes);
    clearvm()
        .arg(stem.to_str().unwrap())
        .assert()
        .failure()
        .code(2)
        .stdout(predicate::str::contains("hello\n"))
        .stdout(predicate::str::contains("|| OP_POP"));
}

#[test]
fn unknown_opcode_is_diagnosed() {
    let dir = TempDir::new().unwrap();
    let stem = write_module(&dir, "unknown", &[0x00, 0xFE]);
    clearvm()
        .arg(stem.to_str().unwrap())
        .assert()
        .failure()
        .code(2)
        .stdout(predicate::str::contains("|| unknown opcode 0xfe at offset 0"));
}
