//! End-to-end tests for the `apigen` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

fn apigen() -> Command {
    Command::cargo_bin("apigen").expect("binary builds")
}

fn write_input(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).expect("create input file");
    file.write_all(content.as_bytes()).expect("write input file");
    path
}

#[test]
fn help_prints_usage() {
    apigen()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("apigen [-h]"));
}

#[test]
fn missing_input_fails() {
    apigen()
        .assert()
        .failure()
        .stderr(predicate::str::contains("exactly one input file"));
}

#[test]
fn stdin_to_stdout_c_header() {
    apigen()
        .arg("-")
        .write_stdin("type Id = u32;\nfn get_id() Id;\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("typedef uint32_t Id;"))
        .stdout(predicate::str::contains("#pragma once"));
}

#[test]
fn output_file_is_written() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_input(&dir, "lib.api", "type Handle = opaque {};\n");
    let output = dir.path().join("lib.h");

    apigen()
        .arg("--output")
        .arg(&output)
        .arg(&input)
        .assert()
        .success();

    let header = std::fs::read_to_string(&output).expect("output written");
    assert!(header.contains("typedef void Handle;"));
}

#[test]
fn zig_backend_renders() {
    apigen()
        .arg("--language")
        .arg("zig")
        .arg("-")
        .write_stdin("type Point = struct { x: i32, y: i32 };\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("pub const Point = extern struct {"));
}

#[test]
fn rust_backend_is_a_stub() {
    apigen()
        .arg("--language")
        .arg("rust")
        .arg("-")
        .write_stdin("type Id = u32;\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not implemented"));
}

#[test]
fn missing_file_reports_internal_error() {
    apigen()
        .arg("/nonexistent/path.api")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error(1016)"));
}

#[test]
fn duplicate_symbol_fails_with_diagnostic() {
    apigen()
        .arg("-")
        .write_stdin("type A = opaque {};\ntype A = opaque {};\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error(1007)"));
}

#[test]
fn diagnostics_carry_location() {
    apigen()
        .arg("-")
        .write_stdin("type A = opaque {};\ntype A = opaque {};\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("stdin:2:1: error(1007)"));
}

#[test]
fn test_mode_accepts_expected_empty_enum() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_input(&dir, "case.api", "// expected: 1012\ntype E = enum(u8){};\n");

    apigen()
        .arg("--test-mode")
        .arg("analyzer")
        .arg(&input)
        .assert()
        .success();
}

#[test]
fn test_mode_accepts_expected_constexpr_range_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_input(&dir, "case.api", "// expected: 1014\nconstexpr max : u8 = 300;\n");

    apigen()
        .arg("--test-mode")
        .arg("analyzer")
        .arg(&input)
        .assert()
        .success();
}

#[test]
fn test_mode_accepts_expected_syntax_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_input(&dir, "case.api", "// expected: 1008\ntype = u8;\n");

    apigen()
        .arg("--test-mode")
        .arg("parser")
        .arg(&input)
        .assert()
        .success();
}

#[test]
fn test_mode_fails_when_expected_code_missing() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_input(&dir, "case.api", "// expected: 1007\ntype A = u8;\n");

    apigen()
        .arg("--test-mode")
        .arg("analyzer")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected diagnostic code 1007"));
}

#[test]
fn test_mode_fails_on_unexpected_diagnostics() {
    let dir = tempfile::tempdir().expect("tempdir");
    let input = write_input(
        &dir,
        "case.api",
        "// expected: 1012\ntype E = enum(u8){};\ntype A = opaque {};\ntype A = opaque {};\n",
    );

    apigen()
        .arg("--test-mode")
        .arg("analyzer")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unexpected diagnostics"));
}

#[test]
fn forward_declarations_in_c_output() {
    apigen()
        .arg("-")
        .write_stdin("type A = struct { p: *B };\ntype B = struct { q: *A };\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("struct B;"))
        .stdout(predicate::str::contains("typedef struct A{"));
}

#[test]
fn warnings_do_not_fail_the_run() {
    apigen()
        .arg("-")
        .write_stdin("type S = struct {};\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("warning(6001)"));
}
