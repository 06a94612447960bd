//! Exit codes and output of the `loxim` binary.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

fn loxim() -> Command {
    Command::new(env!("CARGO_BIN_EXE_loxim"))
}

/// Writes `contents` to a per-test file in the temp directory.
fn script(name: &str, contents: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("loxim-{}-{}", std::process::id(), name));
    std::fs::write(&path, contents).unwrap();
    path
}

fn run(args: &[&str]) -> Output {
    loxim().args(args).output().unwrap()
}

fn run_script(name: &str, source: &str) -> Output {
    let path = script(name, source.as_bytes());
    let out = run(&[path.to_str().unwrap()]);
    let _ = std::fs::remove_file(path);
    out
}

fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn test_script_success() {
    let out = run_script("ok.lox", "1 + 2 * 3\n");
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "7\n");
}

#[test]
fn test_compile_error_exits_65() {
    let out = run_script("compile.lox", "1 +");
    assert_eq!(out.status.code(), Some(65));
    assert!(stderr(&out).contains("Expected an expression."));
    assert_eq!(stdout(&out), "");
}

#[test]
fn test_runtime_error_exits_70() {
    let out = run_script("runtime.lox", "true + 1");
    assert_eq!(out.status.code(), Some(70));
    assert!(stderr(&out).contains("Operands must be numbers."));
    assert_eq!(stdout(&out), "");
}

#[test]
fn test_missing_file_exits_74() {
    let out = run(&["/nonexistent/loxim/script.lox"]);
    assert_eq!(out.status.code(), Some(74));
}

#[test]
fn test_bad_usage_exits_64() {
    assert_eq!(run(&["a.lox", "b.lox"]).status.code(), Some(64));
    assert_eq!(run(&["--frobnicate"]).status.code(), Some(64));
    assert_eq!(run(&["--emit-bc"]).status.code(), Some(64));
}

#[test]
fn test_repl_interprets_each_line() {
    let mut child = loxim()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"1 + 1\n-nil\n2 * 4\n")
        .unwrap();
    let out = child.wait_with_output().unwrap();

    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "> 2\n> > 8\n> \n");
    assert!(stderr(&out).contains("Operand must be a number."));
}

#[test]
fn test_bc_flag_prints_disassembly() {
    let path = script("bc.lox", b"-2");
    let out = run(&["--bc", path.to_str().unwrap()]);
    let _ = std::fs::remove_file(path);

    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        stdout(&out),
        "== code ==\n0000    1  2 OP_CONSTANT         0 '2'\n0002    |  1 OP_NEGATE\n0003    |  3 OP_RETURN\n-2\n"
    );
}

#[test]
fn test_emit_and_run_chunk() {
    let source = script("emit.lox", b"(4 - 1) * 2");
    let chunk = std::env::temp_dir().join(format!("loxim-{}-emit.loxc", std::process::id()));

    let out = run(&[
        "--emit-bc",
        chunk.to_str().unwrap(),
        source.to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "");

    let out = run(&[chunk.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(stdout(&out), "6\n");

    let _ = std::fs::remove_file(source);
    let _ = std::fs::remove_file(chunk);
}

#[test]
fn test_corrupt_chunk_exits_65() {
    let path = script("corrupt.loxc", &[0xff, 0xff, 0xff]);
    let out = run(&[path.to_str().unwrap()]);
    let _ = std::fs::remove_file(path);

    assert_eq!(out.status.code(), Some(65));
}

#[test]
fn test_tokens_flag() {
    let path = script("tokens.lox", b"1 + nil");
    let out = run(&["--tokens", "--no-color", "--pretty", path.to_str().unwrap()]);
    let _ = std::fs::remove_file(path);

    assert_eq!(out.status.code(), Some(0));
    assert!(stdout(&out).starts_with("[01:01] NUMBER   1\n"));
}
