use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn cjit() -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("cjit");
    cmd.env_remove("RUST_LOG").env_remove("CJIT_TMPDIR");
    cmd
}

/// Writes `code` to `main.c` in a fresh directory, with an empty workspace root beside it.
fn source(code: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("main.c");
    fs::write(&file, code).unwrap();
    fs::create_dir(dir.path().join("tmp")).unwrap();
    (dir, file)
}

fn workspace_root(dir: &TempDir) -> PathBuf {
    dir.path().join("tmp")
}

// ── program status ──────────────────────────────────────────

#[test]
fn exit_status_is_the_program_return_value() {
    let (dir, file) = source("int main(int argc, char **argv){ return 42; }");

    cjit()
        .arg(&file)
        .env("CJIT_TMPDIR", workspace_root(&dir))
        .assert()
        .code(42)
        .stderr(predicate::str::contains("Compilation successful"));

    assert_eq!(fs::read_dir(workspace_root(&dir)).unwrap().count(), 0);
}

#[test]
fn program_output_reaches_stdout() {
    let (dir, file) = source(
        r#"
        #include <stdio.h>
        int main(int argc, char **argv) {
            printf("hello %s\n", argv[1]);
            return 0;
        }
    "#,
    );

    cjit()
        .arg("--tmpdir")
        .arg(workspace_root(&dir))
        .arg(&file)
        .arg("world")
        .assert()
        .success()
        .stdout(predicate::str::contains("hello world"));
}

#[test]
fn exit_call_still_removes_workspace() {
    let (dir, file) = source(
        r#"
        #include <stdio.h>
        #include <stdlib.h>
        int main(void) {
            printf("leaving early\n");
            exit(3);
            return 0;
        }
    "#,
    );

    cjit()
        .arg("--tmpdir")
        .arg(workspace_root(&dir))
        .arg(&file)
        .assert()
        .code(3)
        .stdout(predicate::str::contains("leaving early"))
        .stderr(predicate::str::contains("Execution completed").not());

    assert_eq!(fs::read_dir(workspace_root(&dir)).unwrap().count(), 0);
}

#[test]
fn quiet_hides_status_lines() {
    let (dir, file) = source("int main(void){ return 0; }");

    cjit()
        .arg("-q")
        .arg("--tmpdir")
        .arg(workspace_root(&dir))
        .arg(&file)
        .assert()
        .success()
        .stderr(predicate::str::contains("Execution start").not());
}

// ── failures ────────────────────────────────────────────────

#[test]
fn syntax_error_exits_one() {
    let (dir, file) = source("int main(");

    cjit()
        .arg("--tmpdir")
        .arg(workspace_root(&dir))
        .arg(&file)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("Execution start").not());

    assert_eq!(fs::read_dir(workspace_root(&dir)).unwrap().count(), 0);
}

#[test]
fn missing_main_exits_one() {
    let (dir, file) = source("int helper(int x) { return x * 2; }");

    cjit()
        .arg("--tmpdir")
        .arg(workspace_root(&dir))
        .arg(&file)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Symbol not found in source: main"));
}

#[test]
fn missing_file_exits_one() {
    let dir = tempfile::tempdir().unwrap();

    cjit()
        .arg(dir.path().join("absent.c"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("File not found"));
}

// ── usage ───────────────────────────────────────────────────

#[test]
fn version_exits_zero() {
    cjit()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn help_exits_zero() {
    cjit()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn no_arguments_is_a_usage_error() {
    cjit().assert().code(1).stderr(predicate::str::contains("Usage"));
}

#[test]
fn unknown_flag_is_a_usage_error() {
    cjit().arg("--no-such-flag").arg("x.c").assert().code(1);
}
