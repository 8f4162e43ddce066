//! Integration tests for the `onchange` binary's startup behavior.

use std::process::Command;

#[test]
fn missing_watch_directory_exits_non_zero() {
    let output = Command::new(env!("CARGO_BIN_EXE_onchange"))
        .args(["-d", "/nonexistent/onchange/root", "-c", "echo hi"])
        .env_remove("ONCHANGE_DIR")
        .output()
        .expect("binary should launch");

    assert!(!output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stdout.contains("Watching directory"));
    assert!(stderr.contains("does not exist"), "stderr was: {stderr}");
}

#[test]
fn file_as_watch_root_exits_non_zero() {
    let temp = tempfile::tempdir().unwrap();
    let file = temp.path().join("not-a-dir.txt");
    std::fs::write(&file, "x").unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_onchange"))
        .arg("-d")
        .arg(&file)
        .output()
        .expect("binary should launch");

    assert!(!output.status.success());
    assert!(!String::from_utf8_lossy(&output.stdout).contains("Watching directory"));
}

#[test]
fn invalid_debounce_exits_non_zero() {
    let temp = tempfile::tempdir().unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_onchange"))
        .arg("-d")
        .arg(temp.path())
        .args(["--debounce-ms", "0"])
        .output()
        .expect("binary should launch");

    assert!(!output.status.success());
}
