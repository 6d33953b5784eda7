//! Real subprocesses through `cmd`.
#![cfg(windows)]

use firmware_updater::core::Invocation;
use firmware_updater::{CommandRunner, ShellRunner};
use tempfile::TempDir;

#[tokio::test]
async fn test_cmd_runs_program_under_path_with_spaces() {
    let temp_dir = TempDir::new().unwrap();
    let bin = temp_dir.path().join("Program Files").join("pio bin");
    std::fs::create_dir_all(&bin).unwrap();
    let script = bin.join("platformio.cmd");
    std::fs::write(&script, "@echo off\r\necho args %*\r\n").unwrap();

    let output = ShellRunner::new()
        .run(&Invocation::new(script.to_string_lossy()).args(["run", "--target", "upload"]))
        .await
        .unwrap();

    assert!(output.success, "stderr: {}", output.stderr);
    assert_eq!(output.stdout, "args run --target upload");
}

#[tokio::test]
async fn test_cmd_does_not_expand_percent_in_arguments() {
    let output = ShellRunner::new()
        .run(&Invocation::new("echo").arg("%USERPROFILE%"))
        .await
        .unwrap();

    assert!(output.success);
    assert!(output.stdout.contains("USERPROFILE"));
    assert!(!output.stdout.contains(":\\"));
}
