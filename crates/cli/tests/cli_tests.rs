//! CLI integration tests

use std::process::{Command, Output};
use tempfile::TempDir;

fn hiring(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_hiring"))
        .args(args)
        .env_remove("HIRING_API_URL")
        .output()
        .expect("Failed to execute command")
}

#[test]
fn test_cli_help() {
    let output = hiring(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI help should succeed");
    assert!(stdout.contains("Smart Hiring"), "Should show app name");
    for command in ["train", "predict", "inspect", "sample-data", "remote"] {
        assert!(stdout.contains(command), "Should show {} command", command);
    }
    assert!(stdout.contains("--format"), "Should show format option");
    assert!(stdout.contains("HIRING_API_URL"), "Should show env var");
}

#[test]
fn test_cli_version() {
    let output = hiring(&["--version"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success(), "CLI version should succeed");
    assert!(stdout.contains("hiring"), "Should show binary name");
}

#[test]
fn test_train_help() {
    let output = hiring(&["train", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    for option in ["--data", "--schema", "--trees", "--seed", "--pad-samples"] {
        assert!(stdout.contains(option), "Should show {} option", option);
    }
}

#[test]
fn test_remote_help() {
    let output = hiring(&["remote", "--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("health"));
    assert!(stdout.contains("reload"));
    assert!(stdout.contains("rank"));
}

#[test]
fn test_sample_train_predict_inspect() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("sample.csv");
    let model = dir.path().join("model.bin");
    let data_arg = data.to_str().unwrap();
    let model_arg = model.to_str().unwrap();

    let output = hiring(&["sample-data", "--output", data_arg, "--count", "120"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let output = hiring(&[
        "--format", "json", "train", "--data", data_arg, "--output", model_arg, "--trees", "10",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let trained: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(trained["model_version"].as_str().unwrap().starts_with("rf-"));

    let output = hiring(&[
        "--format",
        "json",
        "predict",
        "--model",
        model_arg,
        "--feature",
        "skill_match_score=0.95",
        "--feature",
        "avg_rating=4.9",
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let predicted: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(predicted["model_version"], trained["model_version"]);
    assert!(predicted["insight"]["reasoning"].is_string());

    let output = hiring(&["inspect", "--model", model_arg]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("smart_hiring"));
}

#[test]
fn test_invalid_feature_argument() {
    let output = hiring(&["predict", "--feature", "skills"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("name=value"));
}

#[test]
fn test_invalid_command() {
    let output = hiring(&["invalid-command"]);
    assert!(!output.status.success(), "Invalid command should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error") || stderr.contains("invalid"));
}

#[test]
fn test_missing_argument() {
    let output = hiring(&["train"]);
    assert!(!output.status.success(), "Missing argument should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("required") || stderr.contains("error"));
}
