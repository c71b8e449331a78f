//! Integration tests for the dlsim CLI

use std::process::{Command, Output};

/// Run the binary with an isolated config directory
fn dlsim(args: &[&str]) -> Output {
    let home = tempfile::tempdir().expect("tempdir");
    Command::new(env!("CARGO_BIN_EXE_dlsim"))
        .args(args)
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_STATE_HOME", home.path().join("state"))
        .env_remove("RUST_LOG")
        .env_remove("DLSIM_MODE")
        .env_remove("DLSIM_RESOURCES")
        .env_remove("DLSIM_PROCESSES")
        .env_remove("DLSIM_SEED")
        .env_remove("DLSIM_POLL_INTERVAL_MS")
        .env_remove("DLSIM_COLOR")
        .output()
        .expect("Failed to execute dlsim")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_cli_version() {
    let output = dlsim(&["--version"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("dlsim"));
}

#[test]
fn test_cli_help() {
    let output = dlsim(&["--help"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Deadlock avoidance and detection simulator"));
    assert!(text.contains("--mode"));
    assert!(text.contains("--resources"));
    assert!(text.contains("--wall-clock"));
}

#[test]
fn test_avoidance_run() {
    let output = dlsim(&["--color", "never"]);
    assert_eq!(output.status.code(), Some(0));

    let text = stdout(&output);
    assert!(text.starts_with("Mode=avoidance total=[3, 3, 2] n=5\nMax demand per process:\n  P0: "));
    assert!(text.contains("[avoid][grant] proc"));
    assert!(text.contains("All done."));
    assert!(!text.contains("[detect]"));
    assert!(!text.contains("abort"));
}

#[test]
fn test_detection_run() {
    let output = dlsim(&[
        "--mode",
        "detection",
        "--resources",
        "3,3,2",
        "--n",
        "5",
        "--seed",
        "42",
        "--color",
        "never",
    ]);
    assert_eq!(output.status.code(), Some(0));

    let text = stdout(&output);
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[0].starts_with("Mode=detection total=[3, 3, 2] n=5"));
    assert!(lines.iter().any(|l| l.starts_with("[detect][block]")));

    let found: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.contains("Deadlock cycle found:"))
        .map(|(i, _)| i)
        .collect();
    let resolved: Vec<usize> = lines
        .iter()
        .enumerate()
        .filter(|(_, l)| l.starts_with("[resolve] abort proc"))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(found.len(), 1);
    assert_eq!(resolved, vec![found[0] + 1]);

    // Everyone but the victim runs to completion after the abort.
    let finished_after = lines[resolved[0]..]
        .iter()
        .filter(|l| l.ends_with("finished"))
        .count();
    assert!(finished_after >= 1);
    assert_eq!(lines.iter().filter(|l| l.ends_with("finished")).count(), 4);
    assert!(!text.contains("[final]"));
    assert!(text.contains("All done."));
}

#[test]
fn test_resolve_lines_follow_cycle_reports() {
    for seed in ["0", "3", "11"] {
        let output = dlsim(&["--mode", "detection", "--seed", seed, "--color", "never"]);
        assert_eq!(output.status.code(), Some(0));

        let text = stdout(&output);
        let lines: Vec<&str> = text.lines().collect();
        for (i, line) in lines.iter().enumerate() {
            if line.starts_with("[resolve]") {
                let previous = i.checked_sub(1).and_then(|j| lines.get(j));
                assert!(
                    previous.is_some_and(|p| p.contains("Deadlock cycle found:")),
                    "seed {seed}: {line}"
                );
            }
        }
    }
}

#[test]
fn test_same_seed_same_output() {
    let args = ["--mode", "detection", "--seed", "11", "--n", "6", "--color", "never"];
    let first = dlsim(&args);
    let second = dlsim(&args);
    assert!(first.status.success());
    assert_eq!(stdout(&first), stdout(&second));
}

#[test]
fn test_json_report() {
    let output = dlsim(&["--json", "--mode", "detection", "--n", "3"]);
    assert!(output.status.success());

    let report: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("stdout is a JSON report");
    assert_eq!(report["mode"], "detection");
    assert_eq!(report["processes"].as_array().map(Vec::len), Some(3));
    assert_eq!(report["available"], report["total"]);
}

#[test]
fn test_malformed_resources_exit_one() {
    let output = dlsim(&["--resources", "3,x,2"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Error:"));
}

#[test]
fn test_zero_processes_exit_one() {
    let output = dlsim(&["--n", "0"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).is_empty());
}

#[test]
fn test_missing_config_file_exit_one() {
    let output = dlsim(&["--config", "/nonexistent/dlsim.toml"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_usage_error_exit_two() {
    let output = dlsim(&["--no-such-flag"]);
    assert_eq!(output.status.code(), Some(2));
}
