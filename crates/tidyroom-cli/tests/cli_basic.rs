//! Basic CLI smoke tests.
//!
//! These only exercise argument parsing; commands that touch the data
//! directory are covered by the core integration tests.

use std::process::Command;

fn run_cli(args: &[&str]) -> (String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "tidyroom-cli", "--quiet", "--"])
        .args(args)
        .output()
        .expect("failed to execute CLI command");

    let combined = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    (combined, output.status.code().unwrap_or(-1))
}

#[test]
fn help_lists_every_command_group() {
    let (output, code) = run_cli(&["--help"]);
    assert_eq!(code, 0);
    for group in ["area", "session", "verify", "points", "stats", "config"] {
        assert!(output.contains(group), "missing '{group}' in help output");
    }
}

#[test]
fn session_start_requires_an_area_argument() {
    let (_, code) = run_cli(&["session", "start"]);
    assert_ne!(code, 0);
}

#[test]
fn unknown_subcommand_is_rejected() {
    let (_, code) = run_cli(&["totally-unknown"]);
    assert_ne!(code, 0);
}
