//! CLI integration tests.

use std::process::Command;

fn run_cli(args: &[&str]) -> std::io::Result<std::process::Output> {
    Command::new(env!("CARGO_BIN_EXE_sitecfg"))
        .args(args)
        .env("NO_COLOR", "1")
        .output()
}

#[test]
fn help_lists_config_commands() -> std::io::Result<()> {
    let output = run_cli(&["config", "--help"])?;
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["check", "show", "schema"] {
        assert!(stdout.contains(command), "help should mention {command}");
    }
    Ok(())
}

#[test]
fn unknown_subcommand_is_usage_error() -> std::io::Result<()> {
    let output = run_cli(&["config", "lint"])?;
    assert_eq!(output.status.code(), Some(2));
    assert!(output.stdout.is_empty());
    Ok(())
}

#[test]
fn check_without_path_validates_defaults() -> std::io::Result<()> {
    let dir = std::env::temp_dir();
    let output = Command::new(env!("CARGO_BIN_EXE_sitecfg"))
        .args(["--no-progress", "config", "check"])
        .current_dir(&dir)
        .output()?;
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "status: ok\nconfig: ok\n"
    );
    Ok(())
}

#[test]
fn logs_go_to_stderr() -> std::io::Result<()> {
    let output = Command::new(env!("CARGO_BIN_EXE_sitecfg"))
        .args(["--no-progress", "config", "check"])
        .current_dir(std::env::temp_dir())
        .env("SITECFG_LOG", "debug")
        .output()?;
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "status: ok\nconfig: ok\n"
    );
    assert!(String::from_utf8_lossy(&output.stderr).contains("loading config"));
    Ok(())
}
