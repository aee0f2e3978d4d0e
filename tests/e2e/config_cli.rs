//! End-to-end runs of `sitecfg config` against the shared fixtures.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::{fs, io};

fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(Path::parent)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| manifest_dir.to_path_buf())
}

fn fixture_path(relative: &str) -> PathBuf {
    workspace_root()
        .join("crates")
        .join("config")
        .join("tests")
        .join("fixtures")
        .join(relative)
}

fn run_cli(args: &[&str]) -> io::Result<Output> {
    Command::new(env!("CARGO_BIN_EXE_sitecfg"))
        .args(args)
        .current_dir(workspace_root())
        .env("NO_COLOR", "1")
        .env_remove("SITECFG_LOG")
        .output()
}

fn path_arg(relative: &str) -> String {
    fixture_path(relative).to_string_lossy().to_string()
}

fn parse_stdout(output: &Output) -> io::Result<Value> {
    serde_json::from_slice(&output.stdout).map_err(io::Error::other)
}

#[test]
fn valid_json_and_toml_configs_pass() -> io::Result<()> {
    for fixture in ["site.valid.json", "site.valid.toml"] {
        let path = path_arg(fixture);
        let output = run_cli(&["--output", "json", "config", "check", "--path", &path])?;
        assert_eq!(output.status.code(), Some(0), "fixture {fixture}");

        let value = parse_stdout(&output)?;
        assert_eq!(value.get("status").and_then(Value::as_str), Some("ok"));
        assert_eq!(
            value.get("violations").and_then(Value::as_array).map(Vec::len),
            Some(0)
        );
    }
    Ok(())
}

#[test]
fn invalid_config_prints_report_and_exits_with_invalid_input() -> io::Result<()> {
    let path = path_arg("site.invalid.json");
    let output = run_cli(&["--no-progress", "config", "check", "--path", &path])?;
    assert_eq!(output.status.code(), Some(2));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    assert_eq!(
        lines.next(),
        Some("[config] Astro found issue(s) with your configuration:")
    );
    assert_eq!(lines.next(), Some("  ! site  Expected string, received number."));
    assert_eq!(lines.count(), 5);
    assert!(output.stderr.is_empty());
    Ok(())
}

#[test]
fn invalid_config_json_output_lists_violation_paths() -> io::Result<()> {
    let path = path_arg("site.invalid.json");
    let output = run_cli(&["--output", "json", "config", "check", "--path", &path])?;
    assert_eq!(output.status.code(), Some(2));

    let value = parse_stdout(&output)?;
    let paths: Vec<&str> = value
        .get("violations")
        .and_then(Value::as_array)
        .ok_or_else(|| io::Error::other("missing violations"))?
        .iter()
        .filter_map(|violation| violation.get("path").and_then(Value::as_str))
        .collect();
    assert_eq!(
        paths,
        vec![
            "site",
            "integrations.1",
            "build.format",
            "server.port",
            "outDir",
            "i18n.defaultLocale",
        ]
    );
    Ok(())
}

#[test]
fn show_reports_normalized_config() -> io::Result<()> {
    let path = path_arg("site.valid.json");
    let output = run_cli(&[
        "--output", "json", "config", "show", "--path", &path, "--port", "4000",
    ])?;
    assert_eq!(output.status.code(), Some(0));

    let value = parse_stdout(&output)?;
    let effective = value
        .get("effectiveConfig")
        .ok_or_else(|| io::Error::other("missing effectiveConfig"))?;
    assert_eq!(
        effective.get("base").and_then(Value::as_str),
        Some("/guides/")
    );
    assert_eq!(
        effective.pointer("/server/port").and_then(Value::as_u64),
        Some(4000)
    );
    let names: Vec<&str> = effective
        .get("integrations")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.get("name").and_then(Value::as_str))
                .collect()
        })
        .unwrap_or_default();
    assert_eq!(names, vec!["@astrojs/mdx", "@astrojs/sitemap"]);
    Ok(())
}

#[test]
fn missing_config_file_is_io_error() -> io::Result<()> {
    let path = path_arg("does-not-exist.json");
    let output = run_cli(&["config", "check", "--path", &path])?;
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stdout).contains("ERR_CONFIG_CONFIG_FILE_NOT_FOUND"));
    Ok(())
}

#[test]
fn unsupported_extension_is_invalid_input() -> io::Result<()> {
    let dir = std::env::temp_dir().join(format!("sitecfg-e2e-{}", std::process::id()));
    fs::create_dir_all(&dir)?;
    let path = dir.join("site.config.yaml");
    fs::write(&path, "site: https://example.com\n")?;

    let output = run_cli(&["config", "check", "--path", &path.to_string_lossy()])?;
    let _ = fs::remove_dir_all(&dir);

    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stdout).contains("ERR_CONFIG_UNSUPPORTED_FORMAT"));
    Ok(())
}

#[test]
fn non_numeric_port_flag_is_rejected() -> io::Result<()> {
    let output = run_cli(&["--output", "json", "config", "check", "--port", "abc"])?;
    assert_eq!(output.status.code(), Some(2));

    let value = parse_stdout(&output)?;
    assert_eq!(
        value.pointer("/error/code").and_then(Value::as_str),
        Some("ERR_CONFIG_INVALID_FLAG")
    );
    assert_eq!(
        value.pointer("/error/kind").and_then(Value::as_str),
        Some("misuse")
    );
    Ok(())
}

#[test]
fn non_object_config_is_rejected_even_with_overrides() -> io::Result<()> {
    let path = path_arg("site.scalar.json");
    let output = run_cli(&[
        "--output", "json", "config", "check", "--path", &path, "--port", "3000",
    ])?;
    assert_eq!(output.status.code(), Some(2));

    let value = parse_stdout(&output)?;
    assert_eq!(
        value.pointer("/error/code").and_then(Value::as_str),
        Some("ERR_CONFIG_NOT_AN_OBJECT")
    );
    assert_eq!(
        value.pointer("/error/kind").and_then(Value::as_str),
        Some("misuse")
    );
    Ok(())
}

#[test]
fn schema_command_exports_json_schema() -> io::Result<()> {
    let output = run_cli(&["config", "schema"])?;
    assert_eq!(output.status.code(), Some(0));

    let value = parse_stdout(&output)?;
    assert!(value.pointer("/properties/site").is_some());
    assert!(value.pointer("/properties/i18n").is_some());
    Ok(())
}
