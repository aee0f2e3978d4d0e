//! CLI binary entrypoint.

mod error;
mod format;

use clap::{Args, Parser, Subcommand};
use error::{CliError, ExitCode};
use format::{OutputArgs, OutputMode};
use serde_json::{Map, Value};
use sitecfg_config::{
    ConfigError, ConfigValidationError, InlineFlags, InlineOverrides, ValidatedSiteConfig,
    ValidationContext, load_raw_config_from_path, site_config_schema, to_pretty_json,
    validate_config,
};
use sitecfg_shared::ErrorEnvelope;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter directives.
const LOG_FILTER_ENV: &str = "SITECFG_LOG";

#[derive(Debug, Parser)]
#[command(
    name = "sitecfg",
    version,
    about = "Site configuration validator",
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    output: OutputArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Config-related commands.
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigCommands {
    /// Validate a config file and report every violation.
    Check {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Show the normalized config after applying overrides.
    Show {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Print the JSON Schema of the normalized config.
    Schema,
}

/// Config source plus inline overrides.
#[derive(Debug, Default, Args)]
struct SourceArgs {
    /// Optional config file path (JSON/TOML).
    #[arg(long)]
    path: Option<PathBuf>,
    /// Project root override.
    #[arg(long)]
    root: Option<String>,
    /// Deployed site URL override.
    #[arg(long)]
    site: Option<String>,
    /// Base path override.
    #[arg(long)]
    base: Option<String>,
    /// Dev server port override.
    #[arg(long)]
    port: Option<String>,
    /// Dev server host override (`true`, `false`, or an address).
    #[arg(long)]
    host: Option<String>,
    /// Output directory override.
    #[arg(long)]
    out_dir: Option<String>,
    /// Public directory override.
    #[arg(long)]
    public_dir: Option<String>,
}

impl SourceArgs {
    fn flags(&self) -> InlineFlags {
        InlineFlags {
            root: self.root.clone(),
            site: self.site.clone(),
            base: self.base.clone(),
            port: self.port.clone(),
            host: self.host.clone(),
            out_dir: self.out_dir.clone(),
            public_dir: self.public_dir.clone(),
        }
    }
}

pub(crate) struct CliOutput {
    stdout: String,
    stderr: String,
    exit_code: ExitCode,
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_tracing();
    let terminal = io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none();
    let mode = OutputMode::from_args(&cli.output, terminal);

    match run(&cli.command, mode) {
        Ok(output) => match write_output(&output) {
            Ok(()) => std::process::ExitCode::from(output.exit_code.as_u8()),
            Err(error) => exit_with_error(&error),
        },
        Err(error) => exit_with_error(&error),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    // Logs go to stderr so they never interleave with the report on stdout.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn exit_with_error(error: &CliError) -> std::process::ExitCode {
    let _ = writeln!(io::stderr(), "error: {error}");
    std::process::ExitCode::from(error.exit_code().as_u8())
}

fn run(command: &Commands, mode: OutputMode) -> Result<CliOutput, CliError> {
    match command {
        Commands::Config { command } => match command {
            ConfigCommands::Check { source } => {
                let context = ValidationContext::from_current_dir()?;
                config_check(mode, &context, source)
            },
            ConfigCommands::Show { source } => {
                let context = ValidationContext::from_current_dir()?;
                config_show(mode, &context, source)
            },
            ConfigCommands::Schema => config_schema(mode),
        },
    }
}

fn config_check(
    mode: OutputMode,
    context: &ValidationContext,
    source: &SourceArgs,
) -> Result<CliOutput, CliError> {
    if let Err(output) = load_and_validate(mode, context, source) {
        return Ok(output);
    }

    let mut stderr = String::new();
    log_info(&mut stderr, "config check completed", mode.no_progress);

    let stdout = if mode.is_json() {
        let payload = serde_json::json!({
            "status": "ok",
            "configPath": source.path.as_deref().map(display_path),
            "violations": [],
        });
        pretty_json(&payload)?
    } else {
        source.path.as_deref().map_or_else(
            || "status: ok\nconfig: ok\n".to_string(),
            |path| format!("status: ok\nconfig: ok\npath: {}\n", display_path(path)),
        )
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn config_show(
    mode: OutputMode,
    context: &ValidationContext,
    source: &SourceArgs,
) -> Result<CliOutput, CliError> {
    let config = match load_and_validate(mode, context, source) {
        Ok(config) => config,
        Err(output) => return Ok(output),
    };

    let mut stderr = String::new();
    log_info(&mut stderr, "config show completed", mode.no_progress);

    let stdout = if mode.is_json() {
        let payload = serde_json::json!({
            "status": "ok",
            "configPath": source.path.as_deref().map(display_path),
            "effectiveConfig": serde_json::to_value(config.as_ref())?,
        });
        pretty_json(&payload)?
    } else {
        let config_json = match to_pretty_json(config.as_ref()) {
            Ok(json) => json,
            Err(error) => return Ok(format_error_output(mode, &error, ExitCode::Internal)),
        };
        let mut out = String::new();
        out.push_str("status: ok\nconfig:\n");
        out.push_str(&config_json);
        out
    };

    Ok(CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

fn config_schema(mode: OutputMode) -> Result<CliOutput, CliError> {
    let mut stderr = String::new();
    log_info(&mut stderr, "config schema exported", mode.no_progress);

    Ok(CliOutput {
        stdout: pretty_json(&site_config_schema())?,
        stderr,
        exit_code: ExitCode::Ok,
    })
}

/// Load the raw config, apply overrides, and validate.
///
/// Every failure is already rendered for the selected output mode.
fn load_and_validate(
    mode: OutputMode,
    context: &ValidationContext,
    source: &SourceArgs,
) -> Result<ValidatedSiteConfig, CliOutput> {
    tracing::debug!(path = ?source.path, root = %context.root().display(), "loading config");
    let raw = match source.path.as_deref() {
        Some(path) => load_raw_config_from_path(path)
            .map_err(|error| format_error_output(mode, &error, ExitCode::for_envelope(&error)))?,
        None => Value::Object(Map::new()),
    };
    let overrides = InlineOverrides::from_flags(&source.flags()).map_err(|error| {
        format_error_output(mode, &ErrorEnvelope::from(error), ExitCode::InvalidInput)
    })?;
    let raw = overrides.apply(raw);

    validate_config(&raw, context).map_err(|error| match error {
        ConfigError::Validation(carrier) => format_violations_output(mode, &carrier),
        ConfigError::Misuse(error) => {
            format_error_output(mode, &ErrorEnvelope::from(error), ExitCode::InvalidInput)
        },
    })
}

fn format_violations_output(mode: OutputMode, error: &ConfigValidationError) -> CliOutput {
    let mut stderr = String::new();
    log_info(
        &mut stderr,
        &format!("config check failed with {} violation(s)", error.len()),
        mode.no_progress,
    );

    let stdout = if mode.is_json() {
        let envelope = ErrorEnvelope::from(error.clone());
        let violations: Vec<Value> = error
            .iter()
            .map(|violation| {
                serde_json::json!({
                    "path": violation.path.to_string(),
                    "message": violation.message,
                })
            })
            .collect();
        let payload = serde_json::json!({
            "status": "error",
            "error": error_payload(&envelope),
            "violations": violations,
        });
        pretty_json(&payload).unwrap_or_else(|_| internal_error_json())
    } else if mode.styled {
        format!("{}\n", error.render_styled())
    } else {
        format!("{}\n", error.render())
    };

    CliOutput {
        stdout,
        stderr,
        exit_code: ExitCode::InvalidInput,
    }
}

pub(crate) fn format_error_output(
    mode: OutputMode,
    error: &ErrorEnvelope,
    exit_code: ExitCode,
) -> CliOutput {
    let mut stderr = String::new();
    log_info(&mut stderr, "command failed", mode.no_progress);

    let stdout = if mode.is_json() {
        let payload = serde_json::json!({
            "status": "error",
            "error": error_payload(error),
        });
        pretty_json(&payload).unwrap_or_else(|_| internal_error_json())
    } else {
        format_error_text(error)
    };

    CliOutput {
        stdout,
        stderr,
        exit_code,
    }
}

fn error_payload(error: &ErrorEnvelope) -> Value {
    serde_json::json!({
        "code": error.code.to_screaming_id(),
        "kind": error.kind.to_string(),
        "message": error.message,
        "meta": error.metadata,
    })
}

// This is a CLI boundary, so JSON serialization errors are internal.
fn internal_error_json() -> String {
    "{\"status\":\"error\",\"error\":{\"code\":\"ERR_CORE_INTERNAL\",\"message\":\"internal error\",\"kind\":\"unexpected\"}}\n".to_string()
}

fn format_error_text(error: &ErrorEnvelope) -> String {
    let mut out = String::new();
    out.push_str("status: error\n");
    out.push_str("code: ");
    out.push_str(&error.code.to_screaming_id());
    out.push('\n');
    out.push_str("message: ");
    out.push_str(&error.message);
    out.push('\n');
    out.push_str("kind: ");
    out.push_str(&error.kind.to_string());
    out.push('\n');

    if !error.metadata.is_empty() {
        out.push_str("meta:\n");
        for (key, value) in &error.metadata {
            out.push_str("  ");
            out.push_str(key);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
    }

    out
}

fn pretty_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    let mut output = serde_json::to_string_pretty(value)?;
    output.push('\n');
    Ok(output)
}

fn display_path(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

fn log_info(stderr: &mut String, message: &str, no_progress: bool) {
    if no_progress {
        return;
    }
    stderr.push_str("info: ");
    stderr.push_str(message);
    stderr.push('\n');
}

fn write_output(output: &CliOutput) -> Result<(), CliError> {
    let mut stdout = io::stdout();
    stdout.write_all(output.stdout.as_bytes())?;

    if !output.stderr.is_empty() {
        let mut stderr = io::stderr();
        stderr.write_all(output.stderr.as_bytes())?;
        stderr.flush()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::{ColorChoice, OutputFormat};
    use clap::CommandFactory;
    use sitecfg_config::ConfigMisuseError;

    fn workspace_root() -> PathBuf {
        let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
        manifest_dir
            .parent()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| manifest_dir.to_path_buf())
    }

    fn fixture_path(name: &str) -> PathBuf {
        workspace_root()
            .join("crates")
            .join("config")
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    fn mode(output: Option<OutputFormat>, color: ColorChoice) -> OutputMode {
        OutputMode::from_args(
            &OutputArgs {
                output,
                color,
                no_progress: true,
            },
            false,
        )
    }

    fn context() -> ValidationContext {
        ValidationContext::new("/work/site")
    }

    fn source(name: &str) -> SourceArgs {
        SourceArgs {
            path: Some(fixture_path(name)),
            ..SourceArgs::default()
        }
    }

    #[test]
    fn version_flag_is_supported() {
        let result = Cli::command().try_get_matches_from(["cli", "--version"]);
        let is_version = matches!(
            result,
            Err(error) if error.kind() == clap::error::ErrorKind::DisplayVersion
        );

        assert!(is_version, "expected clap to render version");
    }

    #[test]
    fn cli_parses_override_flags() -> Result<(), Box<dyn std::error::Error>> {
        let cli = Cli::try_parse_from([
            "cli",
            "--output",
            "json",
            "config",
            "check",
            "--path",
            "/tmp/site/astro.config.json",
            "--port",
            "8080",
            "--out-dir",
            "./build",
        ])?;
        assert_eq!(cli.output.output, Some(OutputFormat::Json));
        match cli.command {
            Commands::Config {
                command: ConfigCommands::Check { source },
            } => {
                assert_eq!(source.path, Some(PathBuf::from("/tmp/site/astro.config.json")));
                let flags = source.flags();
                assert_eq!(flags.port.as_deref(), Some("8080"));
                assert_eq!(flags.out_dir.as_deref(), Some("./build"));
            },
            _ => return Err("expected config check command".into()),
        }
        Ok(())
    }

    #[test]
    fn json_flag_is_not_accepted() {
        let result = Cli::try_parse_from(["cli", "--json", "config", "schema"]);
        assert!(result.is_err());
    }

    #[test]
    fn styling_follows_color_choice() {
        assert!(!mode(None, ColorChoice::Auto).styled);
        assert!(mode(None, ColorChoice::Always).styled);
        assert!(!mode(Some(OutputFormat::Json), ColorChoice::Always).styled);
    }

    #[test]
    fn config_check_accepts_valid_fixture() -> Result<(), Box<dyn std::error::Error>> {
        let output = config_check(mode(None, ColorChoice::Never), &context(), &source("site.valid.json"))?;
        assert_eq!(output.exit_code, ExitCode::Ok);
        assert!(output.stdout.starts_with("status: ok\nconfig: ok\n"));
        assert!(output.stderr.is_empty());
        Ok(())
    }

    #[test]
    fn config_check_prints_full_report() -> Result<(), Box<dyn std::error::Error>> {
        let output = config_check(mode(None, ColorChoice::Never), &context(), &source("site.invalid.json"))?;
        assert_eq!(output.exit_code, ExitCode::InvalidInput);

        let lines: Vec<&str> = output.stdout.lines().collect();
        assert_eq!(
            lines.first().copied(),
            Some("[config] Astro found issue(s) with your configuration:")
        );
        assert_eq!(lines.len(), 7);
        assert!(lines.iter().skip(1).all(|line| line.starts_with("  ! ")));
        assert!(!output.stdout.contains('\u{1b}'));
        Ok(())
    }

    #[test]
    fn config_check_json_lists_violations() -> Result<(), Box<dyn std::error::Error>> {
        let output = config_check(
            mode(Some(OutputFormat::Json), ColorChoice::Auto),
            &context(),
            &source("site.invalid.json"),
        )?;
        let value: Value = serde_json::from_str(output.stdout.trim())?;
        assert_eq!(value.get("status").and_then(Value::as_str), Some("error"));

        let first = value
            .get("violations")
            .and_then(|violations| violations.get(0))
            .ok_or_else(|| io::Error::other("missing violations"))?;
        assert_eq!(first.get("path").and_then(Value::as_str), Some("site"));
        assert_eq!(
            first.get("message").and_then(Value::as_str),
            Some("Expected string, received number.")
        );
        assert_eq!(
            value
                .get("error")
                .and_then(|error| error.get("code"))
                .and_then(Value::as_str),
            Some("ERR_CONFIG_VALIDATION_FAILED")
        );
        Ok(())
    }

    #[test]
    fn missing_file_is_an_io_failure() -> Result<(), Box<dyn std::error::Error>> {
        let output = config_check(mode(None, ColorChoice::Never), &context(), &source("missing.json"))?;
        assert_eq!(output.exit_code, ExitCode::Io);
        assert!(output.stdout.contains("status: error"));
        assert!(output.stdout.contains("ERR_CONFIG_CONFIG_FILE_NOT_FOUND"));
        Ok(())
    }

    #[test]
    fn non_numeric_port_is_invalid_input() -> Result<(), Box<dyn std::error::Error>> {
        let args = SourceArgs {
            port: Some("eighty".to_owned()),
            ..SourceArgs::default()
        };
        let output = config_check(mode(None, ColorChoice::Never), &context(), &args)?;
        assert_eq!(output.exit_code, ExitCode::InvalidInput);
        assert!(output.stdout.contains("ERR_CONFIG_INVALID_FLAG"));
        Ok(())
    }

    #[test]
    fn config_show_applies_overrides() -> Result<(), Box<dyn std::error::Error>> {
        let args = SourceArgs {
            port: Some("8080".to_owned()),
            out_dir: Some("./build".to_owned()),
            ..source("site.valid.json")
        };
        let output = config_show(
            mode(Some(OutputFormat::Json), ColorChoice::Never),
            &context(),
            &args,
        )?;
        let value: Value = serde_json::from_str(output.stdout.trim())?;
        let effective = value
            .get("effectiveConfig")
            .ok_or_else(|| io::Error::other("missing effectiveConfig"))?;
        assert_eq!(
            effective.pointer("/server/port").and_then(Value::as_u64),
            Some(8080)
        );
        assert_eq!(
            effective.get("outDir").and_then(Value::as_str),
            Some("/work/site/build")
        );
        Ok(())
    }

    #[test]
    fn schema_export_is_json() -> Result<(), Box<dyn std::error::Error>> {
        let output = config_schema(mode(None, ColorChoice::Never))?;
        let value: Value = serde_json::from_str(output.stdout.trim())?;
        assert!(value.pointer("/properties/integrations").is_some());
        Ok(())
    }

    #[test]
    fn exit_codes_for_errors() {
        let io_error = CliError::Io(io::Error::other("io"));
        assert_eq!(io_error.exit_code(), ExitCode::Io);
        assert_eq!(
            ExitCode::for_envelope(&ErrorEnvelope::from(ConfigMisuseError::LegacyKeys {
                keys: vec!["dist".to_owned()],
            })),
            ExitCode::InvalidInput
        );
    }

    #[test]
    fn log_info_respects_no_progress() {
        let mut stderr = String::new();
        log_info(&mut stderr, "message", true);
        assert!(stderr.is_empty());
    }
}
