//! Output format helpers for CLI commands.

use clap::{Args, ValueEnum};

/// Output format choices for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-friendly text output.
    Text,
    /// Machine-friendly JSON output.
    Json,
}

/// Color choices for the diagnostic report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Style when stdout is a terminal and `NO_COLOR` is unset.
    Auto,
    /// Always style.
    Always,
    /// Never style.
    Never,
}

/// Output-related CLI flags.
#[derive(Debug, Args)]
pub struct OutputArgs {
    /// Output format for command responses.
    #[arg(long, global = true, value_enum)]
    pub output: Option<OutputFormat>,
    /// Styling of the diagnostic report in text mode.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,
    /// Suppress progress/logging output.
    #[arg(long, global = true)]
    pub no_progress: bool,
}

/// Output mode derived from CLI flags.
#[derive(Debug, Clone, Copy)]
pub struct OutputMode {
    pub format: OutputFormat,
    pub no_progress: bool,
    pub styled: bool,
}

impl OutputMode {
    /// Build output mode from CLI flags; `terminal` reports whether stdout is a tty.
    #[must_use]
    pub const fn from_args(args: &OutputArgs, terminal: bool) -> Self {
        let format = match args.output {
            Some(value) => value,
            None => OutputFormat::Text,
        };
        let styled = matches!(format, OutputFormat::Text)
            && match args.color {
                ColorChoice::Always => true,
                ColorChoice::Never => false,
                ColorChoice::Auto => terminal,
            };

        Self {
            format,
            no_progress: args.no_progress,
            styled,
        }
    }

    /// Returns true when JSON output is requested.
    #[must_use]
    pub const fn is_json(self) -> bool {
        matches!(self.format, OutputFormat::Json)
    }
}
