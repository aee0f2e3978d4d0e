//! Diagnostic report rendering for collected violations.
//!
//! The plain report is the canonical form; the styled variant only wraps the
//! same text in ANSI sequences for interactive terminals.

use crate::violation::ConfigValidationError;
use std::fmt::Write as _;

/// First line of every report.
pub const REPORT_HEADER: &str = "[config] Astro found issue(s) with your configuration:";

const BOLD: &str = "\u{1b}[1m";
const RED: &str = "\u{1b}[31m";
const YELLOW: &str = "\u{1b}[33m";
const RESET: &str = "\u{1b}[0m";

#[derive(Clone, Copy)]
struct Palette {
    header: (&'static str, &'static str),
    marker: (&'static str, &'static str),
    path: (&'static str, &'static str),
}

const PLAIN: Palette = Palette {
    header: ("", ""),
    marker: ("", ""),
    path: ("", ""),
};

const STYLED: Palette = Palette {
    header: (RED, RESET),
    marker: (YELLOW, RESET),
    path: (BOLD, RESET),
};

fn render(error: &ConfigValidationError, palette: Palette) -> String {
    let mut report = String::new();
    let (open, close) = palette.header;
    let _ = write!(report, "{open}{REPORT_HEADER}{close}");
    for violation in error {
        let (marker_open, marker_close) = palette.marker;
        let (path_open, path_close) = palette.path;
        let _ = write!(
            report,
            "\n  {marker_open}!{marker_close} {path_open}{}{path_close}  {}",
            violation.path, violation.message
        );
    }
    report
}

/// Render the plain-text report: a header line, then `  ! <path>  <message>`
/// per violation in carrier order.
#[must_use]
pub fn format_config_error(error: &ConfigValidationError) -> String {
    render(error, PLAIN)
}

impl ConfigValidationError {
    /// Report with ANSI styling for terminals.
    #[must_use]
    pub fn render_styled(&self) -> String {
        render(self, STYLED)
    }
}

/// Remove ANSI CSI sequences (`ESC [ ... letter`).
#[must_use]
pub fn strip_ansi(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(ch) = chars.next() {
        if ch != '\u{1b}' {
            plain.push(ch);
            continue;
        }
        if chars.next() == Some('[') {
            for code in chars.by_ref() {
                if code.is_ascii_alphabetic() {
                    break;
                }
            }
        }
    }
    plain
}
