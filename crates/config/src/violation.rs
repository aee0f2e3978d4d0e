//! Violations, the error carrier that transports them, and the misuse error kind.

use crate::format::format_config_error;
use crate::path::ConfigPath;
use serde::Serialize;
use sitecfg_shared::{ErrorCode, ErrorEnvelope};
use std::fmt;

/// A single configuration problem keyed to the path that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    /// Path from the config root to the offending field.
    pub path: ConfigPath,
    /// Human-readable message.
    pub message: String,
}

impl Violation {
    /// Create a violation.
    pub fn new(path: ConfigPath, message: impl Into<String>) -> Self {
        Self {
            path,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.path, self.message)
    }
}

/// Every violation found by one validation call, in discovery order.
///
/// Structural violations come first (field declaration order), followed by
/// refinement violations (rule declaration order). The carrier is built once
/// and never mutated after it is handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigValidationError {
    violations: Vec<Violation>,
}

impl ConfigValidationError {
    pub(crate) const fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// Ordered violations.
    #[must_use]
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// First violation in discovery order.
    #[must_use]
    pub fn first(&self) -> Option<&Violation> {
        self.violations.first()
    }

    /// Number of violations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    /// Always false for carriers returned by validation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Iterate violations in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Violation> {
        self.violations.iter()
    }

    /// Plain-text diagnostic report.
    #[must_use]
    pub fn render(&self) -> String {
        format_config_error(self)
    }
}

impl<'a> IntoIterator for &'a ConfigValidationError {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.render())
    }
}

impl std::error::Error for ConfigValidationError {}

/// Code carried by envelopes built from a `ConfigValidationError`.
pub fn validation_failed_code() -> ErrorCode {
    ErrorCode::new("config", "validation_failed")
}

/// Returns true when the envelope reports collected config violations.
#[must_use]
pub fn is_config_validation_error(error: &ErrorEnvelope) -> bool {
    error.has_code(&validation_failed_code())
}

impl From<ConfigValidationError> for ErrorEnvelope {
    fn from(error: ConfigValidationError) -> Self {
        let mut envelope = Self::expected(validation_failed_code(), error.render())
            .with_metadata("violations", error.len().to_string());
        if let Some(first) = error.first() {
            envelope = envelope.with_metadata("path", first.path.to_string());
        }
        envelope
    }
}

/// Invalid arguments to the configuration entry points themselves.
///
/// These fail fast and are never merged with collected violations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigMisuseError {
    /// The raw config root is not a mapping.
    #[error("the configuration must be an object, received {received}")]
    NotAnObject {
        /// Shape that was supplied instead.
        received: &'static str,
    },
    /// The base context root is not an absolute path.
    #[error("the validation root must be an absolute path, received `{root}`")]
    RelativeRoot {
        /// Root that was supplied.
        root: String,
    },
    /// Removed option names were used.
    #[error(
        "Legacy configuration detected: `{}`. Please update your configuration to the new format!",
        .keys.join(", ")
    )]
    LegacyKeys {
        /// Offending keys, in config order.
        keys: Vec<String>,
    },
    /// An inline override flag could not be converted.
    #[error("invalid value `{value}` for flag `--{flag}`: expected {expected}")]
    InvalidFlag {
        /// Flag name without dashes.
        flag: &'static str,
        /// Raw value.
        value: String,
        /// Expected shape.
        expected: &'static str,
    },
}

impl ConfigMisuseError {
    fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotAnObject { .. } => ErrorCode::new("config", "not_an_object"),
            Self::RelativeRoot { .. } => ErrorCode::new("config", "relative_root"),
            Self::LegacyKeys { .. } => ErrorCode::new("config", "legacy_keys"),
            Self::InvalidFlag { .. } => ErrorCode::new("config", "invalid_flag"),
        }
    }
}

impl From<ConfigMisuseError> for ErrorEnvelope {
    fn from(error: ConfigMisuseError) -> Self {
        let envelope = Self::misuse(error.error_code(), error.to_string());
        match error {
            ConfigMisuseError::NotAnObject { received } => {
                envelope.with_metadata("received", received)
            },
            ConfigMisuseError::RelativeRoot { root } => envelope.with_metadata("root", root),
            ConfigMisuseError::LegacyKeys { keys } => envelope.with_metadata("keys", keys.join(",")),
            ConfigMisuseError::InvalidFlag { flag, value, .. } => envelope
                .with_metadata("flag", flag)
                .with_metadata("value", value),
        }
    }
}

/// Failure of a validation call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// One or more violations were collected.
    Validation(ConfigValidationError),
    /// The entry point was called with unusable arguments.
    Misuse(ConfigMisuseError),
}

impl ConfigError {
    /// Returns true when the failure carries collected violations.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Borrow the carrier when this is a validation failure.
    #[must_use]
    pub const fn as_validation(&self) -> Option<&ConfigValidationError> {
        match self {
            Self::Validation(error) => Some(error),
            Self::Misuse(_) => None,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(error) => fmt::Display::fmt(error, formatter),
            Self::Misuse(error) => fmt::Display::fmt(error, formatter),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Validation(error) => Some(error),
            Self::Misuse(error) => Some(error),
        }
    }
}

impl From<ConfigValidationError> for ConfigError {
    fn from(error: ConfigValidationError) -> Self {
        Self::Validation(error)
    }
}

impl From<ConfigMisuseError> for ConfigError {
    fn from(error: ConfigMisuseError) -> Self {
        Self::Misuse(error)
    }
}

impl From<ConfigError> for ErrorEnvelope {
    fn from(error: ConfigError) -> Self {
        match error {
            ConfigError::Validation(error) => error.into(),
            ConfigError::Misuse(error) => error.into(),
        }
    }
}
