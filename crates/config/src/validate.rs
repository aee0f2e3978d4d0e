//! Validation entry point: misuse checks, structural pass, refinement pass.

use crate::normalize::normalize;
use crate::refine::refine;
use crate::schema::{LEGACY_CONFIG_KEYS, SiteConfig};
use crate::shape::shape_of;
use crate::violation::{ConfigError, ConfigMisuseError, ConfigValidationError};
use serde_json::Value;
use sitecfg_shared::Validated;
use std::path::{Path, PathBuf};

/// A site config that passed every structural and refinement check.
pub type ValidatedSiteConfig = Validated<SiteConfig>;

/// Base context for resolving relative filesystem-like options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationContext {
    root: PathBuf,
}

impl ValidationContext {
    /// Context rooted at `root` (must be absolute; checked at validation time).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Context rooted at the process working directory.
    pub fn from_current_dir() -> std::io::Result<Self> {
        std::env::current_dir().map(Self::new)
    }

    /// Base root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Validate and normalize a raw config.
///
/// Misuse (non-object input, relative base root, legacy option names) fails
/// fast. Otherwise every violation from both passes is collected and returned
/// together in one `ConfigValidationError`.
pub fn validate_config(
    raw: &Value,
    context: &ValidationContext,
) -> Result<ValidatedSiteConfig, ConfigError> {
    if !context.root.is_absolute() {
        return Err(ConfigMisuseError::RelativeRoot {
            root: context.root.to_string_lossy().into_owned(),
        }
        .into());
    }
    let Value::Object(object) = raw else {
        return Err(ConfigMisuseError::NotAnObject {
            received: shape_of(raw),
        }
        .into());
    };
    let legacy: Vec<String> = object
        .keys()
        .filter(|key| LEGACY_CONFIG_KEYS.contains(&key.as_str()))
        .cloned()
        .collect();
    if !legacy.is_empty() {
        return Err(ConfigMisuseError::LegacyKeys { keys: legacy }.into());
    }

    let mut normalized = normalize(object, &context.root);
    refine(&mut normalized);

    let violations = normalized.collector.into_violations();
    if violations.is_empty() {
        tracing::debug!(root = %context.root.display(), "configuration validated");
        Ok(Validated::new(normalized.config))
    } else {
        tracing::debug!(
            violations = violations.len(),
            "configuration rejected"
        );
        Err(ConfigValidationError::new(violations).into())
    }
}
