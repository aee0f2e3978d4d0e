//! # sitecfg-config
//!
//! Site configuration validation and normalization.
//!
//! A raw, user-authored value goes through a structural pass (shape checks,
//! defaults, integration flattening, path resolution) and a refinement pass
//! (cross-field rules). Either a complete `SiteConfig` comes out, or a
//! `ConfigValidationError` carrying every violation found, which renders as a
//! terminal report. This crate depends on `shared` only.

/// Directory resolution and containment.
pub mod dirs;
/// Diagnostic report rendering.
pub mod format;
mod i18n;
/// Integration list flattening and deduplication.
pub mod integrations;
/// Raw config loading helpers (file + inline overrides).
pub mod load;
mod normalize;
/// Violation paths.
pub mod path;
/// Violation collector and typed readers.
pub mod reader;
mod refine;
/// Configuration schema types and helpers.
pub mod schema;
/// Value shapes and message templates.
pub mod shape;
/// Validation entry point.
pub mod validate;
/// Violations and error kinds.
pub mod violation;

pub use format::{REPORT_HEADER, format_config_error, strip_ansi};
pub use load::{
    InlineFlags, InlineOverrides, load_raw_config_from_path, merge_raw_config,
    parse_raw_config_json, parse_raw_config_toml, to_pretty_json,
};
pub use normalize::{TOP_LEVEL_KEYS, normalize_base};
pub use path::{ConfigPath, PathSegment};
pub use schema::{
    BuildConfig, BuildFormat, ConfigEnum, I18nConfig, I18nRouting, IntegrationEntry, LocaleEntry,
    LocaleGroup, OutputMode, RoutingStrategy, SiteConfig, TrailingSlash, site_config_schema,
};
pub use validate::{ValidatedSiteConfig, ValidationContext, validate_config};
pub use violation::{
    ConfigError, ConfigMisuseError, ConfigValidationError, Violation, is_config_validation_error,
    validation_failed_code,
};

/// Returns the config crate version.
#[must_use]
pub const fn config_crate_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecfg_shared::shared_crate_version;

    #[test]
    fn crate_versions_match_workspace() {
        assert_eq!(config_crate_version(), shared_crate_version());
    }
}
