//! Integration tests for loading and validating config fixtures.

use serde_json::Value;
use sitecfg_config::schema::{HostSetting, PrefetchConfig, PrefetchOptions, PrefetchStrategy};
use sitecfg_config::{
    BuildFormat, ConfigError, OutputMode, RoutingStrategy, TrailingSlash, ValidationContext,
    is_config_validation_error, load_raw_config_from_path, parse_raw_config_json, validate_config,
};
use sitecfg_shared::{ErrorCode, ErrorEnvelope};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> Result<Value, Box<dyn Error>> {
    let contents = fs::read_to_string(fixture_path(name))?;
    Ok(parse_raw_config_json(&contents)?)
}

fn context() -> ValidationContext {
    ValidationContext::new("/work/site")
}

#[test]
fn valid_fixture_normalizes() -> Result<(), Box<dyn Error>> {
    let raw = read_fixture("site.valid.json")?;
    let config = validate_config(&raw, &context())?;

    assert_eq!(config.site.as_deref(), Some("https://docs.example.com"));
    assert_eq!(config.base, "/guides/");
    assert_eq!(config.trailing_slash, TrailingSlash::Always);
    assert_eq!(config.output, OutputMode::Hybrid);
    assert_eq!(config.out_dir, PathBuf::from("/work/site/build"));
    assert_eq!(config.build.client, PathBuf::from("/work/site/build/client"));
    assert_eq!(config.build.format, BuildFormat::File);
    assert_eq!(config.server.port, 3000);
    assert_eq!(
        config.server.host,
        HostSetting::Address("0.0.0.0".to_owned())
    );
    assert_eq!(config.redirects.len(), 2);
    assert_eq!(config.image.remote_patterns.len(), 1);
    assert!(!config.markdown.smartypants);
    assert_eq!(
        config.prefetch,
        Some(PrefetchConfig::Options(PrefetchOptions {
            prefetch_all: Some(true),
            default_strategy: Some(PrefetchStrategy::Viewport),
        }))
    );

    let names: Vec<&str> = config
        .integrations
        .iter()
        .map(|entry| entry.name.as_str())
        .collect();
    assert_eq!(names, vec!["@astrojs/mdx", "@astrojs/sitemap"]);
    Ok(())
}

#[test]
fn toml_fixture_matches_json_fixture() -> Result<(), Box<dyn Error>> {
    let from_json = load_raw_config_from_path(&fixture_path("site.valid.json"))?;
    let from_toml = load_raw_config_from_path(&fixture_path("site.valid.toml"))?;

    let json_config = validate_config(&from_json, &context())?;
    let toml_config = validate_config(&from_toml, &context())?;
    assert_eq!(json_config.as_ref(), toml_config.as_ref());
    Ok(())
}

#[test]
fn invalid_fixture_reports_every_violation_in_order() -> Result<(), Box<dyn Error>> {
    let raw = read_fixture("site.invalid.json")?;
    let error = validate_config(&raw, &context())
        .err()
        .ok_or("fixture should be rejected")?;
    let carrier = error.as_validation().ok_or("expected collected violations")?;

    let found: Vec<(String, &str)> = carrier
        .iter()
        .map(|violation| (violation.path.to_string(), violation.message.as_str()))
        .collect();
    assert_eq!(
        found,
        vec![
            ("site".to_owned(), "Expected string, received number."),
            ("integrations.1".to_owned(), "Expected object, received number."),
            (
                "build.format".to_owned(),
                "Invalid enum value. Expected 'file' | 'directory' | 'preserve', received 'invalid'"
            ),
            (
                "server.port".to_owned(),
                "Number must be less than or equal to 65535"
            ),
            (
                "outDir".to_owned(),
                "The value of `outDir` must not point to a path within the folder set as `publicDir`, this will cause an infinite loop"
            ),
            (
                "i18n.defaultLocale".to_owned(),
                "The default locale `en` is not present in the `i18n.locales` array."
            ),
        ]
    );
    Ok(())
}

#[test]
fn invalid_fixture_maps_to_validation_envelope() -> Result<(), Box<dyn Error>> {
    let raw = read_fixture("site.invalid.json")?;
    let error: ConfigError = validate_config(&raw, &context())
        .err()
        .ok_or("fixture should be rejected")?;
    let envelope = ErrorEnvelope::from(error);

    assert!(is_config_validation_error(&envelope));
    assert_eq!(envelope.metadata.get("violations").map(String::as_str), Some("6"));
    assert!(envelope.message.starts_with("[config] Astro found issue(s)"));
    Ok(())
}

#[test]
fn domains_fixture_is_accepted() -> Result<(), Box<dyn Error>> {
    let raw = read_fixture("i18n.domains.json")?;
    let config = validate_config(&raw, &context())?;

    let i18n = config.i18n.as_ref().ok_or("i18n should be kept")?;
    assert_eq!(i18n.routing.strategy, RoutingStrategy::Domains);
    assert_eq!(i18n.locale_codes(), vec!["en", "fr", "es", "es-AR"]);
    assert!(config.has_domains());
    Ok(())
}

#[test]
fn missing_fixture_reports_not_found() {
    let error = load_raw_config_from_path(&fixture_path("missing.json")).err();
    assert_eq!(
        error.map(|error| error.code),
        Some(ErrorCode::new("config", "config_file_not_found"))
    );
}
