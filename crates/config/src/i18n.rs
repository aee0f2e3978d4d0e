//! Structural normalization of the `i18n` branch.
//!
//! Cross-field consistency (locale membership, fallback and domain records)
//! is checked later by the refinement rules against the normalized value.

use crate::path::ConfigPath;
use crate::reader::Collector;
use crate::schema::{I18nConfig, I18nRouting, LocaleEntry, LocaleGroup};
use crate::shape::union_message;
use serde_json::Value;

/// Normalize the `i18n` object. Returns `None` when any nested field failed.
pub(crate) fn normalize_i18n(
    collector: &mut Collector,
    path: &ConfigPath,
    value: &Value,
) -> Option<I18nConfig> {
    let object = collector.object(path, value)?;
    let before = collector.len();

    let default_locale = collector.read_required(object, path, "defaultLocale", Collector::string);
    let locales = collector.read_required(object, path, "locales", read_locales);
    let fallback = collector.read_opt(object, path, "fallback", Collector::string_record);
    let routing = collector.read_or(object, path, "routing", I18nRouting::default(), read_routing);
    let domains = collector.read_opt(object, path, "domains", Collector::string_record);

    if collector.len() != before {
        return None;
    }
    Some(I18nConfig {
        default_locale: default_locale?,
        locales: locales?,
        fallback,
        routing,
        domains,
    })
}

fn read_locales(
    collector: &mut Collector,
    path: &ConfigPath,
    value: &Value,
) -> Option<Vec<LocaleEntry>> {
    let items = collector.array(path, value)?;
    let before = collector.len();
    let entries: Vec<LocaleEntry> = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| read_locale_entry(collector, &path.index(index), item))
        .collect();
    (collector.len() == before).then_some(entries)
}

fn read_locale_entry(
    collector: &mut Collector,
    path: &ConfigPath,
    value: &Value,
) -> Option<LocaleEntry> {
    match value {
        Value::String(code) => Some(LocaleEntry::Code(code.clone())),
        Value::Object(object) => {
            let before = collector.len();
            let locale_path = collector.read_required(object, path, "path", Collector::string);
            // An empty list passes here; it is reported by the refinement pass.
            let codes = collector.read_required(object, path, "codes", Collector::string_list);
            if collector.len() != before {
                return None;
            }
            Some(LocaleEntry::Group(LocaleGroup {
                path: locale_path?,
                codes: codes?,
            }))
        },
        other => {
            collector.push(path.clone(), union_message("string", "object", other));
            None
        },
    }
}

fn read_routing(collector: &mut Collector, path: &ConfigPath, value: &Value) -> Option<I18nRouting> {
    let object = collector.object(path, value)?;
    let defaults = I18nRouting::default();
    let before = collector.len();
    let routing = I18nRouting {
        prefix_default_locale: collector.read_or(
            object,
            path,
            "prefixDefaultLocale",
            defaults.prefix_default_locale,
            Collector::boolean,
        ),
        redirect_to_default_locale: collector.read_or(
            object,
            path,
            "redirectToDefaultLocale",
            defaults.redirect_to_default_locale,
            Collector::boolean,
        ),
        strategy: collector.read_or(object, path, "strategy", defaults.strategy, Collector::enumeration),
    };
    (collector.len() == before).then_some(routing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RoutingStrategy;
    use serde_json::json;

    fn run(value: &Value) -> (Option<I18nConfig>, Vec<String>) {
        let mut collector = Collector::new();
        let config = normalize_i18n(&mut collector, &ConfigPath::from_keys(&["i18n"]), value);
        let found = collector
            .into_violations()
            .iter()
            .map(ToString::to_string)
            .collect();
        (config, found)
    }

    #[test]
    fn minimal_i18n_gets_routing_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let (config, found) = run(&json!({ "defaultLocale": "en", "locales": ["en", "es"] }));
        assert!(found.is_empty());
        let config = config.ok_or("i18n should normalize")?;
        assert_eq!(config.routing, I18nRouting::default());
        assert_eq!(config.routing.strategy, RoutingStrategy::Pathname);
        assert!(config.fallback.is_none());
        assert!(config.domains.is_none());
        Ok(())
    }

    #[test]
    fn structured_locales_are_kept() -> Result<(), Box<dyn std::error::Error>> {
        let (config, found) = run(&json!({
            "defaultLocale": "en",
            "locales": ["en", { "path": "spanish", "codes": ["es", "es-AR"] }],
            "routing": { "prefixDefaultLocale": true, "strategy": "domains" },
        }));
        assert!(found.is_empty());
        let config = config.ok_or("i18n should normalize")?;
        assert_eq!(config.locale_codes(), vec!["en", "es", "es-AR"]);
        assert!(config.routing.prefix_default_locale);
        assert!(config.routing.redirect_to_default_locale);
        assert_eq!(config.routing.strategy, RoutingStrategy::Domains);
        Ok(())
    }

    #[test]
    fn empty_codes_pass_structurally() {
        let (config, found) = run(&json!({
            "defaultLocale": "en",
            "locales": ["en", { "path": "spanish", "codes": [] }],
        }));
        assert!(found.is_empty());
        assert!(config.is_some());
    }

    #[test]
    fn nested_shape_errors_are_all_reported() {
        let (config, found) = run(&json!({
            "locales": ["en", 7, { "codes": ["es"] }],
            "fallback": { "it": 1 },
            "routing": { "strategy": "subdomain" },
        }));
        assert!(config.is_none());
        assert_eq!(
            found,
            vec![
                "i18n.defaultLocale: Required",
                "i18n.locales.1: Expected string or object, received number.",
                "i18n.locales.2.path: Required",
                "i18n.fallback.it: Expected string, received number.",
                "i18n.routing.strategy: Invalid enum value. Expected 'pathname' | 'domains', received 'subdomain'",
            ]
        );
    }
}
