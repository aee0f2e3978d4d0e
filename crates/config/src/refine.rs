//! Cross-field refinement rules evaluated against the normalized candidate.
//!
//! Rules run in declaration order and never stop early; the order fixes which
//! violation a caller sees first. A rule is skipped when one of the top-level
//! fields it reads failed structurally, since its input would be a default
//! rather than what the user wrote.

use crate::dirs::is_within;
use crate::normalize::Normalized;
use crate::path::ConfigPath;
use crate::reader::Collector;
use crate::schema::{I18nConfig, LocaleEntry, OutputMode, RoutingStrategy, SiteConfig};
use crate::shape::NON_EMPTY_ARRAY_MESSAGE;

type Check = fn(&SiteConfig, &mut Collector);

/// One cross-field rule.
#[derive(Clone, Copy)]
pub(crate) struct RefinementRule {
    /// Stable identifier used in logs.
    pub name: &'static str,
    /// Top-level fields the rule reads.
    pub depends_on: &'static [&'static str],
    check: Check,
}

impl std::fmt::Debug for RefinementRule {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("RefinementRule")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

const DIRS: &[&str] = &["root", "publicDir", "outDir"];
const I18N: &[&str] = &["i18n"];

/// Every rule, in evaluation order.
pub(crate) const RULES: [RefinementRule; 13] = [
    RefinementRule {
        name: "out_dir_outside_public_dir",
        depends_on: DIRS,
        check: out_dir_outside_public_dir,
    },
    RefinementRule {
        name: "default_locale_listed",
        depends_on: I18N,
        check: default_locale_listed,
    },
    RefinementRule {
        name: "locale_codes_non_empty",
        depends_on: I18N,
        check: locale_codes_non_empty,
    },
    RefinementRule {
        name: "fallback_values_listed",
        depends_on: I18N,
        check: fallback_values_listed,
    },
    RefinementRule {
        name: "fallback_keys_listed",
        depends_on: I18N,
        check: fallback_keys_listed,
    },
    RefinementRule {
        name: "fallback_keys_not_default",
        depends_on: I18N,
        check: fallback_keys_not_default,
    },
    RefinementRule {
        name: "redirect_needs_prefix",
        depends_on: I18N,
        check: redirect_needs_prefix,
    },
    RefinementRule {
        name: "domain_keys_listed",
        depends_on: I18N,
        check: domain_keys_listed,
    },
    RefinementRule {
        name: "domain_values_are_http_urls",
        depends_on: I18N,
        check: domain_values_are_http_urls,
    },
    RefinementRule {
        name: "domain_values_are_origins",
        depends_on: I18N,
        check: domain_values_are_origins,
    },
    RefinementRule {
        name: "domains_need_domains_strategy",
        depends_on: I18N,
        check: domains_need_domains_strategy,
    },
    RefinementRule {
        name: "domains_need_site",
        depends_on: &["i18n", "site"],
        check: domains_need_site,
    },
    RefinementRule {
        name: "domains_need_server_output",
        depends_on: &["i18n", "output"],
        check: domains_need_server_output,
    },
];

/// Run every applicable rule, appending violations to the candidate's collector.
pub(crate) fn refine(normalized: &mut Normalized) {
    for rule in &RULES {
        if !normalized.all_clean(rule.depends_on) {
            tracing::debug!(rule = rule.name, "refinement skipped; input failed structurally");
            continue;
        }
        (rule.check)(&normalized.config, &mut normalized.collector);
    }
}

fn i18n_path(key: &str) -> ConfigPath {
    ConfigPath::from_keys(&["i18n", key])
}

fn out_dir_outside_public_dir(config: &SiteConfig, collector: &mut Collector) {
    if is_within(&config.out_dir, &config.public_dir) {
        collector.push(
            ConfigPath::from_keys(&["outDir"]),
            "The value of `outDir` must not point to a path within the folder set as `publicDir`, this will cause an infinite loop",
        );
    }
}

fn default_locale_listed(config: &SiteConfig, collector: &mut Collector) {
    let Some(i18n) = &config.i18n else { return };
    if !i18n.has_locale(&i18n.default_locale) {
        collector.push(
            i18n_path("defaultLocale"),
            format!(
                "The default locale `{}` is not present in the `i18n.locales` array.",
                i18n.default_locale
            ),
        );
    }
}

fn locale_codes_non_empty(config: &SiteConfig, collector: &mut Collector) {
    let Some(i18n) = &config.i18n else { return };
    for (index, entry) in i18n.locales.iter().enumerate() {
        if matches!(entry, LocaleEntry::Group(group) if group.codes.is_empty()) {
            collector.push(
                i18n_path("locales").index(index).key("codes"),
                NON_EMPTY_ARRAY_MESSAGE,
            );
        }
    }
}

fn fallback_entries(i18n: &I18nConfig) -> impl Iterator<Item = (&String, &String)> {
    i18n.fallback.iter().flatten()
}

fn fallback_values_listed(config: &SiteConfig, collector: &mut Collector) {
    let Some(i18n) = &config.i18n else { return };
    for (_, to) in fallback_entries(i18n) {
        if !i18n.has_locale(to) {
            collector.push(
                i18n_path("fallback"),
                format!(
                    "The locale `{to}` value in the `i18n.fallback` record doesn't exist in the `i18n.locales` array."
                ),
            );
        }
    }
}

fn fallback_keys_listed(config: &SiteConfig, collector: &mut Collector) {
    let Some(i18n) = &config.i18n else { return };
    for (from, _) in fallback_entries(i18n) {
        if !i18n.has_locale(from) {
            collector.push(
                i18n_path("fallback"),
                format!(
                    "The locale `{from}` key in the `i18n.fallback` record doesn't exist in the `i18n.locales` array."
                ),
            );
        }
    }
}

fn fallback_keys_not_default(config: &SiteConfig, collector: &mut Collector) {
    let Some(i18n) = &config.i18n else { return };
    if fallback_entries(i18n).any(|(from, _)| *from == i18n.default_locale) {
        collector.push(
            i18n_path("fallback"),
            "You can't use the default locale as a key. The default locale can only be used as value.",
        );
    }
}

fn redirect_needs_prefix(config: &SiteConfig, collector: &mut Collector) {
    let Some(i18n) = &config.i18n else { return };
    let routing = i18n.routing;
    if !routing.prefix_default_locale && !routing.redirect_to_default_locale {
        collector.push(
            i18n_path("routing"),
            "The option `i18n.redirectToDefaultLocale` is only useful when the `i18n.prefixDefaultLocale` is set to `true`. Remove the option `i18n.redirectToDefaultLocale`, or change its value to `true`.",
        );
    }
}

fn domain_entries(i18n: &I18nConfig) -> impl Iterator<Item = (&String, &String)> {
    i18n.domains.iter().flatten()
}

fn domain_keys_listed(config: &SiteConfig, collector: &mut Collector) {
    let Some(i18n) = &config.i18n else { return };
    if i18n.routing.strategy != RoutingStrategy::Domains {
        return;
    }
    for (locale, _) in domain_entries(i18n) {
        if !i18n.has_locale(locale) {
            collector.push(
                i18n_path("domains"),
                format!(
                    "The locale `{locale}` key in the `i18n.domains` record doesn't exist in the `i18n.locales` array."
                ),
            );
        }
    }
}

/// Parse a domain value, accepting only `http` and `https` URLs.
fn parse_http_url(raw: &str) -> Option<url::Url> {
    url::Url::parse(raw)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

fn domain_values_are_http_urls(config: &SiteConfig, collector: &mut Collector) {
    let Some(i18n) = &config.i18n else { return };
    for (_, domain) in domain_entries(i18n) {
        if parse_http_url(domain).is_none() {
            collector.push(
                i18n_path("domains"),
                "The domain value must be a valid URL, and it has to start with 'https' or 'http'.",
            );
        }
    }
}

fn domain_values_are_origins(config: &SiteConfig, collector: &mut Collector) {
    let Some(i18n) = &config.i18n else { return };
    for (_, domain) in domain_entries(i18n) {
        let Some(url) = parse_http_url(domain) else {
            continue;
        };
        let pathname = url.path();
        if pathname != "/" {
            collector.push(
                i18n_path("domains"),
                format!(
                    "The URL `{domain}` must contain only the origin. A subsequent pathname isn't allowed here. Remove `{pathname}`."
                ),
            );
        }
    }
}

fn domains_need_domains_strategy(config: &SiteConfig, collector: &mut Collector) {
    let Some(i18n) = &config.i18n else { return };
    if config.has_domains() && i18n.routing.strategy != RoutingStrategy::Domains {
        collector.push(
            i18n_path("routing"),
            "When specifying some domains, the property `i18n.routingStrategy` must be set to `\"domains\"`.",
        );
    }
}

fn domains_need_site(config: &SiteConfig, collector: &mut Collector) {
    if config.has_domains() && config.site.is_none() {
        collector.push(
            ConfigPath::from_keys(&["site"]),
            "The option `site` isn't set. When availing of the domain support, `site` is required to create absolute URLs for locales that aren't mapped to a domain.",
        );
    }
}

fn domains_need_server_output(config: &SiteConfig, collector: &mut Collector) {
    if config.has_domains() && config.output != OutputMode::Server {
        collector.push(
            ConfigPath::from_keys(&["output"]),
            "Domain support is only available when `output` is `\"server\"`.",
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use serde_json::{Value, json};
    use std::path::Path;

    fn refined(raw: &Value) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let object = raw.as_object().ok_or("raw config must be an object")?;
        let mut normalized = normalize(object, Path::new("/work/site"));
        refine(&mut normalized);
        Ok(normalized
            .collector
            .into_violations()
            .iter()
            .map(ToString::to_string)
            .collect())
    }

    #[test]
    fn rule_names_are_unique() {
        let mut names: Vec<&str> = RULES.iter().map(|rule| rule.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RULES.len());
    }

    #[test]
    fn containment_is_checked_after_resolution() -> Result<(), Box<dyn std::error::Error>> {
        assert_eq!(
            refined(&json!({ "outDir": "./public/dist" }))?,
            vec![
                "outDir: The value of `outDir` must not point to a path within the folder set as `publicDir`, this will cause an infinite loop"
            ]
        );
        assert!(refined(&json!({ "outDir": "./public-other" }))?.is_empty());
        assert!(refined(&json!({ "outDir": "/elsewhere", "publicDir": "/elsewhere/public" }))?.is_empty());
        Ok(())
    }

    #[test]
    fn rules_are_skipped_when_inputs_failed() -> Result<(), Box<dyn std::error::Error>> {
        let found = refined(&json!({
            "output": 3,
            "site": "https://example.com",
            "i18n": {
                "defaultLocale": "en",
                "locales": ["en"],
                "routing": { "strategy": "domains" },
                "domains": { "en": "https://example.com" },
            },
        }))?;
        assert_eq!(
            found,
            vec!["output: Expected 'static' | 'server' | 'hybrid', received number."]
        );
        Ok(())
    }

    #[test]
    fn violations_follow_rule_order() -> Result<(), Box<dyn std::error::Error>> {
        let found = refined(&json!({
            "outDir": "./public/out",
            "i18n": {
                "defaultLocale": "en",
                "locales": ["es"],
                "fallback": { "en": "it" },
            },
        }))?;
        let paths: Vec<&str> = found
            .iter()
            .filter_map(|line| line.split(": ").next())
            .collect();
        assert_eq!(
            paths,
            vec!["outDir", "i18n.defaultLocale", "i18n.fallback", "i18n.fallback", "i18n.fallback"]
        );
        Ok(())
    }
}
