//! Structural normalization of a raw config object.
//!
//! Fields are visited in declaration order. Each top-level field either
//! normalizes cleanly or records its violations and falls back to the
//! default; the failed field names are kept so refinement rules that depend
//! on them can be skipped.

use crate::dirs::resolve_dir;
use crate::i18n::normalize_i18n;
use crate::integrations::{normalize_entry, normalize_integrations};
use crate::path::ConfigPath;
use crate::reader::{Collector, RawObject};
use crate::schema::{
    BuildConfig, DEFAULT_CACHE_DIR, DEFAULT_OUT_DIR, DEFAULT_PUBLIC_DIR, DEFAULT_SRC_DIR,
    DevToolbarConfig, ExperimentalFlags, HostSetting,
    ImageConfig, ImageService, MarkdownConfig, OpenSetting, Passthrough, PrefetchConfig,
    PrefetchOptions, REDIRECT_STATUS_CODES, RedirectTarget, RemotePattern, ServerConfig,
    SiteConfig, SyntaxHighlight, TrailingSlash,
};
use crate::shape::{INVALID_URL_MESSAGE, expected_message, union_message};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Top-level keys in declaration order.
pub const TOP_LEVEL_KEYS: [&str; 25] = [
    "root",
    "srcDir",
    "publicDir",
    "outDir",
    "cacheDir",
    "site",
    "base",
    "trailingSlash",
    "output",
    "scopedStyleStrategy",
    "adapter",
    "integrations",
    "build",
    "server",
    "redirects",
    "image",
    "devToolbar",
    "compressHTML",
    "prefetch",
    "markdown",
    "vite",
    "i18n",
    "experimental",
    "legacy",
    "$schema",
];

/// Result of the structural pass: a complete candidate plus what failed.
#[derive(Debug)]
pub(crate) struct Normalized {
    pub config: SiteConfig,
    pub failed: BTreeSet<&'static str>,
    pub collector: Collector,
}

impl Normalized {
    /// Returns true when every named top-level field normalized cleanly.
    pub fn all_clean(&self, keys: &[&str]) -> bool {
        keys.iter().all(|key| !self.failed.contains(key))
    }
}

struct TopLevel<'a> {
    object: &'a RawObject,
    collector: Collector,
    failed: BTreeSet<&'static str>,
}

impl TopLevel<'_> {
    fn read<T>(
        &mut self,
        key: &'static str,
        default: T,
        read: impl FnOnce(&mut Collector, &ConfigPath, &Value) -> Option<T>,
    ) -> T {
        self.read_opt(key, read).unwrap_or(default)
    }

    fn read_opt<T>(
        &mut self,
        key: &'static str,
        read: impl FnOnce(&mut Collector, &ConfigPath, &Value) -> Option<T>,
    ) -> Option<T> {
        let before = self.collector.len();
        let value = self
            .collector
            .read_opt(self.object, &ConfigPath::root(), key, read);
        if self.collector.len() != before {
            self.failed.insert(key);
        }
        value
    }
}

/// Walk `object` and build a complete `SiteConfig` rooted under `base_root`.
pub(crate) fn normalize(object: &RawObject, base_root: &Path) -> Normalized {
    for key in object.keys() {
        if !TOP_LEVEL_KEYS.contains(&key.as_str()) {
            tracing::warn!(key = %key, "ignoring unknown configuration key");
        }
    }

    let mut top = TopLevel {
        object,
        collector: Collector::new(),
        failed: BTreeSet::new(),
    };
    let defaults = SiteConfig::defaults_for(base_root);

    let root = top.read("root", defaults.root, |c, p, v| {
        c.string(p, v).map(|raw| resolve_dir(base_root, raw))
    });
    let dir = |default: &str| resolve_dir(&root, default);
    let src_dir = top.read("srcDir", dir(DEFAULT_SRC_DIR), |c, p, v| {
        read_dir(c, p, v, &root)
    });
    let public_dir = top.read("publicDir", dir(DEFAULT_PUBLIC_DIR), |c, p, v| {
        read_dir(c, p, v, &root)
    });
    let out_dir = top.read("outDir", dir(DEFAULT_OUT_DIR), |c, p, v| {
        read_dir(c, p, v, &root)
    });
    let cache_dir = top.read("cacheDir", dir(DEFAULT_CACHE_DIR), |c, p, v| {
        read_dir(c, p, v, &root)
    });
    let site = top.read_opt("site", read_site);
    let base = top.read("base", defaults.base, Collector::string);
    let trailing_slash = top.read("trailingSlash", defaults.trailing_slash, Collector::enumeration);
    let output = top.read("output", defaults.output, Collector::enumeration);
    let scoped_style_strategy = top.read(
        "scopedStyleStrategy",
        defaults.scoped_style_strategy,
        Collector::enumeration,
    );
    let adapter = top.read_opt("adapter", normalize_entry);
    let integrations = top.read("integrations", defaults.integrations, normalize_integrations);
    let build = top.read("build", BuildConfig::defaults_for(&out_dir), |c, p, v| {
        read_build(c, p, v, &root, &out_dir)
    });
    let server = top.read("server", defaults.server, read_server);
    let redirects = top.read("redirects", defaults.redirects, read_redirects);
    let image = top.read("image", defaults.image, read_image);
    let dev_toolbar = top.read("devToolbar", defaults.dev_toolbar, read_dev_toolbar);
    let compress_html = top.read("compressHTML", defaults.compress_html, Collector::boolean);
    let prefetch = top.read_opt("prefetch", read_prefetch);
    let markdown = top.read("markdown", defaults.markdown, read_markdown);
    let vite = top.read("vite", defaults.vite, Collector::passthrough);
    let i18n = top.read_opt("i18n", normalize_i18n);
    let experimental = top.read("experimental", defaults.experimental, read_experimental);
    let legacy = top.read("legacy", defaults.legacy, Collector::passthrough);

    let config = SiteConfig {
        base: normalize_base(&base, trailing_slash),
        root,
        src_dir,
        public_dir,
        out_dir,
        cache_dir,
        site,
        trailing_slash,
        output,
        scoped_style_strategy,
        adapter,
        integrations,
        build,
        server,
        redirects,
        image,
        dev_toolbar,
        compress_html,
        prefetch,
        markdown,
        vite,
        i18n,
        experimental,
        legacy,
    };
    tracing::debug!(
        failed_fields = top.failed.len(),
        violations = top.collector.len(),
        "structural pass finished"
    );
    Normalized {
        config,
        failed: top.failed,
        collector: top.collector,
    }
}

/// Ensure a leading slash and apply the trailing slash policy to `base`.
#[must_use]
pub fn normalize_base(base: &str, trailing_slash: TrailingSlash) -> String {
    let trimmed = match trailing_slash {
        TrailingSlash::Never => base.trim_end_matches('/'),
        TrailingSlash::Always | TrailingSlash::Ignore => base,
    };
    let mut normalized = if trimmed.starts_with('/') {
        trimmed.to_owned()
    } else {
        format!("/{trimmed}")
    };
    if trailing_slash == TrailingSlash::Always && !normalized.ends_with('/') {
        normalized.push('/');
    }
    normalized
}

fn read_dir(collector: &mut Collector, path: &ConfigPath, value: &Value, root: &Path) -> Option<PathBuf> {
    collector.string(path, value).map(|raw| resolve_dir(root, raw))
}

fn read_site(collector: &mut Collector, path: &ConfigPath, value: &Value) -> Option<String> {
    let raw = collector.string(path, value)?;
    let Ok(url) = url::Url::parse(&raw) else {
        collector.push(path.clone(), INVALID_URL_MESSAGE);
        return None;
    };
    // Slashes inside a query or fragment are data, not path separators.
    if url.query().is_some() || url.fragment().is_some() {
        return Some(raw);
    }
    Some(raw.trim_end_matches('/').to_owned())
}

fn read_build(
    collector: &mut Collector,
    path: &ConfigPath,
    value: &Value,
    root: &Path,
    out_dir: &Path,
) -> Option<BuildConfig> {
    let object = collector.object(path, value)?;
    let defaults = BuildConfig::defaults_for(out_dir);
    let before = collector.len();
    let build = BuildConfig {
        format: collector.read_or(object, path, "format", defaults.format, Collector::enumeration),
        client: collector.read_or(object, path, "client", defaults.client, |c, p, v| {
            read_dir(c, p, v, root)
        }),
        server: collector.read_or(object, path, "server", defaults.server, |c, p, v| {
            read_dir(c, p, v, root)
        }),
        assets: collector.read_or(object, path, "assets", defaults.assets, Collector::string),
        assets_prefix: collector.read_opt(object, path, "assetsPrefix", Collector::string),
        server_entry: collector.read_or(
            object,
            path,
            "serverEntry",
            defaults.server_entry,
            Collector::string,
        ),
        redirects: collector.read_or(object, path, "redirects", defaults.redirects, Collector::boolean),
        inline_stylesheets: collector.read_or(
            object,
            path,
            "inlineStylesheets",
            defaults.inline_stylesheets,
            Collector::enumeration,
        ),
    };
    (collector.len() == before).then_some(build)
}

fn read_server(collector: &mut Collector, path: &ConfigPath, value: &Value) -> Option<ServerConfig> {
    let object = collector.object(path, value)?;
    let defaults = ServerConfig::default();
    let before = collector.len();
    let server = ServerConfig {
        host: collector.read_or(object, path, "host", defaults.host, |c, p, v| match v {
            Value::Bool(flag) => Some(HostSetting::AllInterfaces(*flag)),
            Value::String(address) => Some(HostSetting::Address(address.clone())),
            other => {
                c.push(p.clone(), union_message("boolean", "string", other));
                None
            },
        }),
        port: collector.read_or(object, path, "port", defaults.port, |c, p, v| {
            c.integer_in(p, v, 0, i64::from(u16::MAX))
                .and_then(|port| u16::try_from(port).ok())
        }),
        open: collector.read_or(object, path, "open", defaults.open, |c, p, v| match v {
            Value::Bool(flag) => Some(OpenSetting::Enabled(*flag)),
            Value::String(target) => Some(OpenSetting::Path(target.clone())),
            other => {
                c.push(p.clone(), union_message("boolean", "string", other));
                None
            },
        }),
        headers: collector.read_opt(object, path, "headers", Collector::passthrough),
    };
    (collector.len() == before).then_some(server)
}

fn read_redirects(
    collector: &mut Collector,
    path: &ConfigPath,
    value: &Value,
) -> Option<BTreeMap<String, RedirectTarget>> {
    let object = collector.object(path, value)?;
    let before = collector.len();
    let redirects = object
        .iter()
        .filter_map(|(source, target)| {
            read_redirect_target(collector, &path.key(source), target)
                .map(|target| (source.clone(), target))
        })
        .collect();
    (collector.len() == before).then_some(redirects)
}

fn read_redirect_target(
    collector: &mut Collector,
    path: &ConfigPath,
    value: &Value,
) -> Option<RedirectTarget> {
    match value {
        Value::String(destination) => Some(RedirectTarget::Path(destination.clone())),
        Value::Object(object) => {
            let before = collector.len();
            let status = collector.read_required(object, path, "status", read_status);
            let destination =
                collector.read_required(object, path, "destination", Collector::string);
            if collector.len() != before {
                return None;
            }
            Some(RedirectTarget::WithStatus {
                status: status?,
                destination: destination?,
            })
        },
        other => {
            collector.push(path.clone(), union_message("string", "object", other));
            None
        },
    }
}

fn read_status(collector: &mut Collector, path: &ConfigPath, value: &Value) -> Option<u16> {
    let accepted = REDIRECT_STATUS_CODES
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" | ");
    let Value::Number(number) = value else {
        collector.push(path.clone(), expected_message(&accepted, value));
        return None;
    };
    let status = number
        .as_u64()
        .and_then(|status| u16::try_from(status).ok())
        .filter(|status| REDIRECT_STATUS_CODES.contains(status));
    if status.is_none() {
        collector.push(
            path.clone(),
            format!("Invalid enum value. Expected {accepted}, received {number}"),
        );
    }
    status
}

fn read_image(collector: &mut Collector, path: &ConfigPath, value: &Value) -> Option<ImageConfig> {
    let object = collector.object(path, value)?;
    let before = collector.len();
    let image = ImageConfig {
        endpoint: collector.read_opt(object, path, "endpoint", Collector::string),
        service: collector.read_or(object, path, "service", ImageService::default(), read_image_service),
        domains: collector.read_or(object, path, "domains", Vec::new(), Collector::string_list),
        remote_patterns: collector.read_or(object, path, "remotePatterns", Vec::new(), |c, p, v| {
            let items = c.array(p, v)?;
            let before = c.len();
            let patterns: Vec<RemotePattern> = items
                .iter()
                .enumerate()
                .filter_map(|(index, item)| read_remote_pattern(c, &p.index(index), item))
                .collect();
            (c.len() == before).then_some(patterns)
        }),
    };
    (collector.len() == before).then_some(image)
}

fn read_image_service(
    collector: &mut Collector,
    path: &ConfigPath,
    value: &Value,
) -> Option<ImageService> {
    let object = collector.object(path, value)?;
    let before = collector.len();
    let entrypoint = collector.read_required(object, path, "entrypoint", Collector::string);
    let config = collector.read_or(object, path, "config", Passthrough::new(), Collector::passthrough);
    if collector.len() != before {
        return None;
    }
    Some(ImageService {
        entrypoint: entrypoint?,
        config,
    })
}

fn read_remote_pattern(
    collector: &mut Collector,
    path: &ConfigPath,
    value: &Value,
) -> Option<RemotePattern> {
    let object = collector.object(path, value)?;
    let before = collector.len();
    let pattern = RemotePattern {
        protocol: collector.read_opt(object, path, "protocol", Collector::string),
        hostname: collector.read_opt(object, path, "hostname", Collector::string),
        port: collector.read_opt(object, path, "port", Collector::string),
        pathname: collector.read_opt(object, path, "pathname", Collector::string),
    };
    (collector.len() == before).then_some(pattern)
}

fn read_dev_toolbar(
    collector: &mut Collector,
    path: &ConfigPath,
    value: &Value,
) -> Option<DevToolbarConfig> {
    let object = collector.object(path, value)?;
    let defaults = DevToolbarConfig::default();
    let before = collector.len();
    let enabled = collector.read_or(object, path, "enabled", defaults.enabled, Collector::boolean);
    (collector.len() == before).then_some(DevToolbarConfig { enabled })
}

fn read_prefetch(collector: &mut Collector, path: &ConfigPath, value: &Value) -> Option<PrefetchConfig> {
    match value {
        Value::Bool(flag) => Some(PrefetchConfig::Enabled(*flag)),
        Value::Object(object) => {
            let before = collector.len();
            let options = PrefetchOptions {
                prefetch_all: collector.read_opt(object, path, "prefetchAll", Collector::boolean),
                default_strategy: collector.read_opt(
                    object,
                    path,
                    "defaultStrategy",
                    Collector::enumeration,
                ),
            };
            (collector.len() == before).then_some(PrefetchConfig::Options(options))
        },
        other => {
            collector.push(path.clone(), union_message("boolean", "object", other));
            None
        },
    }
}

fn read_markdown(collector: &mut Collector, path: &ConfigPath, value: &Value) -> Option<MarkdownConfig> {
    let object = collector.object(path, value)?;
    let defaults = MarkdownConfig::default();
    let before = collector.len();
    let opaque_list = |c: &mut Collector, p: &ConfigPath, v: &Value| c.array(p, v).map(<[Value]>::to_vec);
    let markdown = MarkdownConfig {
        syntax_highlight: collector.read_or(
            object,
            path,
            "syntaxHighlight",
            defaults.syntax_highlight,
            |c, p, v| match v {
                Value::String(_) => c.enumeration(p, v).map(SyntaxHighlight::Highlighter),
                Value::Bool(false) => Some(SyntaxHighlight::Off(false)),
                other => {
                    c.push(p.clone(), expected_message("'shiki' | 'prism' | false", other));
                    None
                },
            },
        ),
        gfm: collector.read_or(object, path, "gfm", defaults.gfm, Collector::boolean),
        smartypants: collector.read_or(
            object,
            path,
            "smartypants",
            defaults.smartypants,
            Collector::boolean,
        ),
        remark_plugins: collector.read_or(object, path, "remarkPlugins", Vec::new(), opaque_list),
        rehype_plugins: collector.read_or(object, path, "rehypePlugins", Vec::new(), opaque_list),
    };
    (collector.len() == before).then_some(markdown)
}

fn read_experimental(
    collector: &mut Collector,
    path: &ConfigPath,
    value: &Value,
) -> Option<ExperimentalFlags> {
    let object = collector.object(path, value)?;
    let before = collector.len();
    let flag = |c: &mut Collector, key: &str| c.read_or(object, path, key, false, Collector::boolean);
    let flags = ExperimentalFlags {
        direct_render_script: flag(collector, "directRenderScript"),
        content_collection_cache: flag(collector, "contentCollectionCache"),
        i18n_domains: flag(collector, "i18nDomains"),
    };
    (collector.len() == before).then_some(flags)
}
