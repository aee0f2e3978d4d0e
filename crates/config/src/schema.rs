//! Site configuration schema: normalized types, enum registries, and defaults.
//!
//! The types in this module describe the *normalized* shape. Raw user input
//! never deserializes into them directly; the normalizer walks the raw value,
//! fills defaults, and records violations keyed to config paths.
//! - Every field has a concrete value after normalization (own value or default).
//! - Serialization is camelCase and feeds back into the normalizer unchanged.
//! - `site_config_schema` exports the shape as JSON Schema.

use schemars::{JsonSchema, Schema};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Opaque object carried through normalization untouched (hooks, vite, legacy).
pub type Passthrough = BTreeMap<String, Value>;

/// Default `srcDir`, relative to `root`.
pub const DEFAULT_SRC_DIR: &str = "./src";
/// Default `publicDir`, relative to `root`.
pub const DEFAULT_PUBLIC_DIR: &str = "./public";
/// Default `outDir`, relative to `root`.
pub const DEFAULT_OUT_DIR: &str = "./dist";
/// Default `cacheDir`, relative to `root`.
pub const DEFAULT_CACHE_DIR: &str = "./node_modules/.astro";
/// Default `base`.
pub const DEFAULT_BASE: &str = "/";
/// Default dev server port.
pub const DEFAULT_PORT: u16 = 4321;
/// Default `build.assets` folder name.
pub const DEFAULT_ASSETS_DIR: &str = "_astro";
/// Default `build.serverEntry`.
pub const DEFAULT_SERVER_ENTRY: &str = "entry.mjs";
/// Default image service entrypoint.
pub const DEFAULT_IMAGE_SERVICE: &str = "astro/assets/services/sharp";
/// Status codes accepted by object-form redirects.
pub const REDIRECT_STATUS_CODES: [u16; 7] = [300, 301, 302, 303, 304, 307, 308];

/// Removed option names that are rejected before validation.
pub const LEGACY_CONFIG_KEYS: [&str; 9] = [
    "projectRoot",
    "src",
    "pages",
    "public",
    "dist",
    "styleOptions",
    "markdownOptions",
    "buildOptions",
    "devOptions",
];

/// String-valued enum options with a fixed set of accepted values.
pub trait ConfigEnum: Sized + Copy + 'static {
    /// Accepted values in declaration order, paired with their variant.
    const VARIANTS: &'static [(&'static str, Self)];

    /// Accepted spellings in declaration order.
    fn options() -> Vec<&'static str> {
        Self::VARIANTS.iter().map(|(text, _)| *text).collect()
    }

    /// Parse an exact spelling.
    fn parse(input: &str) -> Option<Self> {
        Self::VARIANTS
            .iter()
            .find(|(text, _)| *text == input)
            .map(|(_, variant)| *variant)
    }
}

macro_rules! config_enum {
    (
        $(#[$meta:meta])*
        $name:ident default $default:ident {
            $($(#[$variant_meta:meta])* $variant:ident => $text:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, JsonSchema)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Return the canonical config string for this value.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl ConfigEnum for $name {
            const VARIANTS: &'static [(&'static str, Self)] = &[$(($text, Self::$variant),)+];
        }

        impl fmt::Display for $name {
            fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
                formatter.write_str(self.as_str())
            }
        }
    };
}

config_enum! {
    /// Trailing slash policy for generated routes.
    TrailingSlash default Ignore {
        /// Always append a trailing slash.
        Always => "always",
        /// Never append a trailing slash.
        Never => "never",
        /// Accept both forms.
        Ignore => "ignore",
    }
}

config_enum! {
    /// Build output mode.
    OutputMode default Static {
        /// Prerender every route.
        Static => "static",
        /// Render every route on demand.
        Server => "server",
        /// Prerender by default, opt routes into on-demand rendering.
        Hybrid => "hybrid",
    }
}

config_enum! {
    /// Scoping strategy for component styles.
    ScopedStyleStrategy default Attribute {
        /// `:where()` selectors.
        Where => "where",
        /// Class selectors.
        Class => "class",
        /// Data attribute selectors.
        Attribute => "attribute",
    }
}

config_enum! {
    /// Output file layout for pages.
    BuildFormat default Directory {
        /// `about.html`.
        File => "file",
        /// `about/index.html`.
        Directory => "directory",
        /// Mirror the source layout.
        Preserve => "preserve",
    }
}

config_enum! {
    /// Stylesheet inlining policy.
    InlineStylesheets default Auto {
        /// Inline every stylesheet.
        Always => "always",
        /// Inline small stylesheets only.
        Auto => "auto",
        /// Never inline.
        Never => "never",
    }
}

config_enum! {
    /// Default prefetch trigger.
    PrefetchStrategy default Hover {
        /// On tap/click.
        Tap => "tap",
        /// On hover or focus.
        Hover => "hover",
        /// When the link enters the viewport.
        Viewport => "viewport",
        /// On page load.
        Load => "load",
    }
}

config_enum! {
    /// Code block highlighter.
    Highlighter default Shiki {
        /// Shiki highlighter.
        Shiki => "shiki",
        /// Prism highlighter.
        Prism => "prism",
    }
}

config_enum! {
    /// How locales map to URLs.
    RoutingStrategy default Pathname {
        /// Locales are path prefixes.
        Pathname => "pathname",
        /// Some locales are served from their own domain.
        Domains => "domains",
    }
}

/// Fully normalized site configuration.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    /// Project root (absolute).
    pub root: PathBuf,
    /// Source directory (absolute).
    pub src_dir: PathBuf,
    /// Static asset directory copied verbatim (absolute).
    pub public_dir: PathBuf,
    /// Build output directory (absolute, never inside `public_dir`).
    pub out_dir: PathBuf,
    /// Cache directory (absolute).
    pub cache_dir: PathBuf,
    /// Deployed site URL without trailing slash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
    /// Base path the site is served from.
    pub base: String,
    /// Trailing slash policy.
    pub trailing_slash: TrailingSlash,
    /// Build output mode.
    pub output: OutputMode,
    /// Component style scoping strategy.
    pub scoped_style_strategy: ScopedStyleStrategy,
    /// Deployment adapter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapter: Option<IntegrationEntry>,
    /// Flattened, deduplicated integrations.
    pub integrations: Vec<IntegrationEntry>,
    /// Build options.
    pub build: BuildConfig,
    /// Dev server options.
    pub server: ServerConfig,
    /// Static redirects keyed by source path.
    pub redirects: BTreeMap<String, RedirectTarget>,
    /// Image pipeline options.
    pub image: ImageConfig,
    /// Dev toolbar options.
    pub dev_toolbar: DevToolbarConfig,
    /// Minify generated HTML.
    #[serde(rename = "compressHTML")]
    pub compress_html: bool,
    /// Link prefetching.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefetch: Option<PrefetchConfig>,
    /// Markdown pipeline options.
    pub markdown: MarkdownConfig,
    /// Opaque bundler options.
    pub vite: Passthrough,
    /// Internationalized routing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub i18n: Option<I18nConfig>,
    /// Experimental feature flags.
    pub experimental: ExperimentalFlags,
    /// Opaque legacy flags.
    pub legacy: Passthrough,
}

impl SiteConfig {
    /// Defaults for a project rooted at `root` (must already be absolute).
    #[must_use]
    pub fn defaults_for(root: &Path) -> Self {
        let out_dir = crate::dirs::resolve_dir(root, DEFAULT_OUT_DIR);
        Self {
            root: root.to_path_buf(),
            src_dir: crate::dirs::resolve_dir(root, DEFAULT_SRC_DIR),
            public_dir: crate::dirs::resolve_dir(root, DEFAULT_PUBLIC_DIR),
            cache_dir: crate::dirs::resolve_dir(root, DEFAULT_CACHE_DIR),
            build: BuildConfig::defaults_for(&out_dir),
            out_dir,
            site: None,
            base: DEFAULT_BASE.to_owned(),
            trailing_slash: TrailingSlash::default(),
            output: OutputMode::default(),
            scoped_style_strategy: ScopedStyleStrategy::default(),
            adapter: None,
            integrations: Vec::new(),
            server: ServerConfig::default(),
            redirects: BTreeMap::new(),
            image: ImageConfig::default(),
            dev_toolbar: DevToolbarConfig::default(),
            compress_html: true,
            prefetch: None,
            markdown: MarkdownConfig::default(),
            vite: Passthrough::new(),
            i18n: None,
            experimental: ExperimentalFlags::default(),
            legacy: Passthrough::new(),
        }
    }

    /// Returns true when at least one locale is mapped to its own domain.
    #[must_use]
    pub fn has_domains(&self) -> bool {
        self.i18n
            .as_ref()
            .and_then(|i18n| i18n.domains.as_ref())
            .is_some_and(|domains| !domains.is_empty())
    }
}

/// Integration (or adapter) entry: a name plus its hook table.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct IntegrationEntry {
    /// Integration name.
    pub name: String,
    /// Hook table, empty when the entry declared none.
    pub hooks: Passthrough,
}

/// Build options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Page file layout.
    pub format: BuildFormat,
    /// Client bundle directory (absolute).
    pub client: PathBuf,
    /// Server bundle directory (absolute).
    pub server: PathBuf,
    /// Asset folder name inside the output.
    pub assets: String,
    /// CDN prefix for asset URLs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assets_prefix: Option<String>,
    /// Server entry file name.
    pub server_entry: String,
    /// Emit redirect pages for static builds.
    pub redirects: bool,
    /// Stylesheet inlining policy.
    pub inline_stylesheets: InlineStylesheets,
}

impl BuildConfig {
    /// Defaults derived from the resolved `outDir`.
    #[must_use]
    pub fn defaults_for(out_dir: &Path) -> Self {
        Self {
            format: BuildFormat::default(),
            client: out_dir.join("client"),
            server: out_dir.join("server"),
            assets: DEFAULT_ASSETS_DIR.to_owned(),
            assets_prefix: None,
            server_entry: DEFAULT_SERVER_ENTRY.to_owned(),
            redirects: true,
            inline_stylesheets: InlineStylesheets::default(),
        }
    }
}

/// Host binding for the dev server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum HostSetting {
    /// `false` binds localhost; `true` binds every interface.
    AllInterfaces(bool),
    /// Explicit address.
    Address(String),
}

/// Browser auto-open behaviour for the dev server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum OpenSetting {
    /// Open the root page (or not).
    Enabled(bool),
    /// Open a specific path or URL.
    Path(String),
}

/// Dev server options.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ServerConfig {
    /// Bind address.
    pub host: HostSetting,
    /// Listen port.
    pub port: u16,
    /// Auto-open behaviour.
    pub open: OpenSetting,
    /// Extra response headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Passthrough>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: HostSetting::AllInterfaces(false),
            port: DEFAULT_PORT,
            open: OpenSetting::Enabled(false),
            headers: None,
        }
    }
}

/// Redirect destination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum RedirectTarget {
    /// Destination path, default status.
    Path(String),
    /// Destination with an explicit status code.
    WithStatus {
        /// HTTP status (one of `REDIRECT_STATUS_CODES`).
        status: u16,
        /// Destination path or URL.
        destination: String,
    },
}

/// Image pipeline options.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    /// Custom image endpoint route.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Image service.
    pub service: ImageService,
    /// Remote domains allowed for optimization.
    pub domains: Vec<String>,
    /// Remote URL patterns allowed for optimization.
    pub remote_patterns: Vec<RemotePattern>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            service: ImageService::default(),
            domains: Vec::new(),
            remote_patterns: Vec::new(),
        }
    }
}

/// Image service entrypoint and its options.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct ImageService {
    /// Module specifier of the service.
    pub entrypoint: String,
    /// Service-specific options.
    pub config: Passthrough,
}

impl Default for ImageService {
    fn default() -> Self {
        Self {
            entrypoint: DEFAULT_IMAGE_SERVICE.to_owned(),
            config: Passthrough::new(),
        }
    }
}

/// Remote image URL pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, JsonSchema)]
pub struct RemotePattern {
    /// URL scheme.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Host name (wildcards allowed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    /// Port.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<String>,
    /// Path pattern.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pathname: Option<String>,
}

/// Dev toolbar options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
pub struct DevToolbarConfig {
    /// Show the toolbar.
    pub enabled: bool,
}

impl Default for DevToolbarConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Link prefetching: a switch or detailed options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum PrefetchConfig {
    /// Enable with defaults, or disable.
    Enabled(bool),
    /// Detailed options.
    Options(PrefetchOptions),
}

/// Detailed prefetch options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrefetchOptions {
    /// Prefetch every link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefetch_all: Option<bool>,
    /// Trigger used when a link does not specify one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_strategy: Option<PrefetchStrategy>,
}

/// Syntax highlighting: a highlighter, or `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum SyntaxHighlight {
    /// Named highlighter.
    Highlighter(Highlighter),
    /// Highlighting switched off (always `false`).
    Off(bool),
}

impl Default for SyntaxHighlight {
    fn default() -> Self {
        Self::Highlighter(Highlighter::default())
    }
}

/// Markdown pipeline options.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownConfig {
    /// Code block highlighting.
    pub syntax_highlight: SyntaxHighlight,
    /// GitHub-flavored markdown.
    pub gfm: bool,
    /// Typographic punctuation.
    pub smartypants: bool,
    /// Remark plugins (opaque).
    pub remark_plugins: Vec<Value>,
    /// Rehype plugins (opaque).
    pub rehype_plugins: Vec<Value>,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            syntax_highlight: SyntaxHighlight::default(),
            gfm: true,
            smartypants: true,
            remark_plugins: Vec::new(),
            rehype_plugins: Vec::new(),
        }
    }
}

/// A supported locale: a bare code or a path shared by several codes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum LocaleEntry {
    /// Locale code used as-is in paths.
    Code(String),
    /// Custom path shared by one or more codes.
    Group(LocaleGroup),
}

impl LocaleEntry {
    /// Locale codes this entry contributes to the locale set.
    #[must_use]
    pub fn codes(&self) -> Vec<&str> {
        match self {
            Self::Code(code) => vec![code.as_str()],
            Self::Group(group) => group.codes.iter().map(String::as_str).collect(),
        }
    }
}

/// Locale path with its codes (at least one after validation).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct LocaleGroup {
    /// URL path segment.
    pub path: String,
    /// Locale codes served under `path`.
    pub codes: Vec<String>,
}

/// i18n routing flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct I18nRouting {
    /// Prefix the default locale's routes too.
    pub prefix_default_locale: bool,
    /// Redirect `/` to the default locale.
    pub redirect_to_default_locale: bool,
    /// URL strategy.
    pub strategy: RoutingStrategy,
}

impl Default for I18nRouting {
    fn default() -> Self {
        Self {
            prefix_default_locale: false,
            redirect_to_default_locale: true,
            strategy: RoutingStrategy::default(),
        }
    }
}

/// Internationalized routing options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct I18nConfig {
    /// Locale served without fallback.
    pub default_locale: String,
    /// Supported locales in declaration order.
    pub locales: Vec<LocaleEntry>,
    /// Locale to fall back to, keyed by locale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<BTreeMap<String, String>>,
    /// Routing flags.
    pub routing: I18nRouting,
    /// Origin URL per locale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains: Option<BTreeMap<String, String>>,
}

impl I18nConfig {
    /// Every locale code derivable from `locales`, in declaration order.
    #[must_use]
    pub fn locale_codes(&self) -> Vec<&str> {
        self.locales.iter().flat_map(LocaleEntry::codes).collect()
    }

    /// Returns true when `code` is a known locale.
    #[must_use]
    pub fn has_locale(&self, code: &str) -> bool {
        self.locales
            .iter()
            .any(|entry| entry.codes().contains(&code))
    }
}

/// Experimental feature flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExperimentalFlags {
    /// Render scripts where they are declared.
    pub direct_render_script: bool,
    /// Persist content collection builds between runs.
    pub content_collection_cache: bool,
    /// Per-locale domains.
    pub i18n_domains: bool,
}

/// JSON Schema describing the normalized configuration.
#[must_use]
pub fn site_config_schema() -> Schema {
    schemars::schema_for!(SiteConfig)
}
