//! Raw config loading helpers (file text + inline overrides).
//!
//! Loading only produces an untyped raw value; every shape check happens in
//! `validate_config`. Errors surface as typed `ErrorEnvelope`s.

use crate::schema::SiteConfig;
use crate::violation::ConfigMisuseError;
use serde_json::{Map, Value};
use sitecfg_shared::{ErrorCode, ErrorEnvelope, ResultExt};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

/// Parse raw config JSON text.
pub fn parse_raw_config_json(input: &str) -> Result<Value, ErrorEnvelope> {
    serde_json::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_json"),
            format!("invalid config JSON: {error}"),
        )
        .with_metadata("source", "config")
    })
}

/// Parse raw config TOML text.
pub fn parse_raw_config_toml(input: &str) -> Result<Value, ErrorEnvelope> {
    toml::from_str(input).map_err(|error| {
        ErrorEnvelope::expected(
            ErrorCode::new("config", "invalid_toml"),
            format!("invalid config TOML: {error}"),
        )
        .with_metadata("source", "config")
    })
}

/// Read and parse a raw config file; the format follows the extension.
pub fn load_raw_config_from_path(path: &Path) -> Result<Value, ErrorEnvelope> {
    let format = detect_config_format(path)?;
    let text = read_config_file(path)?;
    let raw = match format {
        ConfigFormat::Json => parse_raw_config_json(&text),
        ConfigFormat::Toml => parse_raw_config_toml(&text),
    };
    raw.with_metadata("path", path.to_string_lossy())
}

/// Serialize a normalized config as deterministic pretty JSON (with trailing newline).
pub fn to_pretty_json(config: &SiteConfig) -> Result<String, ErrorEnvelope> {
    let mut output = serde_json::to_string_pretty(config).map_err(|error| {
        ErrorEnvelope::unexpected(
            ErrorCode::internal(),
            format!("failed to serialize config: {error}"),
        )
    })?;
    output.push('\n');
    Ok(output)
}

fn read_config_file(path: &Path) -> Result<String, ErrorEnvelope> {
    std::fs::read_to_string(path).map_err(|error| {
        let code = match error.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::new("config", "config_file_not_found"),
            std::io::ErrorKind::PermissionDenied => {
                ErrorCode::new("config", "config_file_permission_denied")
            },
            _ => ErrorCode::new("config", "config_file_io"),
        };

        ErrorEnvelope::expected(code, format!("failed to read config file: {error}"))
            .with_metadata("path", path.to_string_lossy().to_string())
    })
}

fn detect_config_format(path: &Path) -> Result<ConfigFormat, ErrorEnvelope> {
    let ext = path
        .extension()
        .and_then(|value| value.to_str())
        .map(str::to_ascii_lowercase);
    match ext.as_deref() {
        Some("json") => Ok(ConfigFormat::Json),
        Some("toml") => Ok(ConfigFormat::Toml),
        other => Err(ErrorEnvelope::expected(
            ErrorCode::new("config", "unsupported_format"),
            "unsupported config format; use .json or .toml",
        )
        .with_metadata("extension", other.unwrap_or_default().to_owned())),
    }
}

/// Deep-merge `overrides` into `base`.
///
/// Objects merge key by key; any other value (arrays included) replaces the
/// base value wholesale.
pub fn merge_raw_config(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Object(base), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match base.get_mut(key) {
                    Some(existing) => merge_raw_config(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    },
                }
            }
        },
        (base, overrides) => *base = overrides.clone(),
    }
}

/// Raw, unconverted override flag values as typed on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineFlags {
    /// `--root`.
    pub root: Option<String>,
    /// `--site`.
    pub site: Option<String>,
    /// `--base`.
    pub base: Option<String>,
    /// `--port`.
    pub port: Option<String>,
    /// `--host`; `true`/`false` toggle all interfaces, anything else is an address.
    pub host: Option<String>,
    /// `--out-dir`.
    pub out_dir: Option<String>,
    /// `--public-dir`.
    pub public_dir: Option<String>,
}

/// Converted inline overrides, ready to merge over file content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InlineOverrides {
    root: Option<String>,
    site: Option<String>,
    base: Option<String>,
    port: Option<u16>,
    host: Option<Value>,
    out_dir: Option<String>,
    public_dir: Option<String>,
}

impl InlineOverrides {
    /// Convert raw flags. A port that is not a number is a misuse error.
    pub fn from_flags(flags: &InlineFlags) -> Result<Self, ConfigMisuseError> {
        let port = flags
            .port
            .as_deref()
            .map(|raw| {
                raw.trim().parse::<u16>().map_err(|_| ConfigMisuseError::InvalidFlag {
                    flag: "port",
                    value: raw.to_owned(),
                    expected: "a port number between 0 and 65535",
                })
            })
            .transpose()?;
        let host = flags.host.as_deref().map(|raw| match raw {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            address => Value::String(address.to_owned()),
        });

        Ok(Self {
            root: flags.root.clone(),
            site: flags.site.clone(),
            base: flags.base.clone(),
            port,
            host,
            out_dir: flags.out_dir.clone(),
            public_dir: flags.public_dir.clone(),
        })
    }

    /// Returns true when no flag was given.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Overrides as a partial raw config.
    #[must_use]
    pub fn to_raw(&self) -> Value {
        let mut raw = Map::new();
        let mut put = |key: &str, value: Option<Value>| {
            if let Some(value) = value {
                raw.insert(key.to_owned(), value);
            }
        };
        put("root", self.root.clone().map(Value::String));
        put("site", self.site.clone().map(Value::String));
        put("base", self.base.clone().map(Value::String));
        put("outDir", self.out_dir.clone().map(Value::String));
        put("publicDir", self.public_dir.clone().map(Value::String));

        let mut server = Map::new();
        if let Some(port) = self.port {
            server.insert("port".to_owned(), Value::from(port));
        }
        if let Some(host) = &self.host {
            server.insert("host".to_owned(), host.clone());
        }
        if !server.is_empty() {
            raw.insert("server".to_owned(), Value::Object(server));
        }
        Value::Object(raw)
    }

    /// Merge these overrides over `raw` and return the result.
    ///
    /// A non-object `raw` is returned untouched so validation can reject it.
    #[must_use]
    pub fn apply(&self, mut raw: Value) -> Value {
        if raw.is_object() && !self.is_empty() {
            merge_raw_config(&mut raw, &self.to_raw());
        }
        raw
    }
}
