//! Lookup configuration.
//!
//! [`Config`] is the fully populated option table. Callers describe what they
//! want to change with [`ConfigOverrides`], which deserializes from the same
//! option names, and [`Config::resolve`] overlays one on the other.

use std::time::Duration;

use serde::{Deserialize, Deserializer};

use crate::error::{Error, Result};

pub const DEFAULT_URI: &str = "http://localhost:8500";
pub const DEFAULT_NODES_PREFIX: &str = "nodes";
pub const DEFAULT_FACTER_PREFIX: &str = "hostname";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Options that must be supplied by the caller. Nothing is mandatory today.
pub const REQUIRED_OPTIONS: &[&str] = &[];

/// Fully resolved configuration for one lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the KV store, without a trailing slash.
    pub uri: String,
    /// Top-level path segment the per-node trees live under.
    pub nodes_prefix: String,
    /// Name of the fact whose value selects the node tree.
    pub facter_prefix: String,
    /// Emit the decoded value alone instead of the whole entry.
    pub value_only: bool,
    /// Decode values from base64 before returning them.
    pub base64_decode: bool,
    /// Treat a 404 from the store as an empty result.
    pub ignore_404: bool,
    /// ACL token, sent as the `token` query parameter.
    pub token: Option<String>,
    /// Deadline for the whole request. `None` means no deadline.
    pub timeout: Option<Duration>,
    /// Fail on a malformed response body instead of returning an empty map.
    pub strict_json: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            uri: DEFAULT_URI.to_string(),
            nodes_prefix: DEFAULT_NODES_PREFIX.to_string(),
            facter_prefix: DEFAULT_FACTER_PREFIX.to_string(),
            value_only: true,
            base64_decode: true,
            ignore_404: true,
            token: None,
            timeout: Some(DEFAULT_TIMEOUT),
            strict_json: false,
        }
    }
}

impl Config {
    /// Overlay `overrides` on the defaults and check that every option in
    /// `required` was supplied by the caller.
    ///
    /// All missing options are reported together in a single
    /// [`Error::Config`].
    pub fn resolve(overrides: &ConfigOverrides, required: &[&str]) -> Result<Self> {
        let provided = overrides.provided();
        let mut missing: Vec<String> = Vec::new();
        for name in required {
            if !provided.iter().any(|p| p == name) && !missing.iter().any(|m| m == name) {
                missing.push(name.to_string());
            }
        }
        if !missing.is_empty() {
            return Err(Error::Config { missing });
        }

        let mut config = Config::default();
        if let Some(uri) = &overrides.uri {
            config.uri = uri.trim_end_matches('/').to_string();
        }
        if let Some(nodes_prefix) = &overrides.nodes_prefix {
            config.nodes_prefix = nodes_prefix.clone();
        }
        if let Some(facter_prefix) = &overrides.facter_prefix {
            config.facter_prefix = facter_prefix.clone();
        }
        if let Some(value_only) = overrides.value_only {
            config.value_only = value_only;
        }
        if let Some(base64_decode) = overrides.base64_decode {
            config.base64_decode = base64_decode;
        }
        if let Some(ignore_404) = overrides.ignore_404 {
            config.ignore_404 = ignore_404;
        }
        if let Some(token) = &overrides.token {
            config.token = token.clone().filter(|t| !t.is_empty());
        }
        if let Some(seconds) = overrides.timeout {
            config.timeout = timeout_from_secs(seconds)?;
        }
        if let Some(strict_json) = overrides.strict_json {
            config.strict_json = strict_json;
        }

        Ok(config)
    }

    /// The literal key prefix stripped from every entry:
    /// `<nodes_prefix>/<instance_prefix>/`.
    pub fn key_prefix(&self, instance_prefix: &str) -> String {
        format!("{}/{}/", self.nodes_prefix, instance_prefix)
    }
}

/// Zero seconds disables the deadline.
fn timeout_from_secs(seconds: f64) -> Result<Option<Duration>> {
    let timeout = Duration::try_from_secs_f64(seconds).map_err(|e| Error::InvalidOption {
        name: "timeout".to_string(),
        message: format!("{} is not a valid number of seconds ({})", seconds, e),
    })?;
    Ok((!timeout.is_zero()).then_some(timeout))
}

/// Caller-supplied option overrides.
///
/// Absent fields keep their default. Unknown keys are ignored when
/// deserializing.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ConfigOverrides {
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub nodes_prefix: Option<String>,
    #[serde(default)]
    pub facter_prefix: Option<String>,
    #[serde(default)]
    pub value_only: Option<bool>,
    #[serde(default)]
    pub base64_decode: Option<bool>,
    #[serde(default)]
    pub ignore_404: Option<bool>,
    /// `Some(None)` means the caller explicitly asked for no token
    /// (`"token": false` or `null`).
    #[serde(default, deserialize_with = "deserialize_token")]
    pub token: Option<Option<String>>,
    /// Seconds, integer or fractional. `0` disables the deadline.
    #[serde(default)]
    pub timeout: Option<f64>,
    #[serde(default)]
    pub strict_json: Option<bool>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduced form taking only the store location. A 404 is always an error.
    pub fn positional(uri: impl Into<String>, nodes_prefix: impl Into<String>) -> Self {
        Self {
            uri: Some(uri.into()),
            nodes_prefix: Some(nodes_prefix.into()),
            ignore_404: Some(false),
            token: Some(None),
            timeout: Some(DEFAULT_TIMEOUT.as_secs_f64()),
            ..Default::default()
        }
    }

    /// Reduced form that also names the fact. A 404 is always tolerated.
    pub fn positional_with_fact(
        uri: impl Into<String>,
        nodes_prefix: impl Into<String>,
        facter_prefix: impl Into<String>,
    ) -> Self {
        Self {
            facter_prefix: Some(facter_prefix.into()),
            ignore_404: Some(true),
            ..Self::positional(uri, nodes_prefix)
        }
    }

    /// Parse overrides from a JSON object.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| Error::InvalidOption {
            name: "overrides".to_string(),
            message: e.to_string(),
        })
    }

    /// Base URL of the store.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Top-level folder the node trees live under.
    pub fn with_nodes_prefix(mut self, nodes_prefix: impl Into<String>) -> Self {
        self.nodes_prefix = Some(nodes_prefix.into());
        self
    }

    /// Fact naming the node tree.
    pub fn with_facter_prefix(mut self, facter_prefix: impl Into<String>) -> Self {
        self.facter_prefix = Some(facter_prefix.into());
        self
    }

    /// Return bare values (`true`) or whole entries (`false`).
    pub fn with_value_only(mut self, value_only: bool) -> Self {
        self.value_only = Some(value_only);
        self
    }

    /// Decode values from base64.
    pub fn with_base64_decode(mut self, base64_decode: bool) -> Self {
        self.base64_decode = Some(base64_decode);
        self
    }

    /// Treat a 404 as an empty result.
    pub fn with_ignore_404(mut self, ignore_404: bool) -> Self {
        self.ignore_404 = Some(ignore_404);
        self
    }

    /// ACL token for the request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(Some(token.into()));
        self
    }

    /// Request deadline. `Duration::ZERO` disables it.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout.as_secs_f64());
        self
    }

    /// Fail on a malformed response body.
    pub fn with_strict_json(mut self, strict_json: bool) -> Self {
        self.strict_json = Some(strict_json);
        self
    }

    /// Names of the options this override set supplies.
    pub fn provided(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.uri.is_some() {
            names.push("uri");
        }
        if self.nodes_prefix.is_some() {
            names.push("nodes_prefix");
        }
        if self.facter_prefix.is_some() {
            names.push("facter_prefix");
        }
        if self.value_only.is_some() {
            names.push("value_only");
        }
        if self.base64_decode.is_some() {
            names.push("base64_decode");
        }
        if self.ignore_404.is_some() {
            names.push("ignore_404");
        }
        if self.token.is_some() {
            names.push("token");
        }
        if self.timeout.is_some() {
            names.push("timeout");
        }
        if self.strict_json.is_some() {
            names.push("strict_json");
        }
        names
    }
}

fn deserialize_token<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Token {
        Value(String),
        Flag(bool),
    }

    match Option::<Token>::deserialize(deserializer)? {
        Some(Token::Value(token)) => Ok(Some(Some(token))),
        Some(Token::Flag(false)) | None => Ok(Some(None)),
        Some(Token::Flag(true)) => Err(serde::de::Error::custom("token must be a string or false")),
    }
}
