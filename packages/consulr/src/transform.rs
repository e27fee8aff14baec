//! Turning a KV listing into output pairs.
//!
//! The store answers a recursive GET with a JSON array of entries. Each entry
//! has its value decoded (optionally), is reduced to that value (optionally),
//! and has the node's key prefix stripped from its key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::Config;
use crate::error::{Error, Result};

/// One record of the store's recursive listing.
///
/// Fields other than `Key` and `Value` (`CreateIndex`, `Flags`, ...) are kept
/// as they came so the full-entry form can hand them back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KvEntry {
    #[serde(rename = "Key")]
    pub key: String,

    /// `null` for folder keys.
    #[serde(rename = "Value", default)]
    pub value: Option<String>,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl KvEntry {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            extra: serde_json::Map::new(),
        }
    }
}

/// What a key maps to in the result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TransformedValue {
    /// The (decoded) value alone.
    Value(Option<String>),
    /// The whole entry with its `Value` replaced by the decoded form.
    Entry(KvEntry),
}

impl TransformedValue {
    /// The decoded value, whichever form this is.
    pub fn value(&self) -> Option<&str> {
        match self {
            TransformedValue::Value(value) => value.as_deref(),
            TransformedValue::Entry(entry) => entry.value.as_deref(),
        }
    }
}

/// How to treat a response body that is not a valid entry list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyPolicy {
    /// Treat it as an empty listing.
    Lenient,
    /// Fail with [`Error::Json`].
    Strict,
}

/// Parse a response body into entries.
///
/// `None` (a tolerated non-200 response) is an empty listing.
pub fn parse_entries(body: Option<&str>, policy: BodyPolicy) -> Result<Vec<KvEntry>> {
    let Some(body) = body else {
        return Ok(Vec::new());
    };

    match serde_json::from_str::<Vec<KvEntry>>(body) {
        Ok(entries) => Ok(entries),
        Err(e) => match policy {
            BodyPolicy::Lenient => {
                warn!(error = %e, "malformed KV listing, treating as empty");
                Ok(Vec::new())
            }
            BodyPolicy::Strict => Err(Error::Json(e)),
        },
    }
}

/// Decode a base64 value into UTF-8 text.
///
/// Bytes that are not UTF-8 are an [`Error::Decode`], same as bad base64.
pub fn decode_value(key: &str, encoded: &str) -> Result<String> {
    let bytes = STANDARD.decode(encoded).map_err(|e| Error::Decode {
        key: key.to_string(),
        message: e.to_string(),
    })?;

    String::from_utf8(bytes).map_err(|e| Error::Decode {
        key: key.to_string(),
        message: e.to_string(),
    })
}

/// Remove a literal leading `prefix` from `key`. Keys that do not start with
/// it are returned unchanged.
pub fn strip_key<'a>(key: &'a str, prefix: &str) -> &'a str {
    key.strip_prefix(prefix).unwrap_or(key)
}

/// Per-entry transformation settings for one lookup.
#[derive(Debug, Clone)]
pub struct Transformer {
    value_only: bool,
    base64_decode: bool,
    key_prefix: String,
    policy: BodyPolicy,
}

impl Transformer {
    pub fn new(config: &Config, instance_prefix: &str) -> Self {
        Self {
            value_only: config.value_only,
            base64_decode: config.base64_decode,
            key_prefix: config.key_prefix(instance_prefix),
            policy: if config.strict_json {
                BodyPolicy::Strict
            } else {
                BodyPolicy::Lenient
            },
        }
    }

    /// Transform a single entry into its output key and value.
    pub fn transform_entry(&self, mut entry: KvEntry) -> Result<(String, TransformedValue)> {
        if self.base64_decode {
            if let Some(encoded) = &entry.value {
                entry.value = Some(decode_value(&entry.key, encoded)?);
            }
        }

        let key = strip_key(&entry.key, &self.key_prefix).to_string();
        let value = if self.value_only {
            TransformedValue::Value(entry.value)
        } else {
            TransformedValue::Entry(entry)
        };

        Ok((key, value))
    }

    /// Parse `body` and transform every entry in order.
    ///
    /// The first entry that fails to decode fails the whole listing.
    pub fn transform(&self, body: Option<&str>) -> Result<Vec<(String, TransformedValue)>> {
        parse_entries(body, self.policy)?
            .into_iter()
            .map(|entry| self.transform_entry(entry))
            .collect()
    }
}
