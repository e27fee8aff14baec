//! Error types for a KV lookup.
//!
//! Every variant is fatal to the lookup that produced it. [`Error::stage`]
//! tells callers which part of the pipeline failed.

use std::fmt;
use std::time::Duration;

/// The pipeline stage an [`Error`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Configuration,
    PrefixResolution,
    Transport,
    Transform,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Configuration => "configuration",
            Stage::PrefixResolution => "prefix resolution",
            Stage::Transport => "transport",
            Stage::Transform => "transform",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("consulr missing config: {}", .missing.join(", "))]
    Config { missing: Vec<String> },

    #[error("consulr invalid option '{name}': {message}")]
    InvalidOption { name: String, message: String },

    #[error("consulr facter prefix not found: {fact}")]
    PrefixNotFound { fact: String },

    #[error("consulr invalid URI '{uri}': {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },

    #[error("consulr HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("consulr timed out after {}s: {path}", .after.as_secs_f64())]
    Timeout { path: String, after: Duration },

    #[error("consulr exception: {path}: {message}")]
    Transport { path: String, message: String },

    #[error("consulr HTTP error: {path} ({status}: {status_text})")]
    Http {
        path: String,
        status: u16,
        status_text: String,
    },

    #[error("consulr JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("consulr decode error for key '{key}': {message}")]
    Decode { key: String, message: String },
}

impl Error {
    /// The stage of the pipeline that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            Error::Config { .. } | Error::InvalidOption { .. } => Stage::Configuration,
            Error::PrefixNotFound { .. } => Stage::PrefixResolution,
            Error::InvalidUri { .. }
            | Error::Client(_)
            | Error::Timeout { .. }
            | Error::Transport { .. }
            | Error::Http { .. } => Stage::Transport,
            Error::Json(_) | Error::Decode { .. } => Stage::Transform,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
