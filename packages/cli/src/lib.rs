//! # consulr-cli
//!
//! Runs one consulr lookup from the command line and prints the resulting
//! map as JSON.
//!
//! Options are layered: defaults, then the `--config` JSON file, then
//! individual flags. Facts come from `--fact name=value` pairs first and
//! `FACTER_<name>` environment variables second.

use std::path::PathBuf;

use clap::Parser;
use consulr::{ChainedFacts, ConfigOverrides, EnvFacts, KvMap, StaticFacts};
use tracing::debug;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("cannot read config file {path}: {source}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid fact '{0}', expected name=value")]
    InvalidFact(String),

    #[error(transparent)]
    Lookup(#[from] consulr::Error),

    #[error("cannot render result: {0}")]
    Render(#[from] serde_json::Error),
}

/// consulr - fetch a node's configuration from Consul KV
#[derive(Parser, Debug)]
#[command(name = "consulr")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// JSON file with option overrides
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Base URL of the Consul agent
    #[arg(long)]
    pub uri: Option<String>,

    /// Top-level KV folder holding per-node trees
    #[arg(long)]
    pub nodes_prefix: Option<String>,

    /// Fact whose value names this node's tree
    #[arg(long)]
    pub facter_prefix: Option<String>,

    /// ACL token sent with the request
    #[arg(long, env = "CONSULR_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Request timeout in seconds; 0 disables it
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<f64>,

    /// Return whole entries instead of bare values
    #[arg(long)]
    pub full_entries: bool,

    /// Leave values base64-encoded
    #[arg(long)]
    pub raw_values: bool,

    /// Fail when the node has no keys (HTTP 404)
    #[arg(long)]
    pub fail_on_404: bool,

    /// Fail on a malformed response instead of returning an empty map
    #[arg(long)]
    pub strict_json: bool,

    /// Fact as name=value; may be repeated
    #[arg(long = "fact", value_name = "NAME=VALUE")]
    pub facts: Vec<String>,

    /// Print compact JSON
    #[arg(long)]
    pub compact: bool,
}

impl Args {
    /// Merge the config file (if any) and the flags into one override set.
    pub fn overrides(&self) -> Result<ConfigOverrides, Error> {
        let mut overrides = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
                    path: path.clone(),
                    source,
                })?;
                debug!(path = %path.display(), "loaded config file");
                ConfigOverrides::from_json(&text)?
            }
            None => ConfigOverrides::new(),
        };

        if let Some(uri) = &self.uri {
            overrides = overrides.with_uri(uri.clone());
        }
        if let Some(nodes_prefix) = &self.nodes_prefix {
            overrides = overrides.with_nodes_prefix(nodes_prefix.clone());
        }
        if let Some(facter_prefix) = &self.facter_prefix {
            overrides = overrides.with_facter_prefix(facter_prefix.clone());
        }
        if let Some(token) = &self.token {
            overrides = overrides.with_token(token.clone());
        }
        if let Some(seconds) = self.timeout {
            overrides.timeout = Some(seconds);
        }
        if self.full_entries {
            overrides = overrides.with_value_only(false);
        }
        if self.raw_values {
            overrides = overrides.with_base64_decode(false);
        }
        if self.fail_on_404 {
            overrides = overrides.with_ignore_404(false);
        }
        if self.strict_json {
            overrides = overrides.with_strict_json(true);
        }

        Ok(overrides)
    }

    /// `--fact` pairs layered over the environment.
    pub fn fact_source(&self) -> Result<ChainedFacts, Error> {
        let mut explicit = StaticFacts::new();
        for fact in &self.facts {
            let (name, value) = parse_fact(fact)?;
            explicit.insert(name, value);
        }

        Ok(ChainedFacts::new()
            .with_source(explicit)
            .with_source(EnvFacts::new()))
    }
}

/// Split a `name=value` fact argument.
pub fn parse_fact(arg: &str) -> Result<(&str, &str), Error> {
    match arg.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name, value)),
        _ => Err(Error::InvalidFact(arg.to_string())),
    }
}

pub fn render(map: &KvMap, compact: bool) -> Result<String, Error> {
    let text = if compact {
        serde_json::to_string(map)?
    } else {
        serde_json::to_string_pretty(map)?
    };
    Ok(text)
}

/// Run the lookup described by `args` and return the rendered result.
pub fn run(args: &Args) -> Result<String, Error> {
    let overrides = args.overrides()?;
    let facts = args.fact_source()?;
    let map = consulr::consulr_kv(&overrides, &facts)?;
    render(&map, args.compact)
}
