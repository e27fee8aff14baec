//! Fetching a node's KV tree.
//!
//! One recursive GET per lookup: `<uri>/v1/kv/<nodes_prefix>/<prefix>?recurse`,
//! with the token appended as a query parameter when one is configured.

use tracing::debug;
use url::form_urlencoded;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::executor::HttpExecutor;
use crate::types::HttpRequest;

/// Status codes that do not fail a lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tolerance {
    codes: Vec<u16>,
}

impl Tolerance {
    /// `200` is always accepted; `404` only when `ignore_404` is set.
    pub fn from_config(config: &Config) -> Self {
        let mut codes = vec![200];
        if config.ignore_404 {
            codes.push(404);
        }
        Self { codes }
    }

    pub fn accepts(&self, status: u16) -> bool {
        self.codes.contains(&status)
    }
}

/// Build the recursive KV request for the node identified by `prefix`.
pub fn kv_request(config: &Config, prefix: &str) -> Result<HttpRequest> {
    let base = format!("{}/v1/kv/{}/{}", config.uri, config.nodes_prefix, prefix);

    let mut raw = format!("{}?recurse", base);
    if let Some(token) = &config.token {
        raw.push_str("&token=");
        raw.extend(form_urlencoded::byte_serialize(token.as_bytes()));
    }

    let url = url::Url::parse(&raw).map_err(|source| Error::InvalidUri {
        uri: format!("{}/", base),
        source,
    })?;

    Ok(HttpRequest::get(url, format!("{}/", base)))
}

/// Fetch the node's entries.
///
/// Returns the body of a `200` response, or `None` for any other tolerated
/// status, whose body is never looked at.
pub fn fetch(
    executor: &dyn HttpExecutor,
    config: &Config,
    prefix: &str,
) -> Result<Option<String>> {
    let request = kv_request(config, prefix)?;
    let tolerance = Tolerance::from_config(config);

    debug!(path = %request.display_path, token = config.token.is_some(), "fetching KV tree");
    let response = executor.execute(&request)?;

    if !tolerance.accepts(response.status) {
        return Err(Error::Http {
            path: request.display_path,
            status: response.status,
            status_text: response.status_text,
        });
    }

    if response.status != 200 {
        debug!(status = response.status, "tolerated status, treating as empty");
        return Ok(None);
    }

    Ok(response.body_text)
}
