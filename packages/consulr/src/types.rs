/// An outbound GET against the KV store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    /// Full request URL, query string included.
    pub url: String,

    /// URL safe to show in logs and errors: the KV path without the query
    /// string, so a token never leaks.
    pub display_path: String,
}

impl HttpRequest {
    /// A GET for `url`, reported as `display_path`.
    pub fn get(url: impl Into<String>, display_path: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            display_path: display_path.into(),
        }
    }
}

/// HTTP response from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,

    /// Status text (e.g., "OK", "Not Found")
    pub status_text: String,

    /// Raw body, if one was read
    pub body_text: Option<String>,
}

impl HttpResponse {
    /// Build a response whose status text is the canonical reason phrase.
    pub fn with_status(status: u16, body_text: Option<String>) -> Self {
        let status_text = http::StatusCode::from_u16(status)
            .ok()
            .and_then(|s| s.canonical_reason())
            .unwrap_or("Unknown")
            .to_string();

        Self {
            status,
            status_text,
            body_text,
        }
    }

    /// A `200 OK` carrying `body_text`.
    pub fn ok(body_text: impl Into<String>) -> Self {
        Self::with_status(200, Some(body_text.into()))
    }
}
