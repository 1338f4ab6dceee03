use thiserror::Error;

/// Top-level error type for the `refetch-http` crate.
///
/// Covers every failure mode of a request: client construction, transport,
/// endpoint-reported errors, and response decoding. `refetch-core` stores
/// these in its observable error cells and classifies them for user-facing
/// notifications.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing or joining error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS configuration or client construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Endpoint ────────────────────────────────────────────────────
    /// The endpoint answered with a non-success status.
    ///
    /// `detail` carries the response body's top-level `message` field when
    /// the body was a JSON object that had one.
    #[error("Endpoint error (HTTP {status}): {message}")]
    Endpoint {
        status: u16,
        message: String,
        detail: Option<String>,
    },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// The HTTP status code, if this error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Endpoint { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The endpoint-supplied error message nested in the response body,
    /// if there was one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Endpoint { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if the endpoint reported a server-side failure.
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }
}
