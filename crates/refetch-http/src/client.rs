// Production HTTP transport
//
// Wraps `reqwest::Client` with endpoint URL construction and response
// decoding. All failure modes resolve to `Error` values -- the returned
// future has no rejection path of its own.

use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::{Transport, TransportConfig};

/// POST-JSON transport over `reqwest`.
///
/// Endpoint identifiers are paths joined onto the base URL. Successful
/// responses are decoded as JSON (an empty body decodes to `Null`);
/// non-success statuses become [`Error::Endpoint`] with the body's
/// top-level `message` field preserved as `detail`.
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport from a base URL and a `TransportConfig`.
    pub fn new(base_url: Url, config: &TransportConfig) -> Result<Self, Error> {
        let http = config.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a transport with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the full URL for an endpoint path.
    fn endpoint_url(&self, endpoint: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(endpoint)?)
    }

    /// Decode a response into the result value or a structured error.
    async fn decode(resp: reqwest::Response) -> Result<Value, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(endpoint_error(status, &body));
        }

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body).map_err(|e| {
            // Char-boundary safe preview of the offending body.
            let preview: String = body.chars().take(200).collect();
            Error::Deserialization {
                message: format!("{e} (body preview: {preview:?})"),
                body,
            }
        })
    }
}

/// Map a non-success response into `Error::Endpoint`.
///
/// The body's top-level `message` field (when the body is a JSON object)
/// becomes `detail`, so consumers can prefer the service's own wording.
fn endpoint_error(status: StatusCode, body: &str) -> Error {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .as_ref()
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .map(String::from);

    let message = detail.clone().unwrap_or_else(|| {
        status
            .canonical_reason()
            .map_or_else(|| format!("{}", status.as_u16()), String::from)
    });

    Error::Endpoint {
        status: status.as_u16(),
        message,
        detail,
    }
}

impl Transport for HttpTransport {
    async fn send(&self, endpoint: &str, params: Value) -> Result<Value, Error> {
        let url = self.endpoint_url(endpoint)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .json(&params)
            .send()
            .await
            .map_err(Error::Transport)?;

        Self::decode(resp).await
    }
}
