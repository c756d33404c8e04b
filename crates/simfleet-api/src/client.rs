// Backend HTTP client
//
// Wraps `reqwest::Client` with simfleet-specific URL construction and
// `{detail}` error-body handling. All endpoint modules (devices, mqtt,
// stats) are implemented as inherent methods via separate files to keep
// this module focused on transport mechanics.

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::ErrorDetail;
use crate::transport::TransportConfig;

/// Raw HTTP client for the simulator backend's `/api` surface.
///
/// Rejected requests arrive as non-2xx responses carrying a `{detail}`
/// body; this client extracts the detail (or falls back to a generic
/// message) so callers only ever see [`Error::Api`] for them.
pub struct PanelClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PanelClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the backend root (e.g. `http://127.0.0.1:8000`);
    /// the `/api` prefix is appended per request.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Build a full URL for an API path: `{base}/api/{path}`.
    pub(crate) fn api_url(&self, path: &str) -> Url {
        let full = format!(
            "{}/api/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path
        );
        Url::parse(&full).expect("invalid API URL")
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Send a GET request and decode the JSON body.
    pub(crate) async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = self.http.get(url).send().await.map_err(Error::Transport)?;
        Self::parse_body(resp).await
    }

    /// Send a POST request with a JSON body and decode the reply.
    pub(crate) async fn post<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::parse_body(resp).await
    }

    /// Send a bodyless POST request and decode the reply.
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("POST {}", url);
        let resp = self.http.post(url).send().await.map_err(Error::Transport)?;
        Self::parse_body(resp).await
    }

    /// Send a POST request with a JSON body, discarding any reply body.
    pub(crate) async fn post_unit(&self, url: Url, body: &impl Serialize) -> Result<(), Error> {
        debug!("POST {}", url);
        let resp = self
            .http
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::expect_success(resp).await
    }

    /// Send a PUT request with a JSON body and decode the reply.
    pub(crate) async fn put<T: DeserializeOwned>(
        &self,
        url: Url,
        body: &impl Serialize,
    ) -> Result<T, Error> {
        debug!("PUT {}", url);
        let resp = self
            .http
            .put(url)
            .json(body)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::parse_body(resp).await
    }

    /// Send a DELETE request and decode the reply.
    pub(crate) async fn delete<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("DELETE {}", url);
        let resp = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::parse_body(resp).await
    }

    /// Send a DELETE request, discarding any reply body.
    pub(crate) async fn delete_unit(&self, url: Url) -> Result<(), Error> {
        debug!("DELETE {}", url);
        let resp = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::expect_success(resp).await
    }

    /// Send a multipart POST (single file part named `file`).
    pub(crate) async fn post_multipart<T: DeserializeOwned>(
        &self,
        url: Url,
        file_name: String,
        bytes: Vec<u8>,
    ) -> Result<T, Error> {
        debug!("POST {} (multipart)", url);
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(Error::Transport)?;
        Self::parse_body(resp).await
    }

    // ── Response handling ────────────────────────────────────────────

    /// Decode a 2xx JSON body, or turn a non-2xx response into
    /// [`Error::Api`] with the server's `{detail}` message.
    async fn parse_body<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if !status.is_success() {
            return Err(Self::api_error(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }

    /// Check for a 2xx response without requiring a decodable body.
    async fn expect_success(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp.text().await.unwrap_or_default();
        Err(Self::api_error(status, &body))
    }

    /// Extract `{detail}` from an error body, falling back to a generic
    /// message with the HTTP status.
    fn api_error(status: reqwest::StatusCode, body: &str) -> Error {
        let detail = serde_json::from_str::<ErrorDetail>(body)
            .ok()
            .and_then(|d| d.detail)
            .unwrap_or_else(|| format!("request failed with HTTP {}", status.as_u16()));
        Error::Api {
            status: status.as_u16(),
            detail,
        }
    }
}
