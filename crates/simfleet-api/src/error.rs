use thiserror::Error;

/// Top-level error type for the `simfleet-api` crate.
///
/// Covers every failure mode of the backend HTTP surface: transport,
/// URL construction, rejected requests, and body decoding.
/// `simfleet-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Backend ─────────────────────────────────────────────────────
    /// Non-success response from the backend. `detail` is the server's
    /// `{detail}` message when present, or a generic fallback.
    #[error("API error (HTTP {status}): {detail}")]
    Api { status: u16, detail: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// The server-supplied rejection detail, if this was a rejected request.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Api { detail, .. } => Some(detail),
            _ => None,
        }
    }
}
