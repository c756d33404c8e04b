// ── Core error types ──
//
// User-facing errors from simfleet-core. Consumers never see HTTP
// status codes or JSON parse failures directly; the
// `From<simfleet_api::Error>` impl translates transport-layer errors
// into domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach backend at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Controller stopped")]
    ControllerStopped,

    // ── Data errors ──────────────────────────────────────────────────
    #[error("Device not found: {uuid}")]
    DeviceNotFound { uuid: String },

    // ── Operation errors ─────────────────────────────────────────────
    /// The backend rejected a mutation; `message` is the server's
    /// `detail`, surfaced verbatim so the operator can correct and retry.
    #[error("Rejected by backend: {message}")]
    Rejected { message: String },

    /// Caught before any network call was made.
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Session / subscription state errors ──────────────────────────
    #[error("Already subscribed to '{topic}' -- unsubscribe first")]
    AlreadySubscribed { topic: String },

    #[error("No active subscription")]
    NotSubscribed,

    #[error("No edit session is open")]
    SessionClosed,

    /// Only raised when `PanelConfig::guard_unsaved_drafts` is set.
    #[error("An edit session with unsaved parameters is open -- cancel it first")]
    UnsavedDraft,

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api { message: String, status: Option<u16> },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<simfleet_api::Error> for CoreError {
    fn from(err: simfleet_api::Error) -> Self {
        match err {
            simfleet_api::Error::Transport(ref e) => {
                if e.is_timeout() {
                    CoreError::Timeout
                } else if e.is_connect() {
                    CoreError::ConnectionFailed {
                        url: e
                            .url()
                            .map(|u| u.to_string())
                            .unwrap_or_else(|| "<unknown>".into()),
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            simfleet_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            // Client errors carry the backend's `detail` verbatim.
            simfleet_api::Error::Api { status, detail } if (400..500).contains(&status) => {
                CoreError::Rejected { message: detail }
            }
            simfleet_api::Error::Api { status, detail } => CoreError::Api {
                message: detail,
                status: Some(status),
            },
            simfleet_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_rejected_with_detail() {
        let err = CoreError::from(simfleet_api::Error::Api {
            status: 400,
            detail: "Device with this UUID already exists".into(),
        });
        match err {
            CoreError::Rejected { message } => {
                assert_eq!(message, "Device with this UUID already exists");
            }
            other => panic!("expected Rejected, got: {other:?}"),
        }
    }

    #[test]
    fn server_errors_keep_their_status() {
        let err = CoreError::from(simfleet_api::Error::Api {
            status: 500,
            detail: "boom".into(),
        });
        match err {
            CoreError::Api { status, .. } => assert_eq!(status, Some(500)),
            other => panic!("expected Api, got: {other:?}"),
        }
    }
}
