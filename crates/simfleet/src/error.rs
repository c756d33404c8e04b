//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use simfleet_config::ConfigError;
use simfleet_core::CoreError;

/// Exit codes per the CLI conventions.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend at {url}")]
    #[diagnostic(
        code(simfleet::connection_failed),
        help(
            "Check that the simulator backend is running and accessible.\n\
             URL: {url}\n\
             Override with --backend or SIMFLEET_BACKEND."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Request timed out")]
    #[diagnostic(
        code(simfleet::timeout),
        help("Increase the timeout with --timeout or check backend responsiveness.")
    )]
    Timeout,

    // ── Resources ────────────────────────────────────────────────────
    #[error("device '{uuid}' not found")]
    #[diagnostic(
        code(simfleet::not_found),
        help("Run: simfleet devices list to see available devices")
    )]
    DeviceNotFound { uuid: String },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Backend rejected the request: {message}")]
    #[diagnostic(code(simfleet::rejected))]
    Rejected { message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(simfleet::api_error))]
    ApiError { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(simfleet::validation))]
    Validation { field: String, reason: String },

    // ── Session / subscription ───────────────────────────────────────
    #[error("An edit session with unsaved parameters is open")]
    #[diagnostic(
        code(simfleet::unsaved_draft),
        help("Cancel the open session first, or disable editor.guard_unsaved_drafts.")
    )]
    UnsavedDraft,

    #[error("Subscription conflict: {message}")]
    #[diagnostic(
        code(simfleet::subscription),
        help("Only one listener subscription can be held at a time.")
    )]
    Subscription { message: String },

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(simfleet::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    #[diagnostic(code(simfleet::config))]
    Config { message: String },

    // ── IO ───────────────────────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::DeviceNotFound { .. } => exit_code::NOT_FOUND,
            Self::UnsavedDraft | Self::Subscription { .. } => exit_code::CONFLICT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::Timeout => CliError::Timeout,

            CoreError::ControllerStopped => CliError::ApiError {
                message: "panel controller is not running".into(),
            },

            CoreError::DeviceNotFound { uuid } => CliError::DeviceNotFound { uuid },

            CoreError::Rejected { message } => CliError::Rejected { message },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::AlreadySubscribed { topic } => CliError::Subscription {
                message: format!("already subscribed to '{topic}'"),
            },

            CoreError::NotSubscribed => CliError::Subscription {
                message: "no active subscription".into(),
            },

            CoreError::UnsavedDraft => CliError::UnsavedDraft,

            CoreError::SessionClosed => CliError::ApiError {
                message: "no edit session is open".into(),
            },

            CoreError::Api { message, .. } => CliError::ApiError { message },

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Internal(message) => CliError::ApiError { message },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config {
            message: err.to_string(),
        }
    }
}
