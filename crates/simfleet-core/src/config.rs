// ── Runtime panel configuration ──
//
// Describes *how* to reach the simulator backend and how the panel
// polls it. Built by the CLI/config crate and handed in -- core never
// reads config files.

use std::time::Duration;

use url::Url;

/// Configuration for a [`PanelController`](crate::PanelController).
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Backend root URL (e.g., `http://127.0.0.1:8000`).
    pub base_url: Url,
    /// Request timeout.
    pub timeout: Duration,
    /// Device + stats poll period in milliseconds. 0 = never poll.
    pub device_poll_ms: u64,
    /// Listener-message poll period in milliseconds, active only while
    /// the listener panel is open. 0 = never poll.
    pub listener_poll_ms: u64,
    /// When set, opening a new edit session over one with unsaved
    /// parameters fails with [`CoreError::UnsavedDraft`](crate::CoreError)
    /// instead of silently discarding the draft.
    pub guard_unsaved_drafts: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000"
                .parse()
                .expect("default URL is valid"),
            timeout: Duration::from_secs(30),
            device_poll_ms: 2000,
            listener_poll_ms: 1000,
            guard_unsaved_drafts: false,
        }
    }
}
