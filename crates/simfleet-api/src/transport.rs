// Shared transport configuration for building reqwest::Client instances.
//
// The backend is a plain HTTP service on the local network, so there is
// no TLS or cookie handling to configure -- only timeout and identity.

use std::time::Duration;

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, crate::error::Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent("simfleet/0.1.0")
            .build()
            .map_err(crate::error::Error::Transport)
    }
}
