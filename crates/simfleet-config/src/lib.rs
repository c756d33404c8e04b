//! Shared configuration for the simfleet CLI.
//!
//! A TOML file under the platform config directory plus `SIMFLEET_`
//! environment overrides, translated into `simfleet_core::PanelConfig`.
//! The backend is unauthenticated, so there is no credential chain --
//! configuration is just the URL and the panel's tuning knobs.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use simfleet_core::PanelConfig;

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Backend root URL.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub polling: Polling,

    #[serde(default)]
    pub editor: Editor,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            timeout: default_timeout(),
            polling: Polling::default(),
            editor: Editor::default(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Polling {
    /// Device + stats poll period in milliseconds. 0 disables polling.
    #[serde(default = "default_devices_ms")]
    pub devices_ms: u64,

    /// Listener-message poll period in milliseconds.
    #[serde(default = "default_listener_ms")]
    pub listener_ms: u64,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            devices_ms: default_devices_ms(),
            listener_ms: default_listener_ms(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Editor {
    /// Refuse to replace an edit session holding unsaved parameters.
    #[serde(default)]
    pub guard_unsaved_drafts: bool,
}

fn default_backend() -> String {
    "http://127.0.0.1:8000".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_devices_ms() -> u64 {
    2000
}
fn default_listener_ms() -> u64 {
    1000
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("io", "simfleet", "simfleet").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("simfleet");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("SIMFLEET_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning defaults if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

// ── Translation to the core config ──────────────────────────────────

/// Build a `PanelConfig` from the loaded configuration.
pub fn to_panel_config(cfg: &Config) -> Result<PanelConfig, ConfigError> {
    let base_url: url::Url = cfg.backend.parse().map_err(|_| ConfigError::Validation {
        field: "backend".into(),
        reason: format!("invalid URL: {}", cfg.backend),
    })?;

    Ok(PanelConfig {
        base_url,
        timeout: Duration::from_secs(cfg.timeout),
        device_poll_ms: cfg.polling.devices_ms,
        listener_poll_ms: cfg.polling.listener_ms,
        guard_unsaved_drafts: cfg.editor.guard_unsaved_drafts,
    })
}
