//! Command dispatch and shared helpers.

use std::io::IsTerminal;

use simfleet_core::{PanelConfig, PanelController};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub mod config_cmd;
pub mod devices;
pub mod mqtt;
pub mod stats;

/// Route a parsed command to its handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Devices(args) => devices::handle(args, global).await,
        Command::Mqtt(args) => mqtt::handle(args, global).await,
        Command::Stats => stats::handle(global).await,
        Command::Config(args) => config_cmd::handle(args, global),
    }
}

/// Build a `PanelConfig` from the config file plus CLI flag overrides.
pub fn panel_config(global: &GlobalOpts) -> Result<PanelConfig, CliError> {
    let cfg = simfleet_config::load_config_or_default();
    let mut panel = simfleet_config::to_panel_config(&cfg)?;

    if let Some(ref backend) = global.backend {
        panel.base_url = backend.parse().map_err(|_| CliError::Validation {
            field: "backend".into(),
            reason: format!("invalid URL: {backend}"),
        })?;
    }
    if let Some(timeout) = global.timeout {
        panel.timeout = std::time::Duration::from_secs(timeout);
    }

    Ok(panel)
}

/// One-shot controller run with the resolved configuration.
pub async fn oneshot<F, Fut, T>(global: &GlobalOpts, f: F) -> Result<T, CliError>
where
    F: FnOnce(PanelController) -> Fut,
    Fut: std::future::Future<Output = Result<T, simfleet_core::CoreError>>,
{
    let config = panel_config(global)?;
    PanelController::oneshot(config, f).await.map_err(Into::into)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Refuses in non-interactive contexts instead of blocking on a pipe.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: message.to_owned(),
        });
    }

    eprint!("{message} [y/N] ");
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes" | "YES"))
}
