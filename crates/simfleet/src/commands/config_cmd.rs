//! Config command handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => {
            let path = simfleet_config::config_path();
            if path.exists() {
                if !global.quiet {
                    eprintln!("Config already exists at {}", path.display());
                }
                return Ok(());
            }
            simfleet_config::save_config(&simfleet_config::Config::default())?;
            if !global.quiet {
                eprintln!("Wrote default config to {}", path.display());
            }
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = simfleet_config::load_config()?;
            let text = toml::to_string_pretty(&cfg).map_err(|e| CliError::Config {
                message: e.to_string(),
            })?;
            println!("{text}");
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", simfleet_config::config_path().display());
            Ok(())
        }
    }
}
