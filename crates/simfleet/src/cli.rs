//! Clap derive structures for the `simfleet` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// simfleet -- control panel for a fleet of simulated MQTT devices
#[derive(Debug, Parser)]
#[command(
    name = "simfleet",
    version,
    about = "Manage a fleet of simulated MQTT telemetry devices",
    long_about = "A command-line panel for the simfleet device-simulator backend.\n\n\
        Devices, their parameter-generation config, and the broker relay all\n\
        live server-side; this tool drives them over the backend's HTTP API.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Backend root URL (overrides the config file)
    #[arg(long, short = 'b', env = "SIMFLEET_BACKEND", global = true)]
    pub backend: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "SIMFLEET_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds
    #[arg(long, env = "SIMFLEET_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage simulated devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Bus operations: publish, listen, message buffer
    Mqtt(MqttArgs),

    /// Broker connectivity and fleet counters
    Stats,

    /// Manage CLI configuration
    Config(ConfigArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DEVICES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List all devices
    #[command(alias = "ls")]
    List,

    /// Get device details
    Get {
        /// Device UUID
        uuid: String,
    },

    /// Create a new device
    Create {
        /// Display name
        #[arg(long, required = true)]
        name: String,

        /// Topic the device publishes on
        #[arg(long, required = true)]
        topic: String,

        /// Topic the device subscribes to (optional)
        #[arg(long)]
        subscribe_topic: Option<String>,

        /// Publish period in milliseconds
        #[arg(long, default_value = "1000")]
        interval_ms: u32,

        /// Parameter spec, repeatable.
        /// Formats: "name:int:MIN:MAX", "name:float:MIN:MAX[:PRECISION]",
        /// "name:bool", "name:timestamp", "name:string:VALUE"
        #[arg(long = "param", value_name = "SPEC")]
        params: Vec<String>,
    },

    /// Edit an existing device (unset flags keep current values)
    Edit {
        /// Device UUID
        uuid: String,

        /// New display name
        #[arg(long)]
        name: Option<String>,

        /// New publish topic
        #[arg(long)]
        topic: Option<String>,

        /// New subscribe topic
        #[arg(long)]
        subscribe_topic: Option<String>,

        /// New publish period in milliseconds
        #[arg(long)]
        interval_ms: Option<u32>,
    },

    /// Delete a device
    Delete {
        /// Device UUID
        uuid: String,
    },

    /// Start publishing
    Start {
        /// Device UUID
        uuid: String,
    },

    /// Stop publishing
    Stop {
        /// Device UUID
        uuid: String,
    },

    /// Start every device in the fleet
    StartAll,

    /// Stop every device in the fleet
    StopAll,

    /// Duplicate a device under a fresh identity
    Duplicate {
        /// Source device UUID
        uuid: String,
    },

    /// Upload a CSV dataset for playback
    UploadCsv {
        /// Device UUID
        uuid: String,

        /// CSV file to upload
        file: PathBuf,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  MQTT
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct MqttArgs {
    #[command(subcommand)]
    pub command: MqttCommand,
}

#[derive(Debug, Subcommand)]
pub enum MqttCommand {
    /// Publish a one-off message through the server's broker connection
    Publish {
        /// Topic to publish on
        #[arg(long, required = true)]
        topic: String,

        /// Payload text; parsed as JSON, sent as a plain string otherwise
        #[arg(long, default_value = "")]
        payload: String,
    },

    /// Show the listener message buffer, newest first
    #[command(alias = "msgs")]
    Messages,

    /// Purge the listener message buffer
    Clear,

    /// Tail listener messages live (Ctrl-C to stop)
    Listen {
        /// Subscribe to this topic for the duration of the tail
        #[arg(long)]
        topic: Option<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Write a default config file if none exists
    Init,

    /// Display the current resolved configuration
    Show,

    /// Print the config file path
    Path,
}
