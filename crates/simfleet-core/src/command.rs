// ── Command API ──
//
// Fire-and-forget imperative actions flow through a unified `Command`
// enum. The controller routes each variant to one backend call and then
// unconditionally refreshes the registry, even on failure, so any
// partial server-side effect becomes visible.

use simfleet_api::models::{Device, DeviceStatus, Parameter};
use uuid::Uuid;

use crate::error::CoreError;

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// All imperative fleet actions.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Run state ────────────────────────────────────────────────────
    Start {
        uuid: String,
    },
    Stop {
        uuid: String,
    },
    StartAll,
    StopAll,

    // ── Fleet mutation ───────────────────────────────────────────────
    /// Callers must obtain operator confirmation BEFORE dispatching;
    /// the core does not second-guess a delete.
    Delete {
        uuid: String,
    },
    /// Fetch the source device, re-key it under a fresh identity, and
    /// create the copy (stopped, parameters unkeyed).
    Duplicate {
        uuid: String,
    },
    /// Device-scoped multipart CSV upload; the server switches the
    /// device into CSV playback mode.
    UploadCsv {
        uuid: String,
        file_name: String,
        bytes: Vec<u8>,
    },

    // ── Bus ──────────────────────────────────────────────────────────
    /// Manual publish. `payload` is parsed as JSON; on parse failure it
    /// is sent verbatim as a plain string (intentional fallback, not an
    /// error path).
    Publish {
        topic: String,
        payload: String,
    },
}

/// Result of a command execution.
#[derive(Debug)]
pub enum CommandResult {
    Ok,
    /// New run state reported by a start/stop endpoint.
    Status(DeviceStatus),
    /// The device created by a duplicate.
    Device(Device),
    /// Where the server stored an uploaded CSV.
    CsvStored { file_path: Option<String> },
}

// ── Helpers ─────────────────────────────────────────────────────────

/// Parse manual-publish text as JSON, falling back to a plain string
/// payload when it isn't valid JSON.
pub(crate) fn parse_payload(raw: &str) -> serde_json::Value {
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_owned()))
}

/// Build the duplicate of a fetched device: fresh identity, renamed,
/// forced STOPPED, every parameter re-keyed to the new identity with
/// its persisted id stripped so the server allocates new ones.
pub(crate) fn duplicate_of(source: &Device) -> Device {
    let uuid = Uuid::new_v4().to_string();
    let params: Vec<Parameter> = source
        .params
        .iter()
        .map(|p| Parameter {
            id: None,
            device_uuid: Some(uuid.clone()),
            ..p.clone()
        })
        .collect();

    Device {
        uuid,
        name: format!("{} (Copy)", source.name),
        status: DeviceStatus::Stopped,
        params,
        // Server-owned; not worth echoing into the create body.
        messages: Vec::new(),
        ..source.clone()
    }
}
