// Backend wire types
//
// Models for the simulator backend's JSON API. The backend is lenient
// about field presence (devices created by older builds may omit newer
// columns), so `#[serde(default)]` is used liberally on the read path.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Device ───────────────────────────────────────────────────────────

/// Run state of a simulated device. Server-owned: the client never sets
/// it directly on create and only changes it through the start/stop
/// endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceStatus {
    Running,
    #[default]
    Stopped,
}

impl DeviceStatus {
    pub fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "RUNNING"),
            Self::Stopped => write!(f, "STOPPED"),
        }
    }
}

/// Value-generation strategy. Clients always submit `Random`; the server
/// flips a device to `CsvPlayback` after a CSV upload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GenerationMode {
    #[default]
    Random,
    CsvPlayback,
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Random => write!(f, "RANDOM"),
            Self::CsvPlayback => write!(f, "CSV_PLAYBACK"),
        }
    }
}

/// A configured simulated publisher entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Opaque stable identity. Immutable once assigned.
    pub uuid: String,
    pub name: String,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(default)]
    pub mode: GenerationMode,
    pub publish_topic: String,
    /// Empty or absent means "no subscription".
    #[serde(default)]
    pub subscribe_topic: Option<String>,
    /// Publish period in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u32,
    /// MQTT delivery QoS (0, 1, or 2).
    #[serde(default)]
    pub qos: u8,
    #[serde(default)]
    pub retain: bool,
    /// Server-assigned after a CSV upload; echoed back verbatim on update.
    #[serde(default)]
    pub csv_file_path: Option<String>,
    /// Whether a replayed CSV dataset loops.
    #[serde(default = "default_csv_loop")]
    pub csv_loop: bool,
    #[serde(default)]
    pub params: Vec<Parameter>,
    /// Recently received inbound messages. Server-owned and bounded
    /// (the backend keeps the last 5 per device); read-only here.
    #[serde(default)]
    pub messages: Vec<InboundMessage>,
}

fn default_interval_ms() -> u32 {
    1000
}

fn default_csv_loop() -> bool {
    true
}

// ── Parameter ────────────────────────────────────────────────────────

/// Generated-value type of a parameter. Lowercase on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamKind {
    Int,
    Float,
    Bool,
    Timestamp,
    String,
}

impl fmt::Display for ParamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => write!(f, "int"),
            Self::Float => write!(f, "float"),
            Self::Bool => write!(f, "bool"),
            Self::Timestamp => write!(f, "timestamp"),
            Self::String => write!(f, "string"),
        }
    }
}

/// One named value-generation rule attached to a device.
///
/// Exactly one of {numeric bounds, `string_value`} is semantically active
/// for a given `kind`; the inactive fields may still be serialized and
/// are ignored by consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Database-assigned row id. Must be stripped when duplicating a
    /// device so the server allocates fresh ones.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// Back-reference to the owning device, stamped at submit time.
    #[serde(default)]
    pub device_uuid: Option<String>,
    pub param_name: String,
    #[serde(rename = "type")]
    pub kind: ParamKind,
    #[serde(default)]
    pub min_val: f64,
    #[serde(default)]
    pub max_val: f64,
    /// Decimal places for float rendering.
    #[serde(default = "default_precision")]
    pub precision: Option<u32>,
    /// Present only when `kind == String`.
    #[serde(default)]
    pub string_value: Option<String>,
}

fn default_precision() -> Option<u32> {
    Some(2)
}

// ── Messages ─────────────────────────────────────────────────────────

/// An inbound bus message relayed by the server, either attached to a
/// device (`Device::messages`) or in the shared listener buffer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub topic: String,
    /// Raw payload. Usually a string, but the relay passes structured
    /// JSON through untouched.
    pub payload: serde_json::Value,
    /// Unix seconds.
    pub timestamp: i64,
}

impl InboundMessage {
    /// The payload as display text: strings verbatim, anything else as
    /// compact JSON.
    pub fn payload_text(&self) -> String {
        match &self.payload {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

// ── Stats ────────────────────────────────────────────────────────────

/// Server-side counters from `GET /api/stats`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BrokerStats {
    pub mqtt_connected: bool,
    pub total_devices: u64,
    pub running_devices: u64,
}

// ── Request / reply envelopes ────────────────────────────────────────

/// Body for `POST /api/mqtt/subscribe` and `/unsubscribe`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicRequest {
    pub topic: String,
}

/// Body for `POST /api/mqtt/publish`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishRequest {
    pub topic: String,
    pub payload: serde_json::Value,
    pub qos: u8,
    pub retain: bool,
}

/// Generic `{message}` acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: String,
}

/// Reply from the start/stop endpoints.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusReply {
    pub status: DeviceStatus,
}

/// Reply from `POST /api/devices/{uuid}/upload-csv`.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvUploadReply {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Error body shape used by the backend for rejected requests.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorDetail {
    #[serde(default)]
    pub detail: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn device_deserializes_with_sparse_fields() {
        let device: Device = serde_json::from_value(json!({
            "uuid": "a-1",
            "name": "Sim1",
            "publish_topic": "fleet/sim1",
        }))
        .unwrap();

        assert_eq!(device.status, DeviceStatus::Stopped);
        assert_eq!(device.mode, GenerationMode::Random);
        assert_eq!(device.interval_ms, 1000);
        assert!(device.csv_loop);
        assert!(device.params.is_empty());
        assert!(device.messages.is_empty());
    }

    #[test]
    fn status_uses_uppercase_wire_form() {
        assert_eq!(
            serde_json::to_value(DeviceStatus::Running).unwrap(),
            json!("RUNNING")
        );
        let status: DeviceStatus = serde_json::from_value(json!("STOPPED")).unwrap();
        assert_eq!(status, DeviceStatus::Stopped);
    }

    #[test]
    fn mode_uses_screaming_snake_wire_form() {
        assert_eq!(
            serde_json::to_value(GenerationMode::CsvPlayback).unwrap(),
            json!("CSV_PLAYBACK")
        );
    }

    #[test]
    fn param_kind_is_lowercase() {
        assert_eq!(
            serde_json::to_value(ParamKind::Timestamp).unwrap(),
            json!("timestamp")
        );
        let kind: ParamKind = serde_json::from_value(json!("float")).unwrap();
        assert_eq!(kind, ParamKind::Float);
    }

    #[test]
    fn parameter_kind_serializes_as_type() {
        let param = Parameter {
            id: None,
            device_uuid: Some("a-1".into()),
            param_name: "temp".into(),
            kind: ParamKind::Float,
            min_val: 0.0,
            max_val: 100.0,
            precision: Some(2),
            string_value: None,
        };
        let value = serde_json::to_value(&param).unwrap();
        assert_eq!(value["type"], json!("float"));
        // Absent id must not appear in the body at all.
        assert!(value.get("id").is_none());
    }

    #[test]
    fn parameter_precision_defaults_to_two() {
        let param: Parameter = serde_json::from_value(json!({
            "param_name": "temp",
            "type": "float",
        }))
        .unwrap();
        assert_eq!(param.precision, Some(2));
    }

    #[test]
    fn inbound_message_payload_text() {
        let plain = InboundMessage {
            topic: "t".into(),
            payload: json!("23.5"),
            timestamp: 0,
        };
        assert_eq!(plain.payload_text(), "23.5");

        let structured = InboundMessage {
            topic: "t".into(),
            payload: json!({"v": 1}),
            timestamp: 0,
        };
        assert_eq!(structured.payload_text(), r#"{"v":1}"#);
    }
}
