// Integration tests for `PanelClient` using wiremock.

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use simfleet_api::models::{Device, DeviceStatus, GenerationMode, ParamKind, PublishRequest};
use simfleet_api::{Error, PanelClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, PanelClient) {
    let server = MockServer::start().await;
    let base = server.uri().parse().unwrap();
    let client = PanelClient::with_client(reqwest::Client::new(), base);
    (server, client)
}

fn device_body(uuid: &str, status: &str) -> serde_json::Value {
    json!({
        "uuid": uuid,
        "name": "Sim1",
        "status": status,
        "mode": "RANDOM",
        "publish_topic": "fleet/sim1",
        "subscribe_topic": null,
        "interval_ms": 1000,
        "qos": 0,
        "retain": false,
        "csv_file_path": null,
        "csv_loop": true,
        "params": [
            {
                "id": 7,
                "device_uuid": uuid,
                "param_name": "temp",
                "type": "float",
                "min_val": 0.0,
                "max_val": 100.0,
                "precision": 2,
                "string_value": null
            }
        ],
        "messages": []
    })
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_list_devices() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            device_body("a-1", "RUNNING"),
            device_body("a-2", "STOPPED"),
        ])))
        .mount(&server)
        .await;

    let devices = client.list_devices().await.unwrap();

    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].uuid, "a-1");
    assert_eq!(devices[0].status, DeviceStatus::Running);
    assert_eq!(devices[0].params.len(), 1);
    assert_eq!(devices[0].params[0].kind, ParamKind::Float);
    assert_eq!(devices[1].status, DeviceStatus::Stopped);
}

#[tokio::test]
async fn test_get_device() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices/a-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_body("a-1", "STOPPED")))
        .mount(&server)
        .await;

    let device = client.get_device("a-1").await.unwrap();

    assert_eq!(device.uuid, "a-1");
    assert_eq!(device.name, "Sim1");
    assert_eq!(device.mode, GenerationMode::Random);
    assert_eq!(device.params[0].id, Some(7));
    assert_eq!(device.params[0].device_uuid.as_deref(), Some("a-1"));
}

#[tokio::test]
async fn test_create_device_echoes_body() {
    let (server, client) = setup().await;

    let mut device: Device = serde_json::from_value(device_body("a-9", "STOPPED")).unwrap();
    device.params[0].id = None;

    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .and(body_json(&device))
        .respond_with(ResponseTemplate::new(200).set_body_json(device_body("a-9", "STOPPED")))
        .mount(&server)
        .await;

    let created = client.create_device(&device).await.unwrap();
    assert_eq!(created.uuid, "a-9");
}

#[tokio::test]
async fn test_start_device_returns_new_status() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/devices/a-1/start"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "RUNNING" })))
        .mount(&server)
        .await;

    let reply = client.start_device("a-1").await.unwrap();
    assert_eq!(reply.status, DeviceStatus::Running);
}

#[tokio::test]
async fn test_upload_csv() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/devices/a-1/upload-csv"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "CSV uploaded and device updated",
            "file_path": "data/csv/a-1_replay.csv"
        })))
        .mount(&server)
        .await;

    let reply = client
        .upload_csv("a-1", "replay.csv".into(), b"ts,temp\n0,21.5\n".to_vec())
        .await
        .unwrap();

    assert_eq!(reply.file_path.as_deref(), Some("data/csv/a-1_replay.csv"));
}

#[tokio::test]
async fn test_subscribe_sends_topic_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/mqtt/subscribe"))
        .and(body_json(json!({ "topic": "fleet/#" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "subscribed" })))
        .mount(&server)
        .await;

    client.subscribe("fleet/#").await.unwrap();
}

#[tokio::test]
async fn test_listener_messages() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/mqtt/listener-messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "topic": "fleet/sim1", "payload": "21.5", "timestamp": 1700000000 },
            { "topic": "fleet/sim2", "payload": {"v": 2}, "timestamp": 1700000001 },
        ])))
        .mount(&server)
        .await;

    let messages = client.listener_messages().await.unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].payload_text(), "21.5");
    assert_eq!(messages[1].payload_text(), r#"{"v":2}"#);
}

#[tokio::test]
async fn test_publish() {
    let (server, client) = setup().await;

    let request = PublishRequest {
        topic: "fleet/manual".into(),
        payload: json!({ "cmd": "ping" }),
        qos: 0,
        retain: false,
    };

    Mock::given(method("POST"))
        .and(path("/api/mqtt/publish"))
        .and(body_json(&request))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "message": "published" })))
        .mount(&server)
        .await;

    client.publish(&request).await.unwrap();
}

#[tokio::test]
async fn test_get_stats() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/stats"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "mqtt_connected": true,
            "total_devices": 4,
            "running_devices": 2
        })))
        .mount(&server)
        .await;

    let stats = client.get_stats().await.unwrap();

    assert!(stats.mqtt_connected);
    assert_eq!(stats.total_devices, 4);
    assert_eq!(stats.running_devices, 2);
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_error_detail_is_extracted() {
    let (server, client) = setup().await;

    let device: Device = serde_json::from_value(device_body("a-1", "STOPPED")).unwrap();

    Mock::given(method("POST"))
        .and(path("/api/devices"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({ "detail": "Device with this UUID already exists" })),
        )
        .mount(&server)
        .await;

    let result = client.create_device(&device).await;

    match result {
        Err(Error::Api { status, ref detail }) => {
            assert_eq!(status, 400);
            assert_eq!(detail, "Device with this UUID already exists");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_404_not_found() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "detail": "Device not found" })))
        .mount(&server)
        .await;

    let result = client.get_device("missing").await;

    let err = result.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.detail(), Some("Device not found"));
}

#[tokio::test]
async fn test_error_without_detail_falls_back() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let result = client.list_devices().await;

    match result {
        Err(Error::Api { status, ref detail }) => {
            assert_eq!(status, 500);
            assert_eq!(detail, "request failed with HTTP 500");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_bad_body_is_deserialization() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client.list_devices().await;

    assert!(matches!(result, Err(Error::Deserialization { .. })));
}
