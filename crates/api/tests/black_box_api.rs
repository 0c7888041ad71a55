use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value as JsonValue, json};

use fleetguard_api::app::{build_app, services::build_in_memory_services};
use fleetguard_core::{AlertNotification, VehicleId};
use fleetguard_events::{InMemoryTopic, Topic};
use fleetguard_infra::{InMemoryItemStore, IngestConfig, ItemStore};

struct TestServer {
    base_url: String,
    store: Arc<InMemoryItemStore>,
    topic: Arc<InMemoryTopic<AlertNotification>>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        let config = IngestConfig::from_lookup(|key| match key {
            "VEHICLE_TABLE" => Some("vehicles".to_string()),
            "ALERT_TOPIC" => Some("alerts".to_string()),
            _ => None,
        })
        .expect("test config");

        // Same router as prod, in-memory backends, ephemeral port.
        let wiring = build_in_memory_services(&config);
        let app = build_app(wiring.services);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            store: wiring.store,
            topic: wiring.topic,
            handle,
        }
    }

    async fn invoke(&self, client: &reqwest::Client, event: &JsonValue) -> (StatusCode, JsonValue) {
        let res = client
            .post(format!("{}/invoke", self.base_url))
            .json(event)
            .send()
            .await
            .expect("request failed");
        let status = res.status();
        let body = res.json::<JsonValue>().await.expect("json body");
        (status, body)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::spawn().await;
    let res = reqwest::get(format!("{}/health", server.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<JsonValue>().await.unwrap(), json!({"status": "ok"}));
}

#[tokio::test]
async fn anomalous_record_is_stored_and_alerted() {
    let server = TestServer::spawn().await;
    let alerts = server.topic.subscribe();
    let client = reqwest::Client::new();

    let (status, body) = server
        .invoke(&client, &json!({"records": [{"vehicleId": "V1", "anomaly": true, "speed": 80}]}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "Processed"}));

    let item = server.store.get_item(&VehicleId::from("V1")).unwrap().unwrap();
    assert_eq!(item.data, r#"{"vehicleId":"V1","anomaly":true,"speed":80}"#);

    let sent = alerts.drain();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message, "Alert: Anomaly detected for Vehicle V1");
}

#[tokio::test]
async fn empty_batch_has_no_side_effects() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = server.invoke(&client, &json!({"records": []})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "Processed"}));

    let (status, _) = server.invoke(&client, &json!({"source": "gateway-7"})).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(server.store.put_count(), 0);
    assert_eq!(server.topic.published_count(), 0);
}

#[tokio::test]
async fn malformed_events_are_rejected() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, body) = server.invoke(&client, &json!({"records": "V1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("malformed_event"));

    let res = client
        .post(format!("{}/invoke", server.base_url))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert_eq!(server.store.put_count(), 0);
}

#[tokio::test]
async fn missing_vehicle_id_lands_under_unknown() {
    let server = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let (status, _) = server
        .invoke(&client, &json!({"records": [{"speed": 12}, {"speed": 13, "anomaly": true}]}))
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(server.store.put_count(), 2);
    let item = server.store.get_item(&VehicleId::unknown()).unwrap().unwrap();
    assert_eq!(item.data, r#"{"speed":13,"anomaly":true}"#);
    assert_eq!(server.topic.published_count(), 1);
}
