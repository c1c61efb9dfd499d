//! Webhook endpoint: inbound HTTP surface for alert notifications.
//!
//! Three POST routes plus a health probe:
//!
//! - `POST /webhook/alert`: board alert notifications; creates an alert.
//! - `POST /webhook/status`: pipeline status changes; acknowledged only.
//! - `POST /webhook/board`: board lifecycle events; `offline` creates an
//!   alert, everything else is a no-op.
//! - `GET /health`: liveness probe.
//!
//! Malformed JSON answers 400 with the same `{success, message}` envelope
//! the happy path uses.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::alerts::AlertService;
use crate::domain::LocationInfo;

/// Service name reported by the health probe.
const SERVICE_NAME: &str = "fleetmon-webhook";

/// Body of `POST /webhook/alert`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct AlertNotification {
    #[serde(rename = "alertType")]
    alert_type: String,
    #[serde(rename = "boardAddress")]
    board_address: String,
    #[serde(rename = "chassisName")]
    chassis_name: String,
    #[serde(rename = "chassisNumber")]
    chassis_number: i32,
    #[serde(rename = "boardName")]
    board_name: String,
    #[serde(rename = "boardNumber")]
    board_number: i32,
    #[serde(rename = "boardStatus")]
    board_status: i32,
    messages: Vec<String>,
}

/// Body of `POST /webhook/board`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BoardEvent {
    #[serde(rename = "boardAddress")]
    board_address: String,
    #[serde(rename = "chassisNumber")]
    chassis_number: i32,
    #[serde(rename = "slotNumber")]
    slot_number: i32,
    #[serde(rename = "eventType")]
    event_type: String,
    timestamp: u64,
}

/// Body of `POST /webhook/status`; recorded but not acted upon.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusEvent {
    #[serde(rename = "eventType")]
    event_type: String,
    #[serde(rename = "stackUUID")]
    stack_uuid: String,
    #[serde(rename = "newStatus")]
    new_status: i32,
    timestamp: u64,
}

/// Uniform webhook reply envelope.
#[derive(Debug, Serialize)]
struct WebhookReply {
    success: bool,
    message: String,
    #[serde(rename = "alertUUID", skip_serializing_if = "Option::is_none")]
    alert_uuid: Option<String>,
}

impl WebhookReply {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            alert_uuid: None,
        }
    }

    fn ok_with_alert(message: impl Into<String>, alert_uuid: String) -> Self {
        Self {
            success: true,
            message: message.into(),
            alert_uuid: Some(alert_uuid),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            alert_uuid: None,
        }
    }
}

/// Build the webhook router over the alert service.
pub fn router(alerts: AlertService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/webhook/alert", post(alert_webhook))
        .route("/webhook/status", post(status_webhook))
        .route("/webhook/board", post(board_webhook))
        .with_state(alerts)
}

/// Bind the webhook listener; a bind failure is fatal at startup.
pub async fn bind(port: u16) -> std::io::Result<TcpListener> {
    TcpListener::bind((std::net::Ipv4Addr::UNSPECIFIED, port)).await
}

/// Serve until the token is cancelled.
pub async fn serve(
    listener: TcpListener,
    alerts: AlertService,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    info!(local = ?listener.local_addr().ok(), "Webhook endpoint starting");
    axum::serve(listener, router(alerts))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": SERVICE_NAME,
    }))
}

async fn alert_webhook(
    State(alerts): State<AlertService>,
    payload: Result<Json<AlertNotification>, JsonRejection>,
) -> (StatusCode, Json<WebhookReply>) {
    let Json(notification) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            debug!(error = %rejection, "Alert webhook body rejected");
            return (
                StatusCode::BAD_REQUEST,
                Json(WebhookReply::error(format!("invalid JSON body: {rejection}"))),
            );
        }
    };

    if notification.alert_type != "board" {
        return (
            StatusCode::BAD_REQUEST,
            Json(WebhookReply::error(format!(
                "unsupported alertType: {}",
                notification.alert_type
            ))),
        );
    }

    let location = LocationInfo {
        chassis_name: notification.chassis_name,
        chassis_number: notification.chassis_number,
        board_name: notification.board_name,
        board_number: notification.board_number,
        board_address: notification.board_address,
    };
    let response = alerts.handle_board_alert(location, &notification.messages);

    match response.data {
        Some(uuid) => (
            StatusCode::OK,
            Json(WebhookReply::ok_with_alert(response.message, uuid)),
        ),
        None => (
            StatusCode::BAD_REQUEST,
            Json(WebhookReply::error(response.message)),
        ),
    }
}

async fn status_webhook(
    payload: Result<Json<StatusEvent>, JsonRejection>,
) -> (StatusCode, Json<WebhookReply>) {
    let Json(event) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(WebhookReply::error(format!("invalid JSON body: {rejection}"))),
            );
        }
    };

    // Recorded only; a future revision may propagate this to the
    // pipeline store.
    debug!(
        event_type = %event.event_type,
        stack = %event.stack_uuid,
        new_status = event.new_status,
        timestamp = event.timestamp,
        "Status webhook received"
    );
    (StatusCode::OK, Json(WebhookReply::ok("status change received")))
}

async fn board_webhook(
    State(alerts): State<AlertService>,
    payload: Result<Json<BoardEvent>, JsonRejection>,
) -> (StatusCode, Json<WebhookReply>) {
    let Json(event) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(WebhookReply::error(format!("invalid JSON body: {rejection}"))),
            );
        }
    };

    if event.event_type != "offline" {
        debug!(
            event_type = %event.event_type,
            board = %event.board_address,
            timestamp = event.timestamp,
            "Board event ignored"
        );
        return (
            StatusCode::OK,
            Json(WebhookReply::ok("board event received")),
        );
    }

    let location = LocationInfo {
        chassis_name: format!("chassis-{:02}", event.chassis_number),
        chassis_number: event.chassis_number,
        board_name: format!("slot-{}", event.slot_number),
        board_number: event.slot_number,
        board_address: event.board_address,
    };
    let response = alerts.handle_board_alert(location, &["board offline".to_string()]);

    match response.data {
        Some(uuid) => (
            StatusCode::OK,
            Json(WebhookReply::ok_with_alert(response.message, uuid)),
        ),
        None => (
            StatusCode::BAD_REQUEST,
            Json(WebhookReply::error(response.message)),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::AlertStore;
    use std::sync::Arc;

    /// Serve the router on an ephemeral port; returns base URL and store.
    async fn spawn_server() -> (String, Arc<AlertStore>, CancellationToken) {
        let store = Arc::new(AlertStore::new());
        let alerts = AlertService::new(Arc::clone(&store));
        let listener = bind(0).await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let shutdown = CancellationToken::new();
        let token = shutdown.clone();
        tokio::spawn(async move {
            serve(listener, alerts, token).await.unwrap();
        });

        (base, store, shutdown)
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let (base, _store, shutdown) = spawn_server().await;
        let client = reqwest::Client::new();

        let response = client.get(format!("{base}/health")).send().await.unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "fleetmon-webhook");

        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_alert_webhook_creates_board_alert() {
        let (base, store, shutdown) = spawn_server().await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}/webhook/alert"))
            .json(&serde_json::json!({
                "alertType": "board",
                "boardAddress": "192.168.1.103",
                "chassisName": "chassis-01",
                "chassisNumber": 1,
                "boardName": "slot-3",
                "boardNumber": 3,
                "boardStatus": 1,
                "messages": ["cpu overload", "temperature high"]
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], true);
        let uuid = body["alertUUID"].as_str().unwrap();
        assert!(uuid.starts_with("alert-board-"));

        let alert = store.find_by_uuid(uuid).unwrap();
        assert_eq!(alert.related_entity(), "192.168.1.103");
        assert_eq!(alert.messages().len(), 2);

        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_alert_webhook_rejects_bad_input() {
        let (base, store, shutdown) = spawn_server().await;
        let client = reqwest::Client::new();

        // Malformed JSON.
        let response = client
            .post(format!("{base}/webhook/alert"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);

        // Unsupported alert type.
        let response = client
            .post(format!("{base}/webhook/alert"))
            .json(&serde_json::json!({"alertType": "component"}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);

        assert_eq!(store.count_active(), 0);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_status_webhook_is_acknowledged_only() {
        let (base, store, shutdown) = spawn_server().await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}/webhook/status"))
            .json(&serde_json::json!({
                "eventType": "stack_status_change",
                "stackUUID": "stack-1",
                "newStatus": 2
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        assert_eq!(store.count_active(), 0);
        shutdown.cancel();
    }

    #[tokio::test]
    async fn test_board_webhook_offline_event() {
        let (base, store, shutdown) = spawn_server().await;
        let client = reqwest::Client::new();

        let response = client
            .post(format!("{base}/webhook/board"))
            .json(&serde_json::json!({
                "boardAddress": "192.168.2.105",
                "chassisNumber": 2,
                "slotNumber": 5,
                "eventType": "offline"
            }))
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        let uuid = body["alertUUID"].as_str().unwrap();

        let alert = store.find_by_uuid(uuid).unwrap();
        assert_eq!(alert.messages().len(), 1);
        assert_eq!(alert.messages()[0].text, "board offline");
        assert_eq!(alert.location().chassis_name, "chassis-02");

        // Other event types are a no-op.
        let response = client
            .post(format!("{base}/webhook/board"))
            .json(&serde_json::json!({
                "boardAddress": "192.168.2.105",
                "eventType": "online"
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        assert_eq!(store.count_active(), 1);

        shutdown.cancel();
    }
}
