//! HTTP surface: the WhatsApp webhook plus probes, a test console and seeding.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use edubot_channels::whatsapp::channel::SIGNATURE_HEADER;
use edubot_channels::whatsapp::{extract_text_messages, WebhookPayload};
use edubot_channels::WhatsAppChannel;
use edubot_core::catalog::{FileCatalog, MySqlCatalog};
use edubot_core::{CatalogStore, MessageResolver};
use edubot_types::config::BotConfig;
use edubot_types::{ChannelAdapter, OutboundMessage};

/// Service name reported by `/meta`.
const SERVICE_NAME: &str = "whatsapp-edtech-bot";

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<BotConfig>,
    pub resolver: Arc<MessageResolver>,
    /// Webhook verification.
    pub whatsapp: Arc<WhatsAppChannel>,
    /// Reply delivery.
    pub outbound: Arc<dyn ChannelAdapter>,
    /// Seeding target; `None` when the catalog is not database-backed.
    pub database: Option<Arc<MySqlCatalog>>,
    /// Set once a non-empty catalog has been published.
    pub ready: Arc<AtomicBool>,
}

/// Flip `ready` once the store publishes its first non-empty catalog.
pub fn track_readiness(store: &CatalogStore, ready: Arc<AtomicBool>) -> JoinHandle<()> {
    let mut catalog = store.subscribe();
    tokio::spawn(async move {
        match catalog.wait_for(|snapshot| !snapshot.is_empty()).await {
            Ok(snapshot) => {
                info!(
                    courses = snapshot.courses.len(),
                    faqs = snapshot.faqs.len(),
                    "catalog available, marking ready"
                );
                ready.store(true, Ordering::Release);
            }
            Err(_) => warn!("catalog store closed before any catalog was loaded"),
        }
    })
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/webhook", get(verify_webhook).post(receive_webhook))
        .route("/health", get(health))
        .route("/ready", get(readiness))
        .route("/meta", get(meta))
        .route("/test", post(test_message))
        .route("/seed", post(seed))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn index(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "message": "🤖 WhatsApp EdTech Bot is running",
        "endpoints": {
            "webhook": "/webhook",
            "health": "/health",
            "test": "/test",
            "seed": "/seed",
            "ready": "/ready",
            "meta": "/meta",
        },
        "status": "active",
        "version": state.config.app.version,
        "commit": state.config.app.short_commit(),
    }))
}

// ============================================================
// Webhook
// ============================================================

#[derive(Debug, Deserialize)]
struct SubscriptionQuery {
    #[serde(rename = "hub.mode", default)]
    mode: String,
    #[serde(rename = "hub.verify_token", default)]
    verify_token: String,
    #[serde(rename = "hub.challenge", default)]
    challenge: String,
}

async fn verify_webhook(
    State(state): State<AppState>,
    Query(query): Query<SubscriptionQuery>,
) -> Response {
    match state
        .whatsapp
        .verify_subscription(&query.mode, &query.verify_token, &query.challenge)
    {
        Some(challenge) => (StatusCode::OK, challenge).into_response(),
        None => (StatusCode::FORBIDDEN, "Forbidden").into_response(),
    }
}

async fn receive_webhook(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    if let Err(e) = state.whatsapp.verify_signature(&body, signature) {
        warn!(error = %e, "rejecting webhook delivery");
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "Invalid signature"})),
        )
            .into_response();
    }

    let payload: WebhookPayload = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "malformed webhook payload");
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": format!("invalid payload: {e}")})),
            )
                .into_response();
        }
    };

    for inbound in extract_text_messages(&payload) {
        let reply = state.resolver.resolve(&inbound.text, &inbound.sender).await;
        let outbound = OutboundMessage::reply_to(&inbound, reply);
        if let Err(e) = state.outbound.send_message(outbound).await {
            error!(sender = %inbound.sender, error = %e, "failed to deliver reply");
        }
    }

    Json(json!({"status": "ok"})).into_response()
}

// ============================================================
// Probes
// ============================================================

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.resolver.store().snapshot();
    let database = if state.resolver.store().ping().await {
        "connected"
    } else {
        "disconnected"
    };

    Json(json!({
        "status": "healthy",
        "database": database,
        "courses_loaded": snapshot.courses.len(),
        "faqs_loaded": snapshot.faqs.len(),
        "version": state.config.app.version,
    }))
}

async fn readiness(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "ready": state.ready.load(Ordering::Acquire),
        "version": state.config.app.version,
        "commit": state.config.app.short_commit(),
    }))
}

async fn meta(State(state): State<AppState>) -> Json<serde_json::Value> {
    let snapshot = state.resolver.store().snapshot();
    let db = &state.config.database;

    Json(json!({
        "service": SERVICE_NAME,
        "version": state.config.app.version,
        "commit": state.config.app.commit,
        "db_host": db.host,
        "db_name": db.name,
        "loaded_courses": snapshot.courses.len(),
        "loaded_faqs": snapshot.faqs.len(),
        "ready": state.ready.load(Ordering::Acquire),
        "whatsapp_configured": state.whatsapp.can_send(),
        "missing_settings": state.config.missing_settings(),
    }))
}

// ============================================================
// Test console and seeding
// ============================================================

#[derive(Debug, Deserialize)]
struct TestMessageRequest {
    #[serde(default = "default_test_message")]
    message: String,
    #[serde(default = "default_test_number")]
    number: String,
}

fn default_test_message() -> String {
    "hello".to_string()
}

fn default_test_number() -> String {
    "1234567890".to_string()
}

async fn test_message(
    State(state): State<AppState>,
    Json(request): Json<TestMessageRequest>,
) -> Json<serde_json::Value> {
    let response = state.resolver.resolve(&request.message, &request.number).await;
    let snapshot = state.resolver.store().snapshot();

    Json(json!({
        "input": request.message,
        "response": response,
        "courses_count": snapshot.courses.len(),
        "faqs_count": snapshot.faqs.len(),
    }))
}

async fn seed(State(state): State<AppState>) -> Response {
    let Some(database) = &state.database else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({"error": "catalog is not database-backed"})),
        )
            .into_response();
    };

    let seed_file: PathBuf = state.config.catalog.seed_file.clone();
    info!(file = %seed_file.display(), "seeding requested");

    let seeded = match database.seed_from(&FileCatalog::new(seed_file)).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!(error = %e, "seeding failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response();
        }
    };

    if let Err(e) = state.resolver.store().refresh().await {
        warn!(error = %e, "catalog reload after seeding failed");
    }

    Json(json!({
        "message": "Database seeded successfully",
        "courses_added": seeded.courses.len(),
        "faqs_added": seeded.faqs.len(),
    }))
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use edubot_core::FallbackResponder;
    use std::time::Duration;
    use edubot_types::config::WhatsAppConfig;
    use edubot_types::errors::BotError;
    use std::path::Path;
    use std::sync::Mutex;

    /// Channel that records replies instead of delivering them.
    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<OutboundMessage>>,
    }

    #[async_trait]
    impl ChannelAdapter for RecordingChannel {
        async fn send_message(&self, message: OutboundMessage) -> Result<(), BotError> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }
    }

    fn seed_file() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/catalog.yaml")
    }

    async fn spawn_app(app_secret: Option<&str>) -> (String, Arc<RecordingChannel>) {
        let store = Arc::new(CatalogStore::new(Arc::new(FileCatalog::new(seed_file()))));
        store.refresh().await.unwrap();
        let resolver = Arc::new(MessageResolver::new(store, FallbackResponder::disabled()));

        let whatsapp_config = WhatsAppConfig {
            verify_token: Some("verify-me".to_string()),
            app_secret: app_secret.map(str::to_string),
            ..Default::default()
        };
        let recorder = Arc::new(RecordingChannel::default());

        let state = AppState {
            config: Arc::new(BotConfig::default()),
            resolver,
            whatsapp: Arc::new(WhatsAppChannel::new(whatsapp_config).unwrap()),
            outbound: recorder.clone(),
            database: None,
            ready: Arc::new(AtomicBool::new(true)),
        };

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });

        (format!("http://{addr}"), recorder)
    }

    fn text_delivery(from: &str, body: &str) -> serde_json::Value {
        json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messages": [{
                            "from": from,
                            "id": "wamid.1",
                            "type": "text",
                            "text": {"body": body}
                        }]
                    }
                }]
            }]
        })
    }

    #[tokio::test]
    async fn test_subscription_handshake() {
        let (base, _) = spawn_app(None).await;
        let client = reqwest::Client::new();

        let ok = client
            .get(format!(
                "{base}/webhook?hub.mode=subscribe&hub.verify_token=verify-me&hub.challenge=1158201444"
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(ok.status(), 200);
        assert_eq!(ok.text().await.unwrap(), "1158201444");

        let denied = client
            .get(format!(
                "{base}/webhook?hub.mode=subscribe&hub.verify_token=nope&hub.challenge=1"
            ))
            .send()
            .await
            .unwrap();
        assert_eq!(denied.status(), 403);
        assert_eq!(denied.text().await.unwrap(), "Forbidden");
    }

    #[tokio::test]
    async fn test_webhook_replies_to_text_message() {
        let (base, recorder) = spawn_app(None).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/webhook"))
            .json(&text_delivery("8801711111111", "python cost"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: serde_json::Value = response.json().await.unwrap();
        assert_eq!(body["status"], "ok");

        let sent = recorder.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, "8801711111111");
        assert!(sent[0].text.contains("Python Programming Fundamentals"));
    }

    #[tokio::test]
    async fn test_webhook_rejects_bad_signature() {
        let (base, recorder) = spawn_app(Some("s3cret")).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/webhook"))
            .header("X-Hub-Signature-256", "sha256=00")
            .json(&text_delivery("1", "hello"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
        assert!(recorder.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_webhook_rejects_malformed_json() {
        let (base, _) = spawn_app(None).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/webhook"))
            .header("content-type", "application/json")
            .body("{not json")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }

    #[tokio::test]
    async fn test_console_endpoint() {
        let (base, recorder) = spawn_app(None).await;

        let body: serde_json::Value = reqwest::Client::new()
            .post(format!("{base}/test"))
            .json(&json!({"message": "refund policy"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();

        assert_eq!(body["input"], "refund policy");
        assert!(body["response"].as_str().unwrap().contains("refund"));
        assert_eq!(body["courses_count"], 5);
        assert_eq!(body["faqs_count"], 11);
        assert!(recorder.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_probes() {
        let (base, _) = spawn_app(None).await;
        let client = reqwest::Client::new();

        let health: serde_json::Value = client
            .get(format!("{base}/health"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(health["status"], "healthy");
        assert_eq!(health["database"], "connected");
        assert_eq!(health["courses_loaded"], 5);

        let ready: serde_json::Value = client
            .get(format!("{base}/ready"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(ready["ready"], true);
        assert_eq!(ready["commit"], "unknown");

        let meta: serde_json::Value = client
            .get(format!("{base}/meta"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(meta["service"], SERVICE_NAME);
        assert_eq!(meta["loaded_faqs"], 11);
    }

    #[tokio::test]
    async fn test_seed_unavailable_without_database() {
        let (base, _) = spawn_app(None).await;

        let response = reqwest::Client::new()
            .post(format!("{base}/seed"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 503);
    }

    #[tokio::test]
    async fn test_ready_once_catalog_published() {
        let store = CatalogStore::new(Arc::new(FileCatalog::new(seed_file())));
        let ready = Arc::new(AtomicBool::new(false));
        let tracker = track_readiness(&store, ready.clone());

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!ready.load(Ordering::Acquire));

        store.refresh().await.unwrap();
        tokio::time::timeout(Duration::from_secs(5), tracker)
            .await
            .unwrap()
            .unwrap();
        assert!(ready.load(Ordering::Acquire));
    }
}
