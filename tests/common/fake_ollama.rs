//! Minimal Ollama HTTP server for adapter tests.

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// One queued answer to `POST /api/chat`.
#[derive(Debug, Clone)]
pub enum FakeReply {
    /// Newline-delimited JSON records, as sent with `stream: true`.
    Ndjson(Vec<Value>),
    /// A single JSON body, as sent with `stream: false`.
    Json(Value),
    /// A non-2xx status with a raw body.
    Status(u16, String),
}

#[derive(Clone, Default)]
struct FakeState {
    replies: Arc<Mutex<VecDeque<FakeReply>>>,
    requests: Arc<Mutex<Vec<Value>>>,
    models: Arc<Vec<String>>,
}

/// Fake Ollama server bound to a random local port.
///
/// When dropped, the server shuts down.
pub struct FakeOllama {
    /// Base URL for the provider (e.g., "http://127.0.0.1:12345")
    pub base_url: String,
    /// `host:port` without a scheme, the way `OLLAMA_HOST` is usually given.
    pub host: String,
    state: FakeState,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeOllama {
    pub async fn spawn(replies: Vec<FakeReply>) -> Self {
        Self::spawn_with_models(replies, vec!["test-model".to_string()]).await
    }

    pub async fn spawn_with_models(replies: Vec<FakeReply>, models: Vec<String>) -> Self {
        let state = FakeState {
            replies: Arc::new(Mutex::new(replies.into_iter().collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
            models: Arc::new(models),
        };

        let app = Router::new()
            .route("/api/chat", post(chat))
            .route("/api/tags", get(tags))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Fake Ollama server failed");
        });

        Self {
            base_url: format!("http://127.0.0.1:{}", port),
            host: format!("127.0.0.1:{}", port),
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Request bodies received on `/api/chat`, in order.
    pub fn requests(&self) -> Vec<Value> {
        self.state.requests.lock().unwrap().clone()
    }
}

impl Drop for FakeOllama {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn chat(State(state): State<FakeState>, Json(body): Json<Value>) -> Response {
    state.requests.lock().unwrap().push(body);

    let reply = state
        .replies
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| FakeReply::Status(500, r#"{"error":"no reply queued"}"#.to_string()));

    match reply {
        FakeReply::Ndjson(records) => {
            let mut body = String::new();
            for record in records {
                body.push_str(&record.to_string());
                body.push('\n');
            }
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "application/x-ndjson")],
                body,
            )
                .into_response()
        }
        FakeReply::Json(value) => (StatusCode::OK, Json(value)).into_response(),
        FakeReply::Status(status, body) => (
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body,
        )
            .into_response(),
    }
}

async fn tags(State(state): State<FakeState>) -> Json<Value> {
    let models: Vec<Value> = state
        .models
        .iter()
        .map(|name| json!({ "name": name }))
        .collect();
    Json(json!({ "models": models }))
}
