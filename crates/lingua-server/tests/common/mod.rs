//! Shared test fixtures: an app over a temp-file SQLite pool and a fake AI
//! gateway standing in for the hosted provider.

// Each test binary uses a subset of these helpers.
#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use lingua_db::{open_pool, PoolSettings};
use lingua_gateway::{AiGateway, ChatTurn, GatewayError};
use lingua_server::{app, AppState};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const TEST_SECRET: &str = "test-secret";

/// Canned gateway. Records the context of the last completion call so tests
/// can assert on prompt assembly; `fail` makes every call error like a
/// provider outage.
pub struct FakeGateway {
    pub transcript: String,
    pub reply: String,
    pub audio: Vec<u8>,
    pub fail: bool,
    pub seen_turns: Mutex<Vec<ChatTurn>>,
}

impl Default for FakeGateway {
    fn default() -> Self {
        Self {
            transcript: "hello from the fake transcriber".to_string(),
            reply: "Great sentence! Let's keep practicing.".to_string(),
            audio: vec![1, 2, 3, 4],
            fail: false,
            seen_turns: Mutex::new(Vec::new()),
        }
    }
}

impl FakeGateway {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    fn outage<T>(&self) -> Result<T, GatewayError> {
        Err(GatewayError::Api {
            status: 500,
            message: "provider outage".to_string(),
        })
    }
}

#[async_trait]
impl AiGateway for FakeGateway {
    async fn transcribe(&self, _wav: Vec<u8>) -> Result<String, GatewayError> {
        if self.fail {
            return self.outage();
        }
        Ok(self.transcript.clone())
    }

    async fn complete(&self, turns: &[ChatTurn]) -> Result<String, GatewayError> {
        if self.fail {
            return self.outage();
        }
        *self.seen_turns.lock().expect("seen_turns lock poisoned") = turns.to_vec();
        Ok(self.reply.clone())
    }

    async fn synthesize(&self, _text: &str) -> Result<Vec<u8>, GatewayError> {
        if self.fail {
            return self.outage();
        }
        Ok(self.audio.clone())
    }
}

/// A configured app state plus the temp dir keeping its database alive.
pub struct TestServer {
    pub state: AppState,
    _db_dir: tempfile::TempDir,
}

impl TestServer {
    pub fn app(&self) -> Router {
        app(self.state.clone())
    }
}

pub fn test_server() -> TestServer {
    test_server_with_gateway(Arc::new(FakeGateway::default()))
}

pub fn test_server_with_gateway(gateway: Arc<dyn AiGateway>) -> TestServer {
    let db_dir = tempfile::tempdir().expect("failed to create temp dir");
    let db_path = db_dir.path().join("test.db");
    let pool = open_pool(
        db_path.to_str().expect("temp path should be utf-8"),
        PoolSettings::default(),
    )
    .expect("failed to create pool");

    {
        let conn = pool.get().expect("failed to get connection");
        lingua_db::run_migrations(&conn).expect("failed to run migrations");
    }

    let (message_tx, _) = tokio::sync::broadcast::channel(100);

    TestServer {
        state: AppState {
            pool,
            jwt_secret: TEST_SECRET.to_string(),
            gateway,
            message_tx,
            client_dir: db_dir.path().join("no-client").display().to_string(),
        },
        _db_dir: db_dir,
    }
}

/// Sends a JSON request and returns status plus parsed body (Null when the
/// body is empty or not JSON).
pub async fn request_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(json) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("failed to build request");

    let response = app.clone().oneshot(request).await.expect("request failed");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Signs up a fresh user and returns `(user_id, token)`.
pub async fn signup(app: &Router, username: &str, password: &str) -> (String, String) {
    let (status, body) = request_json(
        app,
        "POST",
        "/api/auth/signup",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "signup failed: {body}");
    (
        body["userId"].as_str().expect("userId missing").to_string(),
        body["token"].as_str().expect("token missing").to_string(),
    )
}

/// Submits one user message to a conversation and returns status plus body.
pub async fn submit_message(
    app: &Router,
    token: &str,
    conversation_id: &str,
    message_id: &str,
    content: &str,
    create_time: &str,
) -> (StatusCode, Value) {
    request_json(
        app,
        "POST",
        "/api/conversation",
        Some(token),
        Some(serde_json::json!({
            "conversationId": conversation_id,
            "messages": [{
                "id": message_id,
                "role": "user",
                "content": content,
                "createTime": create_time,
            }],
        })),
    )
    .await
}
