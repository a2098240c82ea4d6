//! Shared fixtures for unit tests.

use std::sync::{Arc, Mutex};

use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};

use crate::net::transport::{HttpRequest, HttpResponse, Transport};
use crate::net::types::ApiError;
use crate::session::{Role, SessionStore, TokenPair};

const TEST_SECRET: &[u8] = b"not-the-backend-secret";

/// Sign an arbitrary JSON payload as an HS256 JWT.
pub fn token_from_payload(payload: &Value) -> String {
    jsonwebtoken::encode(&Header::default(), payload, &EncodingKey::from_secret(TEST_SECRET)).unwrap()
}

/// Access token shaped like the backend's, for `user_id` with `role`.
pub fn access_token(user_id: i64, role: Role) -> String {
    token_from_payload(&json!({
        "token_type": "access",
        "exp": 4_102_444_800_i64,
        "iat": 1_700_000_000_i64,
        "jti": format!("jti-{user_id}"),
        "user_id": user_id,
        "username": format!("user{user_id}"),
        "email": format!("user{user_id}@example.com"),
        "role": role.as_str(),
    }))
}

/// A second, distinct access token for the same identity, as a refresh would issue.
pub fn refreshed_token(user_id: i64, role: Role) -> String {
    token_from_payload(&json!({
        "token_type": "access",
        "exp": 4_102_444_900_i64,
        "jti": format!("jti-{user_id}-refreshed"),
        "user_id": user_id,
        "role": role.as_str(),
    }))
}

pub fn token_pair(user_id: i64, role: Role) -> TokenPair {
    TokenPair { access: access_token(user_id, role), refresh: format!("refresh-{user_id}"), role: Some(role) }
}

// =============================================================================
// MOCK TRANSPORT
// =============================================================================

type Handler = Box<dyn Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + Sync>;

/// Scripted backend: answers every request through `handler` and records it.
pub struct MockTransport {
    handler: Handler,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&HttpRequest) -> Result<HttpResponse, ApiError> + Send + Sync + 'static,
    {
        Arc::new(Self { handler: Box::new(handler), requests: Mutex::new(Vec::new()) })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count_path(&self, path: &str) -> usize {
        self.requests.lock().unwrap().iter().filter(|r| r.path == path).count()
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());
        // Let concurrently issued requests interleave like real network calls.
        tokio::task::yield_now().await;
        (self.handler)(request)
    }
}

pub fn respond(status: u16, body: Value) -> Result<HttpResponse, ApiError> {
    Ok(HttpResponse { status, body })
}

/// Store already hydrated and logged in with `pair`.
pub fn logged_in_store(pair: &TokenPair) -> Arc<SessionStore> {
    let store = SessionStore::in_memory();
    store.load();
    store.login(pair).unwrap();
    Arc::new(store)
}
