use std::sync::Arc;

use jsonwebtoken::{EncodingKey, Header};
use serde_json::{Value, json};
use shortlink::net::transport::{HttpRequest, HttpResponse, Transport};
use shortlink::session::TokenPair;
use shortlink::{AuthClient, SessionStore};

use super::*;

/// Backend that answers every request, refresh included, with one response.
struct FixedBackend {
    status: u16,
    body: Value,
}

#[async_trait::async_trait]
impl Transport for FixedBackend {
    async fn send(&self, _request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        Ok(HttpResponse { status: self.status, body: self.body.clone() })
    }
}

fn access_token(user_id: i64) -> String {
    let payload = json!({
        "token_type": "access",
        "exp": 4_102_444_800_i64,
        "user_id": user_id,
        "username": "ada",
        "email": "ada@example.com",
        "role": "regular",
    });
    jsonwebtoken::encode(&Header::default(), &payload, &EncodingKey::from_secret(b"cli-test-secret")).unwrap()
}

fn context(status: u16, body: Value, signed_in: bool) -> CliContext {
    let store = SessionStore::in_memory();
    store.load();
    if signed_in {
        store.login(&TokenPair { access: access_token(7), refresh: "refresh-7".to_owned(), role: None }).unwrap();
    }
    let client = AuthClient::new(Arc::new(FixedBackend { status, body }), Arc::new(store));
    CliContext::new(ShortlinkApi::new(client, "http://localhost:8000"), false)
}

fn public_urls() -> Vec<shortlink::net::types::ShortenedUrl> {
    serde_json::from_value(json!([
        {"id": 1, "orginal_url": "https://example.com", "short_code": "aaa111", "visit_count": 3},
        {"id": 2, "orginal_url": "https://example.org", "short_code": "bbb222", "visit_count": 5},
    ]))
    .unwrap()
}

// =============================================================================
// FAILED
// =============================================================================

#[tokio::test]
async fn wrong_password_keeps_backend_detail() {
    let ctx = context(401, json!({"detail": "No active account found with the given credentials"}), false);

    let err = ctx.api.login("ada@example.com", "wrong-password").await.unwrap_err();

    match ctx.failed(err, "Login failed") {
        CliError::Failed(message) => assert_eq!(message, "No active account found with the given credentials"),
        other => panic!("expected backend detail, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_refresh_reports_expired_session() {
    let ctx = context(401, json!({"detail": "Token is invalid or expired"}), true);

    let err = ctx.api.my_urls().await.unwrap_err();

    assert!(!ctx.api.session().state().session.is_authenticated());
    assert!(matches!(ctx.failed(err, urls::LOAD_FAILED), CliError::SessionExpired));
}

#[tokio::test]
async fn forbidden_while_signed_in_uses_detail() {
    let ctx = context(403, json!({"detail": "You do not have permission to perform this action."}), true);

    let err = ctx.api.list_users().await.unwrap_err();

    match ctx.failed(err, admin::LOAD_FAILED) {
        CliError::Failed(message) => assert_eq!(message, "You do not have permission to perform this action."),
        other => panic!("expected backend detail, got {other:?}"),
    }
}

// =============================================================================
// EXPLORE VISIT
// =============================================================================

#[test]
fn explore_visit_hands_out_link_and_counts_it() {
    let ctx = context(200, Value::Null, false);
    let mut state = ExploreState::default();
    state.loaded(public_urls());

    let link = explore_visit(&mut state, &ctx.api, 2).unwrap();

    assert_eq!(link, "http://localhost:8000/api/bbb222/");
    assert_eq!(state.urls[1].visit_count, 6);
    assert_eq!(state.urls[0].visit_count, 3);
}

#[test]
fn explore_visit_shows_in_sorted_listing() {
    let ctx = context(200, Value::Null, false);
    let mut state = ExploreState::default();
    state.loaded(public_urls());
    state.sort_by(SortField::VisitCount);
    for _ in 0..3 {
        explore_visit(&mut state, &ctx.api, 1).unwrap();
    }

    let visible = state.visible();
    assert_eq!(visible[0].id, 1);
    assert_eq!(visible[0].visit_count, 6);
}

#[test]
fn explore_visit_rejects_unknown_id() {
    let ctx = context(200, Value::Null, false);
    let mut state = ExploreState::default();
    state.loaded(public_urls());

    assert!(matches!(explore_visit(&mut state, &ctx.api, 99), Err(CliError::UnknownUrl(99))));
    assert_eq!(state.urls.iter().map(|u| u.visit_count).sum::<u64>(), 8);
}
