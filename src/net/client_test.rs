use serde_json::json;

use super::*;
use crate::guard::{GuardOutcome, Route, RouteGuard};
use crate::session::Role;
use crate::test_helpers::{MockTransport, logged_in_store, refreshed_token, respond, token_pair};

const PROFILE: &str = "/api/users/1/";

/// Backend that accepts only `valid` as bearer and answers refreshes with `refresh_reply`.
fn backend(valid: String, refresh_reply: Result<HttpResponse, ApiError>) -> Arc<MockTransport> {
    let refresh_reply = std::sync::Mutex::new(Some(refresh_reply));
    MockTransport::new(move |request| {
        if request.path == REFRESH_PATH {
            let reply = refresh_reply.lock().unwrap().take();
            return reply.unwrap_or_else(|| respond(500, json!({ "detail": "refresh called twice" })));
        }
        if request.bearer.as_deref() == Some(valid.as_str()) {
            respond(200, json!({ "id": 1, "username": "ada" }))
        } else {
            respond(401, json!({ "detail": "Given token not valid for any token type" }))
        }
    })
}

fn client(transport: Arc<MockTransport>, store: Arc<SessionStore>) -> AuthClient {
    AuthClient::new(transport, store)
}

#[tokio::test]
async fn valid_token_never_triggers_refresh() {
    let pair = token_pair(1, Role::Regular);
    let transport = backend(pair.access.clone(), respond(200, json!({})));
    let client = client(transport.clone(), logged_in_store(&pair));

    let response = client.execute(HttpRequest::new(Method::GET, PROFILE)).await.unwrap();
    assert_eq!(response.status, 200);

    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].bearer.as_deref(), Some(pair.access.as_str()));
    assert!(!requests[0].retried);
    assert_eq!(transport.count_path(REFRESH_PATH), 0);
}

#[tokio::test]
async fn single_401_refreshes_once_and_retries_once() {
    let pair = token_pair(1, Role::Regular);
    let fresh = refreshed_token(1, Role::Regular);
    let transport = backend(fresh.clone(), respond(200, json!({ "access": fresh })));
    let store = logged_in_store(&pair);
    let client = client(transport.clone(), store.clone());

    let response = client.execute(HttpRequest::new(Method::GET, PROFILE)).await.unwrap();
    assert_eq!(response.body["username"], "ada");

    let requests = transport.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[0].bearer.as_deref(), Some(pair.access.as_str()));
    assert_eq!(requests[1].path, REFRESH_PATH);
    assert_eq!(requests[2].path, PROFILE);
    assert_eq!(requests[2].bearer.as_deref(), Some(fresh.as_str()));
    assert!(requests[2].retried);

    assert_eq!(store.access_token().as_deref(), Some(fresh.as_str()));
    assert_eq!(store.refresh_token().as_deref(), Some("refresh-1"));
}

#[tokio::test]
async fn refresh_call_carries_refresh_token_and_no_bearer() {
    let pair = token_pair(1, Role::Regular);
    let fresh = refreshed_token(1, Role::Regular);
    let transport = backend(fresh.clone(), respond(200, json!({ "access": fresh })));
    let client = client(transport.clone(), logged_in_store(&pair));

    client.execute(HttpRequest::new(Method::GET, PROFILE)).await.unwrap();

    let refresh = &transport.requests()[1];
    assert_eq!(refresh.method, Method::POST);
    assert_eq!(refresh.body, Some(json!({ "refresh": "refresh-1" })));
    assert_eq!(refresh.bearer, None);
}

#[tokio::test]
async fn failed_refresh_clears_session_and_surfaces_original_error() {
    let pair = token_pair(1, Role::Regular);
    let transport = backend(
        "never-valid".into(),
        respond(401, json!({ "detail": "Token is invalid or expired", "code": "token_not_valid" })),
    );
    let store = logged_in_store(&pair);
    let client = client(transport.clone(), store.clone());

    let err = client.execute(HttpRequest::new(Method::GET, PROFILE)).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(err.detail(), Some("Given token not valid for any token type"));

    assert_eq!(transport.requests().len(), 2);
    assert_eq!(store.access_token(), None);
    assert_eq!(store.refresh_token(), None);
    assert!(store.claims().is_none());
}

#[tokio::test]
async fn retry_that_fails_again_is_not_retried() {
    let pair = token_pair(1, Role::Regular);
    let fresh = refreshed_token(1, Role::Regular);
    // The refreshed token is also rejected.
    let transport = backend("never-valid".into(), respond(200, json!({ "access": fresh })));
    let client = client(transport.clone(), logged_in_store(&pair));

    let err = client.execute(HttpRequest::new(Method::GET, PROFILE)).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(transport.requests().len(), 3);
    assert_eq!(transport.count_path(REFRESH_PATH), 1);
}

#[tokio::test]
async fn undecodable_refreshed_token_counts_as_refresh_failure() {
    let pair = token_pair(1, Role::Regular);
    let transport = backend("never-valid".into(), respond(200, json!({ "access": "garbage" })));
    let store = logged_in_store(&pair);
    let client = client(transport.clone(), store.clone());

    let err = client.execute(HttpRequest::new(Method::GET, PROFILE)).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(transport.requests().len(), 2);
    assert!(store.claims().is_none());
}

#[tokio::test]
async fn other_errors_pass_through_without_refresh() {
    let pair = token_pair(1, Role::Regular);
    let transport = MockTransport::new(|request| match request.path.as_str() {
        "/api/urls/9/" => respond(404, json!({ "detail": "Not found." })),
        _ => respond(500, serde_json::Value::Null),
    });
    let store = logged_in_store(&pair);
    let client = client(transport.clone(), store.clone());

    let err = client.execute(HttpRequest::new(Method::DELETE, "/api/urls/9/")).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.detail(), Some("Not found."));

    let err = client.execute(HttpRequest::new(Method::GET, "/api/users/")).await.unwrap_err();
    assert_eq!(err.status(), Some(500));

    assert_eq!(transport.count_path(REFRESH_PATH), 0);
    assert!(store.claims().is_some());
}

#[tokio::test]
async fn transport_failure_passes_through() {
    let pair = token_pair(1, Role::Regular);
    let transport = MockTransport::new(|_| Err(ApiError::Transport("connection refused".into())));
    let client = client(transport, logged_in_store(&pair));

    let err = client.execute(HttpRequest::new(Method::GET, PROFILE)).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
}

#[tokio::test]
async fn missing_refresh_token_clears_without_calling_refresh() {
    let transport = backend("never-valid".into(), respond(200, json!({})));
    let store = Arc::new(SessionStore::in_memory());
    store.load();
    let client = client(transport.clone(), store.clone());

    let err = client.execute(HttpRequest::new(Method::GET, PROFILE)).await.unwrap_err();
    assert_eq!(err.status(), Some(401));
    assert_eq!(transport.count_path(REFRESH_PATH), 0);
    assert_eq!(transport.requests()[0].bearer, None);
}

#[tokio::test]
async fn rotated_refresh_token_is_stored() {
    let pair = token_pair(1, Role::Regular);
    let fresh = refreshed_token(1, Role::Regular);
    let transport = backend(fresh.clone(), respond(200, json!({ "access": fresh, "refresh": "rotated" })));
    let store = logged_in_store(&pair);
    let client = client(transport, store.clone());

    client.execute(HttpRequest::new(Method::GET, PROFILE)).await.unwrap();
    assert_eq!(store.refresh_token().as_deref(), Some("rotated"));
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh() {
    let pair = token_pair(1, Role::Regular);
    let fresh = refreshed_token(1, Role::Regular);
    let transport = backend(fresh.clone(), respond(200, json!({ "access": fresh })));
    let client = client(transport.clone(), logged_in_store(&pair));

    let (a, b) = tokio::join!(
        client.execute(HttpRequest::new(Method::GET, PROFILE)),
        client.execute(HttpRequest::new(Method::GET, "/api/users/1/shortened_url/")),
    );
    assert_eq!(a.unwrap().status, 200);
    assert_eq!(b.unwrap().status, 200);
    assert_eq!(transport.count_path(REFRESH_PATH), 1);
    assert_eq!(transport.requests().len(), 5);
}

#[tokio::test]
async fn public_requests_skip_bearer_and_refresh() {
    let pair = token_pair(1, Role::Regular);
    let transport = MockTransport::new(|_| respond(401, json!({ "detail": "No active account found" })));
    let store = logged_in_store(&pair);
    let client = client(transport.clone(), store.clone());

    let err = client.execute_public(HttpRequest::new(Method::POST, "/api/token/")).await.unwrap_err();
    assert_eq!(err.detail(), Some("No active account found"));
    assert_eq!(transport.requests().len(), 1);
    assert_eq!(transport.requests()[0].bearer, None);
    assert!(store.claims().is_some());
}

#[tokio::test]
async fn request_json_decodes_body() {
    let pair = token_pair(1, Role::Regular);
    let transport = MockTransport::new(|request| match request.path.as_str() {
        "/api/urls/1/visit/" => respond(200, json!({ "redirect_to": "https://example.com" })),
        _ => respond(200, json!({ "unexpected": true })),
    });
    let client = client(transport, logged_in_store(&pair));

    let visit: crate::net::types::VisitResponse =
        client.request_json(Method::GET, "/api/urls/1/visit/", None).await.unwrap();
    assert_eq!(visit.redirect_to, "https://example.com");

    let err = client.request_json::<crate::net::types::VisitResponse>(Method::GET, "/x/", None).await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)));
}

#[tokio::test]
async fn invalid_refresh_token_ends_at_landing_redirect() {
    let pair = token_pair(1, Role::Regular);
    let transport = backend("never-valid".into(), respond(401, json!({ "detail": "Token is invalid or expired" })));
    let store = logged_in_store(&pair);
    let client = client(transport, store.clone());
    assert_eq!(RouteGuard::AnyAuthenticated.check(&store.state()), GuardOutcome::Render);

    client.execute(HttpRequest::new(Method::GET, PROFILE)).await.unwrap_err();

    assert_eq!(store.state().session.access_token(), None);
    assert_eq!(store.state().session.refresh_token(), None);
    assert_eq!(RouteGuard::AnyAuthenticated.check(&store.state()), GuardOutcome::Redirect(Route::Landing));
}
