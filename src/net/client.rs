//! Authenticated API client with refresh-and-retry on 401.
//!
//! FLOW
//! ====
//! 1. Attach the stored access token as a bearer credential.
//! 2. On a 401 for a request not yet retried, mark it retried and exchange the
//!    stored refresh token at `/api/token/refresh/`.
//! 3. Refresh succeeded: store the new access token and resend once.
//!    Refresh failed: clear the session and return the original 401.
//!
//! Refreshes are single-flight. A request that hits 401 while another request
//! is refreshing waits for it, then retries with the token that refresh
//! produced instead of spending the refresh token a second time.
//!
//! ERROR HANDLING
//! ==============
//! Every non-2xx response other than the handled 401 is returned untouched as
//! [`ApiError::Status`]; transport failures come back as
//! [`ApiError::Transport`].

use std::sync::Arc;

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use super::transport::{HttpRequest, HttpResponse, Transport};
use super::types::{ApiError, RefreshRequest, RefreshedToken};
use crate::session::SessionStore;

pub const REFRESH_PATH: &str = "/api/token/refresh/";
const UNAUTHORIZED: u16 = 401;

pub struct AuthClient {
    transport: Arc<dyn Transport>,
    session: Arc<SessionStore>,
    refresh_lock: Mutex<()>,
}

impl AuthClient {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<SessionStore>) -> Self {
        Self { transport, session, refresh_lock: Mutex::new(()) }
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Send an authenticated request and return the 2xx response.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] for non-success responses (after at most
    /// one refresh-and-retry on 401) and [`ApiError::Transport`] when no
    /// response was received.
    pub async fn execute(&self, mut request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let sent_with = self.session.access_token();
        request.bearer.clone_from(&sent_with);

        let response = self.dispatch(&request).await?;
        if response.status != UNAUTHORIZED || request.retried {
            return into_result(response);
        }

        request.retried = true;
        let Some(fresh) = self.refresh_access(sent_with.as_deref()).await else {
            return into_result(response);
        };

        request.bearer = Some(fresh);
        let retry = self.dispatch(&request).await?;
        into_result(retry)
    }

    /// Send a request without credentials and without the refresh policy.
    ///
    /// Used for the credential exchanges themselves (register, token obtain),
    /// where a 401 means "wrong password", not "expired token".
    ///
    /// # Errors
    ///
    /// Same as [`AuthClient::execute`].
    pub async fn execute_public(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let response = self.dispatch(&request).await?;
        into_result(response)
    }

    /// Authenticated request with an optional JSON body, decoded into `T`.
    ///
    /// # Errors
    ///
    /// Same as [`AuthClient::execute`], plus [`ApiError::Decode`] when the
    /// body does not match `T`.
    pub async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, ApiError> {
        let mut request = HttpRequest::new(method, path);
        request.body = body;
        let response = self.execute(request).await?;
        decode_body(response)
    }

    async fn dispatch(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        tracing::debug!(
            method = %request.method,
            path = %request.path,
            retried = request.retried,
            authenticated = request.bearer.is_some(),
            "dispatching request"
        );
        let response = self.transport.send(request).await?;
        tracing::debug!(path = %request.path, status = response.status, "response received");
        Ok(response)
    }

    /// Obtain a usable access token after a 401, or clear the session.
    async fn refresh_access(&self, stale: Option<&str>) -> Option<String> {
        let _guard = self.refresh_lock.lock().await;

        if let Some(current) = self.session.access_token() {
            if stale != Some(current.as_str()) {
                tracing::debug!("access token was refreshed concurrently; reusing it");
                return Some(current);
            }
        }

        let Some(refresh) = self.session.refresh_token() else {
            tracing::warn!("received 401 without a refresh token; clearing session");
            self.session.clear();
            return None;
        };

        match self.exchange_refresh_token(&refresh).await {
            Ok(access) => {
                tracing::info!("access token refreshed");
                Some(access)
            }
            Err(e) => {
                tracing::warn!(error = %e, "token refresh failed; clearing session");
                self.session.clear();
                None
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh: &str) -> Result<String, ApiError> {
        let body = serde_json::to_value(RefreshRequest { refresh }).map_err(|e| ApiError::Decode(e.to_string()))?;
        let request = HttpRequest::new(Method::POST, REFRESH_PATH).with_body(body);
        let response = into_result(self.dispatch(&request).await?)?;
        let token: RefreshedToken = decode_body(response)?;
        self.session.store_refreshed(&token.access, token.refresh.as_deref())?;
        Ok(token.access)
    }
}

fn into_result(response: HttpResponse) -> Result<HttpResponse, ApiError> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status { status: response.status, body: response.body })
    }
}

pub(crate) fn decode_body<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    serde_json::from_value(response.body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
