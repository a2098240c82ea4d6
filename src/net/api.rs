//! Typed bindings for the backend REST endpoints.
//!
//! Every call except register/token-obtain goes through [`AuthClient::execute`]
//! and therefore inherits bearer injection and refresh-and-retry.

#![allow(clippy::missing_errors_doc)]

use std::sync::Arc;

use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::client::{AuthClient, decode_body};
use super::transport::{HttpRequest, ReqwestTransport, Transport, join_url};
use super::types::{
    ApiError, ChangePasswordRequest, LoginRequest, MessageResponse, ProfileUpdate, RegisterRequest, Registration,
    ShortenedUrl, UrlInput, UserAccount, VisitResponse,
};
use crate::config::ClientConfig;
use crate::session::{Claims, FileStorage, SessionError, SessionStore, TokenPair};

// =============================================================================
// ENDPOINTS
// =============================================================================

pub const REGISTER_PATH: &str = "/api/register/";
pub const TOKEN_PATH: &str = "/api/token/";
pub const USERS_PATH: &str = "/api/users/";
pub const PUBLIC_URLS_PATH: &str = "/api/users/public_urls/";
pub const URLS_PATH: &str = "/api/urls/";
pub const CHANGE_PASSWORD_PATH: &str = "/users/change_password/";

fn user_endpoint(user_id: i64) -> String {
    format!("/api/users/{user_id}/")
}

fn block_user_endpoint(user_id: i64) -> String {
    format!("/api/users/{user_id}/block_user/")
}

fn user_urls_endpoint(user_id: i64) -> String {
    format!("/api/users/{user_id}/shortened_url/")
}

fn url_endpoint(url_id: i64) -> String {
    format!("/api/urls/{url_id}/")
}

fn visit_endpoint(url_id: i64) -> String {
    format!("/api/urls/{url_id}/visit/")
}

// =============================================================================
// API
// =============================================================================

/// Session-aware facade over every endpoint the dashboard uses.
pub struct ShortlinkApi {
    client: AuthClient,
    base_url: String,
}

impl ShortlinkApi {
    pub fn new(client: AuthClient, base_url: &str) -> Self {
        Self { client, base_url: base_url.trim_end_matches('/').to_owned() }
    }

    /// Wire a file-backed session and a reqwest transport from `config`.
    ///
    /// The session is hydrated before returning.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ApiError> {
        let session = Arc::new(SessionStore::new(FileStorage::new(&config.session_file)));
        session.load();
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new(&config.base_url, config.timeouts)?);
        Ok(Self::new(AuthClient::new(transport, session), &config.base_url))
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionStore> {
        self.client.session()
    }

    /// Id of the signed-in user.
    pub fn current_user_id(&self) -> Result<i64, ApiError> {
        self.session().claims().map(|c| c.user_id).ok_or(ApiError::NotAuthenticated)
    }

    // -------------------------------------------------------------------------
    // auth
    // -------------------------------------------------------------------------

    pub async fn register(&self, request: &RegisterRequest) -> Result<Registration, ApiError> {
        let request = HttpRequest::new(Method::POST, REGISTER_PATH).with_body(to_body(request)?);
        decode_body(self.client.execute_public(request).await?)
    }

    /// Exchange credentials for a token pair without touching the session.
    pub async fn obtain_token(&self, email: &str, password: &str) -> Result<TokenPair, ApiError> {
        let body = to_body(&LoginRequest { username: email, password })?;
        let request = HttpRequest::new(Method::POST, TOKEN_PATH).with_body(body);
        decode_body(self.client.execute_public(request).await?)
    }

    /// Obtain a token pair and establish the session from it.
    pub async fn login(&self, email: &str, password: &str) -> Result<Claims, ApiError> {
        let tokens = self.obtain_token(email, password).await?;
        Ok(self.session().login(&tokens)?)
    }

    /// Create the account, then sign in with its email and password.
    pub async fn register_and_login(&self, request: &RegisterRequest) -> Result<Claims, ApiError> {
        self.register(request).await?;
        self.login(&request.email, &request.password).await
    }

    pub fn logout(&self) -> Result<(), SessionError> {
        self.session().logout()
    }

    pub async fn change_password(&self, current_password: &str, new_password: &str) -> Result<(), ApiError> {
        let body = to_body(&ChangePasswordRequest { current_password, new_password })?;
        self.client.execute(HttpRequest::new(Method::POST, CHANGE_PASSWORD_PATH).with_body(body)).await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // users
    // -------------------------------------------------------------------------

    /// Admin-only listing of every account.
    pub async fn list_users(&self) -> Result<Vec<UserAccount>, ApiError> {
        self.client.request_json(Method::GET, USERS_PATH, None).await
    }

    pub async fn get_user(&self, user_id: i64) -> Result<UserAccount, ApiError> {
        self.client.request_json(Method::GET, &user_endpoint(user_id), None).await
    }

    pub async fn update_user(&self, user_id: i64, update: &ProfileUpdate) -> Result<UserAccount, ApiError> {
        self.client.request_json(Method::PUT, &user_endpoint(user_id), Some(to_body(update)?)).await
    }

    /// Toggle the account's active flag; returns the backend's confirmation message.
    pub async fn block_user(&self, user_id: i64) -> Result<String, ApiError> {
        let reply: MessageResponse =
            self.client.request_json(Method::POST, &block_user_endpoint(user_id), None).await?;
        Ok(reply.message)
    }

    pub async fn my_profile(&self) -> Result<UserAccount, ApiError> {
        self.get_user(self.current_user_id()?).await
    }

    // -------------------------------------------------------------------------
    // urls
    // -------------------------------------------------------------------------

    pub async fn user_urls(&self, user_id: i64) -> Result<Vec<ShortenedUrl>, ApiError> {
        self.client.request_json(Method::GET, &user_urls_endpoint(user_id), None).await
    }

    pub async fn my_urls(&self) -> Result<Vec<ShortenedUrl>, ApiError> {
        self.user_urls(self.current_user_id()?).await
    }

    pub async fn public_urls(&self) -> Result<Vec<ShortenedUrl>, ApiError> {
        self.client.request_json(Method::GET, PUBLIC_URLS_PATH, None).await
    }

    pub async fn create_url(&self, original_url: &str) -> Result<ShortenedUrl, ApiError> {
        let body = to_body(&UrlInput { original_url })?;
        self.client.request_json(Method::POST, URLS_PATH, Some(body)).await
    }

    pub async fn update_url(&self, url_id: i64, original_url: &str) -> Result<ShortenedUrl, ApiError> {
        let body = to_body(&UrlInput { original_url })?;
        self.client.request_json(Method::PUT, &url_endpoint(url_id), Some(body)).await
    }

    pub async fn delete_url(&self, url_id: i64) -> Result<(), ApiError> {
        self.client.execute(HttpRequest::new(Method::DELETE, url_endpoint(url_id))).await?;
        Ok(())
    }

    /// Resolve the link's destination; the backend counts the visit.
    pub async fn visit_url(&self, url_id: i64) -> Result<String, ApiError> {
        let reply: VisitResponse = self.client.request_json(Method::GET, &visit_endpoint(url_id), None).await?;
        Ok(reply.redirect_to)
    }

    // -------------------------------------------------------------------------
    // links
    // -------------------------------------------------------------------------

    /// Public redirect link for a short code.
    #[must_use]
    pub fn short_link(&self, short_code: &str) -> String {
        short_link(&self.base_url, short_code)
    }

    /// Absolute location of a link's QR image, if it has one.
    #[must_use]
    pub fn qr_link(&self, url: &ShortenedUrl) -> Option<String> {
        url.qr_code.as_deref().filter(|qr| !qr.is_empty()).map(|qr| qr_link(&self.base_url, qr))
    }
}

#[must_use]
pub fn short_link(base_url: &str, short_code: &str) -> String {
    join_url(base_url, &format!("api/{short_code}/"))
}

/// QR paths are served relative to the backend unless already absolute.
#[must_use]
pub fn qr_link(base_url: &str, qr_code: &str) -> String {
    if qr_code.starts_with("http://") || qr_code.starts_with("https://") {
        qr_code.to_owned()
    } else {
        join_url(base_url, qr_code)
    }
}

fn to_body<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
