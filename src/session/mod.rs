//! Session state for the current caller: token pair plus decoded claims.
//!
//! SYSTEM CONTEXT
//! ==============
//! The [`SessionStore`] is the single in-process owner of the access/refresh
//! tokens. Route guards read it on every navigation; the authenticated client
//! reads it before every request and writes it on refresh.
//!
//! INVARIANT
//! =========
//! `claims` is only ever produced by decoding `access_token`, so the two are
//! either both present or both absent.

pub mod claims;
pub mod storage;
pub mod store;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

pub use claims::{Claims, Role, decode_claims};
pub use storage::{ACCESS_KEY, FileStorage, MemoryStorage, REFRESH_KEY, StorageError, TokenStorage};
pub use store::SessionStore;

/// Token pair returned by `POST /api/token/`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
    /// Role echoed by the backend next to the tokens; the claims are authoritative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Tokens plus the identity decoded from the access token.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    access_token: Option<String>,
    refresh_token: Option<String>,
    claims: Option<Claims>,
}

impl Session {
    fn authenticated(access_token: String, refresh_token: Option<String>, claims: Claims) -> Self {
        Self { access_token: Some(access_token), refresh_token, claims: Some(claims) }
    }

    fn refresh_only(refresh_token: Option<String>) -> Self {
        Self { access_token: None, refresh_token, claims: None }
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    #[must_use]
    pub fn claims(&self) -> Option<&Claims> {
        self.claims.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.claims.is_some()
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
            .field("claims", &self.claims)
            .finish()
    }
}

/// Snapshot published to every subscriber of the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionState {
    /// True only until the first [`SessionStore::load`] completes.
    pub loading: bool,
    pub session: Session,
}

impl SessionState {
    #[must_use]
    pub fn claims(&self) -> Option<&Claims> {
        self.session.claims()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("access token could not be decoded: {0}")]
    InvalidToken(String),

    #[error("session storage failed: {0}")]
    Storage(#[from] StorageError),
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidToken(_) => "E_INVALID_TOKEN",
            Self::Storage(_) => "E_SESSION_STORAGE",
        }
    }
}
