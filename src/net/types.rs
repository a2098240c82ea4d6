//! Wire DTOs and the API error type.
//!
//! DESIGN
//! ======
//! Field names follow the backend's JSON verbatim, including its
//! `orginal_url` spelling, which is mapped onto `original_url` here so the
//! typo stays at the boundary.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::error::ErrorCode;
use crate::session::{Role, SessionError};

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced an HTTP response (DNS, connect, timeout).
    #[error("request failed: {0}")]
    Transport(String),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: Value },

    /// A success response did not have the expected shape.
    #[error("response parse failed: {0}")]
    Decode(String),

    /// The call needs a logged-in user and there is none.
    #[error("not logged in")]
    NotAuthenticated,

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The backend's `detail` message, when the error body carries one.
    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { body, .. } => body.get("detail").and_then(Value::as_str),
            _ => None,
        }
    }

    /// First validation message for `field` (`{"email": ["..."]}`).
    #[must_use]
    pub fn field_error(&self, field: &str) -> Option<&str> {
        let Self::Status { body, .. } = self else {
            return None;
        };
        match body.get(field)? {
            Value::String(message) => Some(message),
            Value::Array(messages) => messages.first().and_then(Value::as_str),
            _ => None,
        }
    }

    /// Message to show a person: the backend's `detail`, else `fallback`.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.detail().unwrap_or(fallback).to_owned()
    }
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "E_TRANSPORT",
            Self::Status { status: 401, .. } => "E_UNAUTHORIZED",
            Self::Status { status: 403, .. } => "E_FORBIDDEN",
            Self::Status { status: 404, .. } => "E_NOT_FOUND",
            Self::Status { status: 400, .. } => "E_VALIDATION",
            Self::Status { .. } => "E_HTTP_STATUS",
            Self::Decode(_) => "E_DECODE",
            Self::NotAuthenticated => "E_NOT_AUTHENTICATED",
            Self::Session(e) => e.error_code(),
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// A shortened link as returned by the backend.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortenedUrl {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
    /// Owner account, embedded by the backend.
    #[serde(default)]
    pub user: Option<UserAccount>,
    #[serde(rename = "orginal_url")]
    pub original_url: String,
    pub short_code: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub title: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub description: String,
    /// Path or absolute URL of the QR image.
    #[serde(default)]
    pub qr_code: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub visit_count: u64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl ShortenedUrl {
    #[must_use]
    pub fn owner_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }
}

/// A user account as seen by its owner or an admin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: i64,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub username: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub first_name: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub last_name: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub email: String,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
    #[serde(default)]
    pub role: Role,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub total_shortened_links: u64,
}

impl UserAccount {
    /// `"username last_name"`, trimmed when either half is empty.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.username, self.last_name).trim().to_owned()
    }

    /// Label for the active flag as shown in the admin table.
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        if self.is_active { "Active" } else { "Blocked" }
    }
}

fn active_by_default() -> bool {
    true
}

// =============================================================================
// REQUEST / RESPONSE BODIES
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Body of `POST /api/register/`; the password is write-only.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
}

/// The token endpoint authenticates by email in the `username` field.
#[derive(Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

#[derive(Clone, Deserialize)]
pub struct RefreshedToken {
    pub access: String,
    #[serde(default)]
    pub refresh: Option<String>,
}

/// Body for creating or editing a link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UrlInput<'a> {
    #[serde(rename = "orginal_url")]
    pub original_url: &'a str,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ProfileUpdate {
    pub username: String,
    pub last_name: String,
    pub email: String,
}

impl ProfileUpdate {
    /// Start an edit form pre-filled from the current profile.
    #[must_use]
    pub fn from_account(account: &UserAccount) -> Self {
        Self {
            username: account.username.clone(),
            last_name: account.last_name.clone(),
            email: account.email.clone(),
        }
    }
}

#[derive(Clone, Serialize)]
pub struct ChangePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct VisitResponse {
    pub redirect_to: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

// =============================================================================
// SERDE HELPERS
// =============================================================================

/// Accept integer ids that arrive either as JSON numbers or numeric strings.
pub(crate) fn deserialize_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_i64().ok_or_else(|| D::Error::custom(format!("id out of range: {n}"))),
        Value::String(s) => s.trim().parse().map_err(|_| D::Error::custom(format!("non-numeric id: {s}"))),
        other => Err(D::Error::custom(format!("expected id, got {other}"))),
    }
}

/// Treat an explicit JSON `null` like an absent field.
fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
