//! Identity claims carried in the backend's access token.
//!
//! The client holds no signing key, so the payload is decoded without
//! signature or expiry checks; the backend rejects bad tokens with a 401 and
//! the refresh path takes over from there.

use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use super::SessionError;
use crate::net::types::deserialize_id;

/// Account role. Anything other than `"admin"` is treated as a regular user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    #[serde(other)]
    Regular,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Regular => "regular",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(deserialize_with = "deserialize_id")]
    pub user_id: i64,
    #[serde(default)]
    pub role: Role,
    /// Expiry as unix seconds.
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub iat: Option<i64>,
    #[serde(default)]
    pub jti: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl Claims {
    /// Whether `exp` lies at or before `now_secs`. Tokens without `exp` never expire locally.
    #[must_use]
    pub fn is_expired_at(&self, now_secs: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now_secs)
    }
}

/// Decode the payload of a JWT access token into [`Claims`].
///
/// # Errors
///
/// Returns [`SessionError::InvalidToken`] for anything that is not a
/// three-part JWT with a JSON payload carrying at least `user_id`.
pub fn decode_claims(token: &str) -> Result<Claims, SessionError> {
    let mut validation = Validation::default();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    jsonwebtoken::decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims)
        .map_err(|e| SessionError::InvalidToken(e.to_string()))
}

#[cfg(test)]
#[path = "claims_test.rs"]
mod tests;
