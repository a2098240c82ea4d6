//! Persisted session store with synchronous change notification.

use tokio::sync::watch;

use super::claims::{Claims, decode_claims};
use super::storage::{ACCESS_KEY, MemoryStorage, REFRESH_KEY, TokenStorage};
use super::{Session, SessionError, SessionState, TokenPair};

/// Process-wide holder of the token pair and derived claims.
///
/// Writers persist to storage first and publish second, so a subscriber never
/// observes a session that would not survive a restart.
pub struct SessionStore {
    storage: Box<dyn TokenStorage>,
    state: watch::Sender<SessionState>,
}

impl SessionStore {
    /// Create a store in the loading phase. Call [`SessionStore::load`] to hydrate.
    pub fn new(storage: impl TokenStorage + 'static) -> Self {
        let (state, _) = watch::channel(SessionState { loading: true, session: Session::default() });
        Self { storage: Box::new(storage), state }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// Hydrate from storage and leave the loading phase for good.
    ///
    /// A missing, unreadable or undecodable access token yields a logged-out
    /// session; nothing is raised to the caller.
    pub fn load(&self) -> SessionState {
        let access = self.read_item(ACCESS_KEY);
        let refresh = self.read_item(REFRESH_KEY);

        let session = match access {
            None => Session::refresh_only(refresh),
            Some(access) => match decode_claims(&access) {
                Ok(claims) => {
                    tracing::debug!(user_id = claims.user_id, role = claims.role.as_str(), "session restored");
                    Session::authenticated(access, refresh, claims)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "discarding undecodable stored access token");
                    self.erase_tokens();
                    Session::default()
                }
            },
        };

        let next = SessionState { loading: false, session };
        self.state.send_replace(next.clone());
        next
    }

    /// Persist a fresh token pair and publish the decoded session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidToken`] if the access token does not
    /// decode (nothing is persisted), or a storage error.
    pub fn login(&self, tokens: &TokenPair) -> Result<Claims, SessionError> {
        let claims = decode_claims(&tokens.access)?;
        self.storage.set_item(ACCESS_KEY, &tokens.access)?;
        self.storage.set_item(REFRESH_KEY, &tokens.refresh)?;

        tracing::info!(user_id = claims.user_id, role = claims.role.as_str(), "session established");
        let session = Session::authenticated(tokens.access.clone(), Some(tokens.refresh.clone()), claims.clone());
        self.state.send_modify(|state| state.session = session);
        Ok(claims)
    }

    /// Erase both tokens and the claims. Safe to call when already logged out.
    ///
    /// # Errors
    ///
    /// Returns a storage error if the persisted tokens could not be removed;
    /// the in-memory session is cleared regardless.
    pub fn logout(&self) -> Result<(), SessionError> {
        let access = self.storage.remove_item(ACCESS_KEY);
        let refresh = self.storage.remove_item(REFRESH_KEY);
        self.state.send_modify(|state| state.session = Session::default());
        access?;
        refresh?;
        Ok(())
    }

    /// Store an access token obtained from the refresh endpoint.
    ///
    /// A rotated refresh token replaces the stored one when present.
    pub(crate) fn store_refreshed(&self, access: &str, refresh: Option<&str>) -> Result<Claims, SessionError> {
        let claims = decode_claims(access)?;
        self.storage.set_item(ACCESS_KEY, access)?;
        if let Some(refresh) = refresh {
            self.storage.set_item(REFRESH_KEY, refresh)?;
        }

        let refresh = refresh.map(ToOwned::to_owned).or_else(|| self.refresh_token());
        let session = Session::authenticated(access.to_owned(), refresh, claims.clone());
        self.state.send_modify(|state| state.session = session);
        Ok(claims)
    }

    /// Drop the session after an irrecoverable refresh failure.
    pub(crate) fn clear(&self) {
        if let Err(e) = self.logout() {
            tracing::warn!(error = %e, "failed to erase persisted tokens");
        }
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every published [`SessionState`].
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    #[must_use]
    pub fn claims(&self) -> Option<Claims> {
        self.state.borrow().session.claims.clone()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.state.borrow().session.access_token.clone()
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.state.borrow().session.refresh_token.clone()
    }

    fn read_item(&self, key: &str) -> Option<String> {
        match self.storage.get_item(key) {
            Ok(value) => value.filter(|v| !v.is_empty()),
            Err(e) => {
                tracing::warn!(key, error = %e, "session storage unreadable; treating as logged out");
                None
            }
        }
    }

    fn erase_tokens(&self) {
        for key in [ACCESS_KEY, REFRESH_KEY] {
            if let Err(e) = self.storage.remove_item(key) {
                tracing::warn!(key, error = %e, "failed to erase stored token");
            }
        }
    }
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
