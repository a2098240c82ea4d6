//! Admin console: user table, user detail, block/unblock.

#[cfg(test)]
#[path = "admin_test.rs"]
mod tests;

use crate::net::types::{ApiError, ShortenedUrl, UserAccount};
use crate::session::Role;

pub const LOAD_FAILED: &str = "Failed to fetch users";
pub const DETAIL_FAILED: &str = "Failed to fetch user details";

/// What the block button does for a given account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockAction {
    Block,
    Unblock,
}

impl BlockAction {
    /// Action offered for `user`, or `None` when the account cannot be blocked (admins).
    #[must_use]
    pub fn for_user(user: &UserAccount) -> Option<Self> {
        if user.role == Role::Admin {
            return None;
        }
        Some(if user.is_active { Self::Block } else { Self::Unblock })
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Unblock => "unblock",
        }
    }

    /// `is_active` after the action succeeds.
    #[must_use]
    pub fn resulting_active(self) -> bool {
        self == Self::Unblock
    }

    #[must_use]
    pub fn success_message(self) -> &'static str {
        match self {
            Self::Block => "User blocked successfully",
            Self::Unblock => "User unblocked successfully",
        }
    }

    #[must_use]
    pub fn failure_fallback(self) -> String {
        format!("Failed to {} user", self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserDetail {
    pub user: UserAccount,
    pub urls: Vec<ShortenedUrl>,
}

#[derive(Clone, Debug)]
pub struct AdminState {
    pub users: Vec<UserAccount>,
    pub loading: bool,
    pub error: Option<String>,
    pub selected: Option<UserDetail>,
}

impl Default for AdminState {
    fn default() -> Self {
        Self { users: Vec::new(), loading: true, error: None, selected: None }
    }
}

impl AdminState {
    pub fn loaded(&mut self, users: Vec<UserAccount>) {
        self.users = users;
        self.loading = false;
        self.error = None;
    }

    pub fn failed(&mut self, err: &ApiError) {
        self.loading = false;
        self.error = Some(err.user_message(LOAD_FAILED));
    }

    #[must_use]
    pub fn user(&self, user_id: i64) -> Option<&UserAccount> {
        self.users.iter().find(|u| u.id == user_id)
    }

    pub fn open_detail(&mut self, user: UserAccount, urls: Vec<ShortenedUrl>) {
        self.selected = Some(UserDetail { user, urls });
    }

    /// Reflect a successful block/unblock in the table and the open detail.
    pub fn apply_block(&mut self, user_id: i64, action: BlockAction) {
        let active = action.resulting_active();
        for user in self.users.iter_mut().filter(|u| u.id == user_id) {
            user.is_active = active;
        }
        if let Some(detail) = self.selected.as_mut().filter(|d| d.user.id == user_id) {
            detail.user.is_active = active;
        }
    }
}
