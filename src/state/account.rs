//! Registration outcome and the profile page.

#[cfg(test)]
#[path = "account_test.rs"]
mod tests;

use crate::net::types::{ApiError, ProfileUpdate, UserAccount};

pub const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";
pub const PROFILE_LOAD_FAILED: &str = "Failed to fetch profile";
pub const PROFILE_UPDATE_FAILED: &str = "Failed to update profile";
pub const PASSWORD_CHANGE_FAILED: &str = "Failed to change password";
pub const PROFILE_UPDATED: &str = "Profile updated successfully!";
pub const PASSWORD_CHANGED: &str = "Password changed successfully!";

/// Message for a failed register-then-login: `detail`, else the first `email` error.
#[must_use]
pub fn registration_error_message(err: &ApiError) -> String {
    err.detail().or_else(|| err.field_error("email")).unwrap_or(REGISTRATION_FAILED).to_owned()
}

#[derive(Clone, Debug)]
pub struct ProfileState {
    pub profile: Option<UserAccount>,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<String>,
}

impl Default for ProfileState {
    fn default() -> Self {
        Self { profile: None, loading: true, error: None, notice: None }
    }
}

impl ProfileState {
    pub fn loaded(&mut self, profile: UserAccount) {
        self.profile = Some(profile);
        self.loading = false;
        self.error = None;
    }

    pub fn failed(&mut self, err: &ApiError, fallback: &str) {
        self.loading = false;
        self.notice = None;
        self.error = Some(err.user_message(fallback));
    }

    /// Edit form pre-filled from the loaded profile.
    #[must_use]
    pub fn edit_form(&self) -> Option<ProfileUpdate> {
        self.profile.as_ref().map(ProfileUpdate::from_account)
    }

    pub fn updated(&mut self, profile: UserAccount) {
        self.profile = Some(profile);
        self.error = None;
        self.notice = Some(PROFILE_UPDATED.to_owned());
    }

    pub fn password_changed(&mut self) {
        self.error = None;
        self.notice = Some(PASSWORD_CHANGED.to_owned());
    }
}
