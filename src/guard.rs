//! Route table and access policies.
//!
//! SYSTEM CONTEXT
//! ==============
//! Every navigation is checked against the current [`SessionState`]. A role
//! mismatch is not an error: the caller is sent to the home page that fits
//! their role, or to the landing page when there is no session.

#[cfg(test)]
#[path = "guard_test.rs"]
mod guard_test;

use crate::session::{Role, SessionState};

/// Pages a guard can redirect to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Landing,
    UserHome,
    AdminHome,
}

impl Route {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Landing => "/",
            Self::UserHome => "/home",
            Self::AdminHome => "/admin",
        }
    }

    /// Home page for a signed-in role.
    #[must_use]
    pub fn home_for(role: Role) -> Self {
        match role {
            Role::Admin => Self::AdminHome,
            Role::Regular => Self::UserHome,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Session hydration has not finished yet.
    Loading,
    Render,
    Redirect(Route),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouteGuard {
    /// Only reachable without a session (landing, login, register).
    PublicOnly,
    AnyAuthenticated,
    RegularOnly,
    AdminOnly,
}

impl RouteGuard {
    /// Decide what a navigation should do given the signed-in role, if any.
    #[must_use]
    pub fn evaluate(self, role: Option<Role>, loading: bool) -> GuardOutcome {
        if loading {
            return GuardOutcome::Loading;
        }
        match (self, role) {
            (Self::PublicOnly, None) => GuardOutcome::Render,
            (Self::PublicOnly, Some(role)) => GuardOutcome::Redirect(Route::home_for(role)),
            (_, None) => GuardOutcome::Redirect(Route::Landing),
            (Self::AnyAuthenticated, Some(_))
            | (Self::RegularOnly, Some(Role::Regular))
            | (Self::AdminOnly, Some(Role::Admin)) => GuardOutcome::Render,
            (Self::RegularOnly, Some(Role::Admin)) => GuardOutcome::Redirect(Route::AdminHome),
            (Self::AdminOnly, Some(Role::Regular)) => GuardOutcome::Redirect(Route::UserHome),
        }
    }

    #[must_use]
    pub fn check(self, state: &SessionState) -> GuardOutcome {
        self.evaluate(state.claims().map(|c| c.role), state.loading)
    }

    /// Guard protecting `path`, or `None` for paths outside the route table.
    #[must_use]
    pub fn for_path(path: &str) -> Option<Self> {
        match path {
            "/" | "/login" | "/register" => Some(Self::PublicOnly),
            "/admin" => Some(Self::AdminOnly),
            "/home" => Some(Self::RegularOnly),
            "/my-urls" | "/explore-urls" | "/profile" => Some(Self::AnyAuthenticated),
            _ => None,
        }
    }
}

/// Resolve a navigation to `path`. Unknown paths fall back to the landing page.
#[must_use]
pub fn navigate(path: &str, state: &SessionState) -> GuardOutcome {
    match RouteGuard::for_path(path) {
        Some(guard) => guard.check(state),
        None => GuardOutcome::Redirect(Route::Landing),
    }
}
