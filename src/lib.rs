//! Client SDK for the shortlink URL-shortening service.
//!
//! SYSTEM CONTEXT
//! ==============
//! The backend owns every piece of business logic (short codes, redirects,
//! visit counting, QR images). This crate only keeps the caller's session,
//! talks to the REST API with bearer tokens, decides which pages a session may
//! see, and holds the page-local state the dashboard views need.
//!
//! LAYOUT
//! ======
//! - [`session`]: persisted token pair plus decoded identity claims.
//! - [`net`]: transport seam, authenticated client with refresh-and-retry,
//!   typed endpoint bindings and wire DTOs.
//! - [`guard`]: route table and the four access policies.
//! - [`state`]: view-state models for the URL table, explorer and admin console.
//! - [`util`]: form validation.

pub mod config;
pub mod error;
pub mod guard;
pub mod net;
pub mod session;
pub mod state;
pub mod util;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::ClientConfig;
pub use error::ErrorCode;
pub use guard::{GuardOutcome, Route, RouteGuard};
pub use net::api::ShortlinkApi;
pub use net::client::AuthClient;
pub use net::types::ApiError;
pub use session::{Claims, Role, Session, SessionState, SessionStore};
