//! Page-local view state for the dashboard.
//!
//! DESIGN
//! ======
//! Each page owns a plain struct. The caller fills it from API responses and
//! applies successful writes to it locally, so lists stay in sync without a
//! re-fetch. Nothing here performs I/O; failures are stored as the message a
//! person should see (`detail` from the backend, else a page-specific
//! fallback).

pub mod account;
pub mod admin;
pub mod explore;
pub mod urls;

pub use account::{ProfileState, registration_error_message};
pub use admin::{AdminState, BlockAction, UserDetail};
pub use explore::{ExploreState, SortDirection, SortField};
pub use urls::MyUrlsState;
