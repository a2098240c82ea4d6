//! Networking: transport seam, authenticated client, endpoint bindings.

pub mod api;
pub mod client;
pub mod transport;
pub mod types;
