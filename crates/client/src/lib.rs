//! Typed HTTP client for the beacon API.
//!
//! [`client::BeaconClient`] wraps the REST endpoints and keeps the login
//! state in a shared [`session::SessionStore`], which UI code subscribes to
//! instead of listening for ad-hoc login/logout notifications.

pub mod client;
pub mod session;

pub use client::{BeaconClient, ClientError};
pub use session::{AuthSession, SessionEvent, SessionStore};
