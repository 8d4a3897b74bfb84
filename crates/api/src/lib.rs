//! Beacon API server library.
//!
//! Exposes the building blocks (config, state, store, error handling,
//! routes) so integration tests, the client crate's tests, and the binary
//! entrypoint all assemble the same application.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod store;
