//! The casting agency REST API
//!
//! A small CRUD service over actors and movies where every data route
//! is protected by a scoped bearer token. The `castguard` crates do
//! the token work; this crate wires them to the routes, the in-memory
//! store, and the service configuration.

pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;

pub use routes::{router, AppState};
