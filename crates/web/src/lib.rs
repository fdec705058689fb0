//! Countdown Wallet HTTP API
//!
//! JSON endpoints for creating wallets, importing them from a recovery
//! phrase, and publishing countdowns under shareable word tokens.

pub mod error;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{serve, AppState, WebServer};
