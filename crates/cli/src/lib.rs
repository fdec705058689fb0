//! Countdown Wallet CLI
//!
//! Command-line client for the countdown API. The wallet it holds lives in
//! a local identity file.

pub mod client;
pub mod commands;
pub mod output;

pub use client::ApiClient;
