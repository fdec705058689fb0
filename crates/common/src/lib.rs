//! Countdown Wallet Common Library
//!
//! Identity primitives, persistence, and wallet operations shared by the
//! web service and the CLI.

pub mod config;
pub mod db;
pub mod error;
pub mod identity;
pub mod secret;
pub mod token;
pub mod types;
pub mod wallet;
pub mod wordlist;

// Re-export commonly used types
pub use config::{Config, IdentityConfig};
pub use db::Database;
pub use error::{Error, Result};
pub use identity::{Credentials, Identity, IdentityContext, IdentityStore, OnboardingState};
pub use secret::{
    derive_owner_secret, owner_secret_from_mnemonic, random_owner_secret, DEFAULT_SECRET_BYTES,
};
pub use token::{
    generate_mnemonic, generate_slug, generate_token, TokenGenerator, DEFAULT_MNEMONIC_WORDS,
    DEFAULT_SLUG_WORDS, DEFAULT_TOKEN_WORDS,
};
pub use types::*;
pub use wallet::WalletService;
pub use wordlist::Wordlist;

/// Countdown Wallet version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default store path
pub fn default_store_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".countdown")
}

/// Default database path
pub fn default_db_path() -> std::path::PathBuf {
    default_store_path().join("state.db")
}

/// Default configuration file
pub fn default_config_path() -> std::path::PathBuf {
    default_store_path().join("config.toml")
}

/// Where the CLI keeps the wallet it holds
pub fn default_identity_path() -> std::path::PathBuf {
    default_store_path().join("identity.json")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
