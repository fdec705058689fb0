//! Error types for Countdown Wallet

use thiserror::Error;

/// Result type alias using the Countdown Wallet error
pub type Result<T> = std::result::Result<T, Error>;

/// Countdown Wallet error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Recovery phrase is empty")]
    MalformedMnemonic,

    #[error("Secret derivation failed: {0}")]
    DerivationFailure(String),

    #[error("Generated {kind} '{value}' collides with an existing one")]
    CollisionDetected { kind: String, value: String },

    #[error("Could not find a free {kind} after {attempts} attempts; the wordlist is too small")]
    TokenSpaceExhausted { kind: String, attempts: u32 },

    #[error("Word count must be at least 1")]
    InvalidWordCount,

    #[error("Invalid wordlist: {0}")]
    InvalidWordlist(String),

    #[error("Resource not found: {kind} with id {id}")]
    NotFound { kind: String, id: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the operation that produced this error may succeed when
    /// repeated with freshly generated input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::CollisionDetected { .. })
    }

    pub fn not_found(kind: &str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind: kind.to_string(),
            id: id.into(),
        }
    }
}
