//! Service configuration

use crate::token::{DEFAULT_MNEMONIC_WORDS, DEFAULT_SLUG_WORDS, DEFAULT_TOKEN_WORDS};
use crate::{Error, Result, Wordlist};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Store directory path
    pub store_path: PathBuf,

    /// HTTP listen address
    pub listen_addr: String,

    /// Origin used when building share links
    pub public_base_url: String,

    /// Identity and token generation
    pub identity: IdentityConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store_path: crate::default_store_path(),
            listen_addr: "127.0.0.1:8080".to_string(),
            public_base_url: "http://127.0.0.1:8080".to_string(),
            identity: IdentityConfig::default(),
        }
    }
}

/// Identity and token generation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Words in a wallet slug
    pub slug_words: usize,

    /// Words in a countdown sharing token
    pub token_words: usize,

    /// Words in a generated recovery phrase
    pub mnemonic_words: usize,

    /// Insert attempts before giving up on a colliding slug
    pub slug_insert_attempts: u32,

    /// Insert attempts before giving up on a colliding token
    pub token_insert_attempts: u32,

    /// Require the owner secret for writes and imports
    pub enforce_ownership: bool,

    /// Newline-separated wordlist replacing the built-in English list
    pub wordlist_path: Option<PathBuf>,

    /// Smallest acceptable slug/token search space, in bits
    pub min_search_space_bits: f64,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            slug_words: DEFAULT_SLUG_WORDS,
            token_words: DEFAULT_TOKEN_WORDS,
            mnemonic_words: DEFAULT_MNEMONIC_WORDS,
            slug_insert_attempts: 5,
            token_insert_attempts: 5,
            enforce_ownership: true,
            wordlist_path: None,
            min_search_space_bits: 24.0,
        }
    }
}

impl IdentityConfig {
    /// Load the configured dictionary
    pub fn wordlist(&self) -> Result<Wordlist> {
        match &self.wordlist_path {
            Some(path) => Wordlist::load(path),
            None => Ok(Wordlist::english()),
        }
    }

    /// Reject settings under which generation cannot work or would collide constantly
    pub fn validate(&self, wordlist: &Wordlist) -> Result<()> {
        for (name, value) in [
            ("slug_words", self.slug_words),
            ("token_words", self.token_words),
            ("mnemonic_words", self.mnemonic_words),
        ] {
            if value == 0 {
                return Err(Error::InvalidConfig(format!("{} must be at least 1", name)));
            }
        }
        if self.slug_insert_attempts == 0 || self.token_insert_attempts == 0 {
            return Err(Error::InvalidConfig(
                "insert attempts must be at least 1".to_string(),
            ));
        }

        for (name, words) in [("slug", self.slug_words), ("token", self.token_words)] {
            let bits = wordlist.entropy_bits(words);
            if bits < self.min_search_space_bits {
                return Err(Error::InvalidConfig(format!(
                    "{} space is {:.1} bits ({} words from a {}-word list), below the {:.1}-bit minimum",
                    name,
                    bits,
                    words,
                    wordlist.len(),
                    self.min_search_space_bits
                )));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Check the listen address and the identity settings against their wordlist
    pub fn validate(&self) -> Result<()> {
        self.listen_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|e| {
                Error::InvalidConfig(format!("listen_addr '{}': {}", self.listen_addr, e))
            })?;
        let wordlist = self.identity.wordlist()?;
        self.identity.validate(&wordlist)
    }

    /// Get the database path
    pub fn db_path(&self) -> PathBuf {
        self.store_path.join("state.db")
    }

    /// Absolute link for a page path such as `/c/<token>`
    pub fn public_url(&self, path: &str) -> String {
        format!("{}{}", self.public_base_url.trim_end_matches('/'), path)
    }
}
