//! Wallet and countdown operations
//!
//! Every generated identifier (wallet slug, countdown token) is inserted
//! under a UNIQUE constraint. A collision is detected by the store, never
//! assumed away, and retried with a fresh draw up to a configured bound.

use crate::secret::{hash_owner_secret, is_owner_secret, verify_owner_secret};
use crate::{
    Countdown, Database, Error, IdentityConfig, NewCountdown, Result, TokenGenerator, Wallet,
};
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Wallet service
#[derive(Clone)]
pub struct WalletService {
    db: Database,
    generator: TokenGenerator,
    config: IdentityConfig,
}

impl WalletService {
    /// Build a service using the configured dictionary
    pub fn new(db: Database, config: IdentityConfig) -> Result<Self> {
        let wordlist = config.wordlist()?;
        Self::with_generator(db, config, TokenGenerator::new(wordlist))
    }

    pub fn with_generator(
        db: Database,
        config: IdentityConfig,
        generator: TokenGenerator,
    ) -> Result<Self> {
        config.validate(generator.wordlist())?;
        Ok(Self {
            db,
            generator,
            config,
        })
    }

    pub fn config(&self) -> &IdentityConfig {
        &self.config
    }

    pub fn generator(&self) -> &TokenGenerator {
        &self.generator
    }

    /// Register a wallet for an owner secret the client generated or derived.
    ///
    /// Only the hash of the secret is stored.
    pub fn register_wallet(&self, owner_secret: &str) -> Result<Wallet> {
        if !is_owner_secret(owner_secret) {
            return Err(Error::Validation(
                "owner secret must be 64 lowercase hex characters".to_string(),
            ));
        }
        self.insert_new_wallet(owner_secret)
    }

    /// Confirm that a client recovered the right secret for an existing wallet
    pub fn import_wallet(&self, wallet_id: &str, owner_secret: &str) -> Result<Wallet> {
        let wallet = self.authorize(wallet_id, owner_secret)?;
        info!("Imported wallet {}", wallet.wallet_id);
        Ok(wallet)
    }

    /// Look up a wallet and check that `owner_secret` controls it
    pub fn authorize(&self, wallet_id: &str, owner_secret: &str) -> Result<Wallet> {
        let wallet = self.get_wallet(wallet_id)?;
        if self.config.enforce_ownership
            && !verify_owner_secret(owner_secret, &wallet.owner_secret_hash)
        {
            warn!("Rejected owner secret for wallet {}", wallet_id);
            return Err(Error::PermissionDenied(format!(
                "owner secret does not match wallet {}",
                wallet_id
            )));
        }
        debug!("Authorized owner of wallet {}", wallet_id);
        Ok(wallet)
    }

    pub fn get_wallet(&self, wallet_id: &str) -> Result<Wallet> {
        self.db
            .get_wallet(wallet_id)?
            .ok_or_else(|| Error::not_found("Wallet", wallet_id))
    }

    /// Add a countdown to a wallet the caller owns
    pub fn create_countdown(
        &self,
        wallet_id: &str,
        owner_secret: &str,
        input: &NewCountdown,
    ) -> Result<Countdown> {
        let wallet = self.authorize(wallet_id, owner_secret)?;
        self.insert_new_countdown(Some(wallet.id), input)
    }

    /// Countdown shared by token only, outside any wallet
    pub fn create_standalone_countdown(&self, input: &NewCountdown) -> Result<Countdown> {
        self.insert_new_countdown(None, input)
    }

    pub fn get_countdown(&self, token: &str) -> Result<Countdown> {
        self.db
            .get_countdown(token)?
            .ok_or_else(|| Error::not_found("Countdown", token))
    }

    /// Countdowns in a wallet, newest first
    pub fn list_countdowns(&self, wallet_id: &str) -> Result<Vec<Countdown>> {
        let wallet = self.get_wallet(wallet_id)?;
        self.db.list_countdowns(wallet.id)
    }

    fn insert_new_wallet(&self, owner_secret: &str) -> Result<Wallet> {
        let owner_secret_hash = hash_owner_secret(owner_secret);
        let wallet = insert_with_retry(
            "wallet slug",
            self.config.slug_insert_attempts,
            || {
                Ok(Wallet {
                    id: Uuid::new_v4(),
                    wallet_id: self.generator.slug(self.config.slug_words)?,
                    owner_secret_hash: owner_secret_hash.clone(),
                    created_at: Utc::now().timestamp(),
                })
            },
            |wallet| self.db.insert_wallet(wallet),
        )?;

        info!("Created wallet {}", wallet.wallet_id);
        Ok(wallet)
    }

    fn insert_new_countdown(
        &self,
        wallet: Option<Uuid>,
        input: &NewCountdown,
    ) -> Result<Countdown> {
        let valid = input.validate()?;
        let countdown = insert_with_retry(
            "countdown token",
            self.config.token_insert_attempts,
            || {
                Ok(Countdown {
                    id: Uuid::new_v4(),
                    wallet_id: wallet,
                    token: self.generator.token(self.config.token_words)?,
                    title: valid.title.clone(),
                    description: valid.description.clone(),
                    color: valid.color.clone(),
                    target_time: valid.target_time,
                    all_day: valid.all_day,
                    repeat: valid.repeat,
                    remind_at: valid.remind_at,
                    created_at: Utc::now().timestamp(),
                })
            },
            |countdown| self.db.insert_countdown(countdown),
        )?;

        info!("Created countdown {} ({})", countdown.token, countdown.title);
        Ok(countdown)
    }
}

/// Draw a candidate and insert it, redrawing on a uniqueness collision
fn insert_with_retry<T>(
    kind: &str,
    attempts: u32,
    mut draw: impl FnMut() -> Result<T>,
    mut insert: impl FnMut(&T) -> Result<()>,
) -> Result<T> {
    for attempt in 1..=attempts {
        let candidate = draw()?;
        match insert(&candidate) {
            Ok(()) => return Ok(candidate),
            Err(e) if e.is_retryable() => {
                warn!("{} (attempt {}/{})", e, attempt, attempts);
            }
            Err(e) => return Err(e),
        }
    }

    Err(Error::TokenSpaceExhausted {
        kind: kind.to_string(),
        attempts,
    })
}
