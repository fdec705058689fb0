//! Client-side wallet identity
//!
//! A client "owns" a wallet by holding two strings: the public wallet slug
//! and the owner secret. [`IdentityContext`] tracks the onboarding flow
//! explicitly and persists the pair through an [`IdentityStore`]:
//!
//! ```text
//! Anonymous -> Creating  -> Owned
//! Anonymous -> Importing -> Owned
//!              Importing -> ImportFailed -> Anonymous
//! Owned     -> (clear)   -> Anonymous
//! ```
//!
//! Recovery phrases never leave the client. [`Credentials`] derives the owner
//! secret locally, and only that secret is presented to the server.

use crate::secret::{derive_owner_secret, random_owner_secret, trim_phrase, DEFAULT_SECRET_BYTES};
use crate::token::generate_mnemonic;
use crate::{Error, Result, Wordlist};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// The wallet a client controls
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub wallet_id: String,
    #[serde(rename = "owner_token")]
    pub owner_secret: String,
}

impl Identity {
    pub fn new(wallet_id: impl Into<String>, owner_secret: impl Into<String>) -> Self {
        Self {
            wallet_id: wallet_id.into(),
            owner_secret: owner_secret.into(),
        }
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity")
            .field("wallet_id", &self.wallet_id)
            .field("owner_secret", &"<redacted>")
            .finish()
    }
}

/// Owner secret for a wallet about to be registered, plus its recovery phrase
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub owner_secret: String,
    /// Absent for unrecoverable wallets
    pub mnemonic: Option<String>,
}

impl Credentials {
    /// Credentials recoverable from a phrase. A phrase of `words` words is
    /// generated when none is supplied.
    pub async fn recoverable(mnemonic: Option<String>, words: usize) -> Result<Self> {
        let mnemonic = match mnemonic {
            Some(phrase) => {
                let phrase = trim_phrase(&phrase).to_string();
                let unknown = Wordlist::english().unknown_words(&phrase);
                if !unknown.is_empty() {
                    debug!("Recovery phrase has {} non-dictionary words", unknown.len());
                }
                phrase
            }
            None => generate_mnemonic(words)?,
        };
        let owner_secret = derive_owner_secret(mnemonic.clone()).await?;
        Ok(Self {
            owner_secret,
            mnemonic: Some(mnemonic),
        })
    }

    /// Random owner secret with no recovery phrase
    pub fn unrecoverable() -> Result<Self> {
        Ok(Self {
            owner_secret: random_owner_secret(DEFAULT_SECRET_BYTES)?,
            mnemonic: None,
        })
    }

    pub fn identity(&self, wallet_id: impl Into<String>) -> Identity {
        Identity::new(wallet_id, self.owner_secret.clone())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("owner_secret", &"<redacted>")
            .field("recoverable", &self.mnemonic.is_some())
            .finish()
    }
}

/// Onboarding state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingState {
    Anonymous,
    Creating,
    Importing { wallet_id: String },
    Owned(Identity),
    ImportFailed { wallet_id: String, reason: String },
}

impl OnboardingState {
    fn name(&self) -> &'static str {
        match self {
            Self::Anonymous => "anonymous",
            Self::Creating => "creating",
            Self::Importing { .. } => "importing",
            Self::Owned(_) => "owned",
            Self::ImportFailed { .. } => "import_failed",
        }
    }
}

impl std::fmt::Display for OnboardingState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// File-backed storage for the identity pair
#[derive(Debug, Clone)]
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored identity, if any
    pub fn load(&self) -> Result<Option<Identity>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        let identity: Identity = serde_json::from_str(&content)?;
        Ok(Some(identity))
    }

    /// Persist the identity, readable only by the current user
    pub fn save(&self, identity: &Identity) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;

        // mode only applies on creation; tighten a file that already existed
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(serde_json::to_string_pretty(identity)?.as_bytes())?;

        debug!("Saved identity for wallet {} to {:?}", identity.wallet_id, self.path);
        Ok(())
    }

    /// Forget the stored identity
    pub fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Explicit identity context passed to whatever needs wallet ownership
#[derive(Debug)]
pub struct IdentityContext {
    state: OnboardingState,
    store: Option<IdentityStore>,
}

impl Default for IdentityContext {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityContext {
    /// Anonymous context without persistence
    pub fn new() -> Self {
        Self {
            state: OnboardingState::Anonymous,
            store: None,
        }
    }

    /// Context backed by a store; starts `Owned` if the store holds an identity
    pub fn with_store(store: IdentityStore) -> Result<Self> {
        let state = match store.load()? {
            Some(identity) => OnboardingState::Owned(identity),
            None => OnboardingState::Anonymous,
        };
        Ok(Self {
            state,
            store: Some(store),
        })
    }

    pub fn state(&self) -> &OnboardingState {
        &self.state
    }

    pub fn identity(&self) -> Option<&Identity> {
        match &self.state {
            OnboardingState::Owned(identity) => Some(identity),
            _ => None,
        }
    }

    /// Anonymous -> Creating
    pub fn begin_create(&mut self) -> Result<()> {
        self.transition(OnboardingState::Creating, |s| {
            matches!(s, OnboardingState::Anonymous)
        })
    }

    /// Anonymous -> Importing
    pub fn begin_import(&mut self, wallet_id: &str) -> Result<()> {
        self.transition(
            OnboardingState::Importing {
                wallet_id: wallet_id.to_string(),
            },
            |s| matches!(s, OnboardingState::Anonymous),
        )
    }

    /// Creating | Importing -> Owned, persisting the identity
    pub fn complete(&mut self, identity: Identity) -> Result<()> {
        match &self.state {
            OnboardingState::Creating => {}
            OnboardingState::Importing { wallet_id } if *wallet_id == identity.wallet_id => {}
            OnboardingState::Importing { wallet_id } => {
                return Err(Error::Validation(format!(
                    "imported identity is for wallet {}, expected {}",
                    identity.wallet_id, wallet_id
                )));
            }
            other => return Err(invalid(other, "owned")),
        }

        if let Some(store) = &self.store {
            store.save(&identity)?;
        }
        info!("Now holding wallet {}", identity.wallet_id);
        self.state = OnboardingState::Owned(identity);
        Ok(())
    }

    /// Importing -> ImportFailed, or Creating -> Anonymous
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<()> {
        let next = match &self.state {
            OnboardingState::Importing { wallet_id } => OnboardingState::ImportFailed {
                wallet_id: wallet_id.clone(),
                reason: reason.into(),
            },
            OnboardingState::Creating => OnboardingState::Anonymous,
            other => return Err(invalid(other, "import_failed")),
        };
        self.state = next;
        Ok(())
    }

    /// ImportFailed -> Anonymous
    pub fn acknowledge(&mut self) -> Result<()> {
        self.transition(OnboardingState::Anonymous, |s| {
            matches!(s, OnboardingState::ImportFailed { .. })
        })
    }

    /// Drop any held identity and return to Anonymous
    pub fn clear(&mut self) -> Result<()> {
        if let Some(store) = &self.store {
            store.clear()?;
        }
        if let OnboardingState::Owned(identity) = &self.state {
            info!("Released wallet {}", identity.wallet_id);
        }
        self.state = OnboardingState::Anonymous;
        Ok(())
    }

    fn transition(
        &mut self,
        next: OnboardingState,
        allowed: impl Fn(&OnboardingState) -> bool,
    ) -> Result<()> {
        if !allowed(&self.state) {
            return Err(invalid(&self.state, next.name()));
        }
        self.state = next;
        Ok(())
    }
}

fn invalid(from: &OnboardingState, to: &str) -> Error {
    Error::InvalidStateTransition {
        from: from.name().to_string(),
        to: to.to_string(),
    }
}
