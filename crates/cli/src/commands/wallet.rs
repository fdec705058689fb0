//! Wallet Commands

use anyhow::{bail, Result};
use clap::Subcommand;
use countdown_common::{
    derive_owner_secret, Credentials, Identity, IdentityContext, DEFAULT_MNEMONIC_WORDS,
};
use serde::Serialize;
use tracing::info;

use crate::client::{ApiClient, WalletSummary};
use crate::commands::countdown::show_wallet;
use crate::output::{
    print_info, print_item, print_success, print_warning, OutputFormat, TableDisplay,
};

#[derive(Subcommand)]
pub enum WalletCommands {
    /// Create a new wallet and hold it locally
    Create {
        /// Use this recovery phrase instead of generating one
        #[arg(long)]
        mnemonic: Option<String>,

        /// Random owner secret with no recovery phrase
        #[arg(long, conflicts_with = "mnemonic")]
        unrecoverable: bool,

        /// Words in a generated recovery phrase
        #[arg(long, default_value_t = DEFAULT_MNEMONIC_WORDS, conflicts_with_all = ["mnemonic", "unrecoverable"])]
        words: usize,

        /// Replace a wallet that is already held
        #[arg(long)]
        force: bool,
    },

    /// Take ownership of an existing wallet with its recovery phrase
    Import {
        /// Wallet ID (e.g. glacier-owl-echo)
        wallet_id: String,

        /// Recovery phrase
        #[arg(long, env = "COUNTDOWN_MNEMONIC")]
        mnemonic: String,
    },

    /// Show a wallet and its countdowns (defaults to the held wallet)
    Show {
        wallet_id: Option<String>,
    },

    /// Forget the held wallet
    Logout,
}

/// Wallet display wrapper for serialization
#[derive(Serialize)]
pub struct WalletDisplay {
    pub wallet_id: String,
    pub path: String,
    pub owner_secret: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
}

impl WalletDisplay {
    fn new(wallet: WalletSummary, credentials: Credentials) -> Self {
        Self {
            wallet_id: wallet.wallet_id,
            path: wallet.path,
            owner_secret: credentials.owner_secret,
            mnemonic: credentials.mnemonic,
        }
    }
}

impl TableDisplay for WalletDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Wallet", "Path", "Owner Secret", "Recovery Phrase"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.wallet_id.clone(),
            self.path.clone(),
            self.owner_secret.clone(),
            self.mnemonic
                .clone()
                .unwrap_or_else(|| "(none)".to_string()),
        ]
    }
}

pub async fn execute(
    cmd: WalletCommands,
    client: &ApiClient,
    ctx: &mut IdentityContext,
    format: OutputFormat,
) -> Result<()> {
    match cmd {
        WalletCommands::Create {
            mnemonic,
            unrecoverable,
            words,
            force,
        } => {
            if let Some(held) = ctx.identity().map(|i| i.wallet_id.clone()) {
                if !force {
                    bail!(
                        "Already holding wallet {}; run `countdown wallet logout` or pass --force",
                        held
                    );
                }
                ctx.clear()?;
            }

            ctx.begin_create()?;
            let (wallet, credentials) = match register(client, mnemonic, unrecoverable, words).await
            {
                Ok(created) => created,
                Err(e) => {
                    ctx.fail(e.to_string())?;
                    return Err(e);
                }
            };
            ctx.complete(credentials.identity(wallet.wallet_id.clone()))?;

            let recoverable = credentials.mnemonic.is_some();
            print_success(&format!("Wallet '{}' created", wallet.wallet_id));
            print_item(&WalletDisplay::new(wallet, credentials), format);
            if recoverable {
                print_warning("Write down the recovery phrase. It is the only way to import this wallet elsewhere.");
            } else {
                print_warning("This wallet has no recovery phrase. Losing the identity file loses ownership.");
            }
        }

        WalletCommands::Import {
            wallet_id,
            mnemonic,
        } => {
            if let Some(identity) = ctx.identity() {
                bail!(
                    "Already holding wallet {}; run `countdown wallet logout` first",
                    identity.wallet_id
                );
            }

            ctx.begin_import(&wallet_id)?;
            match import(client, &wallet_id, mnemonic).await {
                Ok(identity) => {
                    ctx.complete(identity)?;
                    print_success(&format!("Imported wallet '{}'", wallet_id));
                }
                Err(e) => {
                    ctx.fail(e.to_string())?;
                    ctx.acknowledge()?;
                    return Err(e);
                }
            }
        }

        WalletCommands::Show { wallet_id } => {
            let wallet_id = match (wallet_id, ctx.identity()) {
                (Some(id), _) => id,
                (None, Some(identity)) => identity.wallet_id.clone(),
                (None, None) => bail!("No wallet held; pass a wallet ID or run `countdown wallet create`"),
            };
            show_wallet(client, &wallet_id, format).await?;
        }

        WalletCommands::Logout => match ctx.identity().map(|i| i.wallet_id.clone()) {
            Some(wallet_id) => {
                ctx.clear()?;
                print_success(&format!("Forgot wallet '{}'", wallet_id));
            }
            None => print_info("No wallet held"),
        },
    }

    Ok(())
}

/// Build credentials locally and register only the owner secret
async fn register(
    client: &ApiClient,
    mnemonic: Option<String>,
    unrecoverable: bool,
    words: usize,
) -> Result<(WalletSummary, Credentials)> {
    let credentials = if unrecoverable {
        Credentials::unrecoverable()?
    } else {
        Credentials::recoverable(mnemonic, words).await?
    };
    let wallet = client.create_wallet(&credentials.owner_secret).await?;
    Ok((wallet, credentials))
}

/// Derive the secret locally; the phrase itself is never sent
async fn import(client: &ApiClient, wallet_id: &str, mnemonic: String) -> Result<Identity> {
    let owner_secret = derive_owner_secret(mnemonic).await?;
    let wallet = client.import_wallet(wallet_id, &owner_secret).await?;
    info!("Recovered owner secret for {}", wallet.wallet_id);
    Ok(Identity::new(wallet.wallet_id, owner_secret))
}
