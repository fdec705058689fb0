//! Generate Commands
//!
//! Local generation with the built-in dictionary; no server needed.

use anyhow::Result;
use clap::Subcommand;
use countdown_common::{
    derive_owner_secret, generate_mnemonic, generate_slug, generate_token, random_owner_secret,
    DEFAULT_MNEMONIC_WORDS, DEFAULT_SECRET_BYTES, DEFAULT_SLUG_WORDS, DEFAULT_TOKEN_WORDS,
};

use crate::output::{print_value, OutputFormat};

#[derive(Subcommand)]
pub enum GenerateCommands {
    /// Countdown sharing token
    Token {
        #[arg(short, long, default_value_t = DEFAULT_TOKEN_WORDS)]
        words: usize,
    },

    /// Wallet slug
    Slug {
        #[arg(short, long, default_value_t = DEFAULT_SLUG_WORDS)]
        words: usize,
    },

    /// Recovery phrase
    Mnemonic {
        #[arg(short, long, default_value_t = DEFAULT_MNEMONIC_WORDS)]
        words: usize,
    },

    /// Random owner secret (hex)
    Secret {
        #[arg(short, long, default_value_t = DEFAULT_SECRET_BYTES)]
        bytes: usize,
    },

    /// Owner secret for a recovery phrase
    Derive {
        /// Recovery phrase
        #[arg(env = "COUNTDOWN_MNEMONIC")]
        mnemonic: String,
    },
}

/// Produce the requested value and the JSON key it is reported under
pub async fn generate(cmd: GenerateCommands) -> Result<(&'static str, String)> {
    Ok(match cmd {
        GenerateCommands::Token { words } => ("token", generate_token(words)?),
        GenerateCommands::Slug { words } => ("wallet_id", generate_slug(words)?),
        GenerateCommands::Mnemonic { words } => ("mnemonic", generate_mnemonic(words)?),
        GenerateCommands::Secret { bytes } => ("owner_secret", random_owner_secret(bytes)?),
        GenerateCommands::Derive { mnemonic } => {
            ("owner_secret", derive_owner_secret(mnemonic).await?)
        }
    })
}

pub async fn execute(cmd: GenerateCommands, format: OutputFormat) -> Result<()> {
    let (key, value) = generate(cmd).await?;
    print_value(key, &value, format);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use countdown_common::owner_secret_from_mnemonic;

    #[tokio::test]
    async fn test_generate_shapes() {
        let (key, token) = generate(GenerateCommands::Token { words: 4 }).await.unwrap();
        assert_eq!(key, "token");
        assert_eq!(token.split('-').count(), 4);

        let (_, phrase) = generate(GenerateCommands::Mnemonic { words: 12 })
            .await
            .unwrap();
        assert_eq!(phrase.split(' ').count(), 12);

        let (_, secret) = generate(GenerateCommands::Secret { bytes: 32 }).await.unwrap();
        assert_eq!(secret.len(), 64);
    }

    #[tokio::test]
    async fn test_derive_matches_library() {
        let (_, derived) = generate(GenerateCommands::Derive {
            mnemonic: "Glacier Owl Echo ".to_string(),
        })
        .await
        .unwrap();
        assert_eq!(derived, owner_secret_from_mnemonic("glacier owl echo").unwrap());
    }

    #[tokio::test]
    async fn test_zero_words_fails() {
        assert!(generate(GenerateCommands::Slug { words: 0 }).await.is_err());
        assert!(generate(GenerateCommands::Secret { bytes: 0 }).await.is_err());
    }
}
