//! Owner secrets
//!
//! An owner secret is the bearer credential for a wallet: 64 lowercase hex
//! characters, produced either from 32 bytes of OS randomness or as the
//! SHA-256 digest of a normalized recovery phrase.
//!
//! Phrase derivation is a single unsalted SHA-256. Anyone holding one
//! derived secret and the dictionary can search the phrase space offline,
//! so the strength of an imported wallet rests entirely on the phrase
//! length. Existing wallets depend on this exact mapping.

use crate::{Error, Result};
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};

/// Bytes of randomness in a fresh owner secret
pub const DEFAULT_SECRET_BYTES: usize = 32;

/// Hex length of every owner secret
pub const SECRET_HEX_LEN: usize = 64;

/// Random hex-encoded secret from the OS CSPRNG
pub fn random_owner_secret(byte_length: usize) -> Result<String> {
    random_owner_secret_with_rng(byte_length, &mut OsRng)
}

pub fn random_owner_secret_with_rng<R: RngCore + CryptoRng + ?Sized>(
    byte_length: usize,
    rng: &mut R,
) -> Result<String> {
    if byte_length == 0 {
        return Err(Error::Validation(
            "secret length must be at least one byte".to_string(),
        ));
    }
    let mut bytes = vec![0u8; byte_length];
    rng.fill_bytes(&mut bytes);
    Ok(hex::encode(bytes))
}

/// Strip surrounding whitespace and byte-order marks from a pasted phrase
pub fn trim_phrase(mnemonic: &str) -> &str {
    mnemonic.trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
}

/// Trim and lower-case a recovery phrase, rejecting blank input
pub fn normalize_mnemonic(mnemonic: &str) -> Result<String> {
    let normalized = trim_phrase(mnemonic).to_lowercase();
    if normalized.is_empty() {
        return Err(Error::MalformedMnemonic);
    }
    Ok(normalized)
}

/// Deterministic owner secret for a recovery phrase
pub fn owner_secret_from_mnemonic(mnemonic: &str) -> Result<String> {
    let normalized = normalize_mnemonic(mnemonic)?;
    Ok(sha256_hex(normalized.as_bytes()))
}

/// [`owner_secret_from_mnemonic`] on the blocking pool.
///
/// Completes with the full secret or an error; there is no partial result.
pub async fn derive_owner_secret(mnemonic: String) -> Result<String> {
    tokio::task::spawn_blocking(move || owner_secret_from_mnemonic(&mnemonic))
        .await
        .map_err(|e| Error::DerivationFailure(e.to_string()))?
}

/// Whether `value` has the shape of an owner secret
pub fn is_owner_secret(value: &str) -> bool {
    value.len() == SECRET_HEX_LEN
        && value
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

/// Storage form of an owner secret. The plain secret is never persisted server-side.
pub fn hash_owner_secret(secret: &str) -> String {
    sha256_hex(secret.as_bytes())
}

/// Compare a presented secret against a stored hash
pub fn verify_owner_secret(secret: &str, stored_hash: &str) -> bool {
    constant_time_eq(&hash_owner_secret(secret), stored_hash)
}

fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut v: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        v |= x ^ y;
    }
    v == 0
}
