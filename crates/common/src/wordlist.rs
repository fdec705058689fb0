//! Dictionary backing slugs, tokens, and recovery phrases
//!
//! The default list is the BIP-39 English wordlist (2048 words). A
//! deployment may substitute its own newline-separated file; every word
//! must be lowercase and free of whitespace and hyphens so that slugs split
//! back into their words unambiguously.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use rand::Rng;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

static ENGLISH: Lazy<Wordlist> = Lazy::new(|| {
    let words = bip39::Language::English
        .word_list()
        .iter()
        .map(|w| w.to_string())
        .collect::<Vec<_>>();
    let index = words.iter().cloned().collect();
    Wordlist {
        inner: Arc::new(Inner { words, index }),
    }
});

/// Smallest dictionary that still yields more than one possible draw
const MIN_WORDS: usize = 2;

struct Inner {
    words: Vec<String>,
    index: HashSet<String>,
}

/// Ordered, duplicate-free dictionary shared by all generators
#[derive(Clone)]
pub struct Wordlist {
    inner: Arc<Inner>,
}

impl Wordlist {
    /// The built-in BIP-39 English list
    pub fn english() -> Self {
        ENGLISH.clone()
    }

    /// Build a wordlist from an ordered sequence of words
    pub fn new<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Vec::new();
        let mut index = HashSet::new();

        for (pos, word) in words.into_iter().enumerate() {
            let word = word.as_ref();
            if word.is_empty() {
                return Err(Error::InvalidWordlist(format!("empty word at position {}", pos)));
            }
            if word.chars().any(|c| c.is_whitespace() || c == '-') {
                return Err(Error::InvalidWordlist(format!(
                    "word '{}' contains whitespace or a hyphen",
                    word
                )));
            }
            if word != word.to_lowercase() {
                return Err(Error::InvalidWordlist(format!("word '{}' is not lowercase", word)));
            }
            if !index.insert(word.to_string()) {
                return Err(Error::InvalidWordlist(format!("duplicate word '{}'", word)));
            }
            list.push(word.to_string());
        }

        if list.len() < MIN_WORDS {
            return Err(Error::InvalidWordlist(format!(
                "need at least {} words, got {}",
                MIN_WORDS,
                list.len()
            )));
        }

        Ok(Self {
            inner: Arc::new(Inner { words: list, index }),
        })
    }

    /// Parse a newline-separated list. Blank lines and `#` comments are skipped.
    pub fn parse(content: &str) -> Result<Self> {
        Self::new(
            content
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    /// Load a newline-separated wordlist file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let list = Self::parse(&content)?;
        debug!("Loaded {} words from {:?}", list.len(), path.as_ref());
        Ok(list)
    }

    pub fn len(&self) -> usize {
        self.inner.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.words.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.inner.words.get(index).map(String::as_str)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.inner.index.contains(word)
    }

    /// Draw one word uniformly at random
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &str {
        let i = rng.gen_range(0..self.inner.words.len());
        &self.inner.words[i]
    }

    /// Bits of entropy in a sequence of `word_count` independent draws
    pub fn entropy_bits(&self, word_count: usize) -> f64 {
        word_count as f64 * (self.len() as f64).log2()
    }

    /// Words of a phrase (case-insensitive) that are not in this dictionary
    pub fn unknown_words<'a>(&self, phrase: &'a str) -> Vec<&'a str> {
        phrase
            .split_whitespace()
            .filter(|w| !self.contains(&w.to_lowercase()))
            .collect()
    }
}

impl Default for Wordlist {
    fn default() -> Self {
        Self::english()
    }
}

impl std::fmt::Debug for Wordlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wordlist")
            .field("len", &self.len())
            .field("first", &self.get(0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;

    #[test]
    fn test_english_list() {
        let list = Wordlist::english();
        assert_eq!(list.len(), 2048);
        assert_eq!(list.get(0), Some("abandon"));
        assert_eq!(list.get(2047), Some("zoo"));
        assert!(list.contains("glacier"));
        assert!(list.contains("owl"));
        assert!(list.contains("echo"));
        assert!(!list.contains("countdown"));
    }

    #[test]
    fn test_english_entropy() {
        let list = Wordlist::english();
        assert!((list.entropy_bits(3) - 33.0).abs() < 1e-9);
        assert!((list.entropy_bits(12) - 132.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_bad_words() {
        assert!(matches!(
            Wordlist::new(["alpha", "beta-gamma"]),
            Err(Error::InvalidWordlist(_))
        ));
        assert!(matches!(
            Wordlist::new(["alpha", "beta gamma"]),
            Err(Error::InvalidWordlist(_))
        ));
        assert!(matches!(
            Wordlist::new(["alpha", "Beta"]),
            Err(Error::InvalidWordlist(_))
        ));
        assert!(matches!(
            Wordlist::new(["alpha", "alpha"]),
            Err(Error::InvalidWordlist(_))
        ));
        assert!(matches!(
            Wordlist::new(["alpha", ""]),
            Err(Error::InvalidWordlist(_))
        ));
        assert!(matches!(
            Wordlist::new(["alone"]),
            Err(Error::InvalidWordlist(_))
        ));
    }

    #[test]
    fn test_parse_skips_comments() {
        let list = Wordlist::parse("# colors\nred\n\n  green  \nblue\n").unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list.get(0), Some("red"));
        assert_eq!(list.get(2), Some("blue"));
        assert!(!list.contains("# colors"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "north\nsouth\neast\nwest").unwrap();
        let list = Wordlist::load(file.path()).unwrap();
        assert_eq!(list.len(), 4);
        assert!(list.contains("west"));
    }

    #[test]
    fn test_pick_stays_in_list() {
        let list = Wordlist::new(["red", "green", "blue"]).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        for _ in 0..200 {
            let w = list.pick(&mut rng);
            assert!(list.contains(w));
            seen.insert(w.to_string());
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_unknown_words() {
        let list = Wordlist::english();
        assert!(list.unknown_words("Abandon ABILITY able").is_empty());
        assert_eq!(list.unknown_words("abandon qwerty able"), vec!["qwerty"]);
    }
}
