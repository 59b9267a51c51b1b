//! Alphabet and Candidate: the symbol ring and the strings built over it
//!
//! The alphabet is a cyclic ring of distinct ASCII symbols. Candidates are
//! immutable strings over that ring; every operator builds a new one.

use crate::error::{EvolutionError, Result};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Symbols of the classic weasel program: space followed by A-Z
pub const DEFAULT_SYMBOLS: &str = " ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// An ordered ring of distinct ASCII symbols
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Alphabet {
    symbols: Vec<u8>,
    /// Ring position of each ASCII byte, if it belongs to the alphabet
    positions: Vec<Option<usize>>,
}

impl Alphabet {
    /// Build an alphabet, rejecting non-ASCII, duplicate symbols and rings shorter than 2
    pub fn new(symbols: &str) -> Result<Self> {
        if !symbols.is_ascii() {
            return Err(EvolutionError::InvalidAlphabet(format!(
                "non-ASCII symbols in {:?}",
                symbols
            )));
        }
        let bytes = symbols.as_bytes().to_vec();
        if bytes.len() < 2 {
            return Err(EvolutionError::InvalidAlphabet(
                "needs at least two symbols".to_string(),
            ));
        }
        for (i, b) in bytes.iter().enumerate() {
            if bytes[..i].contains(b) {
                return Err(EvolutionError::InvalidAlphabet(format!(
                    "duplicate symbol {:?}",
                    *b as char
                )));
            }
        }
        Ok(Self::from_ascii(bytes))
    }

    fn from_ascii(symbols: Vec<u8>) -> Self {
        let mut positions = vec![None; 128];
        for (i, &b) in symbols.iter().enumerate() {
            positions[b as usize] = Some(i);
        }
        Self { symbols, positions }
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn as_str(&self) -> &str {
        // Validated ASCII in `new`, so this never falls back
        std::str::from_utf8(&self.symbols).unwrap_or_default()
    }

    /// Ring position of a symbol
    pub fn position(&self, symbol: u8) -> Option<usize> {
        self.positions.get(symbol as usize).copied().flatten()
    }

    pub fn contains(&self, symbol: u8) -> bool {
        self.position(symbol).is_some()
    }

    /// Move `symbol` by `distance` steps around the ring (negative = backward).
    /// Symbols outside the alphabet are returned unchanged.
    pub fn shift(&self, symbol: u8, distance: isize) -> u8 {
        match self.position(symbol) {
            Some(pos) => {
                let len = self.symbols.len() as isize;
                let next = (pos as isize + distance).rem_euclid(len);
                self.symbols[next as usize]
            }
            None => symbol,
        }
    }

    /// Draw one symbol uniformly
    pub fn random_symbol<R: Rng + ?Sized>(&self, rng: &mut R) -> u8 {
        self.symbols[rng.gen_range(0..self.symbols.len())]
    }

    /// Draw a candidate of `length` symbols, each uniformly
    pub fn random_candidate<R: Rng + ?Sized>(&self, length: usize, rng: &mut R) -> Candidate {
        Candidate::from_symbols((0..length).map(|_| self.random_symbol(rng)))
    }

    /// Check that every symbol of `candidate` is on the ring
    pub fn validate(&self, candidate: &Candidate) -> Result<()> {
        match candidate.as_bytes().iter().find(|&&b| !self.contains(b)) {
            Some(&b) => Err(EvolutionError::Protocol(format!(
                "symbol {:?} is not in alphabet {:?}",
                b as char,
                self.as_str()
            ))),
            None => Ok(()),
        }
    }
}

impl Default for Alphabet {
    fn default() -> Self {
        Self::from_ascii(DEFAULT_SYMBOLS.as_bytes().to_vec())
    }
}

impl TryFrom<String> for Alphabet {
    type Error = EvolutionError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(&value)
    }
}

impl From<Alphabet> for String {
    fn from(alphabet: Alphabet) -> Self {
        alphabet.as_str().to_string()
    }
}

/// One point in the search space: a fixed-length string over the alphabet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Candidate(String);

impl Candidate {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Build from ASCII symbol bytes
    pub fn from_symbols(symbols: impl IntoIterator<Item = u8>) -> Self {
        Self(symbols.into_iter().map(char::from).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Candidate {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Candidate {
    fn from(text: String) -> Self {
        Self(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_default_alphabet() {
        let alphabet = Alphabet::default();
        assert_eq!(alphabet.len(), 27);
        assert_eq!(alphabet.position(b' '), Some(0));
        assert_eq!(alphabet.position(b'Z'), Some(26));
        assert!(!alphabet.contains(b'a'));
    }

    #[test]
    fn test_rejects_bad_alphabets() {
        assert!(Alphabet::new("A").is_err());
        assert!(Alphabet::new("ABA").is_err());
        assert!(Alphabet::new("AÉ").is_err());
    }

    #[test]
    fn test_shift_wraps_both_ways() {
        let alphabet = Alphabet::default();
        assert_eq!(alphabet.shift(b'Z', 1), b' ');
        assert_eq!(alphabet.shift(b' ', -1), b'Z');
        assert_eq!(alphabet.shift(b'A', 3), b'D');
        assert_eq!(alphabet.shift(b'B', -3), b'Z');
    }

    #[test]
    fn test_random_candidate_stays_on_ring() {
        let alphabet = Alphabet::new("ACT").unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let c = alphabet.random_candidate(50, &mut rng);
        assert_eq!(c.len(), 50);
        assert!(alphabet.validate(&c).is_ok());
        assert!(alphabet.validate(&Candidate::from("CAG")).is_err());
    }

    #[test]
    fn test_alphabet_serde_as_string() {
        let alphabet = Alphabet::new("ACT").unwrap();
        let json = serde_json::to_string(&alphabet).unwrap();
        assert_eq!(json, "\"ACT\"");
        let back: Alphabet = serde_json::from_str(&json).unwrap();
        assert_eq!(back, alphabet);
        assert!(serde_json::from_str::<Alphabet>("\"AA\"").is_err());
    }
}
