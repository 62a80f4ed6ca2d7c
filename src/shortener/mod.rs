//! Short code generation.
//!
//! Codes are fixed-length strings over a 62-character alphabet
//! (lowercase, then uppercase, then digits, so `encode(0)` is
//! `"a"`). The generator only supplies candidates; uniqueness is
//! enforced by the storage layer's constrained insert.

use rand::RngExt;

/// Base-62 alphabet: a-z, A-Z, 0-9.
pub const ALPHABET: &[u8; 62] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

pub const DEFAULT_CODE_LENGTH: usize = 5;

/// Source of candidate short codes.
///
/// Implementations don't interact with storage and make no uniqueness
/// guarantee on their own. The production source is the random
/// [`CodeGenerator`]; tests substitute scripted sources to force
/// collisions.
pub trait CodeSource: Send + Sync {
    fn next_code(&self) -> String;
}

/// Random base-62 code generator.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    length: usize,
}

impl Default for CodeGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_CODE_LENGTH)
    }
}

impl CodeGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Generate a random code of the configured length, uniform over
    /// the alphabet.
    pub fn generate(&self) -> String {
        let mut rng = rand::rng();
        (0..self.length)
            .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
            .collect()
    }

    /// Check length and alphabet membership.
    pub fn is_valid(&self, code: &str) -> bool {
        code.len() == self.length && code.bytes().all(|b| digit_value(b).is_some())
    }
}

impl CodeSource for CodeGenerator {
    fn next_code(&self) -> String {
        self.generate()
    }
}

fn digit_value(b: u8) -> Option<u64> {
    match b {
        b'a'..=b'z' => Some((b - b'a') as u64),
        b'A'..=b'Z' => Some((b - b'A') as u64 + 26),
        b'0'..=b'9' => Some((b - b'0') as u64 + 52),
        _ => None,
    }
}

/// Encode a number as a base-62 string, most-significant digit first.
///
/// `encode(0)` yields `"a"`, the first character of the alphabet. This
/// is the deterministic alternative to random generation: feeding a
/// monotonic counter through it eliminates collisions entirely.
pub fn encode(mut n: u64) -> String {
    if n == 0 {
        return (ALPHABET[0] as char).to_string();
    }

    let mut buf = Vec::new();
    while n > 0 {
        buf.push(ALPHABET[(n % 62) as usize]);
        n /= 62;
    }
    buf.reverse();
    // The buffer holds alphabet bytes only.
    String::from_utf8(buf).unwrap_or_default()
}

/// Decode a base-62 string back to a number.
///
/// Exact inverse of [`encode`] for every value it produces. Returns
/// `None` on characters outside the alphabet or on overflow.
pub fn decode(code: &str) -> Option<u64> {
    if code.is_empty() {
        return None;
    }

    let mut n: u64 = 0;
    for b in code.bytes() {
        let d = digit_value(b)?;
        n = n.checked_mul(62)?.checked_add(d)?;
    }
    Some(n)
}
