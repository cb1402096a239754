//! Wallet address validation and merchant-input classification.
//!
//! The merchant field of the widget accepts either a `.sol` domain or a
//! literal base58 wallet address. This module owns the cheap synchronous
//! checks for both forms; the asynchronous domain lookup lives in
//! [`crate::sns`].

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Shortest base58 encoding of a 32-byte public key we accept.
pub const MIN_ADDRESS_LEN: usize = 32;
/// Longest base58 encoding of a 32-byte public key we accept.
pub const MAX_ADDRESS_LEN: usize = 44;

/// Reasons a raw string is rejected as a wallet address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Input length is outside the 32-44 character window.
    #[error("address must be {MIN_ADDRESS_LEN}-{MAX_ADDRESS_LEN} characters, got {0}")]
    Length(usize),

    /// Input contains a character outside the base58 alphabet.
    #[error("address contains non-base58 character {0:?}")]
    Alphabet(char),
}

/// A validated base58 wallet address.
///
/// Construction goes through [`FromStr`], so holding a `WalletAddress`
/// means the length and alphabet checks have already passed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WalletAddress(CompactString);

impl WalletAddress {
    /// The address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap an already-validated address without re-checking it.
    ///
    /// Only for crate-internal construction sites that build addresses
    /// from the base58 alphabet directly.
    pub(crate) fn new_unchecked(raw: CompactString) -> Self {
        Self(raw)
    }
}

impl FromStr for WalletAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < MIN_ADDRESS_LEN || s.len() > MAX_ADDRESS_LEN {
            return Err(AddressError::Length(s.len()));
        }
        if let Some(bad) = s.chars().find(|c| !is_base58_char(*c)) {
            return Err(AddressError::Alphabet(bad));
        }
        Ok(Self(CompactString::from(s)))
    }
}

impl TryFrom<String> for WalletAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WalletAddress> for String {
    fn from(address: WalletAddress) -> Self {
        address.0.into()
    }
}

impl AsRef<str> for WalletAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Returns true when the merchant input should be treated as a
/// name-service domain rather than a literal address.
pub fn is_sol_domain(input: &str) -> bool {
    input.len() > 4 && input.ends_with(".sol")
}

fn is_base58_char(c: char) -> bool {
    c.is_ascii_alphanumeric() && !matches!(c, '0' | 'O' | 'I' | 'l')
}
