//! Token metadata and settlement currencies.

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Mint address of USDC on mainnet.
pub const USDC_MINT: &str = "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v";
/// Mint address of wrapped SOL.
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Metadata for a token the payer can spend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenInfo {
    /// Mint address of the token.
    pub address: CompactString,
    pub symbol: CompactString,
    pub name: String,
    pub decimals: u8,
    /// Reference price in USD, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<Url>,
}

/// Currency the merchant is settled in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SettlementCurrency {
    Usdc,
    Sol,
}

impl SettlementCurrency {
    /// Mint address of the settlement token.
    pub const fn mint(&self) -> &'static str {
        match self {
            SettlementCurrency::Usdc => USDC_MINT,
            SettlementCurrency::Sol => SOL_MINT,
        }
    }
}

impl fmt::Display for SettlementCurrency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementCurrency::Usdc => f.write_str("USDC"),
            SettlementCurrency::Sol => f.write_str("SOL"),
        }
    }
}

/// Error returned when parsing an unknown currency name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown settlement currency: {0}")]
pub struct ParseCurrencyError(String);

impl FromStr for SettlementCurrency {
    type Err = ParseCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USDC" => Ok(SettlementCurrency::Usdc),
            "SOL" => Ok(SettlementCurrency::Sol),
            _ => Err(ParseCurrencyError(s.to_owned())),
        }
    }
}
