//! Quote request/response payloads.

use compact_str::CompactString;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Request body for `POST /api/bags/quote`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    /// Mint address of the token the payer spends.
    pub token_in: CompactString,
    /// Payment amount, denominated in the settlement currency.
    pub amount: Decimal,
    /// Mint address of the settlement token.
    pub out_token: CompactString,
}

/// A price quote for paying `amount_out` of the settlement currency with
/// `amount_in` of the selected token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub token_in: CompactString,
    pub token_out: CompactString,
    /// How much of `token_in` the payer spends.
    pub amount_in: Decimal,
    /// How much of `token_out` the merchant receives.
    pub amount_out: Decimal,
    /// Estimated price impact, in percent.
    pub price_impact: f64,
    /// Mint addresses along the swap route.
    pub route: Vec<CompactString>,
    /// Allowed slippage, in percent.
    pub slippage: f64,
    /// Swap fee, denominated in the settlement currency.
    pub fee: Decimal,
}
