//! Wire objects shared between the widget, the quote sources and the demo.

mod quote;
mod token;

pub use quote::{QuoteRequest, QuoteResponse};
pub use token::{
    ParseCurrencyError, SOL_MINT, SettlementCurrency, TokenInfo, USDC_MINT,
};
