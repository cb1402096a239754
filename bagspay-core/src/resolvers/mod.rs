//! The two widget instantiations of the resolution engine.
//!
//! Merchant resolution and quote resolution are fully independent
//! resolver instances; they share the machine, never state.

pub mod merchant;
pub mod quote;

pub use merchant::{MerchantResolve, merchant_resolver};
pub use quote::{QuoteInput, QuoteResolve, quote_resolver};
