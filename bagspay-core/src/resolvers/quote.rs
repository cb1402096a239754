//! Price-quote resolution for the checkout widget.

use async_trait::async_trait;
use bagspay_sdk::address::WalletAddress;
use bagspay_sdk::client::{ClientError, QuoteSource};
use bagspay_sdk::objects::{QuoteRequest, QuoteResponse, SettlementCurrency, TokenInfo};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::engine::{
    AsyncResolver, ErrorValuePolicy, Resolve, ResolveError, ResolverConfig,
};

/// Debounce window for quote parameters. Shorter than the merchant
/// window: amount steppers and token pickers change in quick bursts.
pub const QUOTE_DEBOUNCE: Duration = Duration::from_millis(300);

/// Everything a quote depends on. The widget resubmits the whole tuple
/// whenever any part of it changes.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteInput {
    pub token: Option<TokenInfo>,
    /// Payment amount in the settlement currency.
    pub amount: Decimal,
    pub currency: SettlementCurrency,
    pub merchant: Option<WalletAddress>,
}

/// Resolves quote parameters to a [`QuoteResponse`] via a [`QuoteSource`].
pub struct QuoteResolve {
    source: Arc<dyn QuoteSource>,
}

impl QuoteResolve {
    pub fn new(source: Arc<dyn QuoteSource>) -> Self {
        Self { source }
    }
}

#[async_trait]
impl Resolve for QuoteResolve {
    type Input = QuoteInput;
    type Output = QuoteResponse;

    fn is_resolvable(&self, input: &QuoteInput) -> bool {
        input.token.is_some() && input.merchant.is_some() && input.amount > Decimal::ZERO
    }

    async fn resolve(
        &self,
        input: QuoteInput,
        cancel: CancellationToken,
    ) -> Result<QuoteResponse, ResolveError> {
        let Some(token) = input.token else {
            // Guarded by the precondition.
            return Err(ResolveError::InvalidInput("no token selected".to_owned()));
        };

        let request = QuoteRequest {
            token_in: token.address.clone(),
            amount: input.amount,
            out_token: input.currency.mint().into(),
        };

        match cancel.run_until_cancelled(self.source.quote(&request)).await {
            None => Err(ResolveError::Network("quote request cancelled".to_owned())),
            Some(Ok(quote)) => Ok(quote),
            Some(Err(ClientError::UnknownToken(mint))) => {
                Err(ResolveError::NotFound(format!("token not found: {mint}")))
            }
            Some(Err(ClientError::Api { status: 404, body })) => {
                Err(ResolveError::NotFound(body))
            }
            Some(Err(error)) => Err(ResolveError::Network(error.to_string())),
        }
    }
}

/// Spawn a quote resolver with the standard widget tuning.
///
/// No hard timeout, and the last good quote survives failures so the UI
/// can keep showing it next to the error while the user retries.
pub fn quote_resolver(source: Arc<dyn QuoteSource>) -> AsyncResolver<QuoteResolve> {
    AsyncResolver::spawn(
        ResolverConfig {
            debounce: QUOTE_DEBOUNCE,
            timeout: None,
            on_error: ErrorValuePolicy::KeepLastGood,
        },
        QuoteResolve::new(source),
    )
}
