//! Mock quote backend.
//!
//! Serves deterministic quote math over a fixed token table, with
//! randomised slippage/price-impact and simulated latency, so the widget
//! can run end to end without a live quote API.

use async_trait::async_trait;
use compact_str::CompactString;
use rand::Rng;
use rust_decimal::Decimal;
use std::time::Duration;

use super::{ClientError, QuoteSource};
use crate::objects::{QuoteRequest, QuoteResponse, SOL_MINT, TokenInfo};

/// Simulated quote latency of the mock backend.
pub const MOCK_QUOTE_LATENCY: Duration = Duration::from_millis(800);

/// Reference SOL price used by the mock, in USD.
const MOCK_SOL_PRICE: Decimal = Decimal::from_parts(150, 0, 0, false, 0);

/// Swap fee applied by the mock backend: 0.3%.
const MOCK_FEE_RATE: Decimal = Decimal::from_parts(3, 0, 0, false, 3);

/// The demo token table.
pub fn mock_tokens() -> Vec<TokenInfo> {
    vec![
        token(
            "BAGSoL11111111111111111111111111111111111111",
            "BAGS",
            "Bags Protocol Token",
            9,
            Decimal::new(5, 2),
        ),
        token(
            "MOCHI11111111111111111111111111111111111111",
            "MOCHI",
            "Mochi Meme Coin",
            9,
            Decimal::new(1, 4),
        ),
        token(
            "BONK111111111111111111111111111111111111111",
            "BONK",
            "Bonk Inu",
            5,
            Decimal::new(2, 5),
        ),
        token(
            "POPCAT1111111111111111111111111111111111111",
            "POPCAT",
            "Popcat",
            9,
            Decimal::new(5, 4),
        ),
        token(
            "WIF1111111111111111111111111111111111111111",
            "WIF",
            "dogwifhat",
            9,
            Decimal::new(25, 1),
        ),
    ]
}

fn token(address: &str, symbol: &str, name: &str, decimals: u8, price: Decimal) -> TokenInfo {
    TokenInfo {
        address: CompactString::from(address),
        symbol: CompactString::from(symbol),
        name: name.to_owned(),
        decimals,
        price: Some(price),
        logo_uri: None,
    }
}

/// In-process quote source backed by [`mock_tokens`].
#[derive(Debug, Clone)]
pub struct MockBagsApi {
    latency: Duration,
    tokens: Vec<TokenInfo>,
}

impl MockBagsApi {
    pub fn new() -> Self {
        Self {
            latency: MOCK_QUOTE_LATENCY,
            tokens: mock_tokens(),
        }
    }

    /// Override the simulated latency (tests use `Duration::ZERO`).
    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            tokens: mock_tokens(),
        }
    }
}

impl Default for MockBagsApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteSource for MockBagsApi {
    async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, ClientError> {
        tokio::time::sleep(self.latency).await;

        let token = self
            .tokens
            .iter()
            .find(|t| t.address == request.token_in)
            .ok_or_else(|| ClientError::UnknownToken(request.token_in.clone()))?;
        let price = token
            .price
            .ok_or_else(|| ClientError::UnknownToken(request.token_in.clone()))?;

        let amount_in_currency = request.amount * settlement_price(&request.out_token);
        let amount_in = amount_in_currency / price;

        let mut rng = rand::rng();
        Ok(QuoteResponse {
            token_in: request.token_in.clone(),
            token_out: request.out_token.clone(),
            amount_in,
            amount_out: request.amount,
            price_impact: rng.random_range(0.1..=1.0),
            route: vec![request.token_in.clone(), CompactString::from(SOL_MINT)],
            slippage: rng.random_range(0.5..=2.0),
            fee: amount_in_currency * MOCK_FEE_RATE,
        })
    }
}

/// USD price of the settlement token. USDC and anything unknown settle at $1.
fn settlement_price(mint: &str) -> Decimal {
    match mint {
        SOL_MINT => MOCK_SOL_PRICE,
        _ => Decimal::ONE,
    }
}
