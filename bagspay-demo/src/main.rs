//! BagsPay checkout resolution demo.
//!
//! Drives the merchant and quote resolvers the way the widget UI would:
//! submits the merchant input, waits for the resolved address, then feeds
//! the quote resolver and refreshes once. Runs against the mock backend
//! unless a live quote API base URL is provided.

use bagspay_core::engine::{AsyncResolver, Resolve, ResolutionState, ResolutionStatus};
use bagspay_core::resolvers::{QuoteInput, merchant_resolver, quote_resolver};
use bagspay_sdk::client::{mock_tokens, quote_source_for};
use bagspay_sdk::config::ApiMode;
use bagspay_sdk::objects::SettlementCurrency;
use bagspay_sdk::sns::MockNameService;
use clap::Parser;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use url::Url;

/// BagsPay demo - drive the checkout resolution flow from the CLI
#[derive(Parser, Debug)]
#[command(name = "bagspay-demo")]
#[command(version, about, long_about = None)]
struct Args {
    /// Merchant input: a `.sol` domain or a wallet address
    #[arg(short, long, default_value = "merchant.sol")]
    merchant: String,

    /// Payment amount in the settlement currency
    #[arg(short, long, default_value = "25")]
    amount: Decimal,

    /// Settlement currency (USDC or SOL)
    #[arg(short, long, default_value = "USDC")]
    currency: SettlementCurrency,

    /// Base URL of a live quote API; the mock backend is used when omitted
    #[arg(long, env = "BAGS_API_BASE_URL")]
    api_base_url: Option<Url>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();
    tracing::info!("Starting bagspay-demo v{}", env!("CARGO_PKG_VERSION"));

    let mode = ApiMode::from_base_url(args.api_base_url);
    tracing::info!(mock = mode.is_mock(), "Quote backend selected");

    // Merchant resolution: .sol domain or literal address.
    let merchant = merchant_resolver(Arc::new(MockNameService::new()));
    merchant.submit(args.merchant.clone()).await?;

    let state = wait_for_settled(&merchant).await;
    let Some(address) = state.value else {
        anyhow::bail!(
            "merchant resolution failed: {}",
            state
                .error_message()
                .unwrap_or_else(|| "unknown error".to_owned())
        );
    };
    tracing::info!(merchant = %args.merchant, address = %address, "Merchant resolved");

    // Quote resolution for the first demo token.
    let token = mock_tokens()
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("empty token table"))?;
    let quote = quote_resolver(quote_source_for(&mode));
    quote
        .submit(QuoteInput {
            token: Some(token.clone()),
            amount: args.amount,
            currency: args.currency,
            merchant: Some(address),
        })
        .await?;

    let state = wait_for_settled(&quote).await;
    report_quote(&state, &token.symbol, args.currency);

    // Manual refresh, as the widget's refresh affordance does.
    tracing::info!("Refreshing quote");
    let mut updates = quote.subscribe();
    updates.mark_unchanged();
    quote.refresh().await?;
    loop {
        updates.changed().await?;
        let state = updates.borrow_and_update().clone();
        if state.status != ResolutionStatus::Resolving {
            report_quote(&state, &token.symbol, args.currency);
            break;
        }
    }

    merchant.shutdown();
    quote.shutdown();
    Ok(())
}

/// Wait until the resolver settles on a resolved value or an error.
async fn wait_for_settled<R: Resolve>(
    resolver: &AsyncResolver<R>,
) -> ResolutionState<R::Output> {
    let mut rx = resolver.subscribe();
    loop {
        {
            let state = rx.borrow_and_update();
            if matches!(
                state.status,
                ResolutionStatus::Resolved | ResolutionStatus::Error
            ) {
                return state.clone();
            }
        }
        if rx.changed().await.is_err() {
            return rx.borrow().clone();
        }
    }
}

fn report_quote(
    state: &ResolutionState<bagspay_sdk::objects::QuoteResponse>,
    symbol: &str,
    currency: SettlementCurrency,
) {
    match (&state.value, &state.error) {
        (Some(quote), None) => {
            tracing::info!(
                amount_in = %quote.amount_in,
                token = symbol,
                amount_out = %quote.amount_out,
                currency = %currency,
                fee = %quote.fee,
                "Quote resolved"
            );
        }
        (value, Some(error)) => {
            tracing::warn!(
                error = %error,
                stale_quote = value.is_some(),
                "Quote resolution failed"
            );
        }
        (None, None) => {
            tracing::warn!("Quote resolver settled with neither value nor error");
        }
    }
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
