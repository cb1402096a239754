//! Merchant-input resolution: `.sol` domains with literal-address fallback.

use async_trait::async_trait;
use bagspay_sdk::address::{WalletAddress, is_sol_domain};
use bagspay_sdk::sns::{NameResolver, NameServiceError};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::engine::{
    AsyncResolver, ErrorValuePolicy, Resolve, ResolveError, ResolverConfig,
};

/// Debounce window for merchant text input. Longer than the quote window:
/// typing an address has natural pauses and each lookup is expensive.
pub const MERCHANT_DEBOUNCE: Duration = Duration::from_millis(400);

/// Hard cap on a single merchant resolution attempt.
pub const MERCHANT_TIMEOUT: Duration = Duration::from_secs(7);

/// Resolves the raw merchant field to a validated wallet address.
///
/// Inputs matching the `.sol` pattern go through the name service first;
/// if that lookup fails, the input is retried as a literal base58 address.
/// Inputs matching neither form fail with `InvalidInput`.
pub struct MerchantResolve<N: NameResolver> {
    names: Arc<N>,
}

impl<N: NameResolver> MerchantResolve<N> {
    pub fn new(names: Arc<N>) -> Self {
        Self { names }
    }
}

#[async_trait]
impl<N: NameResolver> Resolve for MerchantResolve<N> {
    type Input = String;
    type Output = WalletAddress;

    fn is_resolvable(&self, input: &String) -> bool {
        !input.trim().is_empty()
    }

    async fn resolve(
        &self,
        input: String,
        cancel: CancellationToken,
    ) -> Result<WalletAddress, ResolveError> {
        let trimmed = input.trim();

        let lookup_error = if is_sol_domain(trimmed) {
            match cancel
                .run_until_cancelled(self.names.resolve_domain(trimmed))
                .await
            {
                None => {
                    // Superseded mid-lookup; the engine discards whatever
                    // we return.
                    return Err(ResolveError::Network("lookup cancelled".to_owned()));
                }
                Some(Ok(address)) => return Ok(address),
                Some(Err(error)) => {
                    warn!(
                        input = trimmed,
                        error = %error,
                        "domain resolution failed, trying literal address"
                    );
                    Some(error)
                }
            }
        } else {
            None
        };

        if let Ok(address) = trimmed.parse::<WalletAddress>() {
            return Ok(address);
        }

        match lookup_error {
            Some(NameServiceError::NotFound(domain)) => {
                Err(ResolveError::NotFound(format!("domain not found: {domain}")))
            }
            Some(NameServiceError::Network(reason)) => Err(ResolveError::Network(reason)),
            None => Err(ResolveError::InvalidInput(format!(
                "invalid merchant address or domain: {trimmed}"
            ))),
        }
    }
}

/// Spawn a merchant resolver with the standard widget tuning.
pub fn merchant_resolver<N: NameResolver>(names: Arc<N>) -> AsyncResolver<MerchantResolve<N>> {
    AsyncResolver::spawn(
        ResolverConfig {
            debounce: MERCHANT_DEBOUNCE,
            timeout: Some(MERCHANT_TIMEOUT),
            on_error: ErrorValuePolicy::Clear,
        },
        MerchantResolve::new(names),
    )
}
