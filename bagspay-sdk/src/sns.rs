//! `.sol` name-service resolution.
//!
//! The resolution engine only depends on the [`NameResolver`] trait; the
//! concrete resolver is injected at construction. The shipped
//! implementation is a deterministic in-process mock, which is what the
//! demo widget runs against. A production deployment would implement the
//! trait over an on-chain name registry client.

use async_trait::async_trait;
use compact_str::CompactString;
use std::time::Duration;
use thiserror::Error;

use crate::address::{MAX_ADDRESS_LEN, WalletAddress, is_sol_domain};

/// Simulated lookup latency of the mock name service.
pub const MOCK_LOOKUP_LATENCY: Duration = Duration::from_millis(200);

/// Failures reported by a name resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameServiceError {
    /// The domain does not exist or has no address record.
    #[error("domain not found: {0}")]
    NotFound(CompactString),

    /// The lookup failed at the transport level.
    #[error("name service error: {0}")]
    Network(String),
}

/// Resolves a `.sol` domain to the wallet address it points at.
#[async_trait]
pub trait NameResolver: Send + Sync + 'static {
    async fn resolve_domain(&self, domain: &str) -> Result<WalletAddress, NameServiceError>;
}

/// Deterministic in-process name service for the demo and tests.
///
/// Every well-formed `.sol` domain resolves to the same derived address on
/// every call, after a configurable simulated latency.
#[derive(Debug, Clone)]
pub struct MockNameService {
    latency: Duration,
}

impl MockNameService {
    pub fn new() -> Self {
        Self {
            latency: MOCK_LOOKUP_LATENCY,
        }
    }

    /// Override the simulated latency (tests use `Duration::ZERO`).
    pub fn with_latency(latency: Duration) -> Self {
        Self { latency }
    }
}

impl Default for MockNameService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NameResolver for MockNameService {
    async fn resolve_domain(&self, domain: &str) -> Result<WalletAddress, NameServiceError> {
        if !is_sol_domain(domain) {
            return Err(NameServiceError::NotFound(CompactString::from(domain)));
        }
        tokio::time::sleep(self.latency).await;
        Ok(mock_address_for(domain))
    }
}

/// Derive a stable, base58-valid mock address from the domain name.
fn mock_address_for(domain: &str) -> WalletAddress {
    const ALPHABET: &[u8] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

    // FNV-1a over the domain, then expanded over the base58 alphabet.
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in domain.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }

    let mut raw = CompactString::from("So1");
    let mut state = hash;
    while raw.len() < MAX_ADDRESS_LEN {
        raw.push(char::from(ALPHABET[(state % 58) as usize]));
        state = state.rotate_left(7).wrapping_add(raw.len() as u64);
    }
    WalletAddress::new_unchecked(raw)
}
