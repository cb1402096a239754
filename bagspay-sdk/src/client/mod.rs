//! Quote sources for the checkout widget.
//!
//! The engine consumes quotes through the [`QuoteSource`] trait; which
//! implementation backs it is decided once, explicitly, via
//! [`crate::config::ApiMode`]. The live HTTP client is gated behind the
//! `client` cargo feature.

mod mock;

#[cfg(feature = "client")]
mod http;

pub use mock::{MOCK_QUOTE_LATENCY, MockBagsApi, mock_tokens};

#[cfg(feature = "client")]
pub use http::QuoteApiClient;

use async_trait::async_trait;
use compact_str::CompactString;

use crate::objects::{QuoteRequest, QuoteResponse};

/// Errors produced by quote sources.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (DNS, TLS, connection reset, …).
    #[cfg(feature = "client")]
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server returned a non-2xx status code.
    #[error("api error: status {status}, body: {body}")]
    Api { status: u16, body: String },

    /// Response body could not be deserialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The base URL could not be joined with the endpoint path.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// The requested token is not known to the backend.
    #[error("token not found: {0}")]
    UnknownToken(CompactString),
}

/// Anything that can turn a [`QuoteRequest`] into a [`QuoteResponse`].
#[async_trait]
pub trait QuoteSource: Send + Sync + 'static {
    async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, ClientError>;
}

/// Build the quote source selected by the configuration.
#[cfg(feature = "client")]
pub fn quote_source_for(mode: &crate::config::ApiMode) -> std::sync::Arc<dyn QuoteSource> {
    use crate::config::ApiMode;
    use std::sync::Arc;

    match mode {
        ApiMode::Mock => Arc::new(MockBagsApi::new()),
        ApiMode::Live { base_url } => Arc::new(QuoteApiClient::new(base_url.clone())),
    }
}
