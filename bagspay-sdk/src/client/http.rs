//! Live quote API client.

use reqwest::Client;
use url::Url;

use super::{ClientError, QuoteSource};
use crate::objects::{QuoteRequest, QuoteResponse};

const QUOTE_ENDPOINT: &str = "/api/bags/quote";

/// Typed HTTP client for the quote API.
///
/// `POST {base_url}/api/bags/quote` with the [`QuoteRequest`] as a JSON
/// body; non-2xx responses surface as [`ClientError::Api`] with the status
/// and body attached.
#[derive(Debug, Clone)]
pub struct QuoteApiClient {
    http: Client,
    base_url: Url,
}

impl QuoteApiClient {
    /// Create a new `QuoteApiClient`.
    ///
    /// * `base_url` – root URL of the quote API (e.g. `https://api.bags.fm`).
    pub fn new(base_url: Url) -> Self {
        Self {
            http: Client::new(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Fetch a quote for the given request.
    pub async fn get_quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, ClientError> {
        let url = self.base_url.join(QUOTE_ENDPOINT)?;
        let resp = self.http.post(url).json(request).send().await?;
        parse_response(resp).await
    }
}

#[async_trait::async_trait]
impl QuoteSource for QuoteApiClient {
    async fn quote(&self, request: &QuoteRequest) -> Result<QuoteResponse, ClientError> {
        self.get_quote(request).await
    }
}

async fn parse_response<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ClientError> {
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(ClientError::Api {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = resp.bytes().await?;
    serde_json::from_slice(&bytes).map_err(ClientError::Json)
}
