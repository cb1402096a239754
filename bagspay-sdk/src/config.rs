//! Explicit backend selection.
//!
//! The widget historically decided mock-vs-live from the presence of an
//! environment variable read deep inside the quote layer. Here the choice
//! is a plain configuration value, constructed once by the embedding
//! application and injected into the quote source at build time. Nothing
//! in this crate reads the environment.

use url::Url;

/// Which backend the quote source talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiMode {
    /// In-process mock backend.
    Mock,
    /// Live quote API rooted at `base_url`.
    Live { base_url: Url },
}

impl ApiMode {
    /// Map an optional base URL to a mode: `None` means mock.
    pub fn from_base_url(base_url: Option<Url>) -> Self {
        match base_url {
            Some(base_url) => ApiMode::Live { base_url },
            None => ApiMode::Mock,
        }
    }

    pub fn is_mock(&self) -> bool {
        matches!(self, ApiMode::Mock)
    }
}
