//! Externally visible resolution state.

use thiserror::Error;

/// Lifecycle phase of the current resolution attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionStatus {
    /// No valid input has been submitted, or the input was cleared.
    Idle,
    /// A resolution has been dispatched and has not settled yet.
    Resolving,
    /// The latest dispatched resolution succeeded.
    Resolved,
    /// The latest dispatched resolution failed or timed out.
    Error,
}

/// Terminal failure reasons reported through [`ResolutionState`].
///
/// All failures are non-fatal: the resolver stays in a stable, retryable
/// state and never propagates an error past the published snapshot.
/// Staleness is deliberately not a variant here; a superseded completion
/// is discarded inside the engine and never becomes visible.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The input failed a cheap format check; no network call was made.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation completed but could not find a result.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation failed at the transport or server level.
    #[error("network error: {0}")]
    Network(String),

    /// The configured hard timeout fired before the operation completed.
    #[error("resolution timed out")]
    Timeout,
}

/// Snapshot published on the resolver's watch channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolutionState<T> {
    pub status: ResolutionStatus,
    /// Last successfully resolved value. Whether it survives a subsequent
    /// failure is decided by the configured
    /// [`ErrorValuePolicy`](super::ErrorValuePolicy).
    pub value: Option<T>,
    pub error: Option<ResolveError>,
}

impl<T> ResolutionState<T> {
    /// The initial state: no value, no error, nothing scheduled.
    pub fn idle() -> Self {
        Self {
            status: ResolutionStatus::Idle,
            value: None,
            error: None,
        }
    }

    pub fn is_resolving(&self) -> bool {
        self.status == ResolutionStatus::Resolving
    }

    /// Human-readable failure reason, if the state carries one.
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(ToString::to_string)
    }
}

impl<T> Default for ResolutionState<T> {
    fn default() -> Self {
        Self::idle()
    }
}
