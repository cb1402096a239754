//! Per-instance resolver tuning.

use std::time::Duration;

/// What happens to the last good value when a current-request failure
/// lands.
///
/// Merchant resolution clears it (an address that failed to re-resolve
/// must not be paid to); quote resolution keeps it so the UI can show the
/// last good quote alongside the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorValuePolicy {
    /// Clear `value` when a failure is applied.
    #[default]
    Clear,
    /// Keep the last successfully resolved value through failures.
    KeepLastGood,
}

/// Tuning for one [`AsyncResolver`](super::AsyncResolver) instance.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Trailing debounce window between the last `submit` and dispatch.
    pub debounce: Duration,
    /// Hard upper bound on a dispatched resolution. The clock starts at
    /// dispatch, not at `submit`. `None` disables the timeout.
    pub timeout: Option<Duration>,
    pub on_error: ErrorValuePolicy,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(300),
            timeout: None,
            on_error: ErrorValuePolicy::default(),
        }
    }
}
