//! Debounced, cancellable, race-free asynchronous value resolution.
//!
//! The widget has two places where a rapidly-changing input (merchant
//! text, quote parameters) must be turned into a single current resolved
//! value without firing a network call per keystroke and without a slow
//! early response overwriting a fast later one. Both run on the same
//! machine: [`AsyncResolver`], parametrized by a [`Resolve`]
//! implementation, a debounce window, an optional hard timeout, and an
//! error-value policy.
//!
//! The correctness backbone is request identity: every dispatched
//! resolution carries a monotonically increasing id, and a completion is
//! only applied while its id still matches the in-flight slot. Cancellation
//! of superseded requests is best-effort; discarding stale completions is
//! authoritative.

mod config;
mod resolver;
mod state;

pub use config::{ErrorValuePolicy, ResolverConfig};
pub use resolver::{AsyncResolver, Resolve, ResolverClosed};
pub use state::{ResolutionState, ResolutionStatus, ResolveError};
