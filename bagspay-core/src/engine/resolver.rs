//! The generic resolution engine.
//!
//! [`AsyncResolver`] is an actor: a spawned worker task owns all mutable
//! state (debounce deadline, in-flight request slot, request id counter)
//! and everything else talks to it through channels. Commands go in over
//! an mpsc channel, state snapshots come out over a watch channel, and
//! completions of dispatched resolutions arrive on an internal mpsc
//! channel tagged with their request id.
//!
//! Completions are applied in logical-validity order, not arrival order:
//! a completion is only applied while its request id still matches the
//! in-flight slot. Superseding, timing out or tearing down a request
//! clears or replaces the slot, so anything the old request eventually
//! produces is silently discarded.

use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::config::{ErrorValuePolicy, ResolverConfig};
use super::state::{ResolutionState, ResolutionStatus, ResolveError};

/// Buffer size for the command and completion channels.
const CHANNEL_BUFFER: usize = 32;

/// The underlying asynchronous operation an [`AsyncResolver`] drives.
#[async_trait::async_trait]
pub trait Resolve: Send + Sync + 'static {
    type Input: Clone + Send + Sync + 'static;
    type Output: Clone + Send + Sync + 'static;

    /// Cheap synchronous precondition. Inputs that fail it reset the
    /// resolver to idle without scheduling anything.
    fn is_resolvable(&self, input: &Self::Input) -> bool;

    /// Perform the resolution.
    ///
    /// The token is cancelled when the request has been superseded, timed
    /// out or torn down. Honoring it promptly is optional: whatever a
    /// cancelled resolution returns is already stale and will be
    /// discarded by the engine.
    async fn resolve(
        &self,
        input: Self::Input,
        cancel: CancellationToken,
    ) -> Result<Self::Output, ResolveError>;
}

enum Command<I> {
    Submit(I),
    Retry,
}

struct Completion<T> {
    request_id: u64,
    outcome: Result<T, ResolveError>,
}

struct Inflight {
    request_id: u64,
    cancel: CancellationToken,
    /// Hard timeout deadline, armed at dispatch when configured.
    deadline: Option<Instant>,
}

/// Error returned by handle methods after the worker has shut down.
#[derive(Debug, thiserror::Error)]
#[error("resolver has been torn down")]
pub struct ResolverClosed;

/// Handle to a spawned resolution worker.
///
/// One handle per logical subscription (e.g. one per widget instance).
/// Dropping the handle tears the worker down; in-flight work is cancelled
/// and no further state is published.
pub struct AsyncResolver<R: Resolve> {
    command_tx: mpsc::Sender<Command<R::Input>>,
    state_rx: watch::Receiver<ResolutionState<R::Output>>,
    shutdown_tx: watch::Sender<bool>,
}

impl<R: Resolve> AsyncResolver<R> {
    /// Spawn a worker for `resolve` with the given tuning.
    pub fn spawn(config: ResolverConfig, resolve: R) -> Self {
        let (command_tx, command_rx) = mpsc::channel(CHANNEL_BUFFER);
        let (completion_tx, completion_rx) = mpsc::channel(CHANNEL_BUFFER);
        let (state_tx, state_rx) = watch::channel(ResolutionState::idle());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = ResolverWorker {
            config,
            resolve: Arc::new(resolve),
            command_rx,
            completion_tx,
            completion_rx,
            state_tx,
            shutdown_rx,
            last_input: None,
            next_request_id: 0,
            debounce_deadline: None,
            inflight: None,
        };
        tokio::spawn(worker.run());

        Self {
            command_tx,
            state_rx,
            shutdown_tx,
        }
    }

    /// Record a new input value.
    ///
    /// Restarts the debounce window (trailing edge only). An input that
    /// fails the [`Resolve::is_resolvable`] precondition resets the
    /// resolver to idle immediately, with nothing scheduled.
    pub async fn submit(&self, input: R::Input) -> Result<(), ResolverClosed> {
        self.command_tx
            .send(Command::Submit(input))
            .await
            .map_err(|_| ResolverClosed)
    }

    /// Re-trigger resolution for the last valid input immediately,
    /// bypassing the debounce window. No-op if there is no valid input.
    pub async fn retry(&self) -> Result<(), ResolverClosed> {
        self.command_tx
            .send(Command::Retry)
            .await
            .map_err(|_| ResolverClosed)
    }

    /// Same primitive as [`retry`](Self::retry); quote call sites name it
    /// refresh.
    pub async fn refresh(&self) -> Result<(), ResolverClosed> {
        self.retry().await
    }

    /// Current state snapshot.
    pub fn state(&self) -> ResolutionState<R::Output> {
        self.state_rx.borrow().clone()
    }

    /// Subscribe to state updates.
    pub fn subscribe(&self) -> watch::Receiver<ResolutionState<R::Output>> {
        self.state_rx.clone()
    }

    /// Tear the worker down. Idempotent; also triggered by drop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

impl<R: Resolve> Drop for AsyncResolver<R> {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

struct ResolverWorker<R: Resolve> {
    config: ResolverConfig,
    resolve: Arc<R>,
    command_rx: mpsc::Receiver<Command<R::Input>>,
    /// Kept so the completion channel never closes while the worker runs.
    completion_tx: mpsc::Sender<Completion<R::Output>>,
    completion_rx: mpsc::Receiver<Completion<R::Output>>,
    state_tx: watch::Sender<ResolutionState<R::Output>>,
    shutdown_rx: watch::Receiver<bool>,
    /// Last submitted input that passed the precondition.
    last_input: Option<R::Input>,
    /// Highest request id issued so far. Bumped only on dispatch.
    next_request_id: u64,
    debounce_deadline: Option<Instant>,
    inflight: Option<Inflight>,
}

impl<R: Resolve> ResolverWorker<R> {
    async fn run(mut self) {
        trace!("resolver worker started");

        loop {
            let debounce_deadline = self.debounce_deadline;
            let timeout_deadline = self.inflight.as_ref().and_then(|i| i.deadline);

            tokio::select! {
                biased;

                result = self.shutdown_rx.changed() => {
                    if result.is_err() || *self.shutdown_rx.borrow() {
                        trace!("resolver worker received shutdown");
                        break;
                    }
                }

                command = self.command_rx.recv() => {
                    match command {
                        Some(Command::Submit(input)) => self.handle_submit(input),
                        Some(Command::Retry) => self.handle_retry(),
                        None => {
                            trace!("command channel closed");
                            break;
                        }
                    }
                }

                Some(completion) = self.completion_rx.recv() => {
                    self.handle_completion(completion);
                }

                _ = sleep_until_opt(debounce_deadline), if debounce_deadline.is_some() => {
                    self.debounce_deadline = None;
                    self.dispatch();
                }

                _ = sleep_until_opt(timeout_deadline), if timeout_deadline.is_some() => {
                    self.handle_timeout();
                }
            }
        }

        // Teardown: nothing may be published after this point.
        if let Some(inflight) = self.inflight.take() {
            inflight.cancel.cancel();
        }
        trace!("resolver worker stopped");
    }

    fn handle_submit(&mut self, input: R::Input) {
        // A new submit always restarts the debounce window.
        self.debounce_deadline = None;

        if !self.resolve.is_resolvable(&input) {
            trace!("input not resolvable, resetting to idle");
            self.last_input = None;
            if let Some(inflight) = self.inflight.take() {
                inflight.cancel.cancel();
            }
            self.publish(ResolutionState::idle());
            return;
        }

        self.last_input = Some(input);
        self.debounce_deadline = Some(Instant::now() + self.config.debounce);
    }

    fn handle_retry(&mut self) {
        if self.last_input.is_none() {
            trace!("retry without a valid input, ignoring");
            return;
        }
        self.debounce_deadline = None;
        self.dispatch();
    }

    /// Issue a new request for the last valid input: fresh request id,
    /// fresh cancellation token, timeout armed if configured.
    fn dispatch(&mut self) {
        let Some(input) = self.last_input.clone() else {
            return;
        };

        if let Some(previous) = self.inflight.take() {
            previous.cancel.cancel();
        }

        self.next_request_id += 1;
        let request_id = self.next_request_id;
        let cancel = CancellationToken::new();
        let deadline = self.config.timeout.map(|timeout| Instant::now() + timeout);
        self.inflight = Some(Inflight {
            request_id,
            cancel: cancel.clone(),
            deadline,
        });

        let mut state = self.state_tx.borrow().clone();
        state.status = ResolutionStatus::Resolving;
        state.error = None;
        self.publish(state);

        debug!(request_id, "dispatching resolution");
        let resolve = Arc::clone(&self.resolve);
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let outcome = resolve.resolve(input, cancel).await;
            // Fails only when the worker is gone; the result is then moot.
            let _ = completion_tx
                .send(Completion {
                    request_id,
                    outcome,
                })
                .await;
        });
    }

    fn handle_completion(&mut self, completion: Completion<R::Output>) {
        let current = self.inflight.as_ref().map(|i| i.request_id);
        if current != Some(completion.request_id) {
            debug!(
                request_id = completion.request_id,
                "discarding stale completion"
            );
            return;
        }
        self.inflight = None;

        match completion.outcome {
            Ok(value) => {
                debug!(request_id = completion.request_id, "resolution succeeded");
                self.publish(ResolutionState {
                    status: ResolutionStatus::Resolved,
                    value: Some(value),
                    error: None,
                });
            }
            Err(error) => {
                debug!(
                    request_id = completion.request_id,
                    error = %error,
                    "resolution failed"
                );
                self.fail(error);
            }
        }
    }

    /// The hard timeout fired while its request was still in flight:
    /// abandon the request as if it had failed. A late completion is
    /// discarded by the slot check in [`handle_completion`].
    fn handle_timeout(&mut self) {
        let Some(inflight) = self.inflight.take() else {
            return;
        };
        inflight.cancel.cancel();
        warn!(request_id = inflight.request_id, "resolution timed out");
        self.fail(ResolveError::Timeout);
    }

    fn fail(&mut self, error: ResolveError) {
        let value = match self.config.on_error {
            ErrorValuePolicy::Clear => None,
            ErrorValuePolicy::KeepLastGood => self.state_tx.borrow().value.clone(),
        };
        self.publish(ResolutionState {
            status: ResolutionStatus::Error,
            value,
            error: Some(error),
        });
    }

    fn publish(&self, state: ResolutionState<R::Output>) {
        let _ = self.state_tx.send_replace(state);
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::sleep;

    fn config(
        debounce_ms: u64,
        timeout_ms: Option<u64>,
        on_error: ErrorValuePolicy,
    ) -> ResolverConfig {
        ResolverConfig {
            debounce: Duration::from_millis(debounce_ms),
            timeout: timeout_ms.map(Duration::from_millis),
            on_error,
        }
    }

    #[derive(Clone)]
    struct Step {
        latency: Duration,
        outcome: Result<String, ResolveError>,
    }

    fn ok(latency_ms: u64, value: &str) -> Step {
        Step {
            latency: Duration::from_millis(latency_ms),
            outcome: Ok(value.to_owned()),
        }
    }

    fn fail(latency_ms: u64, error: ResolveError) -> Step {
        Step {
            latency: Duration::from_millis(latency_ms),
            outcome: Err(error),
        }
    }

    /// Scripted resolve: each input maps to a sequence of steps, one per
    /// call (the last step repeats). Deliberately ignores the
    /// cancellation token so superseded resolutions still complete and
    /// exercise the stale-completion discard path.
    #[derive(Clone)]
    struct ScriptedResolve {
        script: Arc<HashMap<String, Vec<Step>>>,
        calls: Arc<Mutex<Vec<String>>>,
        counts: Arc<Mutex<HashMap<String, usize>>>,
    }

    fn scripted(entries: &[(&str, Vec<Step>)]) -> ScriptedResolve {
        ScriptedResolve {
            script: Arc::new(
                entries
                    .iter()
                    .map(|(input, steps)| ((*input).to_owned(), steps.clone()))
                    .collect(),
            ),
            calls: Arc::new(Mutex::new(Vec::new())),
            counts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    impl ScriptedResolve {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl Resolve for ScriptedResolve {
        type Input = String;
        type Output = String;

        fn is_resolvable(&self, input: &String) -> bool {
            !input.trim().is_empty()
        }

        async fn resolve(
            &self,
            input: String,
            _cancel: CancellationToken,
        ) -> Result<String, ResolveError> {
            self.calls.lock().unwrap().push(input.clone());
            let step = {
                let mut counts = self.counts.lock().unwrap();
                let call_index = counts.entry(input.clone()).or_insert(0);
                let step = self.script.get(&input).and_then(|steps| {
                    steps
                        .get((*call_index).min(steps.len().saturating_sub(1)))
                        .cloned()
                });
                *call_index += 1;
                step
            };
            match step {
                Some(step) => {
                    sleep(step.latency).await;
                    step.outcome
                }
                None => Err(ResolveError::NotFound(format!("no script for {input}"))),
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn debounce_coalesces_rapid_submissions() {
        let resolve = scripted(&[("abc", vec![ok(10, "X")])]);
        let probe = resolve.clone();
        let resolver =
            AsyncResolver::spawn(config(300, None, ErrorValuePolicy::Clear), resolve);

        resolver.submit("a".to_owned()).await.unwrap();
        sleep(Duration::from_millis(50)).await;
        resolver.submit("ab".to_owned()).await.unwrap();
        sleep(Duration::from_millis(50)).await;
        resolver.submit("abc".to_owned()).await.unwrap();

        // Past the debounce window and the resolution latency.
        sleep(Duration::from_millis(500)).await;

        assert_eq!(probe.calls(), vec!["abc".to_owned()]);
        let state = resolver.state();
        assert_eq!(state.status, ResolutionStatus::Resolved);
        assert_eq!(state.value.as_deref(), Some("X"));
        assert!(state.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_early_response_never_overwrites_fast_late_one() {
        let resolve = scripted(&[
            ("slow", vec![ok(5_000, "SLOW")]),
            ("fast", vec![ok(100, "FAST")]),
        ]);
        let probe = resolve.clone();
        let resolver =
            AsyncResolver::spawn(config(300, None, ErrorValuePolicy::Clear), resolve);

        resolver.submit("slow".to_owned()).await.unwrap();
        // "slow" dispatches at ~300ms and would complete at ~5300ms.
        sleep(Duration::from_millis(400)).await;
        resolver.submit("fast".to_owned()).await.unwrap();

        // "fast" dispatches at ~700ms and completes at ~800ms.
        sleep(Duration::from_millis(600)).await;
        assert_eq!(resolver.state().value.as_deref(), Some("FAST"));

        // Let "slow" complete; its result must be discarded as stale.
        sleep(Duration::from_millis(5_000)).await;
        let state = resolver.state();
        assert_eq!(state.status, ResolutionStatus::Resolved);
        assert_eq!(state.value.as_deref(), Some("FAST"));
        assert_eq!(probe.calls(), vec!["slow".to_owned(), "fast".to_owned()]);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_input_resets_to_idle_without_dispatch() {
        let resolve = scripted(&[("valid", vec![ok(10, "V")])]);
        let probe = resolve.clone();
        let resolver =
            AsyncResolver::spawn(config(300, None, ErrorValuePolicy::Clear), resolve);

        resolver.submit("valid".to_owned()).await.unwrap();
        sleep(Duration::from_millis(400)).await;
        assert_eq!(resolver.state().value.as_deref(), Some("V"));

        // Whitespace-only input fails the precondition.
        resolver.submit("   ".to_owned()).await.unwrap();
        sleep(Duration::from_millis(1)).await;

        let state = resolver.state();
        assert_eq!(state.status, ResolutionStatus::Idle);
        assert!(state.value.is_none());
        assert!(state.error.is_none());

        // No debounce timer is pending: nothing new is dispatched.
        sleep(Duration::from_millis(1_000)).await;
        assert_eq!(probe.calls(), vec!["valid".to_owned()]);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fires_and_late_success_is_discarded() {
        let resolve = scripted(&[("slowpoke", vec![ok(10_000, "LATE")])]);
        let resolver = AsyncResolver::spawn(
            config(400, Some(7_000), ErrorValuePolicy::Clear),
            resolve,
        );

        resolver.submit("slowpoke".to_owned()).await.unwrap();

        // Dispatch at ~400ms, timeout at ~7400ms.
        sleep(Duration::from_millis(7_500)).await;
        let state = resolver.state();
        assert_eq!(state.status, ResolutionStatus::Error);
        assert_eq!(state.error, Some(ResolveError::Timeout));
        assert!(state.value.is_none());

        // The resolution completes at ~10400ms; the success must not
        // resurrect the state.
        sleep(Duration::from_millis(3_500)).await;
        let state = resolver.state();
        assert_eq!(state.status, ResolutionStatus::Error);
        assert_eq!(state.error, Some(ResolveError::Timeout));
        assert!(state.value.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn retry_bypasses_the_debounce_window() {
        let resolve = scripted(&[(
            "x",
            vec![
                fail(50, ResolveError::Network("boom".to_owned())),
                ok(50, "X2"),
            ],
        )]);
        let probe = resolve.clone();
        let resolver =
            AsyncResolver::spawn(config(300, None, ErrorValuePolicy::Clear), resolve);

        resolver.submit("x".to_owned()).await.unwrap();
        sleep(Duration::from_millis(400)).await;
        let state = resolver.state();
        assert_eq!(state.status, ResolutionStatus::Error);
        assert!(state.value.is_none());

        resolver.retry().await.unwrap();
        // Well inside what would be a fresh debounce window.
        sleep(Duration::from_millis(100)).await;
        let state = resolver.state();
        assert_eq!(state.status, ResolutionStatus::Resolved);
        assert_eq!(state.value.as_deref(), Some("X2"));
        assert_eq!(probe.calls().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_without_valid_input_is_a_no_op() {
        let resolve = scripted(&[]);
        let probe = resolve.clone();
        let resolver =
            AsyncResolver::spawn(config(300, None, ErrorValuePolicy::Clear), resolve);

        resolver.retry().await.unwrap();
        sleep(Duration::from_millis(500)).await;
        assert!(probe.calls().is_empty());
        assert_eq!(resolver.state().status, ResolutionStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn teardown_silences_inflight_completions() {
        let resolve = scripted(&[("x", vec![ok(500, "X")])]);
        let resolver =
            AsyncResolver::spawn(config(300, None, ErrorValuePolicy::Clear), resolve);

        resolver.submit("x".to_owned()).await.unwrap();
        sleep(Duration::from_millis(350)).await;

        let observer = resolver.subscribe();
        assert!(observer.borrow().is_resolving());

        resolver.shutdown();
        sleep(Duration::from_millis(1_000)).await;

        // The resolution completed after teardown; nothing was published.
        assert!(observer.borrow().is_resolving());
        assert!(observer.has_changed().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn keep_last_good_policy_retains_value_through_errors() {
        let resolve = scripted(&[(
            "x",
            vec![ok(10, "GOOD"), fail(10, ResolveError::Network("down".to_owned()))],
        )]);
        let resolver = AsyncResolver::spawn(
            config(300, None, ErrorValuePolicy::KeepLastGood),
            resolve,
        );

        resolver.submit("x".to_owned()).await.unwrap();
        sleep(Duration::from_millis(400)).await;
        assert_eq!(resolver.state().value.as_deref(), Some("GOOD"));

        resolver.refresh().await.unwrap();
        sleep(Duration::from_millis(100)).await;
        let state = resolver.state();
        assert_eq!(state.status, ResolutionStatus::Error);
        assert_eq!(state.value.as_deref(), Some("GOOD"));
        assert_eq!(
            state.error,
            Some(ResolveError::Network("down".to_owned()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn resubmit_during_flight_lets_old_completion_land_until_superseded() {
        // A new submit only restarts the debounce window; the in-flight
        // request stays current until the next dispatch.
        let resolve = scripted(&[
            ("first", vec![ok(100, "FIRST")]),
            ("second", vec![ok(100, "SECOND")]),
        ]);
        let resolver =
            AsyncResolver::spawn(config(300, None, ErrorValuePolicy::Clear), resolve);

        resolver.submit("first".to_owned()).await.unwrap();
        // Dispatch at ~300ms, completion at ~400ms.
        sleep(Duration::from_millis(350)).await;
        resolver.submit("second".to_owned()).await.unwrap();

        // "first" completes inside "second"'s debounce window and is
        // still the highest-issued request, so it is applied.
        sleep(Duration::from_millis(100)).await;
        assert_eq!(resolver.state().value.as_deref(), Some("FIRST"));

        // "second" dispatches and wins in the end.
        sleep(Duration::from_millis(500)).await;
        assert_eq!(resolver.state().value.as_deref(), Some("SECOND"));
    }
}
