//! Poll engine: fixed-cadence synchronization against a remote state source.
//!
//! Each cycle mints a token, schedules the *next* cycle before awaiting the
//! fetch, and applies the result only if its token is still the live one.
//! Scheduling before the await keeps the cadence decoupled from network
//! latency: slow responses overlap with newer cycles and simply lose the
//! token race instead of queueing behind each other.

use std::sync::{Arc, Mutex};

use contracts::{AvatarState, ClientError, StateSource};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, instrument, trace, warn};

use crate::observable::{ListenerId, ObservableState};
use crate::smoothing::smooth;

const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);

/// Outcome of one completed fetch
enum CycleOutcome {
    /// Result applied to the container and fanned out
    Applied(AvatarState),
    /// Token superseded while the fetch was in flight; result dropped
    Stale,
}

/// Snapshot of the engine's health metrics
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineStats {
    /// True iff a pending cycle timer exists
    pub is_running: bool,
    /// Effective poll rate, `1000 / avg_interval_ms`, `0.0` before the
    /// interval estimate is seeded
    pub average_request_per_second: f64,
    /// Smoothed round-trip time of completed fetches, `None` before the
    /// first completed fetch
    pub average_network_delay_ms: Option<f64>,
    /// Fetches that failed at the transport, cumulative over restarts
    pub failed_polls: u64,
    /// Completed fetches dropped by the staleness gate, cumulative
    pub stale_drops: u64,
}

struct EngineInner {
    /// Delay applied to future scheduling decisions
    interval: Duration,
    /// Token minting counter, strictly increasing
    next_token: u64,
    /// Token currently allowed to apply results
    live_token: u64,
    /// Pending cycle timer; `Some` iff the loop is running
    pending: Option<JoinHandle<()>>,
    /// Completion instant of the last *applied* update
    last_applied_at: Option<Instant>,
    /// Smoothed gap between applied updates (ms)
    avg_interval_ms: Option<f64>,
    /// Smoothed fetch round-trip time (ms)
    avg_network_delay_ms: Option<f64>,
    /// Failed fetches, never reset
    failed_polls: u64,
    /// Stale results dropped, never reset
    stale_drops: u64,
}

impl EngineInner {
    fn mint_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }
}

struct Shared<S> {
    source: S,
    state: ObservableState<AvatarState>,
    inner: Mutex<EngineInner>,
}

/// Periodic synchronization engine
///
/// Bound to one [`StateSource`] for its whole life. Cheap to clone; all
/// clones drive the same engine.
pub struct PollEngine<S> {
    shared: Arc<Shared<S>>,
}

impl<S> Clone for PollEngine<S> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S> std::fmt::Debug for PollEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.shared.inner.lock().unwrap();
        f.debug_struct("PollEngine")
            .field("interval", &inner.interval)
            .field("live_token", &inner.live_token)
            .field("running", &inner.pending.is_some())
            .finish()
    }
}

impl<S: StateSource + 'static> PollEngine<S> {
    /// Create an engine with the default 500ms cadence
    pub fn new(source: S) -> Self {
        Self {
            shared: Arc::new(Shared {
                source,
                state: ObservableState::new(),
                inner: Mutex::new(EngineInner {
                    interval: DEFAULT_INTERVAL,
                    next_token: 0,
                    live_token: 0,
                    pending: None,
                    last_applied_at: None,
                    avg_interval_ms: None,
                    avg_network_delay_ms: None,
                    failed_polls: 0,
                    stale_drops: 0,
                }),
            }),
        }
    }

    /// Create an engine with an explicit cadence
    pub fn with_interval(source: S, interval: Duration) -> Result<Self, ClientError> {
        let engine = Self::new(source);
        engine.set_interval(interval)?;
        Ok(engine)
    }

    /// Set the delay used for all future scheduling decisions.
    ///
    /// Does not reschedule an already-pending cycle. Fails fast on a
    /// non-positive interval.
    pub fn set_interval(&self, interval: Duration) -> Result<(), ClientError> {
        if interval.is_zero() {
            return Err(ClientError::InvalidInterval { ms: 0 });
        }
        self.shared.inner.lock().unwrap().interval = interval;
        Ok(())
    }

    /// Begin continuous polling.
    ///
    /// Clears the last-applied timestamp and the delay estimate (the interval
    /// estimate survives restarts), then kicks the first cycle. Calling
    /// `start` while running supersedes the previous live token, so anything
    /// still in flight under it is dropped on arrival.
    #[instrument(name = "poll_engine_start", skip(self))]
    pub fn start(&self) {
        {
            let mut inner = self.shared.inner.lock().unwrap();
            inner.last_applied_at = None;
            inner.avg_network_delay_ms = None;
        }
        debug!("poll loop starting");
        self.kick_cycle(None);
    }

    /// Stop polling.
    ///
    /// Invalidates the live token (in-flight results are dropped on arrival,
    /// the fetch itself is not aborted at the transport level) and cancels the
    /// pending timer. Safe to call when not running; the engine may be
    /// restarted afterwards.
    #[instrument(name = "poll_engine_stop", skip(self))]
    pub fn stop(&self) {
        let mut inner = self.shared.inner.lock().unwrap();
        inner.live_token = inner.mint_token();
        if let Some(timer) = inner.pending.take() {
            timer.abort();
            debug!("pending cycle cancelled");
        }
    }

    /// Force one state update outside the loop.
    ///
    /// Applies the fetched state unconditionally (no token gate: there is no
    /// newer cycle a manual update could race against) and returns it. Errors
    /// propagate to the caller.
    #[instrument(name = "poll_engine_update", skip(self))]
    pub async fn update(&self) -> Result<AvatarState, ClientError> {
        match self.fetch_and_apply(None).await? {
            CycleOutcome::Applied(state) => Ok(state),
            // Unreachable without a token, but keep the error path honest
            CycleOutcome::Stale => Err(ClientError::Other(
                "manual update unexpectedly superseded".into(),
            )),
        }
    }

    /// True iff a pending cycle timer exists
    pub fn is_running(&self) -> bool {
        self.shared.inner.lock().unwrap().pending.is_some()
    }

    /// Effective poll rate in requests per second, `0.0` before the interval
    /// estimate is seeded
    pub fn average_request_per_second(&self) -> f64 {
        match self.shared.inner.lock().unwrap().avg_interval_ms {
            Some(interval_ms) => 1000.0 / interval_ms,
            None => 0.0,
        }
    }

    /// Smoothed network round-trip time in milliseconds, `None` before the
    /// first completed fetch
    pub fn average_network_delay(&self) -> Option<f64> {
        self.shared.inner.lock().unwrap().avg_network_delay_ms
    }

    /// Snapshot of all health metrics in one lock acquisition
    pub fn stats(&self) -> EngineStats {
        let inner = self.shared.inner.lock().unwrap();
        EngineStats {
            is_running: inner.pending.is_some(),
            average_request_per_second: inner
                .avg_interval_ms
                .map_or(0.0, |interval_ms| 1000.0 / interval_ms),
            average_network_delay_ms: inner.avg_network_delay_ms,
            failed_polls: inner.failed_polls,
            stale_drops: inner.stale_drops,
        }
    }

    // ===== Container surface =====

    /// Last applied state, `None` if nothing accepted yet
    pub fn get_state(&self) -> Option<AvatarState> {
        self.shared.state.get()
    }

    /// Subscribe to accepted state transitions
    pub fn add_listener(
        &self,
        listener: impl Fn(&AvatarState) + Send + Sync + 'static,
    ) -> ListenerId {
        self.shared.state.add_listener(listener)
    }

    /// Unsubscribe; removing an absent handle is a no-op
    pub fn remove_listener(&self, id: ListenerId) {
        self.shared.state.remove_listener(id)
    }

    // ===== Loop internals =====

    /// Run one looping cycle: schedule the successor, then fetch.
    ///
    /// A failed fetch is logged and dropped; the successor cycle was already
    /// scheduled before the await, so the loop cadence survives per-cycle
    /// failures.
    fn kick_cycle(&self, expected: Option<u64>) {
        let Some(token) = self.begin_cycle(expected) else {
            return;
        };
        let engine = self.clone();
        tokio::spawn(async move {
            match engine.fetch_and_apply(Some(token)).await {
                Ok(CycleOutcome::Applied(state)) => {
                    trace!(
                        x = state.position.x,
                        y = state.position.y,
                        direction = state.direction,
                        "state applied"
                    );
                }
                Ok(CycleOutcome::Stale) => {}
                Err(error) => {
                    warn!(%error, "poll cycle failed; next cycle already scheduled");
                }
            }
        });
    }

    /// Mint a new live token and schedule the next cycle after the configured
    /// interval, cancelling the previously pending timer.
    ///
    /// `expected` is the token of the cycle that scheduled this one. A timer
    /// whose sleep already completed cannot be cancelled by `abort`, so the
    /// continuation re-checks under the lock: if the live token moved on
    /// (`stop` or a newer `start`), the cycle is abandoned instead of
    /// re-minting and resurrecting the loop.
    fn begin_cycle(&self, expected: Option<u64>) -> Option<u64> {
        let mut inner = self.shared.inner.lock().unwrap();
        if let Some(expected) = expected {
            if inner.live_token != expected {
                trace!(expected, live = inner.live_token, "superseded timer abandoned");
                return None;
            }
        }
        let token = inner.mint_token();
        inner.live_token = token;

        let delay = inner.interval;
        let engine = self.clone();
        let timer = tokio::spawn(async move {
            sleep(delay).await;
            engine.kick_cycle(Some(token));
        });
        if let Some(superseded) = inner.pending.replace(timer) {
            superseded.abort();
        }
        Some(token)
    }

    /// Fetch once and feed the result through the staleness gate.
    ///
    /// Delay smoothing applies to every *completed* fetch, stale or not: the
    /// delay measures the transport, while staleness only gates applied state.
    async fn fetch_and_apply(&self, token: Option<u64>) -> Result<CycleOutcome, ClientError> {
        let sent_at = Instant::now();
        let fetched = self.shared.source.fetch_state().await;
        let delay_ms = sent_at.elapsed().as_secs_f64() * 1000.0;

        let state = match fetched {
            Ok(state) => state,
            Err(error) => {
                self.shared.inner.lock().unwrap().failed_polls += 1;
                metrics::counter!("maze_walker_polls_total", "status" => "error").increment(1);
                return Err(error);
            }
        };
        metrics::counter!("maze_walker_polls_total", "status" => "ok").increment(1);

        {
            let mut inner = self.shared.inner.lock().unwrap();
            inner.avg_network_delay_ms = Some(smooth(inner.avg_network_delay_ms, delay_ms));
            metrics::histogram!("maze_walker_network_delay_ms").record(delay_ms);

            if let Some(token) = token {
                if inner.live_token != token {
                    trace!(token, live = inner.live_token, "stale poll result dropped");
                    inner.stale_drops += 1;
                    metrics::counter!("maze_walker_stale_results_total").increment(1);
                    return Ok(CycleOutcome::Stale);
                }
            }

            let applied_at = Instant::now();
            if let Some(last) = inner.last_applied_at {
                let gap_ms = applied_at.duration_since(last).as_secs_f64() * 1000.0;
                inner.avg_interval_ms = Some(smooth(inner.avg_interval_ms, gap_ms));
                metrics::histogram!("maze_walker_update_interval_ms").record(gap_ms);
            }
            inner.last_applied_at = Some(applied_at);
        }

        // Fan-out runs outside the engine lock so listeners may read
        // engine metrics without deadlocking.
        self.shared.state.set(state);
        metrics::counter!("maze_walker_states_applied_total").increment(1);
        Ok(CycleOutcome::Applied(state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted source: each call pops `(state, latency_ms)`, repeating the
    /// last entry once exhausted. Calls listed in `fail_calls` (1-based)
    /// reject after their latency elapses.
    struct ScriptSource {
        script: Mutex<VecDeque<(AvatarState, u64)>>,
        last: Mutex<(AvatarState, u64)>,
        calls: AtomicUsize,
        fail_calls: Vec<usize>,
    }

    impl ScriptSource {
        fn new(entries: Vec<(AvatarState, u64)>) -> Self {
            let last = *entries.last().expect("script must not be empty");
            Self {
                script: Mutex::new(entries.into_iter().collect()),
                last: Mutex::new(last),
                calls: AtomicUsize::new(0),
                fail_calls: Vec::new(),
            }
        }

        fn failing_on(mut self, calls: Vec<usize>) -> Self {
            self.fail_calls = calls;
            self
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl StateSource for ScriptSource {
        async fn fetch_state(&self) -> Result<AvatarState, ClientError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            let (state, latency_ms) = {
                let mut script = self.script.lock().unwrap();
                match script.pop_front() {
                    Some(entry) => {
                        *self.last.lock().unwrap() = entry;
                        entry
                    }
                    None => *self.last.lock().unwrap(),
                }
            };
            sleep(Duration::from_millis(latency_ms)).await;
            if self.fail_calls.contains(&call) {
                return Err(ClientError::transport("scripted failure"));
            }
            Ok(state)
        }
    }

    fn at(x: f64) -> AvatarState {
        AvatarState::new(x, 0.0, 0.0)
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_update_applies_and_returns_state() {
        let engine = PollEngine::new(ScriptSource::new(vec![(at(1.0), 10)]));

        let state = engine.update().await.unwrap();
        assert_eq!(state, at(1.0));
        assert_eq!(engine.get_state(), Some(at(1.0)));
        // Manual update never schedules a timer
        assert!(!engine.is_running());
        // ... but the completed fetch still seeds the delay estimate
        assert_eq!(engine.average_network_delay(), Some(10.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_update_propagates_transport_error() {
        let source = ScriptSource::new(vec![(at(1.0), 5)]).failing_on(vec![1]);
        let engine = PollEngine::new(source);

        let result = engine.update().await;
        assert!(matches!(result, Err(ClientError::Transport { .. })));
        assert_eq!(engine.get_state(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_cycles_never_regress() {
        // interval 100ms; latencies 10 / 250 / 5. The 250ms response lands
        // after two newer cycles were minted and must lose the token race.
        let source = ScriptSource::new(vec![(at(1.0), 10), (at(2.0), 250), (at(3.0), 5)]);
        let engine =
            PollEngine::with_interval(source, Duration::from_millis(100)).unwrap();

        let applied = Arc::new(Mutex::new(Vec::new()));
        let applied_clone = Arc::clone(&applied);
        engine.add_listener(move |state: &AvatarState| {
            applied_clone.lock().unwrap().push(state.position.x);
        });

        engine.start();
        assert!(engine.is_running());
        sleep(Duration::from_millis(400)).await;
        engine.stop();
        sleep(Duration::from_millis(300)).await;

        let seen = applied.lock().unwrap().clone();
        assert_eq!(seen.first(), Some(&1.0));
        // The slow 2.0 response must never be applied after 3.0
        if let Some(first_three) = seen.iter().position(|&x| x == 3.0) {
            assert!(seen[first_three..].iter().all(|&x| x == 3.0));
        } else {
            panic!("expected 3.0 to be applied, saw {seen:?}");
        }
        assert_eq!(engine.get_state(), Some(at(3.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_applied_gap_seeds_interval_estimate() {
        let source = ScriptSource::new(vec![(at(1.0), 0)]);
        let engine =
            PollEngine::with_interval(source, Duration::from_millis(100)).unwrap();

        engine.start();
        // Cycles apply at t=0, 100, 200: seed gap is exactly 100ms, and the
        // smoothed estimate stays there under a constant cadence.
        sleep(Duration::from_millis(250)).await;
        engine.stop();

        let rate = engine.average_request_per_second();
        assert!((rate - 10.0).abs() < 1e-6, "expected 10 rps, got {rate}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_result_updates_delay_but_not_interval() {
        // Call 1 takes 300ms and is superseded by stop(); call 2 is fast and
        // is the only applied update.
        let source = ScriptSource::new(vec![(at(1.0), 300), (at(2.0), 5)]);
        let engine =
            PollEngine::with_interval(source, Duration::from_millis(100)).unwrap();

        engine.start();
        sleep(Duration::from_millis(150)).await;
        engine.stop();
        // Let the 300ms fetch complete after the stop
        sleep(Duration::from_millis(250)).await;

        // Applied: only call 2 (at t=105). Interval estimate never seeded.
        assert_eq!(engine.get_state(), Some(at(2.0)));
        assert_eq!(engine.average_request_per_second(), 0.0);

        // Delay smoothed over BOTH completed fetches: 5 then the stale 300.
        // 5 + 0.8 * (300 - 5) = 241
        let delay = engine.average_network_delay().unwrap();
        assert!((delay - 241.0).abs() < 1e-6, "expected 241, got {delay}");
        assert_eq!(engine.stats().stale_drops, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_loop_survives_failed_cycle() {
        let source =
            ScriptSource::new(vec![(at(1.0), 5), (at(2.0), 5), (at(3.0), 5)]).failing_on(vec![2]);
        let engine =
            PollEngine::with_interval(source, Duration::from_millis(100)).unwrap();

        engine.start();
        sleep(Duration::from_millis(350)).await;
        engine.stop();

        // Cycle 2 failed but cycles 3+ still ran
        assert_eq!(engine.get_state(), Some(at(3.0)));
        assert!(engine.shared.source.call_count() >= 3);
        assert_eq!(engine.stats().failed_polls, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent_when_not_running() {
        let engine = PollEngine::new(ScriptSource::new(vec![(at(1.0), 5)]));
        assert!(!engine.is_running());
        engine.stop();
        engine.stop();
        assert!(!engine.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_timer_cannot_restart_loop() {
        // A timer whose sleep already completed escapes `abort`; its
        // continuation may reach the engine only after a stop. The token
        // check must abandon it instead of re-minting a live cycle.
        let source = ScriptSource::new(vec![(at(1.0), 5)]);
        let engine =
            PollEngine::with_interval(source, Duration::from_millis(100)).unwrap();

        engine.start();
        let pre_stop_token = engine.shared.inner.lock().unwrap().live_token;
        engine.stop();
        assert!(!engine.is_running());

        // The late continuation arrives with its pre-stop token
        engine.kick_cycle(Some(pre_stop_token));
        assert!(!engine.is_running());

        sleep(Duration::from_millis(300)).await;
        assert!(!engine.is_running());
        assert_eq!(engine.get_state(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_resets_delay_history_but_keeps_interval_estimate() {
        let source = ScriptSource::new(vec![(at(1.0), 5)]);
        let engine =
            PollEngine::with_interval(source, Duration::from_millis(100)).unwrap();

        engine.start();
        sleep(Duration::from_millis(250)).await;
        engine.stop();

        let rate_before = engine.average_request_per_second();
        assert!(rate_before > 0.0);
        assert!(engine.average_network_delay().is_some());

        engine.start();
        // History cleared synchronously; the interval estimate survives
        assert!(engine.is_running());
        assert_eq!(engine.average_request_per_second(), rate_before);
        assert_eq!(engine.average_network_delay(), None);
        engine.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_supersedes_in_flight_fetch() {
        // The 400ms response from the first run must not clobber states
        // applied by the second run.
        let source = ScriptSource::new(vec![(at(1.0), 400), (at(2.0), 5)]);
        let engine =
            PollEngine::with_interval(source, Duration::from_millis(1_000)).unwrap();

        engine.start();
        sleep(Duration::from_millis(50)).await;
        engine.start();
        sleep(Duration::from_millis(500)).await;
        engine.stop();

        assert_eq!(engine.get_state(), Some(at(2.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_listeners_survive_restart() {
        let source = ScriptSource::new(vec![(at(1.0), 0)]);
        let engine =
            PollEngine::with_interval(source, Duration::from_millis(100)).unwrap();

        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = Arc::clone(&hits);
        engine.add_listener(move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        engine.start();
        sleep(Duration::from_millis(50)).await;
        engine.stop();
        let after_first_run = hits.load(Ordering::SeqCst);
        assert!(after_first_run >= 1);

        engine.start();
        sleep(Duration::from_millis(50)).await;
        engine.stop();
        assert!(hits.load(Ordering::SeqCst) > after_first_run);
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_interval_rejects_zero() {
        let engine = PollEngine::new(ScriptSource::new(vec![(at(1.0), 5)]));
        let result = engine.set_interval(Duration::ZERO);
        assert!(matches!(result, Err(ClientError::InvalidInterval { ms: 0 })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_interval_applies_to_future_cycles() {
        let source = ScriptSource::new(vec![(at(1.0), 0)]);
        let engine =
            PollEngine::with_interval(source, Duration::from_millis(100)).unwrap();

        engine.start();
        sleep(Duration::from_millis(10)).await;
        // The pending cycle keeps its 100ms delay; later cycles use 200ms
        engine.set_interval(Duration::from_millis(200)).unwrap();
        sleep(Duration::from_millis(500)).await;
        engine.stop();

        // t=0 and t=100 at the old cadence, then t=300 and t=500:
        // four calls within the window, not six.
        assert_eq!(engine.shared.source.call_count(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_snapshot_matches_accessors() {
        let source = ScriptSource::new(vec![(at(1.0), 20)]);
        let engine =
            PollEngine::with_interval(source, Duration::from_millis(100)).unwrap();

        engine.start();
        sleep(Duration::from_millis(250)).await;

        let stats = engine.stats();
        assert!(stats.is_running);
        assert_eq!(
            stats.average_request_per_second,
            engine.average_request_per_second()
        );
        assert_eq!(
            stats.average_network_delay_ms,
            engine.average_network_delay()
        );
        engine.stop();
        assert!(!engine.stats().is_running);
    }
}
