//! # Poller: supervised polling of one long-running job.
//!
//! Drives a [`StatusProbe`] on a fixed cadence until the job completes, the
//! tick budget runs out, a check fails permanently, or the caller stops the
//! session.
//!
//! ## Flow
//! ```text
//! start() ──► spawn loop (epoch n, session token)
//!
//! loop {
//!   ├─► sleep(interval)            (cancellable)
//!   ├─► publish TickStarting
//!   ├─► check(child token)         (fresh token per tick, cancellable)
//!   │       │
//!   │       ├─ done          ──► break Completed(status)
//!   │       ├─ pending       ──► record tick; budget spent? break Exhausted
//!   │       │                     else publish TickScheduled, continue
//!   │       ├─ Err(Canceled) ──► stop in progress? break Stopped
//!   │       │                     else swallow, continue (not counted)
//!   │       └─ Err(other)    ──► break Errored(err)
//! }
//!
//! finish(epoch, terminal state) ── committed? ──► publish terminal event
//!                                └─ stale?    ──► discard (no side effect)
//! resolve PollHandle
//! ```
//!
//! ## Rules
//! - One pending timer and at most one in-flight check per session; ticks are
//!   strictly sequential.
//! - Each tick gets a **fresh child token**, so aborting one tick can never
//!   cancel the next tick's unrelated call.
//! - `stop()` transitions to `Stopped` immediately and aborts the in-flight
//!   check; a check that completes anyway is discarded by the epoch guard.
//! - Dropping the poller behaves exactly like `stop()` — no tick fires after
//!   disposal.

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::{AlreadyPolling, CallError, PollError};
use crate::events::{Bus, Event, EventKind};
use crate::poller::config::PollerConfig;
use crate::poller::session::{PollSession, PollState, SessionCell};
use crate::poller::status::{JobStatus, StatusProbe};
use crate::retry::retry_with_backoff;

/// Supervises polling of a single job.
///
/// Create one per job with [`Poller::new`] (own event bus) or via
/// [`Poller::builder`] to share a bus across pollers. Concurrency across jobs
/// comes from independent poller instances; one instance never overlaps its
/// own ticks.
pub struct Poller<P: StatusProbe + ?Sized> {
    probe: Arc<P>,
    cfg: PollerConfig,
    bus: Bus,
    session: Arc<SessionCell>,
    current: Mutex<Option<CancellationToken>>,
}

impl<P: StatusProbe + ?Sized> Poller<P> {
    /// Creates a poller with its own event bus (capacity from the config).
    pub fn new(probe: Arc<P>, cfg: PollerConfig) -> Self {
        let bus = Bus::new(cfg.bus_capacity);
        Self::with_bus(probe, cfg, bus)
    }

    /// Creates a poller publishing onto an externally shared bus.
    pub fn with_bus(probe: Arc<P>, cfg: PollerConfig, bus: Bus) -> Self {
        Self {
            probe,
            cfg,
            bus,
            session: Arc::new(SessionCell::default()),
            current: Mutex::new(None),
        }
    }

    /// Starts building a poller around the given probe.
    pub fn builder(probe: Arc<P>) -> PollerBuilder<P> {
        PollerBuilder {
            probe,
            cfg: PollerConfig::default(),
            bus: None,
        }
    }

    /// The job this poller watches.
    pub fn job_id(&self) -> &str {
        self.probe.job_id()
    }

    /// The bus this poller publishes lifecycle events on.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Snapshot of the current session state.
    pub fn session(&self) -> PollSession {
        self.session.snapshot()
    }

    /// Starts a fresh poll session.
    ///
    /// Valid from `Idle` or any terminal state; rejected with
    /// [`AlreadyPolling`] while a session is active. The first status check
    /// runs after one `interval`.
    ///
    /// The returned [`PollHandle`] resolves exactly once with the session's
    /// outcome; dropping it does not affect the session.
    pub fn start(&self) -> Result<PollHandle<P::Output>, AlreadyPolling> {
        let epoch = self.session.begin().ok_or(AlreadyPolling)?;
        let token = CancellationToken::new();
        *self.current.lock().unwrap() = Some(token.clone());

        let (tx, rx) = oneshot::channel();
        tokio::spawn(run_loop(
            Arc::clone(&self.probe),
            self.cfg.clone(),
            self.bus.clone(),
            Arc::clone(&self.session),
            epoch,
            token,
            tx,
        ));
        Ok(PollHandle { rx })
    }

    /// Stops the active session, if any.
    ///
    /// Transitions to `Stopped` immediately, cancels the pending timer, and
    /// aborts the in-flight check via its cancellation token. Idempotent; a
    /// no-op when nothing is running.
    pub fn stop(&self) {
        let stopped = self.session.stop();
        if let Some(token) = self.current.lock().unwrap().take() {
            token.cancel();
        }
        if stopped {
            self.bus
                .publish(Event::now(EventKind::PollStopped).with_job(self.probe.job_id()));
        }
    }

    /// Clears the session (tick count, last error) and returns to `Idle`.
    ///
    /// Safe from any state; an active session is torn down first.
    pub fn reset(&self) {
        if let Some(token) = self.current.lock().unwrap().take() {
            token.cancel();
        }
        self.session.reset();
    }
}

impl<P: StatusProbe + ?Sized> Drop for Poller<P> {
    /// Teardown behaves exactly like [`Poller::stop`]: no tick fires after
    /// the poller is gone.
    fn drop(&mut self) {
        self.stop();
    }
}

/// Builder for [`Poller`] instances sharing configuration or a bus.
pub struct PollerBuilder<P: StatusProbe + ?Sized> {
    probe: Arc<P>,
    cfg: PollerConfig,
    bus: Option<Bus>,
}

impl<P: StatusProbe + ?Sized> PollerBuilder<P> {
    /// Sets the polling cadence.
    pub fn interval(mut self, interval: std::time::Duration) -> Self {
        self.cfg.interval = interval;
        self
    }

    /// Sets the tick budget.
    pub fn max_ticks(mut self, max_ticks: u32) -> Self {
        self.cfg.max_ticks = max_ticks;
        self
    }

    /// Wraps each status check in transient-failure retry.
    pub fn tick_retry(mut self, policy: crate::policies::RetryPolicy) -> Self {
        self.cfg.tick_retry = Some(policy);
        self
    }

    /// Publishes onto a shared bus instead of a private one.
    pub fn bus(mut self, bus: Bus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Builds the poller.
    pub fn build(self) -> Poller<P> {
        match self.bus {
            Some(bus) => Poller::with_bus(self.probe, self.cfg, bus),
            None => Poller::new(self.probe, self.cfg),
        }
    }
}

/// Handle to a running poll session.
///
/// Resolves exactly once with the session outcome. Dropping the handle does
/// not stop the session; use [`Poller::stop`] for that.
pub struct PollHandle<T> {
    rx: oneshot::Receiver<Result<JobStatus<T>, PollError>>,
}

impl<T> PollHandle<T> {
    /// Waits for the session to end.
    ///
    /// - `Ok(status)` — the job completed (the status may still carry a
    ///   provider-side `error`; interpreting it is the caller's business).
    /// - `Err(PollError::Exhausted)` — tick budget spent.
    /// - `Err(PollError::Stopped)` — stopped or reset by the caller.
    /// - `Err(PollError::Check)` — a status check failed permanently.
    pub async fn join(self) -> Result<JobStatus<T>, PollError> {
        self.rx.await.unwrap_or(Err(PollError::Stopped))
    }
}

/// The session loop. Runs detached; every state write is epoch-guarded.
async fn run_loop<P: StatusProbe + ?Sized>(
    probe: Arc<P>,
    cfg: PollerConfig,
    bus: Bus,
    session: Arc<SessionCell>,
    epoch: u64,
    token: CancellationToken,
    tx: oneshot::Sender<Result<JobStatus<P::Output>, PollError>>,
) {
    let job: Arc<str> = Arc::from(probe.job_id());
    let mut tick_no: u32 = 0;

    let outcome = loop {
        let sleep = time::sleep(cfg.interval);
        tokio::pin!(sleep);
        tokio::select! {
            _ = &mut sleep => {}
            _ = token.cancelled() => break Err(PollError::Stopped),
        }

        tick_no += 1;
        bus.publish(
            Event::now(EventKind::TickStarting)
                .with_job(Arc::clone(&job))
                .with_tick(tick_no),
        );

        // Fresh token per tick: aborting this check must not be able to
        // cancel the next tick's call.
        let tick_token = token.child_token();
        let check = run_tick(&*probe, &cfg, &bus, &job, tick_token.clone());
        tokio::pin!(check);
        let result = tokio::select! {
            res = &mut check => res,
            _ = token.cancelled() => {
                tick_token.cancel();
                break Err(PollError::Stopped);
            }
        };

        match result {
            Ok(status) if status.done => break Ok(status),
            Ok(status) => {
                if let Some(pct) = status.progress_percent {
                    bus.publish(
                        Event::now(EventKind::TickProgress)
                            .with_job(Arc::clone(&job))
                            .with_tick(tick_no)
                            .with_progress(pct),
                    );
                }
                match session.record_tick(epoch) {
                    // Stopped or reset between ticks.
                    None => break Err(PollError::Stopped),
                    Some(count) if count >= cfg.max_ticks => {
                        break Err(PollError::Exhausted { ticks: count });
                    }
                    Some(_) => {
                        bus.publish(
                            Event::now(EventKind::TickScheduled)
                                .with_job(Arc::clone(&job))
                                .with_tick(tick_no)
                                .with_delay(cfg.interval),
                        );
                    }
                }
            }
            Err(err) if err.is_canceled() => {
                if token.is_cancelled() {
                    break Err(PollError::Stopped);
                }
                // A cancellation that no stop asked for: absorb it without
                // counting the tick, and keep polling.
            }
            Err(err) => break Err(PollError::Check { source: err }),
        }
    };

    let (state, last_error) = match &outcome {
        Ok(_) => (PollState::Completed, None),
        Err(PollError::Stopped) => (PollState::Stopped, None),
        Err(PollError::Exhausted { .. }) => (PollState::Exhausted, None),
        Err(PollError::Check { source }) => (PollState::Errored, Some(source.clone())),
        Err(_) => (PollState::Errored, None),
    };

    // A stale epoch means the caller stopped or reset this session and may
    // have started a new one; the result of this loop is then discarded.
    let committed = session.finish(epoch, state, last_error);
    if committed {
        match state {
            PollState::Completed => bus.publish(
                Event::now(EventKind::PollCompleted)
                    .with_job(Arc::clone(&job))
                    .with_tick(tick_no),
            ),
            PollState::Exhausted => bus.publish(
                Event::now(EventKind::PollExhausted)
                    .with_job(Arc::clone(&job))
                    .with_tick(tick_no),
            ),
            PollState::Errored => {
                let reason = outcome
                    .as_ref()
                    .err()
                    .map(|e| e.to_string())
                    .unwrap_or_default();
                bus.publish(
                    Event::now(EventKind::PollFailed)
                        .with_job(Arc::clone(&job))
                        .with_tick(tick_no)
                        .with_reason(reason),
                );
            }
            // A caller-side stop publishes PollStopped itself; no other
            // state can reach here.
            _ => {}
        }
        let _ = tx.send(outcome);
    } else {
        let _ = tx.send(Err(PollError::Stopped));
    }
}

/// One status check, optionally wrapped in transient-failure retry.
async fn run_tick<P: StatusProbe + ?Sized>(
    probe: &P,
    cfg: &PollerConfig,
    bus: &Bus,
    job: &Arc<str>,
    tick_token: CancellationToken,
) -> Result<JobStatus<P::Output>, CallError> {
    match &cfg.tick_retry {
        None => probe.check(tick_token).await,
        Some(policy) => {
            // Chain the caller's hook with bus publishing so observers see
            // transient retries without the caller wiring anything.
            let caller_hook = policy.hook();
            let bus = bus.clone();
            let job = Arc::clone(job);
            let policy = policy
                .clone()
                .with_hook(move |err: &CallError, attempt, delay| {
                    if let Some(hook) = &caller_hook {
                        hook(err, attempt, delay);
                    }
                    bus.publish(
                        Event::now(EventKind::RetryScheduled)
                            .with_job(Arc::clone(&job))
                            .with_attempt(attempt)
                            .with_delay(delay)
                            .with_reason(err.to_string()),
                    );
                });
            retry_with_backoff(&policy, || probe.check(tick_token.clone())).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use crate::poller::status::ProbeFn;

    fn fast_cfg(max_ticks: u32) -> PollerConfig {
        PollerConfig {
            interval: Duration::from_millis(10),
            max_ticks,
            tick_retry: None,
            bus_capacity: 64,
        }
    }

    /// Probe that stays pending for `pending` checks, then completes.
    fn counting_probe(
        pending: u32,
    ) -> (
        Arc<ProbeFn<impl Fn(CancellationToken) -> futures::future::Ready<Result<JobStatus<u32>, CallError>> + Send + Sync, u32>>,
        Arc<AtomicU32>,
    ) {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let probe = ProbeFn::arc("job-under-test", move |_ctx: CancellationToken| {
            let n = counter.fetch_add(1, Ordering::Relaxed) + 1;
            futures::future::ready(if n > pending {
                Ok(JobStatus::completed(n))
            } else {
                Ok(JobStatus::pending(Some(n as f32 * 10.0)))
            })
        });
        (probe, calls)
    }

    #[tokio::test(start_paused = true)]
    async fn test_completes_after_k_ticks() {
        // 3 pending checks, completion on the 4th; budget is larger.
        let (probe, calls) = counting_probe(3);
        let poller = Poller::builder(probe)
            .interval(Duration::from_millis(10))
            .max_ticks(10)
            .build();

        let handle = poller.start().unwrap();
        let status = handle.join().await.unwrap();

        assert_eq!(calls.load(Ordering::Relaxed), 4);
        assert_eq!(status.result, Some(4));
        let session = poller.session();
        assert_eq!(session.state, PollState::Completed);
        assert_eq!(session.retry_count, 3);
        assert!(!session.is_polling());
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausts_after_budget() {
        // Never completes.
        let (probe, calls) = counting_probe(u32::MAX);
        let poller = Poller::new(probe, fast_cfg(5));

        let out = poller.start().unwrap().join().await;
        assert_eq!(out.unwrap_err(), PollError::Exhausted { ticks: 5 });
        assert_eq!(calls.load(Ordering::Relaxed), 5);
        assert_eq!(poller.session().state, PollState::Exhausted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_publishes_terminal_event() {
        let (probe, _calls) = counting_probe(u32::MAX);
        let poller = Poller::new(probe, fast_cfg(2));
        let mut rx = poller.bus().subscribe();

        let _ = poller.start().unwrap().join().await;

        let mut saw_exhausted = false;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::PollExhausted {
                saw_exhausted = true;
                assert_eq!(ev.job.as_deref(), Some("job-under-test"));
                assert_eq!(ev.tick, Some(2));
            }
        }
        assert!(saw_exhausted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_check_error_ends_session() {
        let probe = ProbeFn::arc("doomed", |_ctx: CancellationToken| async {
            Err::<JobStatus<()>, _>(CallError::http(422, "invalid job"))
        });
        let poller = Poller::new(probe, fast_cfg(10));

        let out = poller.start().unwrap().join().await;
        assert_eq!(
            out.unwrap_err(),
            PollError::Check {
                source: CallError::http(422, "invalid job")
            }
        );
        let session = poller.session();
        assert_eq!(session.state, PollState::Errored);
        assert_eq!(session.last_error, Some(CallError::http(422, "invalid job")));
        // The failing tick never counted toward the budget.
        assert_eq!(session.retry_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_aborts_in_flight_check_without_counting() {
        // Probe that parks on its token: only a stop can release it.
        let probe = ProbeFn::arc("stuck", |ctx: CancellationToken| async move {
            ctx.cancelled().await;
            Err::<JobStatus<()>, _>(CallError::Canceled)
        });
        let poller = Poller::new(probe, fast_cfg(10));
        let handle = poller.start().unwrap();

        // Let the first tick start, then stop mid-flight.
        tokio::time::sleep(Duration::from_millis(15)).await;
        poller.stop();

        let out = handle.join().await;
        assert_eq!(out.unwrap_err(), PollError::Stopped);
        let session = poller.session();
        assert_eq!(session.state, PollState::Stopped);
        // Cancellation is free: no retry_count bump, no recorded error.
        assert_eq!(session.retry_count, 0);
        assert!(session.last_error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_spurious_cancel_is_swallowed_and_polling_continues() {
        // First check reports Canceled on its own (no stop in progress);
        // second completes.
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let probe = ProbeFn::arc("flaky-cancel", move |_ctx: CancellationToken| {
            let n = counter.fetch_add(1, Ordering::Relaxed);
            futures::future::ready(match n {
                0 => Err(CallError::Canceled),
                _ => Ok(JobStatus::completed("out".to_string())),
            })
        });
        let poller = Poller::new(probe, fast_cfg(10));

        let status = poller.start().unwrap().join().await.unwrap();
        assert_eq!(status.result.as_deref(), Some("out"));
        // The swallowed tick was not counted.
        assert_eq!(poller.session().retry_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_while_polling_is_rejected() {
        let (probe, _calls) = counting_probe(u32::MAX);
        let poller = Poller::new(probe, fast_cfg(100));
        let _handle = poller.start().unwrap();
        assert_eq!(poller.start().err(), Some(AlreadyPolling));
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_after_terminal_state_is_a_fresh_session() {
        let (probe, calls) = counting_probe(2);
        let poller = Poller::new(probe, fast_cfg(10));

        let first = poller.start().unwrap().join().await.unwrap();
        assert_eq!(first.result, Some(3));
        assert_eq!(poller.session().retry_count, 2);

        // Second session starts clean; probe completes immediately now.
        let second = poller.start().unwrap().join().await.unwrap();
        assert_eq!(second.result, Some(4));
        let session = poller.session();
        assert_eq!(session.state, PollState::Completed);
        assert_eq!(session.retry_count, 0);
        assert_eq!(calls.load(Ordering::Relaxed), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_is_idempotent() {
        let (probe, _calls) = counting_probe(u32::MAX);
        let poller = Poller::new(probe, fast_cfg(100));
        let _handle = poller.start().unwrap();
        poller.stop();
        poller.stop();
        assert_eq!(poller.session().state, PollState::Stopped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_returns_to_idle() {
        let (probe, _calls) = counting_probe(u32::MAX);
        let poller = Poller::new(probe, fast_cfg(100));
        let handle = poller.start().unwrap();
        tokio::time::sleep(Duration::from_millis(25)).await;
        poller.reset();

        assert_eq!(handle.join().await.unwrap_err(), PollError::Stopped);
        let session = poller.session();
        assert_eq!(session.state, PollState::Idle);
        assert_eq!(session.retry_count, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_the_session() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let probe = ProbeFn::arc("dropped", move |_ctx: CancellationToken| {
            counter.fetch_add(1, Ordering::Relaxed);
            futures::future::ready(Ok(JobStatus::<()>::pending(None)))
        });
        let poller = Poller::new(probe, fast_cfg(1000));
        let handle = poller.start().unwrap();
        tokio::time::sleep(Duration::from_millis(25)).await;
        drop(poller);

        assert_eq!(handle.join().await.unwrap_err(), PollError::Stopped);
        let seen = calls.load(Ordering::Relaxed);
        // No tick fires after disposal.
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(calls.load(Ordering::Relaxed), seen);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_retry_absorbs_transient_failures() {
        use crate::policies::{BackoffPolicy, JitterPolicy, RetryPolicy};

        // Every first check per tick fails transiently; the in-tick retry
        // makes the session never see it.
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let probe = ProbeFn::arc("transient", move |_ctx: CancellationToken| {
            let n = counter.fetch_add(1, Ordering::Relaxed);
            futures::future::ready(match n {
                0 => Err(CallError::http(503, "unavailable")),
                1 => Ok(JobStatus::pending(None)),
                2 => Err(CallError::http(502, "bad gateway")),
                _ => Ok(JobStatus::completed(())),
            })
        });
        let retry = RetryPolicy::new(
            2,
            BackoffPolicy {
                first: Duration::from_millis(5),
                max: Duration::from_millis(5),
                factor: 1.0,
                jitter: JitterPolicy::None,
            },
        );
        let poller = Poller::builder(probe)
            .interval(Duration::from_millis(10))
            .max_ticks(10)
            .tick_retry(retry)
            .build();
        let mut rx = poller.bus().subscribe();

        let status = poller.start().unwrap().join().await.unwrap();
        assert!(status.done);
        assert_eq!(calls.load(Ordering::Relaxed), 4);

        // The transient retries surfaced as RetryScheduled events.
        let mut retries = 0;
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::RetryScheduled {
                retries += 1;
                assert!(ev.reason.is_some());
            }
        }
        assert_eq!(retries, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_published() {
        let (probe, _calls) = counting_probe(2);
        let poller = Poller::new(probe, fast_cfg(10));
        let mut rx = poller.bus().subscribe();

        let _ = poller.start().unwrap().join().await;

        let mut progress = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            if ev.kind == EventKind::TickProgress {
                progress.push(ev.progress.unwrap());
            }
        }
        assert_eq!(progress, vec![10.0, 20.0]);
    }
}
