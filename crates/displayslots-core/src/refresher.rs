//! Periodic background refresh of the application window
//!
//! A [`ViewRefresher`] owns one dedicated thread that wakes every
//! [`RefreshInterval`] and asks the UI thread for a `FrameUpdater` pass. The
//! UI-side mutators (combo-box population, slot count changes, ...) therefore
//! never have to remember to request a repaint themselves.
//!
//! ## State machine
//!
//! ```text
//!            suspend()            stop()
//! Running ─────────────▶ Suspended ──────▶ Stopped
//!    ▲                      │                 ▲
//!    └──────── resume() ────┘                 │
//!    └──────────────────── stop() ────────────┘
//! ```
//!
//! The state lives behind a mutex paired with a condition variable. The
//! worker re-checks the state after every wakeup, so a `resume()` or `stop()`
//! issued at any time is never lost, and a thread parked in `Suspended` is
//! always woken by `stop()`.

use crate::dispatch::RefreshSink;
use std::num::NonZeroU64;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;
use thiserror::Error;

/// Name of the background thread
const THREAD_NAME: &str = "view-refresher";

const DEFAULT_INTERVAL: NonZeroU64 = match NonZeroU64::new(crate::DEFAULT_REFRESH_INTERVAL_MS) {
    Some(ms) => ms,
    None => panic!("default refresh interval must be non-zero"),
};

/// Errors that can occur when driving a view refresher
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefresherError {
    #[error("Refresh interval must be at least 1 ms")]
    ZeroInterval,

    #[error("View refresher already started")]
    AlreadyStarted,

    #[error("View refresher has been stopped")]
    Stopped,

    #[error("Failed to spawn refresher thread: {0}")]
    SpawnFailed(String),
}

/// Milliseconds between refresh attempts, fixed at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshInterval(NonZeroU64);

impl RefreshInterval {
    /// Create an interval, rejecting zero
    pub fn from_millis(ms: u64) -> Result<Self, RefresherError> {
        NonZeroU64::new(ms)
            .map(Self)
            .ok_or(RefresherError::ZeroInterval)
    }

    pub fn as_millis(&self) -> u64 {
        self.0.get()
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(self.0.get())
    }
}

impl Default for RefreshInterval {
    fn default() -> Self {
        Self(DEFAULT_INTERVAL)
    }
}

/// Lifecycle state of a view refresher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefresherState {
    /// Refresh requests are issued every interval
    Running,
    /// Worker is parked until resumed or stopped
    Suspended,
    /// Terminal; the worker has exited or is about to
    Stopped,
}

/// State shared with the worker thread
struct Shared {
    state: Mutex<RefresherState>,
    changed: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, RefresherState> {
        // The state is a plain enum, a panic elsewhere cannot leave it torn
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Background scheduler that keeps the window layout current
pub struct ViewRefresher {
    interval: RefreshInterval,
    shared: Arc<Shared>,
    /// Present until `start()` hands it to the worker
    sink: Option<Box<dyn RefreshSink>>,
    worker: Option<JoinHandle<()>>,
    started: bool,
}

impl ViewRefresher {
    /// Create a refresher in the `Running` state; no thread exists until
    /// [`start`](Self::start)
    pub fn new(interval: RefreshInterval, sink: impl RefreshSink) -> Self {
        Self {
            interval,
            shared: Arc::new(Shared {
                state: Mutex::new(RefresherState::Running),
                changed: Condvar::new(),
            }),
            sink: Some(Box::new(sink)),
            worker: None,
            started: false,
        }
    }

    pub fn interval(&self) -> RefreshInterval {
        self.interval
    }

    /// Current state
    pub fn state(&self) -> RefresherState {
        *self.shared.lock()
    }

    /// Whether `start()` has already spawned the worker
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the worker thread has exited
    ///
    /// `false` before `start()`.
    pub fn is_finished(&self) -> bool {
        self.started && self.worker.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Spawn the background loop
    ///
    /// May succeed once. A second call is rejected with
    /// [`RefresherError::AlreadyStarted`] so two workers can never exist.
    pub fn start(&mut self) -> Result<(), RefresherError> {
        if self.state() == RefresherState::Stopped {
            tracing::warn!("Refusing to start a stopped view refresher");
            return Err(RefresherError::Stopped);
        }
        if self.started {
            tracing::warn!("View refresher started twice");
            return Err(RefresherError::AlreadyStarted);
        }
        let Some(sink) = self.sink.take() else {
            return Err(RefresherError::AlreadyStarted);
        };
        self.started = true;

        let shared = Arc::clone(&self.shared);
        let interval = self.interval.as_duration();
        let worker = std::thread::Builder::new()
            .name(THREAD_NAME.to_string())
            .spawn(move || run_loop(&shared, interval, sink))
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to spawn view refresher thread");
                RefresherError::SpawnFailed(e.to_string())
            })?;
        self.worker = Some(worker);

        tracing::info!(
            interval_ms = self.interval.as_millis(),
            "View refresher started"
        );
        Ok(())
    }

    /// Pause refresh requests; idempotent
    pub fn suspend(&self) {
        let mut state = self.shared.lock();
        match *state {
            RefresherState::Running => {
                *state = RefresherState::Suspended;
                tracing::info!("View refresher suspended");
            }
            RefresherState::Suspended => {}
            RefresherState::Stopped => {
                tracing::debug!("Ignoring suspend of stopped view refresher");
            }
        }
    }

    /// Continue refresh requests and wake the parked worker; idempotent
    pub fn resume(&self) {
        let mut state = self.shared.lock();
        match *state {
            RefresherState::Suspended => {
                *state = RefresherState::Running;
                self.shared.changed.notify_all();
                tracing::info!("View refresher resumed");
            }
            RefresherState::Running => {}
            RefresherState::Stopped => {
                tracing::debug!("Ignoring resume of stopped view refresher");
            }
        }
    }

    /// Stop permanently and wait for the worker to exit
    ///
    /// Wakes the worker whether it is sleeping or parked in `Suspended`.
    /// Idempotent.
    pub fn stop(&mut self) {
        {
            let mut state = self.shared.lock();
            if *state != RefresherState::Stopped {
                *state = RefresherState::Stopped;
                tracing::info!("Stopping view refresher");
            }
            self.shared.changed.notify_all();
        }

        self.sink = None;
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("View refresher thread panicked");
            }
        }
    }
}

impl Drop for ViewRefresher {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for ViewRefresher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewRefresher")
            .field("interval", &self.interval)
            .field("state", &self.state())
            .field("started", &self.is_started())
            .finish()
    }
}

/// Worker body: sleep, wait out suspension, request a refresh, repeat
fn run_loop(shared: &Shared, interval: Duration, sink: Box<dyn RefreshSink>) {
    tracing::debug!("View refresher thread running");
    let mut requests: u64 = 0;

    loop {
        let state = shared.lock();

        // Timed sleep; only a stop cuts it short. Spurious wakeups and
        // resume notifications re-check and keep sleeping the remainder.
        let (state, _) = shared
            .changed
            .wait_timeout_while(state, interval, |s| *s != RefresherState::Stopped)
            .unwrap_or_else(PoisonError::into_inner);

        let state = shared
            .changed
            .wait_while(state, |s| *s == RefresherState::Suspended)
            .unwrap_or_else(PoisonError::into_inner);

        if *state == RefresherState::Stopped {
            break;
        }
        drop(state);

        if !sink.request_refresh() {
            tracing::warn!("UI side gone, stopping view refresher");
            *shared.lock() = RefresherState::Stopped;
            shared.changed.notify_all();
            break;
        }
        requests += 1;
        tracing::trace!(requests, "Refresh requested");
    }

    tracing::info!(requests, "View refresher thread exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::CountingSink;
    use std::time::Instant;

    fn refresher(ms: u64) -> (ViewRefresher, CountingSink) {
        let sink = CountingSink::new();
        let interval = RefreshInterval::from_millis(ms).unwrap();
        (ViewRefresher::new(interval, sink.clone()), sink)
    }

    #[test]
    fn test_interval_rejects_zero() {
        assert_eq!(
            RefreshInterval::from_millis(0),
            Err(RefresherError::ZeroInterval)
        );
        let interval = RefreshInterval::from_millis(250).unwrap();
        assert_eq!(interval.as_millis(), 250);
        assert_eq!(interval.as_duration(), Duration::from_millis(250));
        assert_eq!(RefreshInterval::default().as_millis(), 1000);
    }

    #[test]
    fn test_initial_state() {
        let (refresher, _sink) = refresher(50);
        assert_eq!(refresher.state(), RefresherState::Running);
        assert!(!refresher.is_started());
        assert!(!refresher.is_finished());
    }

    #[test]
    fn test_start_twice_rejected() {
        let (mut refresher, _sink) = refresher(50);
        refresher.start().unwrap();
        assert!(refresher.is_started());
        assert_eq!(refresher.start(), Err(RefresherError::AlreadyStarted));
        refresher.stop();
    }

    #[test]
    fn test_start_after_stop_rejected() {
        let (mut refresher, _sink) = refresher(50);
        refresher.stop();
        assert_eq!(refresher.start(), Err(RefresherError::Stopped));
    }

    #[test]
    fn test_suspend_idempotent() {
        let (refresher, _sink) = refresher(50);
        refresher.suspend();
        assert_eq!(refresher.state(), RefresherState::Suspended);
        refresher.suspend();
        assert_eq!(refresher.state(), RefresherState::Suspended);
    }

    #[test]
    fn test_resume_idempotent() {
        let (refresher, _sink) = refresher(50);
        refresher.resume();
        assert_eq!(refresher.state(), RefresherState::Running);
        refresher.suspend();
        refresher.resume();
        refresher.resume();
        assert_eq!(refresher.state(), RefresherState::Running);
    }

    #[test]
    fn test_stopped_is_terminal() {
        let (mut refresher, _sink) = refresher(50);
        refresher.stop();
        refresher.resume();
        assert_eq!(refresher.state(), RefresherState::Stopped);
        refresher.suspend();
        assert_eq!(refresher.state(), RefresherState::Stopped);
        refresher.stop();
        assert_eq!(refresher.state(), RefresherState::Stopped);
    }

    #[test]
    fn test_stop_while_suspended_joins_worker() {
        let (mut refresher, sink) = refresher(20);
        refresher.start().unwrap();
        refresher.suspend();
        std::thread::sleep(Duration::from_millis(60));

        let started = Instant::now();
        refresher.stop();
        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(refresher.worker.is_none());
        assert!(refresher.is_finished());

        let after_stop = sink.count();
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(sink.count(), after_stop);
    }

    #[test]
    fn test_requests_issued_while_running() {
        let (mut refresher, sink) = refresher(10);
        refresher.start().unwrap();
        std::thread::sleep(Duration::from_millis(200));
        refresher.stop();
        assert!(sink.count() >= 3, "got {} requests", sink.count());
    }

    #[test]
    fn test_disconnected_sink_stops_refresher() {
        let (mut refresher, sink) = refresher(10);
        sink.disconnect();
        refresher.start().unwrap();

        let deadline = Instant::now() + Duration::from_secs(2);
        while !refresher.is_finished() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(refresher.is_finished());
        assert_eq!(refresher.state(), RefresherState::Stopped);
        assert_eq!(refresher.start(), Err(RefresherError::Stopped));
    }

    #[test]
    fn test_drop_stops_worker() {
        let (mut refresher, sink) = refresher(10);
        refresher.start().unwrap();
        drop(refresher);

        let after_drop = sink.count();
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(sink.count(), after_drop);
    }
}
