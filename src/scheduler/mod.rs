//! Repeating check loop with single-flight execution.
//!
//! The loop runs one cycle immediately and then one per interval. Control
//! commands arrive over a `watch` channel and are only observed while the
//! loop waits between cycles, so a running cycle is never interrupted. A
//! cycle requested while another is in flight is dropped, not queued.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::reconcile::PrCheckResult;

/// Default minutes between cycles.
pub const DEFAULT_INTERVAL_MINUTES: u64 = 5;

/// Something that can run one check cycle.
#[async_trait]
pub trait CycleRunner: Send + Sync + 'static {
    /// Runs one cycle to completion.
    async fn run_cycle(&self) -> PrCheckResult;
}

/// Shared, adjustable interval between cycles, in whole minutes (at least
/// one).
#[derive(Debug, Clone)]
pub struct CheckInterval(Arc<AtomicU64>);

impl CheckInterval {
    /// Creates an interval of `minutes`, raised to one when zero.
    #[must_use]
    pub fn from_minutes(minutes: u64) -> Self {
        Self(Arc::new(AtomicU64::new(minutes.max(1))))
    }

    /// Current interval in minutes.
    #[must_use]
    pub fn minutes(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    /// Changes the interval; zero is raised to one.
    pub fn set_minutes(&self, minutes: u64) {
        self.0.store(minutes.max(1), Ordering::Release);
    }

    /// Current interval as a duration.
    #[must_use]
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.minutes().saturating_mul(60))
    }
}

impl Default for CheckInterval {
    fn default() -> Self {
        Self::from_minutes(DEFAULT_INTERVAL_MINUTES)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Idle,
    Stop,
    Restart,
}

/// Drives a [`CycleRunner`] on a timer.
pub struct Scheduler<R: CycleRunner> {
    runner: Arc<R>,
    interval: CheckInterval,
    in_flight: Arc<AtomicBool>,
    control: watch::Sender<Command>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<R: CycleRunner> Scheduler<R> {
    /// Creates a stopped scheduler.
    #[must_use]
    pub fn new(runner: Arc<R>, interval: CheckInterval) -> Self {
        let (control, _) = watch::channel(Command::Idle);
        Self {
            runner,
            interval,
            in_flight: Arc::new(AtomicBool::new(false)),
            control,
            task: Mutex::new(None),
        }
    }

    /// The shared interval read before every wait.
    #[must_use]
    pub const fn interval(&self) -> &CheckInterval {
        &self.interval
    }

    /// Returns true while the loop task is alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .ok()
            .is_some_and(|task| task.as_ref().is_some_and(|handle| !handle.is_finished()))
    }

    /// Starts the loop; does nothing when it is already running.
    ///
    /// Must be called inside a Tokio runtime.
    pub fn start(&self) {
        let Ok(mut task) = self.task.lock() else {
            return;
        };
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            return;
        }

        let runner = Arc::clone(&self.runner);
        let in_flight = Arc::clone(&self.in_flight);
        let interval = self.interval.clone();
        let control = self.control.subscribe();
        info!(minutes = interval.minutes(), "starting review checks");
        *task = Some(tokio::spawn(run_loop(runner, in_flight, interval, control)));
    }

    /// Runs one cycle now unless one is already running, in which case it
    /// returns `None` immediately.
    pub async fn check_now(&self) -> Option<PrCheckResult> {
        run_single_flight(self.runner.as_ref(), &self.in_flight).await
    }

    /// Ends the loop and waits for it to finish; an in-flight cycle completes
    /// first.
    pub async fn stop(&self) {
        self.control.send_replace(Command::Stop);
        let handle = self.task.lock().ok().and_then(|mut task| task.take());
        if let Some(handle) = handle {
            if let Err(error) = handle.await {
                debug!(%error, "scheduler task ended abnormally");
            }
        }
        info!("stopped review checks");
    }

    /// Cancels the current wait and begins a new cycle immediately, starting
    /// the loop when it is not running.
    pub fn restart(&self) {
        if self.is_running() {
            self.control.send_replace(Command::Restart);
        } else {
            self.start();
        }
    }

    /// Changes the interval; the new value applies from the next wait.
    pub fn set_interval(&self, minutes: u64) {
        self.interval.set_minutes(minutes);
        debug!(minutes = self.interval.minutes(), "check interval changed");
    }

    /// Changes the interval and restarts so the change applies immediately.
    pub fn set_interval_and_restart(&self, minutes: u64) {
        self.set_interval(minutes);
        self.restart();
    }
}

async fn run_loop<R: CycleRunner>(
    runner: Arc<R>,
    in_flight: Arc<AtomicBool>,
    interval: CheckInterval,
    mut control: watch::Receiver<Command>,
) {
    loop {
        if run_single_flight(runner.as_ref(), &in_flight).await.is_none() {
            debug!("scheduled check skipped; a check is already running");
        }

        tokio::select! {
            () = tokio::time::sleep(interval.as_duration()) => {}
            changed = control.changed() => {
                if changed.is_err() {
                    return;
                }
                let command = *control.borrow_and_update();
                if command == Command::Stop {
                    return;
                }
            }
        }
    }
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

async fn run_single_flight<R: CycleRunner + ?Sized>(
    runner: &R,
    in_flight: &AtomicBool,
) -> Option<PrCheckResult> {
    if in_flight
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return None;
    }
    let _guard = InFlightGuard(in_flight);
    Some(runner.run_cycle().await)
}
