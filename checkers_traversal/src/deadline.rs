//! Watchdog thread: flips a stop flag past a deadline and emits periodic
//! progress events. Grounded on the teacher engine's `TimeManager`, which
//! pairs an `Instant` start time with soft/hard `Duration` bounds read
//! through a shared `AtomicBool`; here a single background thread owns the
//! polling loop instead of the step-loop checking clocks itself.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::events::{Event, ProgressEvent};

/// How often the watchdog wakes to check the deadline and stop flag.
pub const WATCHDOG_QUANTUM: Duration = Duration::from_millis(5);

/// Default interval between ProgressEvents during a timed run.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_secs(3);

/// Default duration of `traverse_for` when the caller doesn't specify one.
pub const DEFAULT_TRAVERSAL_DURATION: Duration = Duration::from_secs(10);

pub type EmitFn = Arc<dyn Fn(&Event) + Send + Sync>;

/// A background thread that watches a deadline and stop flag, and reports
/// progress through `emit`. Dropped (via [`Watchdog::join`]) at the end of
/// every driving call; there is no persistent background state between
/// calls.
pub struct Watchdog {
    handle: Option<JoinHandle<()>>,
    stop_watchdog: Arc<AtomicBool>,
}

impl Watchdog {
    /// Spawns the watchdog. `deadline` is `None` for driving modes with no
    /// built-in stop condition (`step_one`/`start_root_only`), in which case
    /// the watchdog only emits progress and never sets `stop_requested`.
    pub fn spawn(
        deadline: Option<Instant>,
        stop_requested: Arc<AtomicBool>,
        progress_interval: Duration,
        game_counter: Arc<AtomicU64>,
        emit: EmitFn,
    ) -> Self {
        let stop_watchdog = Arc::new(AtomicBool::new(false));
        let stop_watchdog_for_thread = Arc::clone(&stop_watchdog);

        let handle = thread::spawn(move || {
            let mut last_progress = Instant::now();
            loop {
                thread::sleep(WATCHDOG_QUANTUM);

                if stop_watchdog_for_thread.load(Ordering::Relaxed) {
                    break;
                }

                let now = Instant::now();
                if let Some(deadline) = deadline {
                    if now >= deadline {
                        stop_requested.store(true, Ordering::Relaxed);
                    }
                }

                if now.duration_since(last_progress) >= progress_interval {
                    last_progress = now;
                    let games_so_far = game_counter.load(Ordering::Relaxed);
                    emit(&Event::Progress(ProgressEvent { games_so_far }));
                }

                if stop_requested.load(Ordering::Relaxed) {
                    break;
                }
            }
        });

        Self {
            handle: Some(handle),
            stop_watchdog,
        }
    }

    /// Signals the watchdog thread to stop and waits for it to exit.
    pub fn join(mut self) {
        self.stop_watchdog.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.stop_watchdog.store(true, Ordering::Relaxed);
    }
}
