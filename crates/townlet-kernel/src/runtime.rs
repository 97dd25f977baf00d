//! The kernel runtime: background worker driving the clock.
//!
//! Exactly one worker thread calls `step(1)` then sleeps for the tick
//! interval, which preserves the clock's single-driver invariant.
//! `stop` is cooperative: the flag is observed between ticks, in-flight
//! steps run to completion, and `stop` joins the worker before
//! returning.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{error, info};

use crate::clock::SimClock;
use crate::error::KernelError;

/// How often the sleeping worker re-checks the stop flag.
const STOP_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Owns the clock and its single background driver thread.
pub struct KernelRuntime {
    clock: Arc<Mutex<SimClock>>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl KernelRuntime {
    /// Wrap a clock in a runtime. The clock is not started yet.
    pub fn new(clock: SimClock) -> Self {
        Self {
            clock: Arc::new(Mutex::new(clock)),
            stop: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Start the clock and spawn the worker loop. Starting a runtime
    /// that is already running is a no-op.
    pub fn start(&mut self) -> Result<(), KernelError> {
        if self.worker.is_some() {
            return Ok(());
        }
        let interval = {
            let mut clock = lock_clock(&self.clock);
            clock.start()?;
            Duration::from_secs(clock.tick_interval_seconds().max(0).unsigned_abs())
        };

        self.stop.store(false, Ordering::SeqCst);
        let clock = Arc::clone(&self.clock);
        let stop = Arc::clone(&self.stop);
        let handle = std::thread::spawn(move || {
            info!("kernel worker started");
            loop {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                if let Err(e) = lock_clock(&clock).step(1) {
                    error!(error = %e, "tick failed");
                }
                sleep_interruptibly(interval, &stop);
            }
            info!("kernel worker exiting");
        });
        self.worker = Some(handle);
        Ok(())
    }

    /// Signal the worker to exit, wait for it, and stop the clock.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(handle) = self.worker.take()
            && handle.join().is_err()
        {
            error!("kernel worker panicked");
        }
        lock_clock(&self.clock).stop();
    }

    /// Whether the worker thread is running.
    pub const fn running(&self) -> bool {
        self.worker.is_some()
    }

    /// Completed tick count.
    pub fn tick_count(&self) -> u64 {
        lock_clock(&self.clock).tick_count()
    }

    /// Run a closure against the clock, for operator calls (forcing a
    /// step, reading sim time). Must not be called while expecting the
    /// worker to be mid-tick semantics; the lock serializes drivers.
    pub fn with_clock<R>(&self, f: impl FnOnce(&mut SimClock) -> R) -> R {
        let mut clock = lock_clock(&self.clock);
        f(&mut clock)
    }
}

impl Drop for KernelRuntime {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.stop();
        }
    }
}

/// Lock the clock, recovering the guard if a previous holder panicked.
fn lock_clock(clock: &Arc<Mutex<SimClock>>) -> MutexGuard<'_, SimClock> {
    clock.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sleep up to `total`, waking early when the stop flag is set.
fn sleep_interruptibly(total: Duration, stop: &Arc<AtomicBool>) {
    let mut remaining = total;
    while !remaining.is_zero() {
        if stop.load(Ordering::SeqCst) {
            return;
        }
        let slice = remaining.min(STOP_POLL_INTERVAL);
        std::thread::sleep(slice);
        remaining = remaining.saturating_sub(slice);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use townlet_store::stores::EventStore;
    use townlet_store::{InMemoryStore, Stores};
    use townlet_types::{Town, TownId};

    use crate::bus::EventBus;
    use crate::config::WritePolicy;

    use super::*;

    fn runtime_with_interval(seconds: i64) -> KernelRuntime {
        let store = Arc::new(InMemoryStore::new());
        let stores = Stores::from_memory(&store);
        let town_id = TownId::from("town:001");
        stores
            .towns
            .create(&Town {
                id: town_id.clone(),
                name: String::from("Townlet"),
                description: String::new(),
                sim_start_time: None,
            })
            .unwrap();
        let bus = EventBus::new(
            Arc::clone(&store) as Arc<dyn EventStore>,
            WritePolicy::Strict,
        );
        KernelRuntime::new(SimClock::new(town_id, seconds, bus, stores.towns))
    }

    #[test]
    fn start_then_stop_joins_the_worker() {
        let mut runtime = runtime_with_interval(0);
        runtime.start().unwrap();
        assert!(runtime.running());

        // A zero-second interval ticks as fast as it can; give it a moment.
        std::thread::sleep(Duration::from_millis(50));
        runtime.stop();
        assert!(!runtime.running());
        assert!(runtime.tick_count() > 0);
    }

    #[test]
    fn start_twice_is_a_noop() {
        let mut runtime = runtime_with_interval(3600);
        runtime.start().unwrap();
        runtime.start().unwrap();
        runtime.stop();
    }

    #[test]
    fn invalid_interval_fails_start() {
        let mut runtime = runtime_with_interval(-1);
        assert!(matches!(
            runtime.start(),
            Err(KernelError::InvalidTickInterval { .. })
        ));
        assert!(!runtime.running());
    }

    #[test]
    fn with_clock_can_force_steps_while_stopped() {
        let runtime = runtime_with_interval(3600);
        runtime.with_clock(|clock| clock.step(2)).unwrap();
        assert_eq!(runtime.tick_count(), 2);
    }
}
