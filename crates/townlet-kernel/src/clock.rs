//! The sim clock: tick driver and sim-time mapping.
//!
//! One tick is one simulated hour; days are 24 ticks. `step` is the
//! synchronous primitive both tests and the background worker use.
//! The clock must have exactly one driver; `step` is not reentrant.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use townlet_store::stores::TownStore;
use townlet_types::TownId;
use tracing::{debug, info};

use crate::bus::EventBus;
use crate::error::KernelError;

/// Hours in a simulated day.
const HOURS_PER_DAY: i64 = 24;

/// The tick driver. Owns the bus and runs the three-phase cycle.
pub struct SimClock {
    town_id: TownId,
    tick_interval_seconds: i64,
    bus: EventBus,
    towns: Arc<dyn TownStore>,
    running: bool,
    tick_count: u64,
    last_tick_at: Option<DateTime<Utc>>,
}

impl SimClock {
    /// Create a stopped clock for the given town.
    pub const fn new(
        town_id: TownId,
        tick_interval_seconds: i64,
        bus: EventBus,
        towns: Arc<dyn TownStore>,
    ) -> Self {
        Self {
            town_id,
            tick_interval_seconds,
            bus,
            towns,
            running: false,
            tick_count: 0,
            last_tick_at: None,
        }
    }

    /// Start the clock: validate the interval and record the sim start
    /// time on the town. Starting an already-running clock is a no-op.
    pub fn start(&mut self) -> Result<(), KernelError> {
        if self.running {
            return Ok(());
        }
        if self.tick_interval_seconds < 0 {
            return Err(KernelError::InvalidTickInterval {
                seconds: self.tick_interval_seconds,
            });
        }
        let now = Utc::now();
        self.towns.set_sim_start_time(&self.town_id, now)?;
        self.running = true;
        self.last_tick_at = Some(now);
        info!(town_id = %self.town_id, interval_s = self.tick_interval_seconds, "sim clock started");
        Ok(())
    }

    /// Stop the clock. The worker loop observes this via
    /// [`running`](Self::running).
    pub fn stop(&mut self) {
        self.running = false;
        info!(town_id = %self.town_id, ticks = self.tick_count, "sim clock stopped");
    }

    /// Run the three-phase cycle `steps` times synchronously.
    ///
    /// Every phase of a tick runs to completion before an error is
    /// reported, so the live set and durable marks stay consistent;
    /// under `WritePolicy::Strict` the first phase error ends the run
    /// early, remaining steps unticked.
    pub fn step(&mut self, steps: u32) -> Result<(), KernelError> {
        for _ in 0..steps {
            let resolved = self.bus.pre_tick();
            let marked = self.bus.on_tick();
            self.bus.post_tick();
            self.tick_count = self.tick_count.saturating_add(1);
            self.last_tick_at = Some(Utc::now());
            debug!(tick = self.tick_count, "tick complete");
            resolved?;
            marked?;
        }
        Ok(())
    }

    /// Whether `start` has been called without a matching `stop`.
    pub const fn running(&self) -> bool {
        self.running
    }

    /// Monotonic count of completed ticks.
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Timestamp of the most recent tick, if any have run.
    pub const fn last_tick_at(&self) -> Option<DateTime<Utc>> {
        self.last_tick_at
    }

    /// The configured wall-clock seconds per tick.
    pub const fn tick_interval_seconds(&self) -> i64 {
        self.tick_interval_seconds
    }

    /// Mutable access to the bus, for publishing and subscription.
    pub const fn bus(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    /// Convert a wall-clock instant into sim-time text for this town.
    pub fn town_time(&self, at: DateTime<Utc>) -> Result<String, KernelError> {
        town_time(
            &self.towns,
            &self.town_id,
            self.tick_interval_seconds,
            at,
        )
    }
}

/// Convert a wall-clock instant into `"Day D, HH:00"` sim-time text.
///
/// Elapsed wall time since the town's recorded sim start is divided by
/// the tick interval to get elapsed ticks; each tick is one sim hour.
pub fn town_time(
    towns: &Arc<dyn TownStore>,
    town_id: &TownId,
    tick_interval_seconds: i64,
    at: DateTime<Utc>,
) -> Result<String, KernelError> {
    let start = towns
        .get_sim_start_time(town_id)?
        .ok_or_else(|| KernelError::ClockNotStarted {
            town_id: town_id.as_str().to_owned(),
        })?;
    let interval = tick_interval_seconds.max(1);
    let elapsed = at.signed_duration_since(start).num_seconds().max(0);
    let ticks = elapsed.checked_div(interval).unwrap_or(0);
    let days = ticks.checked_div(HOURS_PER_DAY).unwrap_or(0);
    let hours = ticks.checked_rem(HOURS_PER_DAY).unwrap_or(0);
    Ok(format!("Day {days}, {hours:02}:00"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use chrono::Duration;
    use townlet_store::stores::EventStore;
    use townlet_store::{InMemoryStore, Stores};
    use townlet_types::Town;

    use crate::config::WritePolicy;

    use super::*;

    fn clock_with_store(interval: i64) -> (SimClock, Arc<InMemoryStore>) {
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
        (
            SimClock::new(town_id, interval, bus, stores.towns),
            store,
        )
    }

    #[test]
    fn start_records_sim_start_time() {
        let (mut clock, store) = clock_with_store(90);
        assert!(!clock.running());
        clock.start().unwrap();
        assert!(clock.running());
        assert!(
            store
                .get_sim_start_time(&TownId::from("town:001"))
                .unwrap()
                .is_some()
        );
    }

    #[test]
    fn start_twice_is_a_noop() {
        let (mut clock, _store) = clock_with_store(90);
        clock.start().unwrap();
        clock.start().unwrap();
        assert!(clock.running());
    }

    #[test]
    fn negative_interval_is_rejected() {
        let (mut clock, _store) = clock_with_store(-5);
        assert!(matches!(
            clock.start(),
            Err(KernelError::InvalidTickInterval { seconds: -5 })
        ));
        assert!(!clock.running());
    }

    #[test]
    fn step_increments_tick_count() {
        let (mut clock, _store) = clock_with_store(90);
        clock.step(3).unwrap();
        assert_eq!(clock.tick_count(), 3);
        assert!(clock.last_tick_at().is_some());
    }

    #[test]
    fn town_time_maps_ticks_to_days_and_hours() {
        let (mut clock, _store) = clock_with_store(60);
        clock.start().unwrap();
        let start = clock.last_tick_at().unwrap();

        // 0 elapsed: Day 0, 00:00
        assert_eq!(clock.town_time(start).unwrap(), "Day 0, 00:00");
        // 5 ticks of 60s: hour 5
        assert_eq!(
            clock.town_time(start + Duration::seconds(300)).unwrap(),
            "Day 0, 05:00"
        );
        // 30 ticks: day 1, hour 6
        assert_eq!(
            clock.town_time(start + Duration::seconds(1800)).unwrap(),
            "Day 1, 06:00"
        );
    }

    #[test]
    fn town_time_before_start_is_an_error() {
        let (clock, _store) = clock_with_store(60);
        assert!(matches!(
            clock.town_time(Utc::now()),
            Err(KernelError::ClockNotStarted { .. })
        ));
    }
}
