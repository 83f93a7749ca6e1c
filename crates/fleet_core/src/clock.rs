//! Fixed-tick simulation clock.
//!
//! One tick advances simulated time by a fixed period; all systems read the
//! same `now_ms` for the duration of a tick, so every update published in a
//! tick carries the same timestamp.

use bevy_ecs::prelude::Resource;

#[derive(Debug, Clone, Resource)]
pub struct SimulationClock {
    tick: u64,
    now_ms: u64,
    tick_period_ms: u64,
    /// Wall-clock epoch (ms) the run started at; added to `now_ms` when
    /// producing externally visible timestamps.
    epoch_ms: u64,
}

impl SimulationClock {
    pub fn new(tick_period_ms: u64, epoch_ms: u64) -> Self {
        Self {
            tick: 0,
            now_ms: 0,
            tick_period_ms,
            epoch_ms,
        }
    }

    /// Advance one tick. Called exactly once per tick, before the schedule.
    pub fn advance(&mut self) {
        self.tick += 1;
        self.now_ms += self.tick_period_ms;
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Simulated milliseconds since the start of the run.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Externally visible timestamp: epoch plus simulated elapsed time.
    /// Strictly monotonic across ticks.
    pub fn timestamp_ms(&self) -> u64 {
        self.epoch_ms + self.now_ms
    }

    pub fn tick_period_ms(&self) -> u64 {
        self.tick_period_ms
    }
}

impl Default for SimulationClock {
    fn default() -> Self {
        Self::new(2_000, 0)
    }
}
