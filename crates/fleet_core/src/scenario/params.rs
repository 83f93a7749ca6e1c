//! Run parameters, with builder-style overrides for tests and sweeps.

use serde::Deserialize;

use crate::routing::RouteProviderKind;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FleetParams {
    pub tick_period_ms: u64,
    pub fleet_size: usize,
    pub seed: u64,
    pub queue_capacity: usize,
    pub new_trip_probability: f64,
    pub battery_drain_per_tick: f64,
    pub battery_charge_per_tick: f64,
    pub battery_low_threshold: f64,
    pub battery_full_threshold: f64,
    /// Initial charge range vehicles start inside.
    pub initial_battery_min: f64,
    pub initial_battery_max: f64,
    pub synthetic_segments: usize,
    pub synthetic_step_ms: u64,
    pub route_provider: RouteProviderKind,
    /// Wall-clock epoch (ms) for outbound timestamps.
    pub epoch_ms: u64,
}

impl Default for FleetParams {
    fn default() -> Self {
        Self {
            tick_period_ms: 2_000,
            fleet_size: 15,
            seed: 0,
            queue_capacity: 8,
            new_trip_probability: 0.5,
            battery_drain_per_tick: 0.1,
            battery_charge_per_tick: 0.5,
            battery_low_threshold: 20.0,
            battery_full_threshold: 95.0,
            initial_battery_min: 85.0,
            initial_battery_max: 100.0,
            synthetic_segments: 15,
            synthetic_step_ms: 3_000,
            route_provider: RouteProviderKind::default(),
            epoch_ms: 0,
        }
    }
}

impl FleetParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_fleet_size(mut self, fleet_size: usize) -> Self {
        self.fleet_size = fleet_size;
        self
    }

    pub fn with_tick_period_ms(mut self, tick_period_ms: u64) -> Self {
        self.tick_period_ms = tick_period_ms;
        self
    }

    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    pub fn with_new_trip_probability(mut self, probability: f64) -> Self {
        self.new_trip_probability = probability;
        self
    }

    pub fn with_epoch_ms(mut self, epoch_ms: u64) -> Self {
        self.epoch_ms = epoch_ms;
        self
    }
}
