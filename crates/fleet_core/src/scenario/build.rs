//! Populates a fresh world from `FleetParams`.

use bevy_ecs::world::World;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::broadcast::{BroadcastRng, Broadcaster, BroadcasterResource};
use crate::clock::SimulationClock;
use crate::commands::CommandQueue;
use crate::dispatch::{
    DispatchPolicyResource, NearestAvailable, TripCounter, TripGenConfig, TripQueue,
};
use crate::ecs::{Position, Vehicle};
use crate::routing::fetch::RouteFetchPool;
use crate::routing::{build_route_provider, RouteSynthesizer, SyntheticConfig};
use crate::scenario::FleetParams;
use crate::service_area::ServiceArea;
use crate::systems::battery::BatteryConfig;

use std::sync::Arc;

/// Insert all resources and spawn the fleet. Subsystem RNGs take distinct
/// offsets from the base seed so reordering one draw stream does not shift
/// the others.
pub fn build_fleet(world: &mut World, params: &FleetParams, broadcaster: Arc<dyn Broadcaster>) {
    let area = ServiceArea::compton();
    let geofence = Arc::clone(&area.geofence);
    let provider = build_route_provider(&params.route_provider);

    world.insert_resource(SimulationClock::new(params.tick_period_ms, params.epoch_ms));
    world.insert_resource(CommandQueue::default());
    world.insert_resource(RouteFetchPool::default());
    world.insert_resource(RouteSynthesizer::new(
        geofence,
        provider,
        SyntheticConfig {
            segments: params.synthetic_segments,
            step_ms: params.synthetic_step_ms,
            curve_factor: 0.002,
        },
        params.seed.wrapping_add(0x5eed_0001),
    ));
    world.insert_resource(TripQueue::new(params.queue_capacity));
    world.insert_resource(TripGenConfig {
        probability: params.new_trip_probability,
        seed: params.seed.wrapping_add(0x5eed_0002),
    });
    world.insert_resource(TripCounter::default());
    world.insert_resource(DispatchPolicyResource(Box::new(NearestAvailable)));
    world.insert_resource(BatteryConfig {
        drain_per_tick: params.battery_drain_per_tick,
        charge_per_tick: params.battery_charge_per_tick,
        low_threshold: params.battery_low_threshold,
        full_threshold: params.battery_full_threshold,
    });
    world.insert_resource(BroadcastRng(StdRng::seed_from_u64(
        params.seed.wrapping_add(0x5eed_0003),
    )));
    world.insert_resource(BroadcasterResource(broadcaster));

    let mut battery_rng = StdRng::seed_from_u64(params.seed.wrapping_add(0x5eed_0004));
    for index in 1..=params.fleet_size {
        let start = &area.start_locations[(index - 1) % area.start_locations.len()];
        let battery = battery_rng.gen_range(params.initial_battery_min..=params.initial_battery_max);
        // A few listed start points sit just outside the boundary polygon;
        // spawn positions always go through the fence.
        let position = area.geofence.constrain(start.position);
        world.spawn((Vehicle::new(index, battery), Position(position)));
    }

    world.insert_resource(area);
}
