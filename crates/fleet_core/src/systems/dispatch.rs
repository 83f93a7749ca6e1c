//! Matches waiting trip requests to idle vehicles.
//!
//! Requests are served oldest first. Assignment is non-blocking: the vehicle
//! gets a synthetic route immediately and a provider fetch, when configured,
//! replaces it asynchronously under the same route generation.

use bevy_ecs::prelude::*;
use log::info;

use crate::clock::SimulationClock;
use crate::dispatch::{DispatchPolicyResource, TripQueue};
use crate::ecs::{Position, TripContext, Vehicle, VehicleRoute, VehicleStatus};
use crate::routing::fetch::RouteFetchPool;
use crate::routing::{Route, RouteSynthesizer};

pub fn dispatch(
    mut commands: Commands,
    clock: Res<SimulationClock>,
    policy: Res<DispatchPolicyResource>,
    mut queue: ResMut<TripQueue>,
    mut synthesizer: ResMut<RouteSynthesizer>,
    fetch_pool: Res<RouteFetchPool>,
    mut vehicles: Query<(Entity, &mut Vehicle, &Position)>,
) {
    let mut idle: Vec<(Entity, crate::spatial::Coordinate)> = vehicles
        .iter()
        .filter(|(_, v, _)| v.status == VehicleStatus::Available)
        .map(|(e, _, p)| (e, p.0))
        .collect();

    while !queue.is_empty() && !idle.is_empty() {
        let pickup = queue
            .front()
            .map(|r| r.pickup.position)
            .expect("queue is non-empty");
        let Some(chosen) = policy.0.select_vehicle(pickup, &idle) else {
            break;
        };
        let request = queue.pop_front().expect("queue is non-empty");
        idle.retain(|(e, _)| *e != chosen);

        let (entity, mut vehicle, position) =
            vehicles.get_mut(chosen).expect("idle vehicle exists");

        let approach =
            synthesizer.synthesize_fallback(position.0, request.pickup.position, clock.now_ms());
        let next_start = approach
            .points
            .last()
            .map(|p| p.timestamp_ms + 1)
            .unwrap_or(clock.now_ms());
        let dropoff = synthesizer.synthesize_fallback(
            request.pickup.position,
            request.destination.position,
            next_start,
        );
        let route = Route::concat_trip(approach, dropoff);

        vehicle.status = VehicleStatus::PickingUp;
        vehicle.route_generation += 1;
        info!(
            "dispatching {} for {} ({} -> {})",
            vehicle.id, request.id, request.pickup.name, request.destination.name
        );

        if let Some(provider) = synthesizer.provider() {
            fetch_pool.spawn_fetch(
                provider,
                entity,
                vehicle.route_generation,
                vec![
                    (position.0, request.pickup.position),
                    (request.pickup.position, request.destination.position),
                ],
            );
        }

        commands.entity(entity).insert((
            VehicleRoute::new(route),
            TripContext {
                trip_id: request.id,
                passenger: request.passenger,
                pickup: request.pickup,
                destination: request.destination,
            },
        ));
    }
}
