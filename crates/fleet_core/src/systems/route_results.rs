//! Applies completed provider fetches.
//!
//! Each outcome carries the route generation it was requested under. A
//! vehicle bumps its generation on every route replacement, so any result
//! that raced a newer assignment arrives with a stale tag and is dropped.

use bevy_ecs::prelude::*;
use log::{debug, warn};

use crate::clock::SimulationClock;
use crate::ecs::{Vehicle, VehicleRoute};
use crate::routing::fetch::RouteFetchPool;
use crate::routing::{Route, RouteSynthesizer};

pub fn apply_route_results(
    fetch_pool: Res<RouteFetchPool>,
    clock: Res<SimulationClock>,
    synthesizer: Res<RouteSynthesizer>,
    mut vehicles: Query<(&Vehicle, &mut VehicleRoute)>,
) {
    for outcome in fetch_pool.drain() {
        let Ok((vehicle, mut active)) = vehicles.get_mut(outcome.vehicle) else {
            debug!("route result dropped, vehicle no longer routed");
            continue;
        };
        if outcome.generation != vehicle.route_generation {
            debug!(
                "route result for {} dropped, generation {} superseded by {}",
                vehicle.id, outcome.generation, vehicle.route_generation
            );
            continue;
        }
        let paths = match outcome.result {
            Ok(paths) => paths,
            Err(err) => {
                // The synthetic route installed at assignment time stays in
                // place.
                warn!("route fetch for {} failed: {err}", vehicle.id);
                continue;
            }
        };
        if paths.is_empty() || paths.iter().any(|p| p.points.len() < 2) {
            warn!("route fetch for {} returned unusable geometry", vehicle.id);
            continue;
        }

        let mut legs = Vec::with_capacity(paths.len());
        let mut start_at = clock.now_ms();
        for path in &paths {
            let leg = synthesizer.route_from_provider_path(path, start_at);
            start_at = leg
                .points
                .last()
                .map(|p| p.timestamp_ms + 1)
                .unwrap_or(start_at);
            legs.push(leg);
        }
        let route = if legs.len() == 2 {
            let mut legs = legs.into_iter();
            Route::concat_trip(legs.next().unwrap(), legs.next().unwrap())
        } else {
            legs.into_iter().next().unwrap()
        };
        debug!(
            "provider route applied to {} ({} points)",
            vehicle.id,
            route.points.len()
        );
        *active = VehicleRoute::new(route);
    }
}
