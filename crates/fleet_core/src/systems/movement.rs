//! Moves routed vehicles along their routes and drives the status
//! transitions tied to route progress.

use bevy_ecs::prelude::*;
use log::{debug, info, warn};

use crate::clock::SimulationClock;
use crate::ecs::{Position, TripContext, Vehicle, VehicleRoute, VehicleStatus};
use crate::routing::RouteSynthesizer;

pub fn movement(
    mut commands: Commands,
    clock: Res<SimulationClock>,
    synthesizer: Res<RouteSynthesizer>,
    mut vehicles: Query<(
        Entity,
        &mut Vehicle,
        &mut Position,
        Option<&mut VehicleRoute>,
        Option<&TripContext>,
    )>,
) {
    let now = clock.now_ms();
    let geofence = synthesizer.geofence();

    for (entity, mut vehicle, mut position, route, trip) in vehicles.iter_mut() {
        // Dropoff was observable for one tick; the vehicle now goes idle.
        if vehicle.status == VehicleStatus::DroppingOff {
            if let Some(trip) = trip {
                info!("{} completed trip {}", vehicle.id, trip.trip_id);
            }
            vehicle.status = VehicleStatus::Available;
            vehicle.speed_mph = 0.0;
            vehicle.route_generation += 1;
            commands
                .entity(entity)
                .remove::<VehicleRoute>()
                .remove::<TripContext>();
            continue;
        }

        let Some(mut route) = route else {
            vehicle.speed_mph = 0.0;
            continue;
        };

        if route.route.points.len() < 2 {
            continue;
        }

        // Advance the cursor when the next waypoint's time has passed,
        // otherwise interpolate within the current segment.
        let next_index = (route.cursor + 1).min(route.route.points.len() - 1);
        let current = route.route.points[route.cursor];
        let next = route.route.points[next_index];

        if !route.at_end() && now >= next.timestamp_ms {
            let hours = (next.timestamp_ms - current.timestamp_ms) as f64 / 3_600_000.0;
            let miles = current.position.distance_miles(next.position);
            vehicle.speed_mph = if hours > 0.0 { miles / hours } else { 0.0 };
            route.cursor = next_index;
            position.0 = next.position;
        } else if !route.at_end() && now > current.timestamp_ms {
            let span = (next.timestamp_ms - current.timestamp_ms) as f64;
            let t = (now - current.timestamp_ms) as f64 / span;
            position.0 = current.position.lerp(next.position, t);
            let hours = span / 3_600_000.0;
            let miles = current.position.distance_miles(next.position);
            vehicle.speed_mph = if hours > 0.0 { miles / hours } else { 0.0 };
        }

        if !geofence.contains(position.0) {
            let corrected = geofence.constrain(position.0);
            warn!(
                "{} strayed outside the service area, snapping back",
                vehicle.id
            );
            position.0 = corrected;
        }

        // Pickup completes when the approach leg is fully traversed.
        if vehicle.status == VehicleStatus::PickingUp {
            if let Some(boundary) = route.route.pickup_boundary {
                if route.cursor >= boundary {
                    debug!("{} picked up passenger", vehicle.id);
                    vehicle.status = VehicleStatus::EnRoute;
                }
            }
        }

        if route.at_end() {
            match vehicle.status {
                VehicleStatus::EnRoute => {
                    // Held for one tick so subscribers observe the dropoff.
                    vehicle.status = VehicleStatus::DroppingOff;
                    vehicle.speed_mph = 0.0;
                }
                VehicleStatus::EnRouteToCharging => {
                    info!("{} reached charging station", vehicle.id);
                    vehicle.status = VehicleStatus::Charging;
                    vehicle.speed_mph = 0.0;
                    vehicle.route_generation += 1;
                    commands.entity(entity).remove::<VehicleRoute>();
                }
                _ => {}
            }
        }
    }
}
