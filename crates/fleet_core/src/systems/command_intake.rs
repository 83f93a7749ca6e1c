//! Applies externally queued commands at the start of the tick.

use bevy_ecs::prelude::*;
use log::{info, warn};

use crate::clock::SimulationClock;
use crate::commands::{CommandQueue, FleetCommand};
use crate::ecs::{Position, TripContext, Vehicle, VehicleRoute, VehicleStatus};
use crate::routing::fetch::RouteFetchPool;
use crate::routing::RouteSynthesizer;

pub fn command_intake(
    mut commands: Commands,
    queue: Res<CommandQueue>,
    clock: Res<SimulationClock>,
    mut synthesizer: ResMut<RouteSynthesizer>,
    fetch_pool: Res<RouteFetchPool>,
    mut vehicles: Query<(Entity, &mut Vehicle, &Position)>,
) {
    for command in queue.drain() {
        match command {
            FleetCommand::Reroute {
                vehicle_id,
                destination,
                destination_name,
            } => {
                let Some((entity, mut vehicle, position)) = vehicles
                    .iter_mut()
                    .find(|(_, v, _)| v.id == vehicle_id)
                else {
                    warn!("reroute ignored, unknown vehicle {vehicle_id}");
                    continue;
                };
                info!(
                    "rerouting {} to {}",
                    vehicle.id,
                    destination_name.as_deref().unwrap_or("coordinates")
                );
                // An immediate synthetic route keeps the vehicle moving; a
                // provider fetch replaces it when the result arrives.
                let route =
                    synthesizer.synthesize_fallback(position.0, destination, clock.now_ms());
                vehicle.status = VehicleStatus::EnRoute;
                vehicle.route_generation += 1;
                if let Some(provider) = synthesizer.provider() {
                    fetch_pool.spawn_fetch(
                        provider,
                        entity,
                        vehicle.route_generation,
                        vec![(position.0, destination)],
                    );
                }
                commands
                    .entity(entity)
                    .insert(VehicleRoute::new(route))
                    .remove::<TripContext>();
            }
            FleetCommand::PullOver { vehicle_id } => {
                let Some((_, mut vehicle, _)) =
                    vehicles.iter_mut().find(|(_, v, _)| v.id == vehicle_id)
                else {
                    warn!("pull-over ignored, unknown vehicle {vehicle_id}");
                    continue;
                };
                info!("pull-over requested for {}", vehicle.id);
                vehicle.pull_over_requested = true;
            }
        }
    }
}
