//! Battery drain, charging and the low-charge detour.

use bevy_ecs::prelude::*;
use log::info;

use crate::clock::SimulationClock;
use crate::ecs::{Position, Vehicle, VehicleRoute, VehicleStatus};
use crate::routing::fetch::RouteFetchPool;
use crate::routing::RouteSynthesizer;
use crate::service_area::ServiceArea;

/// Per-tick battery rates and the thresholds that trigger transitions.
#[derive(Debug, Clone, Copy, Resource)]
pub struct BatteryConfig {
    pub drain_per_tick: f64,
    pub charge_per_tick: f64,
    pub low_threshold: f64,
    pub full_threshold: f64,
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            drain_per_tick: 0.1,
            charge_per_tick: 0.5,
            low_threshold: 20.0,
            full_threshold: 95.0,
        }
    }
}

pub fn battery(
    mut commands: Commands,
    config: Res<BatteryConfig>,
    clock: Res<SimulationClock>,
    area: Res<ServiceArea>,
    mut synthesizer: ResMut<RouteSynthesizer>,
    fetch_pool: Res<RouteFetchPool>,
    mut vehicles: Query<(Entity, &mut Vehicle, &Position)>,
) {
    for (entity, mut vehicle, position) in vehicles.iter_mut() {
        // Adjust charge first so threshold transitions see this tick's level.
        if vehicle.status.is_driving_for_fare() {
            vehicle.battery = (vehicle.battery - config.drain_per_tick).max(0.0);
        } else if vehicle.status == VehicleStatus::Charging {
            vehicle.battery = (vehicle.battery + config.charge_per_tick).min(100.0);
        }

        match vehicle.status {
            VehicleStatus::Charging if vehicle.battery >= config.full_threshold => {
                info!("{} finished charging at {:.1}%", vehicle.id, vehicle.battery);
                vehicle.status = VehicleStatus::Available;
            }
            VehicleStatus::Available if vehicle.battery < config.low_threshold => {
                let Some(station) = area.nearest_charging_station(position.0) else {
                    continue;
                };
                info!(
                    "{} low battery ({:.1}%), heading to {}",
                    vehicle.id, vehicle.battery, station.name
                );
                let route = synthesizer.synthesize_fallback(
                    position.0,
                    station.position,
                    clock.now_ms(),
                );
                vehicle.status = VehicleStatus::EnRouteToCharging;
                vehicle.route_generation += 1;
                if let Some(provider) = synthesizer.provider() {
                    fetch_pool.spawn_fetch(
                        provider,
                        entity,
                        vehicle.route_generation,
                        vec![(position.0, station.position)],
                    );
                }
                commands.entity(entity).insert(VehicleRoute::new(route));
            }
            _ => {}
        }
    }
}
