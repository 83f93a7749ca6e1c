//! Builds and publishes the per-tick fleet snapshot.
//!
//! Runs last in the tick so every update reflects the tick's final state.
//! All updates within one tick share the same `updated_at` timestamp.

use bevy_ecs::prelude::*;

use crate::broadcast::{
    BroadcastRng, BroadcasterResource, FleetEvent, QueueUpdate, SnapshotSinkResource,
    VehicleDiagnostics, VehicleUpdate,
};
use crate::clock::SimulationClock;
use crate::dispatch::TripQueue;
use crate::ecs::{Position, Vehicle, VehicleRoute, VehicleStatus};

pub fn fleet_snapshot(
    clock: Res<SimulationClock>,
    queue: Res<TripQueue>,
    broadcaster: Res<BroadcasterResource>,
    sink: Option<Res<SnapshotSinkResource>>,
    mut rng: ResMut<BroadcastRng>,
    vehicles: Query<(&Vehicle, &Position, Option<&VehicleRoute>)>,
) {
    let updated_at = clock.timestamp_ms();
    let mut snapshots = Vec::new();

    for (vehicle, position, route) in vehicles.iter() {
        let (progress, eta, heading) = match route {
            Some(active) if active.route.points.len() > 1 => {
                let last = active.route.points.len() - 1;
                let progress = active.cursor as f64 / last as f64 * 100.0;
                let remaining_ms = active.route.points[last]
                    .timestamp_ms
                    .saturating_sub(clock.now_ms());
                let minutes = remaining_ms.div_ceil(60_000);
                let heading = if active.cursor < last {
                    position
                        .0
                        .heading_to(active.route.points[active.cursor + 1].position)
                } else {
                    0.0
                };
                (progress, format!("{minutes} min"), heading)
            }
            _ => (0.0, "0 min".to_string(), 0.0),
        };
        let eta = match vehicle.status {
            VehicleStatus::Available | VehicleStatus::Charging => "0 min".to_string(),
            _ => eta,
        };
        let (route_points, route_cursor) = match route {
            Some(active) => (
                active.route.points.iter().map(|p| p.position).collect(),
                active.cursor,
            ),
            None => (Vec::new(), 0),
        };

        snapshots.push(VehicleUpdate {
            id: vehicle.id.clone(),
            kind: vehicle.kind,
            status: vehicle.status,
            lat: position.0.lat,
            lng: position.0.lng,
            battery: vehicle.battery.round().clamp(0.0, 100.0) as u8,
            speed_mph: (vehicle.speed_mph * 10.0).round() / 10.0,
            route: route_points,
            route_cursor,
            progress,
            eta,
            heading,
            pull_over_requested: vehicle.pull_over_requested,
            diagnostics: VehicleDiagnostics::sample(vehicle.battery, &mut rng.0),
            updated_at,
        });
    }

    let queue_update = QueueUpdate {
        requests: queue.iter().cloned().collect(),
        updated_at,
    };

    if let Some(sink) = sink {
        sink.0.record(clock.tick(), &snapshots, &queue_update);
    }
    for snapshot in snapshots {
        broadcaster.0.publish(FleetEvent::Vehicle(snapshot));
    }
    broadcaster.0.publish(FleetEvent::Queue(queue_update));
}
