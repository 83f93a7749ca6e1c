//! Random trip generation.
//!
//! At most one request per tick, drawn from the address book with a seeded
//! RNG so runs are reproducible. A full queue drops the request.

use bevy_ecs::prelude::*;
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::clock::SimulationClock;
use crate::dispatch::{estimate_fare, TripCounter, TripGenConfig, TripQueue, TripRequest};
use crate::service_area::ServiceArea;

pub fn trip_spawner(
    clock: Res<SimulationClock>,
    config: Res<TripGenConfig>,
    area: Res<ServiceArea>,
    mut counter: ResMut<TripCounter>,
    mut queue: ResMut<TripQueue>,
) {
    // Fresh RNG per tick, salted by the running counter.
    let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(counter.0));
    counter.0 += 1;

    if rng.gen::<f64>() >= config.probability {
        return;
    }

    if area.addresses.len() < 2 {
        debug!("address book too small for a trip");
        return;
    }
    let mut pickup = area.random_address(&mut rng).clone();
    // Bounded redraw; gives up for this tick if the book holds duplicates.
    let Some(mut destination) = (0..16)
        .map(|_| area.random_address(&mut rng).clone())
        .find(|candidate| candidate.name != pickup.name)
    else {
        debug!("no distinct destination address, skipping trip");
        return;
    };
    // Stored request coordinates are always in-fence.
    pickup.position = area.geofence.constrain(pickup.position);
    destination.position = area.geofence.constrain(destination.position);

    let miles = pickup.position.distance_miles(destination.position);
    let request = TripRequest {
        id: format!("trip-{}-{}", clock.now_ms(), counter.0),
        passenger: format!("Passenger-{}", rng.gen_range(0..1000)),
        pickup,
        destination,
        requested_at_ms: clock.now_ms(),
        fare_estimate: estimate_fare(miles),
    };

    let id = request.id.clone();
    if queue.push(request) {
        info!("new trip request {id}");
    } else {
        debug!("trip queue full, dropping {id}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use bevy_ecs::schedule::Schedule;
    use bevy_ecs::world::World;

    use crate::geofence::Geofence;
    use crate::service_area::NamedPlace;
    use crate::spatial::Coordinate;

    fn area_with(addresses: Vec<NamedPlace>) -> ServiceArea {
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 10.0),
            Coordinate::new(10.0, 10.0),
            Coordinate::new(10.0, 0.0),
        ];
        ServiceArea {
            geofence: Arc::new(Geofence::new(ring, vec![Coordinate::new(5.0, 5.0)])),
            start_locations: Vec::new(),
            charging_stations: Vec::new(),
            addresses,
        }
    }

    fn spawn_once(area: ServiceArea) -> World {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(TripGenConfig {
            probability: 1.0,
            seed: 9,
        });
        world.insert_resource(TripCounter::default());
        world.insert_resource(TripQueue::new(8));
        world.insert_resource(area);
        let mut schedule = Schedule::default();
        schedule.add_systems(trip_spawner);
        schedule.run(&mut world);
        world
    }

    #[test]
    fn single_address_book_produces_no_request() {
        let world = spawn_once(area_with(vec![NamedPlace::new("Only Stop", 5.0, 5.0)]));
        assert!(world.resource::<TripQueue>().is_empty());
    }

    #[test]
    fn duplicate_address_names_produce_no_request() {
        let world = spawn_once(area_with(vec![
            NamedPlace::new("Depot", 4.0, 4.0),
            NamedPlace::new("Depot", 6.0, 6.0),
        ]));
        assert!(world.resource::<TripQueue>().is_empty());
    }

    #[test]
    fn two_distinct_addresses_suffice() {
        let world = spawn_once(area_with(vec![
            NamedPlace::new("Depot", 4.0, 4.0),
            NamedPlace::new("Market", 6.0, 6.0),
        ]));
        let queue = world.resource::<TripQueue>();
        assert_eq!(queue.len(), 1);
        let request = queue.front().unwrap();
        assert_ne!(request.pickup.name, request.destination.name);
    }
}
