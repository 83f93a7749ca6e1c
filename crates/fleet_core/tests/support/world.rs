//! Shared world setup for integration tests.

use std::sync::mpsc::Receiver;
use std::sync::Arc;

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::Schedule;

use fleet_core::broadcast::{ChannelBroadcaster, FleetEvent};
use fleet_core::clock::SimulationClock;
use fleet_core::dispatch::{estimate_fare, TripQueue, TripRequest};
use fleet_core::ecs::{Position, Vehicle};
use fleet_core::routing::{RouteProvider, RouteSynthesizer, SyntheticConfig};
use fleet_core::runner::{run_tick, tick_schedule};
use fleet_core::scenario::{build_fleet, FleetParams};
use fleet_core::service_area::ServiceArea;
use fleet_core::spatial::Coordinate;

pub struct TestWorld {
    pub world: World,
    pub schedule: Schedule,
    pub broadcaster: Arc<ChannelBroadcaster>,
}

pub struct TestWorldBuilder {
    params: FleetParams,
    provider: Option<Arc<dyn RouteProvider>>,
}

impl TestWorldBuilder {
    /// Three vehicles, no random trips, fixed seed.
    pub fn new() -> Self {
        Self {
            params: FleetParams::default()
                .with_fleet_size(3)
                .with_new_trip_probability(0.0)
                .with_seed(1),
            provider: None,
        }
    }

    pub fn with_params(mut self, params: FleetParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn RouteProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn build(self) -> TestWorld {
        let broadcaster = Arc::new(ChannelBroadcaster::default());
        let mut world = World::new();
        build_fleet(&mut world, &self.params, broadcaster.clone());

        if let Some(provider) = self.provider {
            let geofence = Arc::clone(&world.resource::<ServiceArea>().geofence);
            world.insert_resource(RouteSynthesizer::new(
                geofence,
                Some(provider),
                SyntheticConfig {
                    segments: self.params.synthetic_segments,
                    step_ms: self.params.synthetic_step_ms,
                    curve_factor: 0.002,
                },
                self.params.seed,
            ));
        }

        TestWorld {
            world,
            schedule: tick_schedule(),
            broadcaster,
        }
    }
}

impl TestWorld {
    pub fn subscribe(&self) -> Receiver<FleetEvent> {
        self.broadcaster.subscribe()
    }

    pub fn tick(&mut self) {
        run_tick(&mut self.world, &mut self.schedule);
    }

    pub fn tick_n(&mut self, n: u64) {
        for _ in 0..n {
            self.tick();
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.world.resource::<SimulationClock>().now_ms()
    }

    /// Snapshot of every vehicle, sorted by id.
    pub fn vehicles(&mut self) -> Vec<(Entity, Vehicle, Coordinate)> {
        let mut query = self.world.query::<(Entity, &Vehicle, &Position)>();
        let mut all: Vec<(Entity, Vehicle, Coordinate)> = query
            .iter(&self.world)
            .map(|(e, v, p)| (e, v.clone(), p.0))
            .collect();
        all.sort_by(|a, b| a.1.id.cmp(&b.1.id));
        all
    }

    pub fn vehicle(&mut self, id: &str) -> (Entity, Vehicle, Coordinate) {
        self.vehicles()
            .into_iter()
            .find(|(_, v, _)| v.id == id)
            .unwrap_or_else(|| panic!("no vehicle {id}"))
    }

    /// Queue a trip between two named addresses.
    pub fn push_trip(&mut self, trip_id: &str, pickup: &str, destination: &str) {
        let (pickup, destination) = {
            let area = self.world.resource::<ServiceArea>();
            let mut pickup = area.geocode(pickup).expect("pickup address").clone();
            let mut destination = area
                .geocode(destination)
                .expect("destination address")
                .clone();
            pickup.position = area.geofence.constrain(pickup.position);
            destination.position = area.geofence.constrain(destination.position);
            (pickup, destination)
        };
        let miles = pickup.position.distance_miles(destination.position);
        let requested_at_ms = self.now_ms();
        let request = TripRequest {
            id: trip_id.to_string(),
            passenger: "Passenger-1".to_string(),
            pickup,
            destination,
            requested_at_ms,
            fare_estimate: estimate_fare(miles),
        };
        assert!(
            self.world.resource_mut::<TripQueue>().push(request),
            "trip queue full"
        );
    }
}
