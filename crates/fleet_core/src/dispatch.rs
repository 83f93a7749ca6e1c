//! Trip requests, the bounded wait queue and the dispatch policy.

use std::collections::VecDeque;

use bevy_ecs::prelude::{Entity, Resource};
use serde::{Deserialize, Serialize};

use crate::service_area::NamedPlace;
use crate::spatial::Coordinate;

pub const FARE_BASE: f64 = 2.69;
pub const FARE_PER_MILE: f64 = 1.50;
pub const FARE_CAP: f64 = 14.20;

/// Flat fare model, capped.
pub fn estimate_fare(miles: f64) -> f64 {
    (FARE_BASE + FARE_PER_MILE * miles).min(FARE_CAP)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRequest {
    pub id: String,
    pub passenger: String,
    pub pickup: NamedPlace,
    pub destination: NamedPlace,
    pub requested_at_ms: u64,
    pub fare_estimate: f64,
}

/// Bounded FIFO of waiting trip requests. Arrivals beyond capacity are
/// rejected, not queued.
#[derive(Debug, Resource)]
pub struct TripQueue {
    requests: VecDeque<TripRequest>,
    capacity: usize,
}

impl TripQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            requests: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns false when the queue is full and the request was dropped.
    pub fn push(&mut self, request: TripRequest) -> bool {
        if self.requests.len() >= self.capacity {
            return false;
        }
        self.requests.push_back(request);
        true
    }

    pub fn pop_front(&mut self) -> Option<TripRequest> {
        self.requests.pop_front()
    }

    pub fn front(&self) -> Option<&TripRequest> {
        self.requests.front()
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.requests.len() >= self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &TripRequest> {
        self.requests.iter()
    }
}

/// Picks a vehicle for a pickup from the currently idle set.
pub trait DispatchPolicy: Send + Sync {
    fn select_vehicle(
        &self,
        pickup: Coordinate,
        idle: &[(Entity, Coordinate)],
    ) -> Option<Entity>;
}

/// Nearest idle vehicle by Euclidean degree distance; ties keep the first
/// candidate in iteration order.
pub struct NearestAvailable;

impl DispatchPolicy for NearestAvailable {
    fn select_vehicle(
        &self,
        pickup: Coordinate,
        idle: &[(Entity, Coordinate)],
    ) -> Option<Entity> {
        let mut best: Option<(Entity, f64)> = None;
        for &(entity, position) in idle {
            let dist = pickup.distance_deg(position);
            match best {
                Some((_, best_dist)) if dist >= best_dist => {}
                _ => best = Some((entity, dist)),
            }
        }
        best.map(|(entity, _)| entity)
    }
}

#[derive(Resource)]
pub struct DispatchPolicyResource(pub Box<dyn DispatchPolicy>);

/// Tuning for random trip generation.
#[derive(Debug, Clone, Copy, Resource)]
pub struct TripGenConfig {
    /// Chance a new request is generated each tick.
    pub probability: f64,
    pub seed: u64,
}

impl Default for TripGenConfig {
    fn default() -> Self {
        Self {
            probability: 0.5,
            seed: 0,
        }
    }
}

/// Counts generated trips; also salts the per-tick trip RNG.
#[derive(Debug, Default, Resource)]
pub struct TripCounter(pub u64);
