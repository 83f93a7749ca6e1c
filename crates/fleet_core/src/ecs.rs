//! ECS components for fleet vehicles.

use bevy_ecs::prelude::Component;
use serde::{Deserialize, Serialize};

use crate::routing::Route;
use crate::service_area::NamedPlace;
use crate::spatial::Coordinate;

/// Vehicle lifecycle state. Exactly one per vehicle; all transitions happen
/// inside the tick schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VehicleStatus {
    Available,
    PickingUp,
    EnRoute,
    DroppingOff,
    Charging,
    EnRouteToCharging,
}

impl VehicleStatus {
    /// True while the vehicle is serving a trip (battery drains).
    pub fn is_driving_for_fare(self) -> bool {
        matches!(self, VehicleStatus::PickingUp | VehicleStatus::EnRoute)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleKind {
    Cybertruck,
    ModelY,
    ModelX,
}

impl VehicleKind {
    /// Fleet composition by 1-based vehicle index: the first five are
    /// Cybertrucks, the next five Model Ys, the rest Model Xs.
    pub fn from_index(index: usize) -> Self {
        if index <= 5 {
            VehicleKind::Cybertruck
        } else if index <= 10 {
            VehicleKind::ModelY
        } else {
            VehicleKind::ModelX
        }
    }
}

#[derive(Debug, Clone, Component)]
pub struct Vehicle {
    pub id: String,
    pub kind: VehicleKind,
    pub status: VehicleStatus,
    /// Charge percentage, clamped to [0, 100].
    pub battery: f64,
    /// Display speed from the last movement step, miles per hour.
    pub speed_mph: f64,
    pub pull_over_requested: bool,
    /// Bumped on every route replacement. Async fetch results carry the
    /// generation they were requested under; mismatched results are dropped.
    pub route_generation: u64,
}

impl Vehicle {
    pub fn new(index: usize, battery: f64) -> Self {
        Self {
            id: format!("vehicle-{index:03}"),
            kind: VehicleKind::from_index(index),
            status: VehicleStatus::Available,
            battery,
            speed_mph: 0.0,
            pull_over_requested: false,
            route_generation: 0,
        }
    }
}

/// Current position, always inside the geofence.
#[derive(Debug, Clone, Copy, Component)]
pub struct Position(pub Coordinate);

/// The route a vehicle is currently following.
#[derive(Debug, Clone, Component)]
pub struct VehicleRoute {
    pub route: Route,
    /// Index of the last route point reached.
    pub cursor: usize,
}

impl VehicleRoute {
    pub fn new(route: Route) -> Self {
        Self { route, cursor: 0 }
    }

    pub fn at_end(&self) -> bool {
        self.cursor + 1 >= self.route.points.len()
    }
}

/// Trip details attached while a vehicle is serving a passenger.
#[derive(Debug, Clone, Component)]
pub struct TripContext {
    pub trip_id: String,
    pub passenger: String,
    pub pickup: NamedPlace,
    pub destination: NamedPlace,
}
