//! External control commands.
//!
//! Outside callers never mutate the world directly. They push commands into
//! the shared queue and the intake system applies them at the start of the
//! next tick, so the tick loop stays the single writer.

use std::collections::VecDeque;
use std::sync::Mutex;

use bevy_ecs::prelude::Resource;
use thiserror::Error;

use crate::service_area::{NamedPlace, ServiceArea};
use crate::spatial::Coordinate;

#[derive(Debug, Clone)]
pub enum FleetCommand {
    /// Redirect a vehicle to a new destination, abandoning its current route.
    Reroute {
        vehicle_id: String,
        destination: Coordinate,
        destination_name: Option<String>,
    },
    /// Flag a vehicle to pull over; movement pauses until cleared.
    PullOver { vehicle_id: String },
}

/// Thread-safe command inbox, drained once per tick.
#[derive(Default, Resource)]
pub struct CommandQueue {
    inner: Mutex<VecDeque<FleetCommand>>,
}

impl CommandQueue {
    pub fn push(&self, command: FleetCommand) {
        self.inner.lock().expect("command queue lock").push_back(command);
    }

    pub fn drain(&self) -> Vec<FleetCommand> {
        self.inner.lock().expect("command queue lock").drain(..).collect()
    }
}

#[derive(Debug, Error)]
pub enum RerouteError {
    #[error("no address matches {0:?}")]
    UnknownAddress(String),
}

/// Resolve a free-text destination against the service-area address book.
pub fn resolve_address(area: &ServiceArea, query: &str) -> Result<NamedPlace, RerouteError> {
    area.geocode(query)
        .cloned()
        .ok_or_else(|| RerouteError::UnknownAddress(query.to_string()))
}
