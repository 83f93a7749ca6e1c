//! Simulated autonomous-vehicle fleet core.
//!
//! A fixed-tick simulation of a small robotaxi fleet inside a geofenced
//! service area: trip generation, nearest-vehicle dispatch, route synthesis
//! with an optional external directions provider, battery management and
//! per-tick state broadcasts.

pub mod broadcast;
pub mod clock;
pub mod commands;
pub mod dispatch;
pub mod ecs;
pub mod geofence;
pub mod routing;
pub mod runner;
pub mod scenario;
pub mod service_area;
pub mod spatial;
pub mod systems;

#[cfg(feature = "test-helpers")]
pub mod test_helpers;
