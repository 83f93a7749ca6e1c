//! Tick systems, run in a fixed order every tick.

pub mod battery;
pub mod command_intake;
pub mod dispatch;
pub mod fleet_snapshot;
pub mod movement;
pub mod route_results;
pub mod trip_spawner;
