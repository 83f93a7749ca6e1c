//! Scenario configuration and world construction.

pub mod build;
pub mod params;

pub use build::build_fleet;
pub use params::FleetParams;
