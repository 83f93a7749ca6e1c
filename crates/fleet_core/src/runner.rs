//! The tick schedule and the advance-then-run loop.

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::Schedule;

use crate::clock::SimulationClock;
use crate::systems;

/// Build the per-tick schedule. Order matters:
/// commands first so external input lands before movement, snapshot last so
/// it sees the tick's final state. `apply_deferred` flushes component
/// inserts from dispatch before the snapshot runs.
pub fn tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            systems::command_intake::command_intake,
            systems::route_results::apply_route_results,
            systems::movement::movement,
            systems::battery::battery,
            systems::trip_spawner::trip_spawner,
            systems::dispatch::dispatch,
            apply_deferred,
            systems::fleet_snapshot::fleet_snapshot,
        )
            .chain(),
    );
    schedule
}

/// Advance the clock one tick and run the schedule once.
pub fn run_tick(world: &mut World, schedule: &mut Schedule) {
    world.resource_mut::<SimulationClock>().advance();
    schedule.run(world);
}

pub fn run_ticks(world: &mut World, schedule: &mut Schedule, ticks: u64) {
    for _ in 0..ticks {
        run_tick(world, schedule);
    }
}
