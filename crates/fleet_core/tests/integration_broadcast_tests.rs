mod support;

use fleet_core::broadcast::{FleetEvent, LatestFleetState};
use support::world::TestWorldBuilder;

#[test]
fn every_update_in_a_tick_shares_one_timestamp() {
    let mut tw = TestWorldBuilder::new().build();
    let rx = tw.subscribe();
    tw.tick();

    let events: Vec<FleetEvent> = rx.try_iter().collect();
    // Three vehicles plus the queue.
    assert_eq!(events.len(), 4);
    let stamps: Vec<u64> = events
        .iter()
        .map(|e| match e {
            FleetEvent::Vehicle(v) => v.updated_at,
            FleetEvent::Queue(q) => q.updated_at,
        })
        .collect();
    assert!(stamps.windows(2).all(|w| w[0] == w[1]));
}

#[test]
fn timestamps_advance_every_tick_and_stale_replays_are_dropped() {
    let mut tw = TestWorldBuilder::new().build();
    let rx = tw.subscribe();
    tw.tick();
    let first: Vec<FleetEvent> = rx.try_iter().collect();
    tw.tick();
    let second: Vec<FleetEvent> = rx.try_iter().collect();

    let mut state = LatestFleetState::default();
    for event in first.iter().chain(second.iter()) {
        assert!(state.apply(event.clone()));
    }
    // Replaying the first tick must not win over the second.
    for event in first {
        assert!(!state.apply(event));
    }

    let vehicle = state.vehicle("vehicle-001").expect("vehicle state");
    let expected = tw
        .world
        .resource::<fleet_core::clock::SimulationClock>()
        .timestamp_ms();
    assert_eq!(vehicle.updated_at, expected);
}

#[test]
fn queue_updates_carry_waiting_requests() {
    let mut tw = TestWorldBuilder::new()
        .with_params(
            fleet_core::scenario::FleetParams::default()
                .with_fleet_size(0)
                .with_new_trip_probability(0.0),
        )
        .build();
    let rx = tw.subscribe();
    tw.push_trip("trip-1", "compton airport", "compton plaza");
    tw.tick();

    let queue = rx
        .try_iter()
        .find_map(|e| match e {
            FleetEvent::Queue(q) => Some(q),
            _ => None,
        })
        .expect("queue update");
    // No vehicles, so the request is still waiting.
    assert_eq!(queue.requests.len(), 1);
    assert_eq!(queue.requests[0].id, "trip-1");
}

#[test]
fn broadcast_payloads_are_json_serializable() {
    let mut tw = TestWorldBuilder::new().build();
    let rx = tw.subscribe();
    tw.tick();

    for event in rx.try_iter() {
        let json = serde_json::to_string(&event).expect("serializable event");
        assert!(json.contains("\"type\""));
    }
}
