//! Outbound fleet state.
//!
//! Once per tick the snapshot system builds a `VehicleUpdate` for every
//! vehicle and a `QueueUpdate` for the waiting list, stamps them all with the
//! tick timestamp and hands them to the configured `Broadcaster`. Consumers
//! apply updates through `LatestFleetState`, which drops anything not newer
//! than what it already holds, so late or reordered deliveries cannot roll a
//! vehicle backwards.

use std::collections::HashMap;
use std::sync::{mpsc, Arc, Mutex};

use bevy_ecs::prelude::Resource;
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::dispatch::TripRequest;
use crate::ecs::{VehicleKind, VehicleStatus};
use crate::spatial::Coordinate;

/// Per-vehicle wire snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUpdate {
    pub id: String,
    pub kind: VehicleKind,
    pub status: VehicleStatus,
    pub lat: f64,
    pub lng: f64,
    /// Whole percent.
    pub battery: u8,
    pub speed_mph: f64,
    /// Remaining route geometry for map rendering; empty when idle.
    pub route: Vec<Coordinate>,
    pub route_cursor: usize,
    /// Route completion, 0-100.
    pub progress: f64,
    pub eta: String,
    /// Heading in degrees, 0 = north.
    pub heading: f64,
    pub pull_over_requested: bool,
    pub diagnostics: VehicleDiagnostics,
    pub updated_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueUpdate {
    pub requests: Vec<TripRequest>,
    pub updated_at: u64,
}

/// One message on the broadcast channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FleetEvent {
    Vehicle(VehicleUpdate),
    Queue(QueueUpdate),
}

/// Sink for outbound fleet events.
pub trait Broadcaster: Send + Sync {
    fn publish(&self, event: FleetEvent);
}

#[derive(Clone, Resource)]
pub struct BroadcasterResource(pub Arc<dyn Broadcaster>);

/// Fan-out broadcaster over std channels. Subscribers that hang up are
/// pruned on the next publish.
#[derive(Default)]
pub struct ChannelBroadcaster {
    senders: Mutex<Vec<mpsc::Sender<FleetEvent>>>,
}

impl ChannelBroadcaster {
    pub fn subscribe(&self) -> mpsc::Receiver<FleetEvent> {
        let (tx, rx) = mpsc::channel();
        self.senders.lock().expect("broadcast lock").push(tx);
        rx
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn publish(&self, event: FleetEvent) {
        let mut senders = self.senders.lock().expect("broadcast lock");
        senders.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

/// Broadcaster that drops everything. Used when no consumer is attached.
pub struct NullBroadcaster;

impl Broadcaster for NullBroadcaster {
    fn publish(&self, _event: FleetEvent) {}
}

/// Subscriber-side view that only moves forward in time.
#[derive(Debug, Default)]
pub struct LatestFleetState {
    vehicles: HashMap<String, VehicleUpdate>,
    queue: Option<QueueUpdate>,
}

impl LatestFleetState {
    /// Apply an event if it is newer than the held state. Returns false when
    /// the event was stale and dropped.
    pub fn apply(&mut self, event: FleetEvent) -> bool {
        match event {
            FleetEvent::Vehicle(update) => {
                if let Some(held) = self.vehicles.get(&update.id) {
                    if update.updated_at <= held.updated_at {
                        return false;
                    }
                }
                self.vehicles.insert(update.id.clone(), update);
                true
            }
            FleetEvent::Queue(update) => {
                if let Some(held) = &self.queue {
                    if update.updated_at <= held.updated_at {
                        return false;
                    }
                }
                self.queue = Some(update);
                true
            }
        }
    }

    pub fn vehicle(&self, id: &str) -> Option<&VehicleUpdate> {
        self.vehicles.get(id)
    }

    pub fn vehicles(&self) -> impl Iterator<Item = &VehicleUpdate> {
        self.vehicles.values()
    }

    pub fn queue(&self) -> Option<&QueueUpdate> {
        self.queue.as_ref()
    }
}

/// Optional per-tick snapshot persistence hook.
pub trait SnapshotSink: Send + Sync {
    fn record(&self, tick: u64, vehicles: &[VehicleUpdate], queue: &QueueUpdate);
}

#[derive(Clone, Resource)]
pub struct SnapshotSinkResource(pub Arc<dyn SnapshotSink>);

/// Cosmetic sensor readouts attached to each update. Battery health follows
/// the charge level; the rest wobbles within nominal ranges.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleDiagnostics {
    pub battery_health: String,
    pub tire_pressure_psi: [f64; 4],
    pub camera_status: String,
    pub lidar_status: String,
    pub gps_accuracy_m: f64,
}

impl VehicleDiagnostics {
    pub fn sample(battery: f64, rng: &mut StdRng) -> Self {
        let battery_health = if battery >= 60.0 {
            "good"
        } else if battery >= 25.0 {
            "fair"
        } else {
            "low"
        };
        let mut tires = [0.0f64; 4];
        for t in &mut tires {
            *t = 40.0 + rng.gen::<f64>() * 4.0;
        }
        Self {
            battery_health: battery_health.to_string(),
            tire_pressure_psi: tires,
            camera_status: "online".to_string(),
            lidar_status: "online".to_string(),
            gps_accuracy_m: 1.0 + rng.gen::<f64>() * 2.0,
        }
    }
}

/// Dedicated RNG for diagnostics noise so it never perturbs simulation
/// randomness.
#[derive(Resource)]
pub struct BroadcastRng(pub StdRng);
