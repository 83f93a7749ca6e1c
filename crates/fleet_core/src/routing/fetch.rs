//! Off-thread provider fetches.
//!
//! Provider calls block on HTTP, so they never run inside the tick. A fetch
//! is spawned on its own thread and its outcome comes back over a channel,
//! tagged with the route generation it was requested under. The apply system
//! drains the channel each tick and drops anything whose generation no longer
//! matches the vehicle.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;

use bevy_ecs::prelude::{Entity, Resource};
use log::debug;

use crate::routing::{ProviderError, ProviderPath, RouteProvider};
use crate::spatial::Coordinate;

/// Result of one fetch request, one `ProviderPath` per requested leg.
#[derive(Debug)]
pub struct RouteFetchOutcome {
    pub vehicle: Entity,
    pub generation: u64,
    pub result: Result<Vec<ProviderPath>, ProviderError>,
}

#[derive(Resource)]
pub struct RouteFetchPool {
    tx: Sender<RouteFetchOutcome>,
    rx: Mutex<Receiver<RouteFetchOutcome>>,
}

impl Default for RouteFetchPool {
    fn default() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }
}

impl RouteFetchPool {
    /// Fetch all `legs` in order on a worker thread. The outcome carries the
    /// given generation; a single failed leg fails the whole fetch.
    pub fn spawn_fetch(
        &self,
        provider: Arc<dyn RouteProvider>,
        vehicle: Entity,
        generation: u64,
        legs: Vec<(Coordinate, Coordinate)>,
    ) {
        let tx = self.tx.clone();
        thread::spawn(move || {
            let result = legs
                .into_iter()
                .map(|(from, to)| provider.driving_path(from, to))
                .collect::<Result<Vec<_>, _>>();
            // The receiver may be gone during shutdown.
            if tx
                .send(RouteFetchOutcome {
                    vehicle,
                    generation,
                    result,
                })
                .is_err()
            {
                debug!("route fetch result dropped, pool receiver closed");
            }
        });
    }

    /// Collect every outcome that has arrived so far, without blocking.
    pub fn drain(&self) -> Vec<RouteFetchOutcome> {
        self.rx.lock().expect("fetch pool lock").try_iter().collect()
    }

    /// Push an outcome directly, bypassing the worker thread.
    #[cfg(feature = "test-helpers")]
    pub fn inject(&self, outcome: RouteFetchOutcome) {
        self.tx.send(outcome).expect("fetch pool receiver alive");
    }
}
