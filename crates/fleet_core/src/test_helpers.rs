//! Provider stubs shared by unit and integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::routing::{ProviderError, ProviderPath, RouteProvider};
use crate::spatial::Coordinate;

/// Provider that always fails with a transport error.
pub struct FailingRouteProvider;

impl RouteProvider for FailingRouteProvider {
    fn driving_path(
        &self,
        _from: Coordinate,
        _to: Coordinate,
    ) -> Result<ProviderPath, ProviderError> {
        Err(ProviderError::Transport("stubbed failure".into()))
    }
}

/// Provider that returns a fixed straight path and counts calls.
pub struct FixedRouteProvider {
    pub duration_secs: f64,
    calls: AtomicUsize,
}

impl FixedRouteProvider {
    pub fn new(duration_secs: f64) -> Arc<Self> {
        Arc::new(Self {
            duration_secs,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RouteProvider for FixedRouteProvider {
    fn driving_path(&self, from: Coordinate, to: Coordinate) -> Result<ProviderPath, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(provider_path(vec![from, from.lerp(to, 0.5), to], self.duration_secs))
    }
}

/// Build a step-less `ProviderPath` from raw points.
pub fn provider_path(points: Vec<Coordinate>, duration_secs: f64) -> ProviderPath {
    ProviderPath {
        points,
        duration_secs,
        steps: Vec::new(),
    }
}
