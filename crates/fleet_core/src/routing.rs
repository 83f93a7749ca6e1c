//! Route synthesis.
//!
//! Routes come from one of two places behind a single interface: an external
//! directions provider (optional, feature-gated, fetched off-thread) or a
//! deterministic synthetic generator that bends a curved path between the
//! endpoints. The synthesizer always succeeds; provider failures degrade to
//! the synthetic path.

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};

use bevy_ecs::prelude::Resource;
use log::debug;
use lru::LruCache;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::geofence::Geofence;
use crate::spatial::Coordinate;

#[cfg(feature = "directions")]
pub mod directions;
pub mod fetch;

/// A timed waypoint along a route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoutePoint {
    pub position: Coordinate,
    /// Absolute simulated timestamp (ms) at which the vehicle should reach
    /// this point.
    pub timestamp_ms: u64,
}

/// A route a vehicle follows point by point. Timestamps are strictly
/// increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub points: Vec<RoutePoint>,
    /// For trip routes, the index of the pickup point: the last point of the
    /// approach leg. `None` for single-leg routes.
    pub pickup_boundary: Option<usize>,
}

impl Route {
    pub fn new(points: Vec<RoutePoint>) -> Self {
        debug_assert!(
            points.windows(2).all(|w| w[0].timestamp_ms < w[1].timestamp_ms),
            "route timestamps must be strictly increasing"
        );
        Self {
            points,
            pickup_boundary: None,
        }
    }

    /// Join an approach leg and a dropoff leg into one trip route. The
    /// boundary marks where pickup completes.
    pub fn concat_trip(approach: Route, dropoff: Route) -> Self {
        let boundary = approach.points.len().saturating_sub(1);
        let mut points = approach.points;
        points.extend(dropoff.points);
        let mut route = Route::new(points);
        route.pickup_boundary = Some(boundary);
        route
    }

    pub fn start(&self) -> Option<Coordinate> {
        self.points.first().map(|p| p.position)
    }

    pub fn end(&self) -> Option<Coordinate> {
        self.points.last().map(|p| p.position)
    }
}

/// Geometry and timing as returned by a provider, before geofence
/// constraining and timestamp assignment.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderPath {
    pub points: Vec<Coordinate>,
    pub duration_secs: f64,
    /// Per-step breakdown when the provider supplies one; used to spread
    /// the duration proportionally over the geometry. Empty means even
    /// spacing.
    pub steps: Vec<ProviderStep>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProviderStep {
    pub point_count: usize,
    pub duration_secs: f64,
}

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("provider returned status {0}")]
    Status(String),
    #[error("provider returned an empty path")]
    EmptyPath,
    #[error("failed to decode provider payload: {0}")]
    Decode(String),
}

/// An external source of driving paths.
pub trait RouteProvider: Send + Sync {
    fn driving_path(&self, from: Coordinate, to: Coordinate) -> Result<ProviderPath, ProviderError>;
}

/// LRU wrapper around a provider. Keys quantize the endpoints to about a
/// meter so nearby requests share an entry.
pub struct CachedRouteProvider {
    inner: Arc<dyn RouteProvider>,
    cache: Mutex<LruCache<(i64, i64, i64, i64), ProviderPath>>,
}

impl CachedRouteProvider {
    pub fn new(inner: Arc<dyn RouteProvider>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn key(from: Coordinate, to: Coordinate) -> (i64, i64, i64, i64) {
        let q = |v: f64| (v * 1e5).round() as i64;
        (q(from.lat), q(from.lng), q(to.lat), q(to.lng))
    }
}

impl RouteProvider for CachedRouteProvider {
    fn driving_path(&self, from: Coordinate, to: Coordinate) -> Result<ProviderPath, ProviderError> {
        let key = Self::key(from, to);
        if let Some(hit) = self.cache.lock().expect("cache lock").get(&key) {
            return Ok(hit.clone());
        }
        let path = self.inner.driving_path(from, to)?;
        self.cache
            .lock()
            .expect("cache lock")
            .put(key, path.clone());
        Ok(path)
    }
}

/// Which provider backend to build, if any.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RouteProviderKind {
    /// No external provider; synthetic routes only.
    #[default]
    Synthetic,
    #[cfg(feature = "directions")]
    Directions {
        endpoint: String,
        api_key: String,
        #[serde(default)]
        snap_endpoint: Option<String>,
    },
}

/// Build the configured provider, wrapped in an LRU cache. `None` means
/// synthetic-only operation.
pub fn build_route_provider(kind: &RouteProviderKind) -> Option<Arc<dyn RouteProvider>> {
    match kind {
        RouteProviderKind::Synthetic => None,
        #[cfg(feature = "directions")]
        RouteProviderKind::Directions {
            endpoint,
            api_key,
            snap_endpoint,
        } => {
            let client = directions::DirectionsRouteProvider::new(
                endpoint.clone(),
                api_key.clone(),
                snap_endpoint.clone(),
            );
            Some(Arc::new(CachedRouteProvider::new(Arc::new(client), 256)))
        }
    }
}

/// Tuning for synthetic route generation.
#[derive(Debug, Clone, Copy)]
pub struct SyntheticConfig {
    /// Number of segments the curve is sampled into.
    pub segments: usize,
    /// Simulated milliseconds between consecutive route points.
    pub step_ms: u64,
    /// Curvature and jitter scale in degrees.
    pub curve_factor: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            segments: 15,
            step_ms: 3_000,
            curve_factor: 0.002,
        }
    }
}

/// Turns endpoint pairs into timed, geofence-constrained routes.
///
/// Each synthesis call derives a fresh RNG from the base seed and a call
/// counter, so route shapes are reproducible for a given seed regardless of
/// provider availability.
#[derive(Resource)]
pub struct RouteSynthesizer {
    geofence: Arc<Geofence>,
    provider: Option<Arc<dyn RouteProvider>>,
    synthetic: SyntheticConfig,
    seed: u64,
    calls: u64,
}

impl RouteSynthesizer {
    pub fn new(
        geofence: Arc<Geofence>,
        provider: Option<Arc<dyn RouteProvider>>,
        synthetic: SyntheticConfig,
        seed: u64,
    ) -> Self {
        Self {
            geofence,
            provider,
            synthetic,
            seed,
            calls: 0,
        }
    }

    pub fn provider(&self) -> Option<Arc<dyn RouteProvider>> {
        self.provider.clone()
    }

    pub fn geofence(&self) -> Arc<Geofence> {
        Arc::clone(&self.geofence)
    }

    /// Synthesize a route starting at simulated time `start_at_ms`. Tries the
    /// provider synchronously if one is configured, falling back to the
    /// synthetic curve on any failure. A provider path with fewer than two
    /// points counts as a failure; the result always has at least two.
    pub fn synthesize(&mut self, from: Coordinate, to: Coordinate, start_at_ms: u64) -> Route {
        if let Some(provider) = self.provider.clone() {
            match provider.driving_path(from, to) {
                Ok(path) if path.points.len() >= 2 => {
                    return self.route_from_provider_path(&path, start_at_ms);
                }
                Ok(path) => debug!(
                    "provider returned {} point(s), using synthetic route",
                    path.points.len()
                ),
                Err(err) => debug!("provider path failed, using synthetic route: {err}"),
            }
        }
        self.synthesize_fallback(from, to, start_at_ms)
    }

    /// Deterministic curved path between the constrained endpoints: linear
    /// interpolation plus a sinusoidal lateral bulge and seeded per-point
    /// jitter, so the path is visibly non-straight. Endpoints are exact.
    pub fn synthesize_fallback(
        &mut self,
        from: Coordinate,
        to: Coordinate,
        start_at_ms: u64,
    ) -> Route {
        let mut rng = self.next_rng();
        let from = self.geofence.constrain(from);
        let to = self.geofence.constrain(to);
        let cf = self.synthetic.curve_factor;

        // Lateral direction perpendicular to the chord; the bulge amplitude
        // and sign come from the seeded RNG.
        let dlat = to.lat - from.lat;
        let dlng = to.lng - from.lng;
        let chord = (dlat * dlat + dlng * dlng).sqrt().max(f64::EPSILON);
        let (perp_lat, perp_lng) = (-dlng / chord, dlat / chord);
        let amplitude = (rng.gen::<f64>() - 0.5) * cf * 10.0;

        let segments = self.synthetic.segments.max(1);
        let mut points = Vec::with_capacity(segments + 1);
        for i in 0..=segments {
            let t = i as f64 / segments as f64;
            let position = if i == 0 {
                from
            } else if i == segments {
                to
            } else {
                let base = from.lerp(to, t);
                let bulge = (std::f64::consts::PI * t).sin() * amplitude;
                let lat = base.lat + perp_lat * bulge + (rng.gen::<f64>() - 0.5) * cf;
                let lng = base.lng + perp_lng * bulge + (rng.gen::<f64>() - 0.5) * cf;
                self.geofence.constrain(Coordinate::new(lat, lng))
            };
            points.push(RoutePoint {
                position,
                timestamp_ms: start_at_ms + i as u64 * self.synthetic.step_ms,
            });
        }
        Route::new(points)
    }

    /// Convert provider geometry into a timed route. Every point is
    /// constrained to the geofence; the provider duration is spread over the
    /// points, per step when a breakdown exists, evenly otherwise.
    pub fn route_from_provider_path(&self, path: &ProviderPath, start_at_ms: u64) -> Route {
        let mut points = Vec::with_capacity(path.points.len());
        let total = path.points.len();
        if total == 0 {
            return Route::new(points);
        }

        let offsets = timestamp_offsets_ms(path, total);
        let mut prev_ts = 0u64;
        for (i, &raw) in path.points.iter().enumerate() {
            // Enforce strict monotonicity even when provider steps collapse
            // to zero duration.
            let mut ts = start_at_ms + offsets[i];
            if i > 0 && ts <= prev_ts {
                ts = prev_ts + 1;
            }
            prev_ts = ts;
            points.push(RoutePoint {
                position: self.geofence.constrain(raw),
                timestamp_ms: ts,
            });
        }
        Route::new(points)
    }

    fn next_rng(&mut self) -> StdRng {
        let rng = StdRng::seed_from_u64(self.seed.wrapping_add(self.calls));
        self.calls += 1;
        rng
    }
}

/// Milliseconds from route start for each point index.
fn timestamp_offsets_ms(path: &ProviderPath, total: usize) -> Vec<u64> {
    let mut offsets = vec![0u64; total];
    if total < 2 {
        return offsets;
    }
    let covered: usize = path.steps.iter().map(|s| s.point_count).sum();
    if !path.steps.is_empty() && covered == total {
        let mut index = 0usize;
        let mut elapsed = 0.0f64;
        for step in &path.steps {
            let n = step.point_count;
            for i in 0..n {
                let frac = if n > 1 { i as f64 / (n - 1) as f64 } else { 1.0 };
                offsets[index] = ((elapsed + frac * step.duration_secs) * 1000.0) as u64;
                index += 1;
            }
            elapsed += step.duration_secs;
        }
    } else {
        for (i, slot) in offsets.iter_mut().enumerate() {
            let frac = i as f64 / (total - 1) as f64;
            *slot = (frac * path.duration_secs * 1000.0) as u64;
        }
    }
    offsets
}

/// Decode an encoded polyline (Google polyline algorithm, 1e-5 precision).
pub fn decode_polyline(encoded: &str) -> Result<Vec<Coordinate>, ProviderError> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0usize;
    let mut lat = 0i64;
    let mut lng = 0i64;

    let mut next_delta = |index: &mut usize| -> Result<i64, ProviderError> {
        let mut result = 0i64;
        let mut shift = 0u32;
        loop {
            if *index >= bytes.len() {
                return Err(ProviderError::Decode("truncated polyline".into()));
            }
            let b = bytes[*index] as i64 - 63;
            if b < 0 {
                return Err(ProviderError::Decode("invalid polyline byte".into()));
            }
            *index += 1;
            result |= (b & 0x1f) << shift;
            shift += 5;
            if b < 0x20 {
                break;
            }
        }
        Ok(if result & 1 != 0 {
            !(result >> 1)
        } else {
            result >> 1
        })
    };

    while index < bytes.len() {
        lat += next_delta(&mut index)?;
        lng += next_delta(&mut index)?;
        points.push(Coordinate::new(lat as f64 * 1e-5, lng as f64 * 1e-5));
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_fence() -> Arc<Geofence> {
        Arc::new(Geofence::new(
            vec![
                Coordinate::new(-90.0, -180.0),
                Coordinate::new(-90.0, 180.0),
                Coordinate::new(90.0, 180.0),
                Coordinate::new(90.0, -180.0),
            ],
            vec![Coordinate::new(0.0, 0.0)],
        ))
    }

    #[test]
    fn decode_polyline_matches_reference_vector() {
        let points = decode_polyline("_p~iF~ps|U_ulLnnqC_mqNvxq`@").unwrap();
        assert_eq!(points.len(), 3);
        assert!((points[0].lat - 38.5).abs() < 1e-9);
        assert!((points[0].lng + 120.2).abs() < 1e-9);
        assert!((points[1].lat - 40.7).abs() < 1e-9);
        assert!((points[1].lng + 120.95).abs() < 1e-9);
        assert!((points[2].lat - 43.252).abs() < 1e-9);
        assert!((points[2].lng + 126.453).abs() < 1e-9);
    }

    #[test]
    fn decode_polyline_rejects_truncated_input() {
        assert!(decode_polyline("_p~iF~ps|U_").is_err());
    }

    #[test]
    fn fallback_route_has_exact_endpoints_and_increasing_timestamps() {
        let mut synth = RouteSynthesizer::new(open_fence(), None, SyntheticConfig::default(), 42);
        let from = Coordinate::new(33.89, -118.22);
        let to = Coordinate::new(33.90, -118.20);
        let route = synth.synthesize(from, to, 10_000);

        assert_eq!(route.points.len(), 16);
        assert_eq!(route.start(), Some(from));
        assert_eq!(route.end(), Some(to));
        assert_eq!(route.points[0].timestamp_ms, 10_000);
        assert!(route
            .points
            .windows(2)
            .all(|w| w[0].timestamp_ms < w[1].timestamp_ms));
    }

    #[test]
    fn fallback_routes_are_reproducible_per_seed_and_vary_per_call() {
        let from = Coordinate::new(33.89, -118.22);
        let to = Coordinate::new(33.90, -118.20);

        let mut a = RouteSynthesizer::new(open_fence(), None, SyntheticConfig::default(), 7);
        let mut b = RouteSynthesizer::new(open_fence(), None, SyntheticConfig::default(), 7);
        let first_a = a.synthesize(from, to, 0);
        let first_b = b.synthesize(from, to, 0);
        assert_eq!(first_a, first_b);

        let second_a = a.synthesize(from, to, 0);
        assert_ne!(first_a, second_a);
    }

    #[test]
    fn provider_path_timestamps_follow_step_durations() {
        let synth = RouteSynthesizer::new(open_fence(), None, SyntheticConfig::default(), 0);
        let path = ProviderPath {
            points: vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 1.0),
                Coordinate::new(0.0, 2.0),
                Coordinate::new(0.0, 3.0),
            ],
            duration_secs: 30.0,
            steps: vec![
                ProviderStep {
                    point_count: 2,
                    duration_secs: 10.0,
                },
                ProviderStep {
                    point_count: 2,
                    duration_secs: 20.0,
                },
            ],
        };
        let route = synth.route_from_provider_path(&path, 1_000);
        let ts: Vec<u64> = route.points.iter().map(|p| p.timestamp_ms).collect();
        assert_eq!(ts, vec![1_000, 11_000, 11_001, 31_000]);
    }

    #[test]
    fn concat_trip_marks_the_pickup_boundary() {
        let mut synth = RouteSynthesizer::new(open_fence(), None, SyntheticConfig::default(), 1);
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(1.0, 1.0);
        let c = Coordinate::new(2.0, 0.0);

        let approach = synth.synthesize_fallback(a, b, 0);
        let next_start = approach.points.last().unwrap().timestamp_ms + 3_000;
        let dropoff = synth.synthesize_fallback(b, c, next_start);
        let approach_len = approach.points.len();

        let trip = Route::concat_trip(approach, dropoff);
        assert_eq!(trip.pickup_boundary, Some(approach_len - 1));
        assert_eq!(trip.points[approach_len - 1].position, b);
        assert!(trip
            .points
            .windows(2)
            .all(|w| w[0].timestamp_ms < w[1].timestamp_ms));
    }

    struct FlakyProvider;

    impl RouteProvider for FlakyProvider {
        fn driving_path(
            &self,
            _from: Coordinate,
            _to: Coordinate,
        ) -> Result<ProviderPath, ProviderError> {
            Err(ProviderError::Transport("connection refused".into()))
        }
    }

    #[test]
    fn provider_failure_falls_back_to_synthetic() {
        let mut synth = RouteSynthesizer::new(
            open_fence(),
            Some(Arc::new(FlakyProvider)),
            SyntheticConfig::default(),
            3,
        );
        let route = synth.synthesize(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 1.0), 0);
        assert_eq!(route.points.len(), 16);
    }

    struct SinglePointProvider;

    impl RouteProvider for SinglePointProvider {
        fn driving_path(
            &self,
            from: Coordinate,
            _to: Coordinate,
        ) -> Result<ProviderPath, ProviderError> {
            Ok(ProviderPath {
                points: vec![from],
                duration_secs: 0.0,
                steps: Vec::new(),
            })
        }
    }

    #[test]
    fn degenerate_provider_path_falls_back_to_synthetic() {
        let mut synth = RouteSynthesizer::new(
            open_fence(),
            Some(Arc::new(SinglePointProvider)),
            SyntheticConfig::default(),
            5,
        );
        let from = Coordinate::new(0.0, 0.0);
        let to = Coordinate::new(1.0, 1.0);
        let route = synth.synthesize(from, to, 0);
        assert_eq!(route.points.len(), 16);
        assert_eq!(route.start(), Some(from));
        assert_eq!(route.end(), Some(to));
    }

    struct CountingProvider {
        calls: std::sync::atomic::AtomicUsize,
    }

    impl RouteProvider for CountingProvider {
        fn driving_path(
            &self,
            from: Coordinate,
            to: Coordinate,
        ) -> Result<ProviderPath, ProviderError> {
            self.calls
                .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok(ProviderPath {
                points: vec![from, to],
                duration_secs: 60.0,
                steps: Vec::new(),
            })
        }
    }

    #[test]
    fn cached_provider_serves_repeat_requests_from_cache() {
        let inner = Arc::new(CountingProvider {
            calls: std::sync::atomic::AtomicUsize::new(0),
        });
        let cached = CachedRouteProvider::new(inner.clone(), 8);
        let from = Coordinate::new(33.89, -118.22);
        let to = Coordinate::new(33.90, -118.20);

        cached.driving_path(from, to).unwrap();
        cached.driving_path(from, to).unwrap();
        // Within quantization distance of the first request.
        cached
            .driving_path(Coordinate::new(33.890000004, -118.22), to)
            .unwrap();
        assert_eq!(inner.calls.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
