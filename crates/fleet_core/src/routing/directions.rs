//! Directions-API route provider (blocking HTTP, behind the `directions`
//! feature).
//!
//! Talks to a Google-Directions-compatible endpoint and optionally a
//! snap-to-roads endpoint. All calls are blocking and are expected to run on
//! fetch-pool worker threads, never inside the tick.

use std::time::Duration;

use log::debug;
use serde::Deserialize;

use crate::routing::{decode_polyline, ProviderError, ProviderPath, ProviderStep, RouteProvider};
use crate::spatial::Coordinate;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);
/// Snap-to-roads endpoints cap path length per request.
const MAX_SNAP_BATCH: usize = 100;

pub struct DirectionsRouteProvider {
    endpoint: String,
    api_key: String,
    snap: Option<SnapClient>,
    client: reqwest::blocking::Client,
}

impl DirectionsRouteProvider {
    pub fn new(endpoint: String, api_key: String, snap_endpoint: Option<String>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        let snap = snap_endpoint.map(|endpoint| SnapClient {
            endpoint,
            api_key: api_key.clone(),
            client: client.clone(),
        });
        Self {
            endpoint,
            api_key,
            snap,
            client,
        }
    }
}

impl RouteProvider for DirectionsRouteProvider {
    fn driving_path(&self, from: Coordinate, to: Coordinate) -> Result<ProviderPath, ProviderError> {
        let url = format!(
            "{}/maps/api/directions/json?origin={},{}&destination={},{}&mode=driving&key={}",
            self.endpoint.trim_end_matches('/'),
            from.lat,
            from.lng,
            to.lat,
            to.lng,
            self.api_key
        );
        let response: DirectionsResponse = self
            .client
            .get(&url)
            .send()
            .map_err(|e| ProviderError::Transport(e.to_string()))?
            .json()
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        if response.status != "OK" {
            return Err(ProviderError::Status(response.status));
        }
        let route = response.routes.first().ok_or(ProviderError::EmptyPath)?;

        let mut path = path_from_route(route)?;
        if let Some(snap) = &self.snap {
            if let Some(snapped) = snap.snap(&path.points) {
                path.points = snapped;
                // Step boundaries no longer line up with snapped geometry.
                path.steps.clear();
            }
        }
        Ok(path)
    }
}

/// Prefer per-step polylines so durations can be spread proportionally;
/// fall back to the overview polyline with even spacing.
fn path_from_route(route: &DirectionsRoute) -> Result<ProviderPath, ProviderError> {
    let leg = route.legs.first().ok_or(ProviderError::EmptyPath)?;
    let duration_secs = leg.duration.value;

    let mut points = Vec::new();
    let mut steps = Vec::new();
    for step in &leg.steps {
        let decoded = decode_polyline(&step.polyline.points)?;
        if decoded.is_empty() {
            continue;
        }
        steps.push(ProviderStep {
            point_count: decoded.len(),
            duration_secs: step.duration.value,
        });
        points.extend(decoded);
    }

    if points.is_empty() {
        points = decode_polyline(&route.overview_polyline.points)?;
        steps.clear();
    }
    if points.len() < 2 {
        return Err(ProviderError::EmptyPath);
    }
    Ok(ProviderPath {
        points,
        duration_secs,
        steps,
    })
}

struct SnapClient {
    endpoint: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl SnapClient {
    /// Snap a path to the road network, batched to the endpoint limit.
    /// Returns `None` on any failure so the caller keeps the unsnapped path.
    fn snap(&self, points: &[Coordinate]) -> Option<Vec<Coordinate>> {
        let mut snapped = Vec::with_capacity(points.len());
        for batch in points.chunks(MAX_SNAP_BATCH) {
            let path: Vec<String> = batch.iter().map(|p| format!("{},{}", p.lat, p.lng)).collect();
            let url = format!(
                "{}/v1/snapToRoads?path={}&interpolate=true&key={}",
                self.endpoint.trim_end_matches('/'),
                path.join("|"),
                self.api_key
            );
            let response: SnapResponse = match self.client.get(&url).send().and_then(|r| r.json()) {
                Ok(r) => r,
                Err(e) => {
                    debug!("snap-to-roads failed, keeping raw geometry: {e}");
                    return None;
                }
            };
            if response.snapped_points.is_empty() {
                return None;
            }
            snapped.extend(
                response
                    .snapped_points
                    .into_iter()
                    .map(|p| Coordinate::new(p.location.latitude, p.location.longitude)),
            );
        }
        Some(snapped)
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Debug, Deserialize)]
struct DirectionsRoute {
    overview_polyline: Polyline,
    legs: Vec<DirectionsLeg>,
}

#[derive(Debug, Deserialize)]
struct DirectionsLeg {
    duration: TextValue,
    #[serde(default)]
    steps: Vec<DirectionsStep>,
}

#[derive(Debug, Deserialize)]
struct DirectionsStep {
    duration: TextValue,
    polyline: Polyline,
}

#[derive(Debug, Deserialize)]
struct Polyline {
    points: String,
}

#[derive(Debug, Deserialize)]
struct TextValue {
    value: f64,
}

#[derive(Debug, Deserialize)]
struct SnapResponse {
    #[serde(rename = "snappedPoints", default)]
    snapped_points: Vec<SnappedPoint>,
}

#[derive(Debug, Deserialize)]
struct SnappedPoint {
    location: SnapLocation,
}

#[derive(Debug, Deserialize)]
struct SnapLocation {
    latitude: f64,
    longitude: f64,
}
