//! Service-area containment: point-in-polygon tests and the coarse
//! nearest-landmark correction for out-of-bounds coordinates.

use crate::spatial::Coordinate;

/// Fixed simple polygon bounding the operating area, plus a set of
/// known-interior landmark points used to correct out-of-bounds coordinates.
///
/// `constrain` is a deliberate approximation: instead of projecting onto the
/// polygon boundary, an outside point is moved to the nearest interior
/// landmark. Good enough for a simulation that only needs every stored
/// coordinate to be inside the fence.
#[derive(Debug, Clone)]
pub struct Geofence {
    ring: Vec<Coordinate>,
    lat_min: f64,
    lat_max: f64,
    lng_min: f64,
    lng_max: f64,
    landmarks: Vec<Coordinate>,
}

impl Geofence {
    /// Build a geofence from a closed polygon ring and candidate landmark
    /// points. Landmarks outside the polygon are discarded; if none survive,
    /// the ring centroid is used so `constrain` stays total.
    pub fn new(ring: Vec<Coordinate>, landmarks: Vec<Coordinate>) -> Self {
        debug_assert!(ring.len() >= 3, "polygon needs at least 3 vertices");
        let lat_min = ring.iter().map(|c| c.lat).fold(f64::INFINITY, f64::min);
        let lat_max = ring.iter().map(|c| c.lat).fold(f64::NEG_INFINITY, f64::max);
        let lng_min = ring.iter().map(|c| c.lng).fold(f64::INFINITY, f64::min);
        let lng_max = ring.iter().map(|c| c.lng).fold(f64::NEG_INFINITY, f64::max);

        let mut fence = Self {
            ring,
            lat_min,
            lat_max,
            lng_min,
            lng_max,
            landmarks: Vec::new(),
        };

        let mut interior: Vec<Coordinate> = landmarks
            .into_iter()
            .filter(|p| fence.contains(*p))
            .collect();
        if interior.is_empty() {
            let n = fence.ring.len() as f64;
            let lat = fence.ring.iter().map(|c| c.lat).sum::<f64>() / n;
            let lng = fence.ring.iter().map(|c| c.lng).sum::<f64>() / n;
            interior.push(Coordinate::new(lat, lng));
        }
        fence.landmarks = interior;
        fence
    }

    /// Axis-aligned bounding box check; cheap pre-filter for `contains`.
    pub fn in_bounding_box(&self, p: Coordinate) -> bool {
        p.lat >= self.lat_min
            && p.lat <= self.lat_max
            && p.lng >= self.lng_min
            && p.lng <= self.lng_max
    }

    /// Ray-casting crossing-number test. Counts crossings of a horizontal
    /// ray from `p` against every polygon edge; inside iff the count is odd.
    /// Works for any simple polygon, convex or not.
    pub fn contains(&self, p: Coordinate) -> bool {
        if !self.in_bounding_box(p) {
            return false;
        }
        let mut inside = false;
        let mut j = self.ring.len() - 1;
        for i in 0..self.ring.len() {
            let (xi, yi) = (self.ring[i].lng, self.ring[i].lat);
            let (xj, yj) = (self.ring[j].lng, self.ring[j].lat);
            let crosses = ((yi > p.lat) != (yj > p.lat))
                && (p.lng < (xj - xi) * (p.lat - yi) / (yj - yi) + xi);
            if crosses {
                inside = !inside;
            }
            j = i;
        }
        inside
    }

    /// Interior points pass through unchanged; everything else moves to the
    /// nearest interior landmark by Euclidean degree distance. Idempotent.
    pub fn constrain(&self, p: Coordinate) -> Coordinate {
        if self.contains(p) {
            return p;
        }
        let mut best = self.landmarks[0];
        let mut best_dist = p.distance_deg(best);
        for landmark in &self.landmarks[1..] {
            let dist = p.distance_deg(*landmark);
            if dist < best_dist {
                best = *landmark;
                best_dist = dist;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_fence() -> Geofence {
        Geofence::new(
            vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 10.0),
                Coordinate::new(10.0, 10.0),
                Coordinate::new(10.0, 0.0),
            ],
            vec![Coordinate::new(5.0, 5.0), Coordinate::new(1.0, 1.0)],
        )
    }

    /// L-shaped (concave) polygon: the notch at the top-right is outside.
    fn l_shaped_fence() -> Geofence {
        Geofence::new(
            vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 10.0),
                Coordinate::new(5.0, 10.0),
                Coordinate::new(5.0, 5.0),
                Coordinate::new(10.0, 5.0),
                Coordinate::new(10.0, 0.0),
            ],
            vec![Coordinate::new(2.0, 2.0)],
        )
    }

    #[test]
    fn contains_accepts_interior_points() {
        let fence = square_fence();
        assert!(fence.contains(Coordinate::new(5.0, 5.0)));
        assert!(fence.contains(Coordinate::new(0.5, 9.5)));
    }

    #[test]
    fn contains_rejects_points_far_outside_bounding_box() {
        let fence = square_fence();
        assert!(!fence.contains(Coordinate::new(50.0, 50.0)));
        assert!(!fence.contains(Coordinate::new(-20.0, 5.0)));
    }

    #[test]
    fn contains_handles_concave_polygons() {
        let fence = l_shaped_fence();
        assert!(fence.contains(Coordinate::new(2.0, 8.0)));
        assert!(fence.contains(Coordinate::new(8.0, 2.0)));
        // Inside the bounding box but in the notch.
        assert!(!fence.contains(Coordinate::new(8.0, 8.0)));
    }

    #[test]
    fn constrain_is_identity_for_interior_points() {
        let fence = square_fence();
        let p = Coordinate::new(3.0, 7.0);
        assert_eq!(fence.constrain(p), p);
    }

    #[test]
    fn constrain_moves_outside_points_to_nearest_landmark() {
        let fence = square_fence();
        // Closer to (1, 1) than to (5, 5).
        let corrected = fence.constrain(Coordinate::new(-1.0, -1.0));
        assert_eq!(corrected, Coordinate::new(1.0, 1.0));
        let corrected = fence.constrain(Coordinate::new(11.0, 11.0));
        assert_eq!(corrected, Coordinate::new(5.0, 5.0));
    }

    #[test]
    fn constrain_is_idempotent() {
        let fence = square_fence();
        let p = Coordinate::new(100.0, 100.0);
        let once = fence.constrain(p);
        assert_eq!(fence.constrain(once), once);
    }

    #[test]
    fn exterior_landmarks_are_discarded() {
        let fence = Geofence::new(
            vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 10.0),
                Coordinate::new(10.0, 10.0),
                Coordinate::new(10.0, 0.0),
            ],
            vec![Coordinate::new(50.0, 50.0), Coordinate::new(5.0, 5.0)],
        );
        assert_eq!(
            fence.constrain(Coordinate::new(60.0, 60.0)),
            Coordinate::new(5.0, 5.0)
        );
    }
}
