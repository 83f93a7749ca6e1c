//! Static service-area data: the Compton, CA operating boundary, fleet
//! start locations, charging stations and the address book used for trip
//! generation and free-text geocoding.
//!
//! Everything here is configuration, not computation: loaded once at startup
//! and shared read-only across systems.

use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::geofence::Geofence;
use crate::spatial::Coordinate;

/// A coordinate with a display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedPlace {
    pub name: String,
    pub position: Coordinate,
}

impl NamedPlace {
    pub fn new(name: &str, lat: f64, lng: f64) -> Self {
        Self {
            name: name.to_string(),
            position: Coordinate::new(lat, lng),
        }
    }
}

/// The fixed operating area and its reference points.
#[derive(Debug, Clone, Resource)]
pub struct ServiceArea {
    pub geofence: Arc<Geofence>,
    pub start_locations: Vec<NamedPlace>,
    pub charging_stations: Vec<NamedPlace>,
    pub addresses: Vec<NamedPlace>,
}

impl ServiceArea {
    /// The default service area: Compton, CA.
    pub fn compton() -> Self {
        let ring: Vec<Coordinate> = COMPTON_BOUNDARY
            .iter()
            .map(|&(lat, lng)| Coordinate::new(lat, lng))
            .collect();
        let start_locations: Vec<NamedPlace> = START_LOCATIONS
            .iter()
            .map(|&(name, lat, lng)| NamedPlace::new(name, lat, lng))
            .collect();
        let charging_stations: Vec<NamedPlace> = CHARGING_STATIONS
            .iter()
            .map(|&(name, lat, lng)| NamedPlace::new(name, lat, lng))
            .collect();
        let addresses: Vec<NamedPlace> = ADDRESSES
            .iter()
            .map(|&(name, lat, lng)| NamedPlace::new(name, lat, lng))
            .collect();

        let landmarks = start_locations.iter().map(|p| p.position).collect();
        Self {
            geofence: Arc::new(Geofence::new(ring, landmarks)),
            start_locations,
            charging_stations,
            addresses,
        }
    }

    /// Nearest charging station by Euclidean degree distance.
    pub fn nearest_charging_station(&self, from: Coordinate) -> Option<&NamedPlace> {
        self.charging_stations.iter().min_by(|a, b| {
            from.distance_deg(a.position)
                .total_cmp(&from.distance_deg(b.position))
        })
    }

    /// Case-insensitive lookup of a free-text query against the address
    /// book; the first address whose name contains the query wins.
    pub fn geocode(&self, query: &str) -> Option<&NamedPlace> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.addresses
            .iter()
            .find(|place| place.name.to_lowercase().contains(&needle))
    }

    /// Draw a random address from the book.
    pub fn random_address<R: rand::Rng>(&self, rng: &mut R) -> &NamedPlace {
        &self.addresses[rng.gen_range(0..self.addresses.len())]
    }
}

/// Compton boundary polygon, 154 vertices, closed ring.
const COMPTON_BOUNDARY: &[(f64, f64)] = &[
    (33.90311, -118.26315), (33.90554, -118.26314), (33.90557, -118.26091), (33.9128, -118.26093),
    (33.91283, -118.25446), (33.91732, -118.25434), (33.9173, -118.24504), (33.91782, -118.24504),
    (33.91783, -118.23898), (33.91622, -118.23906), (33.91619, -118.23827), (33.91441, -118.23828),
    (33.91441, -118.23781), (33.91375, -118.23779), (33.91375, -118.2361), (33.90595, -118.2361),
    (33.90742, -118.23062), (33.90773, -118.23078), (33.90781, -118.23037), (33.90752, -118.23028),
    (33.90754, -118.23017), (33.90793, -118.22865), (33.90815, -118.22876), (33.90828, -118.22817),
    (33.90811, -118.22808), (33.90826, -118.22754), (33.9084, -118.22762), (33.90898, -118.22504),
    (33.90872, -118.22271), (33.90883, -118.22237), (33.9198, -118.22409), (33.91983, -118.22803),
    (33.92269, -118.22881), (33.92313, -118.22458), (33.9223, -118.22444), (33.9223, -118.21994),
    (33.92303, -118.21994), (33.92136, -118.21836), (33.91231, -118.21694), (33.91265, -118.21391),
    (33.91306, -118.21384), (33.91062, -118.20641), (33.91262, -118.20583), (33.91059, -118.19849),
    (33.90668, -118.19998), (33.90638, -118.19702), (33.91124, -118.19502), (33.91093, -118.19389),
    (33.90633, -118.19579), (33.90582, -118.19019), (33.9061, -118.1902), (33.90606, -118.18952),
    (33.90734, -118.18932), (33.90707, -118.18674), (33.90537, -118.18705), (33.90564, -118.18964),
    (33.90367, -118.18953), (33.90367, -118.18893), (33.90346, -118.18893), (33.90343, -118.18777),
    (33.90317, -118.18745), (33.90317, -118.1881), (33.90279, -118.1881), (33.90277, -118.18947),
    (33.90222, -118.18943), (33.90223, -118.18893), (33.90196, -118.18893), (33.90196, -118.18842),
    (33.90154, -118.18842), (33.90164, -118.18938), (33.90057, -118.1893), (33.90056, -118.18989),
    (33.8947, -118.18944), (33.89474, -118.18572), (33.89624, -118.18529), (33.89621, -118.18231),
    (33.89425, -118.18225), (33.89427, -118.18169), (33.89262, -118.18159), (33.89273, -118.17995),
    (33.88911, -118.1824), (33.88914, -118.18417), (33.89255, -118.18433), (33.89253, -118.1869),
    (33.88544, -118.18817), (33.8854, -118.18718), (33.88146, -118.18786), (33.88129, -118.20887),
    (33.88083, -118.20887), (33.88082, -118.20852), (33.8748, -118.20857), (33.8748, -118.20814),
    (33.87442, -118.20813), (33.87443, -118.20802), (33.87493, -118.20803), (33.87494, -118.20716),
    (33.87427, -118.20716), (33.87429, -118.2055), (33.8704, -118.20549), (33.87035, -118.20617),
    (33.8729, -118.20691), (33.87372, -118.20697), (33.87357, -118.21611), (33.86951, -118.21546),
    (33.8694, -118.21966), (33.86832, -118.21921), (33.86816, -118.22567), (33.86315, -118.22653),
    (33.86303, -118.23053), (33.86461, -118.23053), (33.86461, -118.23118), (33.86525, -118.2321),
    (33.86655, -118.23216), (33.8665, -118.2342), (33.86734, -118.23424), (33.8673, -118.2356),
    (33.8679, -118.23563), (33.86773, -118.2425), (33.86967, -118.24257), (33.8695, -118.24867),
    (33.87907, -118.24864), (33.87907, -118.24774), (33.88044, -118.24777), (33.88042, -118.24873),
    (33.88202, -118.24874), (33.88187, -118.25381), (33.88026, -118.25343), (33.88003, -118.26125),
    (33.88094, -118.26147), (33.88398, -118.25781), (33.88401, -118.25694), (33.88619, -118.25746),
    (33.88612, -118.25968), (33.88569, -118.25949), (33.88562, -118.25991), (33.88529, -118.25983),
    (33.88525, -118.26116), (33.88609, -118.26136), (33.8861, -118.26087), (33.88667, -118.26101),
    (33.88679, -118.26018), (33.89024, -118.26097), (33.89029, -118.25891), (33.89536, -118.26009),
    (33.89541, -118.25895), (33.89585, -118.25905), (33.8958, -118.25827), (33.89616, -118.25682),
    (33.89626, -118.25247), (33.89768, -118.25278), (33.89768, -118.25243), (33.9028, -118.25376),
    (33.90238, -118.26315), (33.90311, -118.26315),
];

/// Fixed fleet start locations, all inside the boundary.
const START_LOCATIONS: &[(&str, f64, f64)] = &[
    ("Compton City Hall", 33.8958, -118.2201),
    ("Compton College", 33.8897, -118.2189),
    ("Compton Airport", 33.8889, -118.2350),
    ("Compton Library", 33.8950, -118.2200),
    ("Compton High School", 33.8900, -118.2150),
    ("Compton Shopping Center", 33.8850, -118.2000),
    ("Compton Plaza", 33.8800, -118.2100),
    ("Compton Station", 33.8820, -118.2050),
    ("Compton Medical Center", 33.8750, -118.2050),
    ("Compton Community Hospital", 33.8780, -118.2080),
    ("Compton Creek Park", 33.8700, -118.2100),
    ("Compton Park", 33.8650, -118.2200),
    ("Compton Residential Area 1", 33.8900, -118.1900),
    ("Compton Residential Area 2", 33.8850, -118.2300),
    ("Compton Residential Area 3", 33.8800, -118.1950),
];

const CHARGING_STATIONS: &[(&str, f64, f64)] = &[
    ("City Hall Charging Station", 33.8958, -118.2201),
    ("College Charging Station", 33.8897, -118.2189),
    ("Shopping Center Charging Station", 33.8850, -118.2000),
    ("Plaza Charging Station", 33.8800, -118.2100),
    ("Medical Center Charging Station", 33.8750, -118.2050),
];

/// Address book for trip generation and free-text reroute targets.
const ADDRESSES: &[(&str, f64, f64)] = &[
    ("Compton City Hall", 33.8958, -118.2201),
    ("Compton College", 33.8897, -118.2189),
    ("Compton Airport", 33.8889, -118.2350),
    ("Compton Library", 33.8950, -118.2200),
    ("Compton High School", 33.8900, -118.2150),
    ("Compton Shopping Center", 33.8850, -118.2000),
    ("Compton Plaza", 33.8800, -118.2100),
    ("Compton Station", 33.8820, -118.2050),
    ("Compton Medical Center", 33.8750, -118.2050),
    ("Compton Community Hospital", 33.8780, -118.2080),
    ("Compton Creek Park", 33.8700, -118.2100),
    ("Compton Park", 33.8650, -118.2200),
    ("Compton Residential Area 1", 33.8900, -118.1900),
    ("Compton Residential Area 2", 33.8850, -118.2300),
    ("Compton Residential Area 3", 33.8800, -118.1950),
    ("Compton Business District", 33.8950, -118.2250),
    ("Compton Industrial Area", 33.8880, -118.2000),
    ("Compton Elementary School", 33.8750, -118.2150),
    ("Compton Middle School", 33.8820, -118.2100),
    ("Compton Church", 33.8900, -118.2300),
    ("Compton Mosque", 33.8850, -118.1950),
];

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn every_reference_point_constrains_into_the_fence() {
        // Some listed places sit slightly outside the boundary polygon;
        // after one constrain pass everything must be interior.
        let area = ServiceArea::compton();
        for place in area
            .start_locations
            .iter()
            .chain(area.charging_stations.iter())
            .chain(area.addresses.iter())
        {
            let constrained = area.geofence.constrain(place.position);
            assert!(
                area.geofence.contains(constrained),
                "{} does not constrain into the boundary",
                place.name
            );
        }
    }

    #[test]
    fn core_landmarks_are_inside_the_fence() {
        let area = ServiceArea::compton();
        for name in ["Compton City Hall", "Compton College", "Compton Airport"] {
            let place = area.geocode(name).expect("known address");
            assert!(area.geofence.contains(place.position), "{name}");
        }
    }

    #[test]
    fn nearest_charging_station_picks_minimum_distance() {
        let area = ServiceArea::compton();
        let station = area
            .nearest_charging_station(Coordinate::new(33.8960, -118.2200))
            .expect("station");
        assert_eq!(station.name, "City Hall Charging Station");
    }

    #[test]
    fn geocode_matches_case_insensitively() {
        let area = ServiceArea::compton();
        let place = area.geocode("compton airport").expect("address");
        assert_eq!(place.name, "Compton Airport");
        assert!(area.geocode("narnia central").is_none());
        assert!(area.geocode("   ").is_none());
    }

    #[test]
    fn random_address_is_deterministic_for_a_seed() {
        let area = ServiceArea::compton();
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);
        assert_eq!(area.random_address(&mut a), area.random_address(&mut b));
    }
}
