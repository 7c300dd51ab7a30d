//! Monaco locations for realistic test fixtures.
//!
//! Routable with the Geofabrik `europe/monaco` extract.

use delivery_route_planner::point::Coordinates;

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }
}

pub const CASINO: Location = Location::new("Casino de Monte-Carlo", 43.7396, 7.4279);
pub const PALACE: Location = Location::new("Prince's Palace", 43.7314, 7.4200);
pub const MUSEUM: Location = Location::new("Oceanographic Museum", 43.7307, 7.4253);
pub const STADIUM: Location = Location::new("Stade Louis II", 43.7275, 7.4154);
pub const STATION: Location = Location::new("Monaco-Monte-Carlo station", 43.7390, 7.4201);
pub const PORT: Location = Location::new("Port Hercule", 43.7350, 7.4240);
pub const LARVOTTO: Location = Location::new("Larvotto Beach", 43.7447, 7.4345);
pub const GARDEN: Location = Location::new("Jardin Exotique", 43.7317, 7.4125);

pub const ALL: &[Location] = &[
    CASINO, PALACE, MUSEUM, STADIUM, STATION, PORT, LARVOTTO, GARDEN,
];
