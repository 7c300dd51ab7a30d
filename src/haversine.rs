//! Haversine route provider (fallback when OSRM unavailable).
//!
//! Routes are straight lines between waypoints and travel time comes from an
//! assumed speed. Less accurate than OSRM (ignores roads) but always
//! available, and deterministic enough to drive the planner offline.

use rayon::prelude::*;
use tracing::debug;

use crate::error::ProviderError;
use crate::polyline;
use crate::traits::{RouteDescriptor, RouteLeg, RouteProvider, RouteRequest};

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_KMH: f64 = 40.0;

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Upper bound on 2-opt passes.
const MAX_IMPROVEMENT_PASSES: usize = 100;

#[derive(Debug, Clone)]
pub struct HaversineRouter {
    /// Assumed average driving speed in km/h.
    pub speed_kmh: f64,
}

impl Default for HaversineRouter {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
        }
    }
}

impl HaversineRouter {
    pub fn new(speed_kmh: f64) -> Self {
        Self { speed_kmh }
    }

    /// Calculate haversine distance between two points in kilometers.
    pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
        let (lat1, lng1) = from;
        let (lat2, lng2) = to;

        let lat1_rad = lat1.to_radians();
        let lat2_rad = lat2.to_radians();
        let delta_lat = (lat2 - lat1).to_radians();
        let delta_lng = (lng2 - lng1).to_radians();

        let a = (delta_lat / 2.0).sin().powi(2)
            + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
        let c = 2.0 * a.sqrt().asin();

        EARTH_RADIUS_KM * c
    }

    fn km_to_seconds(&self, km: f64) -> f64 {
        km / self.speed_kmh * 3600.0
    }
}

impl RouteProvider for HaversineRouter {
    fn compute_route(&self, request: &RouteRequest) -> Result<RouteDescriptor, ProviderError> {
        if request.waypoints.len() < 2 {
            return Err(ProviderError::EmptyRoute);
        }
        let points: Vec<(f64, f64)> = request.waypoints.iter().map(|p| p.as_tuple()).collect();

        let (visit, permutation) = if request.optimize {
            let matrix = distance_matrix(&points);
            let tour = optimize_open_tour(&matrix);
            let permutation: Vec<usize> = tour.iter().skip(1).map(|index| index - 1).collect();
            (tour, Some(permutation))
        } else {
            ((0..points.len()).collect::<Vec<_>>(), None)
        };

        let mut legs = Vec::with_capacity(visit.len() - 1);
        let mut segments = Vec::with_capacity(visit.len() - 1);
        for pair in visit.windows(2) {
            let (from, to) = (points[pair[0]], points[pair[1]]);
            let km = Self::haversine_km(from, to);
            legs.push(RouteLeg {
                distance_meters: km * 1000.0,
                duration_seconds: self.km_to_seconds(km),
            });
            segments.push(polyline::encode(&[from, to]));
        }
        debug!(stops = visit.len(), optimize = request.optimize, "straight-line route computed");

        Ok(RouteDescriptor {
            permutation,
            segments,
            legs,
            label: "Straight-line estimate".to_string(),
        })
    }
}

fn distance_matrix(points: &[(f64, f64)]) -> Vec<Vec<f64>> {
    points
        .par_iter()
        .map(|from| {
            points
                .iter()
                .map(|to| HaversineRouter::haversine_km(*from, *to))
                .collect()
        })
        .collect()
}

fn path_length(tour: &[usize], matrix: &[Vec<f64>]) -> f64 {
    tour.windows(2).map(|pair| matrix[pair[0]][pair[1]]).sum()
}

/// Open tour starting at waypoint 0: nearest-neighbour seed, then 2-opt.
fn optimize_open_tour(matrix: &[Vec<f64>]) -> Vec<usize> {
    let n = matrix.len();
    let mut tour = Vec::with_capacity(n);
    let mut remaining: Vec<usize> = (1..n).collect();
    let mut current = 0;
    tour.push(current);
    while !remaining.is_empty() {
        let mut best = 0;
        for (slot, candidate) in remaining.iter().enumerate() {
            if matrix[current][*candidate] < matrix[current][remaining[best]] {
                best = slot;
            }
        }
        current = remaining.remove(best);
        tour.push(current);
    }

    for _ in 0..MAX_IMPROVEMENT_PASSES {
        if !two_opt_improve(&mut tour, matrix) {
            break;
        }
    }
    tour
}

/// Reverses one segment after the origin if that shortens the path.
/// Returns true if an improvement was made.
fn two_opt_improve(tour: &mut [usize], matrix: &[Vec<f64>]) -> bool {
    let n = tour.len();
    if n < 3 {
        return false;
    }
    let current = path_length(tour, matrix);

    for i in 0..n - 1 {
        for j in i + 2..n {
            let mut candidate = tour.to_vec();
            candidate[i + 1..=j].reverse();
            if path_length(&candidate, matrix) + 1e-9 < current {
                tour[i + 1..=j].reverse();
                return true;
            }
        }
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Coordinates;

    fn waypoints(points: &[(f64, f64)]) -> Vec<Coordinates> {
        points.iter().map(|p| Coordinates::from(*p)).collect()
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = HaversineRouter::haversine_km((41.0, 29.0), (41.0, 29.0));
        assert!(dist < 0.001, "Same point should have ~0 distance");
    }

    #[test]
    fn test_haversine_known_distance() {
        // Istanbul (41.01, 28.98) to Ankara (39.93, 32.86)
        // Actual distance ~350 km
        let dist = HaversineRouter::haversine_km((41.01, 28.98), (39.93, 32.86));
        assert!(dist > 330.0 && dist < 370.0, "Istanbul to Ankara should be ~350km, got {}", dist);
    }

    #[test]
    fn test_reasonable_travel_time() {
        let provider = HaversineRouter::new(40.0);
        // 10 km at 40 km/h = 0.25 hours = 900 seconds
        assert!((provider.km_to_seconds(10.0) - 900.0).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_order_route() {
        let provider = HaversineRouter::default();
        let request = RouteRequest {
            waypoints: waypoints(&[(41.0, 29.0), (41.1, 29.0), (41.2, 29.0)]),
            optimize: false,
        };
        let route = provider.compute_route(&request).unwrap();
        assert_eq!(route.permutation, None);
        assert_eq!(route.legs.len(), 2);
        assert_eq!(route.segments.len(), 2);
        assert!(route.legs[0].distance_meters > 10_000.0);
    }

    #[test]
    fn test_optimized_route_keeps_origin_and_visits_nearest_first() {
        let provider = HaversineRouter::default();
        // inputs on a line, sent out of order: origin, far, near, middle
        let request = RouteRequest {
            waypoints: waypoints(&[(41.0, 29.0), (41.3, 29.0), (41.1, 29.0), (41.2, 29.0)]),
            optimize: true,
        };
        let route = provider.compute_route(&request).unwrap();
        assert_eq!(route.permutation, Some(vec![1, 2, 0]));
    }

    #[test]
    fn test_two_opt_uncrosses_path() {
        // square corners; 0 -> 2 -> 1 -> 3 crosses itself
        let points = [(0.0, 0.0), (0.0, 0.1), (0.1, 0.1), (0.1, 0.0)];
        let matrix = distance_matrix(&points);
        let mut tour = vec![0, 2, 1, 3];
        let before = path_length(&tour, &matrix);
        assert!(two_opt_improve(&mut tour, &matrix));
        assert!(path_length(&tour, &matrix) < before);
        assert_eq!(tour[0], 0);
    }

    #[test]
    fn test_single_waypoint_is_error() {
        let provider = HaversineRouter::default();
        let request = RouteRequest {
            waypoints: waypoints(&[(41.0, 29.0)]),
            optimize: true,
        };
        assert!(matches!(provider.compute_route(&request), Err(ProviderError::EmptyRoute)));
    }
}
