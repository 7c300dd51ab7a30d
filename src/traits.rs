//! Collaborator boundaries consumed by the planner.
//!
//! The planner never holds a concrete network client; it only sees a
//! `RouteProvider`, so any backend (or a fake) can be plugged in.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::point::Coordinates;

/// Ordered waypoints to route through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRequest {
    pub waypoints: Vec<Coordinates>,
    /// Let the provider reorder every waypoint except the first.
    pub optimize: bool,
}

/// Distance and travel time between two consecutive waypoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

/// What a provider returns for one route.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouteDescriptor {
    /// Visit order of waypoints `1..N`, as 0-based indices into that
    /// sub-list. Only present when optimization was requested.
    pub permutation: Option<Vec<usize>>,
    /// Encoded path per provider step, in travel order.
    pub segments: Vec<String>,
    pub legs: Vec<RouteLeg>,
    pub label: String,
}

impl RouteDescriptor {
    pub fn summary(&self) -> RouteSummary {
        RouteSummary {
            distance_meters: self.legs.iter().map(|leg| leg.distance_meters).sum(),
            duration_seconds: self.legs.iter().map(|leg| leg.duration_seconds).sum(),
            label: if self.label.trim().is_empty() {
                "Route".to_string()
            } else {
                self.label.clone()
            },
        }
    }
}

/// Totals shown next to a drawn route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub distance_meters: f64,
    pub duration_seconds: f64,
    pub label: String,
}

impl RouteSummary {
    /// Kilometres, one decimal.
    pub fn distance_km(&self) -> f64 {
        (self.distance_meters / 100.0).round() / 10.0
    }

    pub fn duration_minutes(&self) -> u64 {
        (self.duration_seconds / 60.0).round().max(0.0) as u64
    }
}

impl fmt::Display for RouteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {:.1} km, {} min",
            self.label,
            self.distance_km(),
            self.duration_minutes()
        )
    }
}

/// Computes a route through ordered waypoints.
pub trait RouteProvider {
    fn compute_route(&self, request: &RouteRequest) -> Result<RouteDescriptor, ProviderError>;
}

impl<P: RouteProvider + ?Sized> RouteProvider for &P {
    fn compute_route(&self, request: &RouteRequest) -> Result<RouteDescriptor, ProviderError> {
        (**self).compute_route(request)
    }
}

impl<P: RouteProvider + ?Sized> RouteProvider for Box<P> {
    fn compute_route(&self, request: &RouteRequest) -> Result<RouteDescriptor, ProviderError> {
        (**self).compute_route(request)
    }
}
