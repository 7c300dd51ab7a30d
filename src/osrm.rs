//! OSRM HTTP adapter for route computation.
//!
//! Fixed-order requests go to the `route` service. Optimized requests go to
//! the `trip` service with the first waypoint pinned as the source, which
//! matches the origin convention the reconciliation step relies on.

use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::ProviderError;
use crate::traits::{RouteDescriptor, RouteLeg, RouteProvider, RouteRequest};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            profile: "car".to_string(),
            timeout_secs: 15,
        }
    }
}

impl OsrmConfig {
    /// Reads `OSRM_BASE_URL`, `OSRM_PROFILE` and `OSRM_TIMEOUT_SECS`,
    /// keeping defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var("OSRM_BASE_URL") {
            config.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Ok(profile) = std::env::var("OSRM_PROFILE") {
            config.profile = profile;
        }
        if let Some(timeout) = std::env::var("OSRM_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse().ok())
        {
            config.timeout_secs = timeout;
        }
        config
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OsrmConfig {
        &self.config
    }

    fn url(&self, request: &RouteRequest) -> String {
        let coords = request
            .waypoints
            .iter()
            .map(|point| format!("{:.6},{:.6}", point.lng, point.lat))
            .collect::<Vec<_>>()
            .join(";");

        let common = "steps=true&geometries=polyline&overview=false";
        if request.optimize {
            format!(
                "{}/trip/v1/{}/{}?source=first&destination=any&roundtrip=false&{}",
                self.config.base_url, self.config.profile, coords, common
            )
        } else {
            format!(
                "{}/route/v1/{}/{}?{}",
                self.config.base_url, self.config.profile, coords, common
            )
        }
    }
}

impl RouteProvider for OsrmClient {
    fn compute_route(&self, request: &RouteRequest) -> Result<RouteDescriptor, ProviderError> {
        let url = self.url(request);
        debug!(
            waypoints = request.waypoints.len(),
            optimize = request.optimize,
            "requesting OSRM route"
        );

        let body = self
            .client
            .get(url)
            .send()
            .and_then(|resp| resp.error_for_status())
            .and_then(|resp| resp.json::<OsrmResponse>())
            .map_err(|err| {
                warn!(error = %err, "OSRM request failed");
                ProviderError::from(err)
            })?;

        body.into_descriptor(request)
    }
}

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
    #[serde(default)]
    trips: Vec<OsrmRoute>,
    #[serde(default)]
    waypoints: Vec<OsrmWaypoint>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    distance: f64,
    duration: f64,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    geometry: String,
}

#[derive(Debug, Deserialize)]
struct OsrmWaypoint {
    #[serde(default)]
    waypoint_index: Option<usize>,
}

impl OsrmResponse {
    fn into_descriptor(self, request: &RouteRequest) -> Result<RouteDescriptor, ProviderError> {
        if self.code != "Ok" {
            return Err(ProviderError::Status {
                message: self.message.unwrap_or_default(),
                code: self.code,
            });
        }

        let permutation = if request.optimize {
            Some(trip_permutation(&self.waypoints)?)
        } else {
            None
        };

        let routes = if request.optimize { self.trips } else { self.routes };
        let route = routes
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyRoute)?;

        let mut segments = Vec::new();
        let mut legs = Vec::with_capacity(route.legs.len());
        let mut labels = Vec::new();
        for leg in route.legs {
            legs.push(RouteLeg {
                distance_meters: leg.distance,
                duration_seconds: leg.duration,
            });
            if !leg.summary.is_empty() {
                labels.push(leg.summary);
            }
            segments.extend(leg.steps.into_iter().map(|step| step.geometry));
        }
        if segments.is_empty() {
            return Err(ProviderError::EmptyRoute);
        }

        Ok(RouteDescriptor {
            permutation,
            segments,
            legs,
            label: labels.join(", "),
        })
    }
}

/// Converts OSRM trip positions into a permutation over waypoints `1..N`.
///
/// `waypoints[i].waypoint_index` is the position of input `i` in the trip;
/// input 0 must stay first.
fn trip_permutation(waypoints: &[OsrmWaypoint]) -> Result<Vec<usize>, ProviderError> {
    let positions = waypoints
        .iter()
        .map(|waypoint| waypoint.waypoint_index)
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| ProviderError::Malformed("trip waypoint without index".to_string()))?;

    if positions.first().is_some_and(|position| *position != 0) {
        return Err(ProviderError::Malformed("trip does not start at the origin".to_string()));
    }

    let mut by_position: Vec<(usize, usize)> = positions
        .iter()
        .enumerate()
        .skip(1)
        .map(|(input, position)| (*position, input - 1))
        .collect();
    by_position.sort_unstable();
    Ok(by_position.into_iter().map(|(_, index)| index).collect())
}
