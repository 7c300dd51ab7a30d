//! Error taxonomy for the planner.
//!
//! Nothing here is fatal to the host: every failure degrades to keeping the
//! last known good state plus one of these values for the presentation layer.

use thiserror::Error;

use crate::polyline::PolylineError;

/// Input rejected before any state was touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("invalid coordinates: lat {lat}, lng {lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },
    #[error("at least 2 delivery points are required to draw a route, found {found}")]
    TooFewPoints { found: usize },
    #[error("at most {max} waypoints are allowed, found {found}")]
    TooManyWaypoints { found: usize, max: usize },
}

/// Failure reported by (or while talking to) a route computation provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("route provider request timed out")]
    Timeout,
    #[error(transparent)]
    Http(reqwest::Error),
    #[error("route provider returned status {code}: {message}")]
    Status { code: String, message: String },
    #[error("route provider returned no route")]
    EmptyRoute,
    #[error("route provider returned a malformed response: {0}")]
    Malformed(String),
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else {
            ProviderError::Http(err)
        }
    }
}

/// The provider's permutation could not be folded back into the model.
///
/// Almost always means the point set changed while the call was in flight.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconcileError {
    #[error("permutation covers {permutation} waypoints but {expected} were expected")]
    LengthMismatch { permutation: usize, expected: usize },
    #[error("permutation does not resolve to every live point ({resolved} of {expected})")]
    Unresolved { resolved: usize, expected: usize },
    #[error("point set changed while the route was being computed")]
    BaseChanged,
    #[error("nothing to reconcile")]
    Empty,
}

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("route geometry could not be decoded: {0}")]
    Geometry(#[from] PolylineError),
    #[error("stale route response: {0}")]
    Reconcile(#[from] ReconcileError),
}

pub type PlannerResult<T> = std::result::Result<T, PlannerError>;

impl PlannerError {
    /// Whether the error came from the provider side, as opposed to local input.
    pub fn is_provider_error(&self) -> bool {
        matches!(self, PlannerError::Provider(_) | PlannerError::Geometry(_))
    }
}
