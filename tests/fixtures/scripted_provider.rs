//! Route provider that answers from a script and records requests.

use std::cell::RefCell;
use std::collections::VecDeque;

use delivery_route_planner::error::ProviderError;
use delivery_route_planner::polyline;
use delivery_route_planner::traits::{RouteDescriptor, RouteLeg, RouteProvider, RouteRequest};

/// One scripted answer.
pub enum Reply {
    /// Straight-line geometry through the request, with this permutation.
    Route(Option<Vec<usize>>),
    Fail(ProviderError),
    Raw(RouteDescriptor),
}

#[derive(Default)]
pub struct ScriptedProvider {
    replies: RefCell<VecDeque<Reply>>,
    requests: RefCell<Vec<RouteRequest>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: Reply) -> &Self {
        self.replies.borrow_mut().push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<RouteRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

/// Geometry that follows the waypoints in request order.
pub fn straight_line(request: &RouteRequest, permutation: Option<Vec<usize>>) -> RouteDescriptor {
    let points: Vec<(f64, f64)> = request.waypoints.iter().map(|p| p.as_tuple()).collect();
    RouteDescriptor {
        permutation,
        segments: points.windows(2).map(|pair| polyline::encode(pair)).collect(),
        legs: points
            .windows(2)
            .map(|_| RouteLeg {
                distance_meters: 1000.0,
                duration_seconds: 120.0,
            })
            .collect(),
        label: "scripted".to_string(),
    }
}

impl RouteProvider for ScriptedProvider {
    fn compute_route(&self, request: &RouteRequest) -> Result<RouteDescriptor, ProviderError> {
        self.requests.borrow_mut().push(request.clone());
        match self.replies.borrow_mut().pop_front() {
            Some(Reply::Route(permutation)) => Ok(straight_line(request, permutation)),
            Some(Reply::Fail(err)) => Err(err),
            Some(Reply::Raw(descriptor)) => Ok(descriptor),
            None => Err(ProviderError::Status {
                code: "Unscripted".to_string(),
                message: "no reply queued".to_string(),
            }),
        }
    }
}
