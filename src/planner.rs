//! Route planner session.
//!
//! `RoutePlanner` owns the ordering model and the sync controller, talks to
//! an injected `RouteProvider`, and exposes what the presentation layer needs:
//! the sorted points, the decoded route line, and error/in-flight signals.
//!
//! Drawing is split into `prepare_draw` and `complete_draw` so that a host can
//! keep mutating points while the provider call is in flight; `draw` runs
//! both halves back to back.

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::error::{PlannerError, PlannerResult, ProviderError, ReconcileError, ValidationError};
use crate::ordering::OrderingModel;
use crate::point::{Coordinates, DeliveryPoint, PointDetails, PointId, PointUpdate, Priority, RoutePolicy};
use crate::polyline::Polyline;
use crate::sync::{SyncAction, SyncController, SyncEvent, SyncState};
use crate::traits::{RouteDescriptor, RouteProvider, RouteRequest, RouteSummary};

/// The route currently on screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawnRoute {
    pub policy: RoutePolicy,
    pub path: Polyline,
    pub summary: RouteSummary,
    pub generation: u64,
}

/// A provider request that has been issued but not yet completed.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingDraw {
    generation: u64,
    policy: RoutePolicy,
    request: RouteRequest,
    /// Points in waypoint order at request time.
    sent: Vec<PointId>,
}

impl PendingDraw {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn policy(&self) -> RoutePolicy {
        self.policy
    }

    pub fn request(&self) -> &RouteRequest {
        &self.request
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawOutcome {
    /// Route reconciled and displayed.
    Drawn,
    /// Too few points remained; the route was removed.
    Cleared,
    /// A newer draw was issued, or the route was cleared, in the meantime.
    Superseded,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    Nothing,
    Cleared,
    /// The debounce settled on a drawn route; run this draw.
    Recompute(PendingDraw),
}

pub struct RoutePlanner<P> {
    model: OrderingModel,
    sync: SyncController,
    provider: P,
    config: PlannerConfig,
    policy: RoutePolicy,
    route: Option<DrawnRoute>,
    last_error: Option<String>,
}

impl<P: RouteProvider> RoutePlanner<P> {
    pub fn new(provider: P, config: PlannerConfig) -> Self {
        Self {
            model: OrderingModel::new(config.ranks.clone()),
            sync: SyncController::new(config.debounce()),
            provider,
            config,
            policy: RoutePolicy::default(),
            route: None,
            last_error: None,
        }
    }

    pub fn model(&self) -> &OrderingModel {
        &self.model
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn policy(&self) -> RoutePolicy {
        self.policy
    }

    pub fn route(&self) -> Option<&DrawnRoute> {
        self.route.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn sync_state(&self) -> SyncState {
        self.sync.state()
    }

    pub fn is_recomputing(&self) -> bool {
        self.sync.is_recomputing()
    }

    /// Active policy's view with freshly committed `order` values.
    pub fn sorted_points(&mut self) -> Vec<&DeliveryPoint> {
        self.model.commit_order(self.policy);
        self.model.sorted_view(self.policy)
    }

    pub fn add_point(
        &mut self,
        coordinates: Coordinates,
        details: PointDetails,
        priority: Priority,
        now: Instant,
    ) -> PlannerResult<DeliveryPoint> {
        coordinates.validate()?;
        let point = self.model.add_point(coordinates, details, priority);
        self.sync.step(SyncEvent::Mutated { at: now });
        Ok(point)
    }

    pub fn remove_point(&mut self, id: PointId, now: Instant) -> bool {
        let changed = self.model.remove_point(id);
        self.notify_if(changed, now)
    }

    pub fn update_point(&mut self, id: PointId, update: PointUpdate, now: Instant) -> bool {
        let changed = self.model.update_point(id, update);
        self.notify_if(changed, now)
    }

    pub fn reorder(&mut self, active_id: PointId, target_id: PointId, now: Instant) -> bool {
        let changed = self.model.reorder(active_id, target_id);
        self.notify_if(changed, now)
    }

    pub fn clear_all(&mut self, now: Instant) -> bool {
        let changed = self.model.clear_all();
        self.notify_if(changed, now)
    }

    fn notify_if(&mut self, changed: bool, now: Instant) -> bool {
        if changed {
            self.sync.step(SyncEvent::Mutated { at: now });
        }
        changed
    }

    /// Operator picked a policy. Picking the policy of the route on screen
    /// toggles the route off; any other pick draws, which also retries a
    /// switch that failed earlier.
    pub fn select_policy(&mut self, policy: RoutePolicy, now: Instant) -> PlannerResult<Option<DrawOutcome>> {
        if self.route.as_ref().is_some_and(|route| route.policy == policy) {
            info!(%policy, "route toggled off");
            self.policy = policy;
            self.clear_route();
            return Ok(None);
        }
        self.policy = policy;
        self.draw(now).map(Some)
    }

    /// Removes the displayed route immediately.
    pub fn clear_route(&mut self) {
        self.route = None;
        self.last_error = None;
        self.sync.step(SyncEvent::Cleared);
    }

    /// Draws with the active policy, blocking on the provider.
    pub fn draw(&mut self, now: Instant) -> PlannerResult<DrawOutcome> {
        let pending = self.prepare_draw()?;
        let result = self.provider.compute_route(&pending.request);
        self.complete_draw(pending, result, now)
    }

    /// Validates and builds the provider request for the active policy.
    pub fn prepare_draw(&mut self) -> PlannerResult<PendingDraw> {
        let found = self.model.len();
        if found < 2 {
            return Err(ValidationError::TooFewPoints { found }.into());
        }
        if found > self.config.max_waypoints {
            return Err(ValidationError::TooManyWaypoints {
                found,
                max: self.config.max_waypoints,
            }
            .into());
        }

        let policy = self.policy;
        let base = self.model.base_sequence(policy);
        let sent: Vec<PointId> = base.iter().map(|p| p.id()).collect();
        let request = RouteRequest {
            waypoints: base.iter().map(|p| p.coordinates()).collect(),
            optimize: policy == RoutePolicy::Shortest,
        };
        let generation = self.sync.begin_draw();
        debug!(generation, %policy, waypoints = sent.len(), "draw started");

        Ok(PendingDraw {
            generation,
            policy,
            request,
            sent,
        })
    }

    /// Folds a provider result back into the model and the displayed route.
    pub fn complete_draw(
        &mut self,
        pending: PendingDraw,
        result: Result<RouteDescriptor, ProviderError>,
        now: Instant,
    ) -> PlannerResult<DrawOutcome> {
        let generation = pending.generation;
        if !self.sync.is_current(generation) {
            debug!(generation, "dropping superseded route response");
            return Ok(DrawOutcome::Superseded);
        }

        let descriptor = match result {
            Ok(descriptor) if descriptor.segments.is_empty() => {
                return Err(self.fail(generation, ProviderError::EmptyRoute.into()));
            }
            Ok(descriptor) => descriptor,
            Err(err) => return Err(self.fail(generation, err.into())),
        };
        let path = match Polyline::from_segments(&descriptor.segments) {
            Ok(path) => path,
            Err(err) => return Err(self.fail(generation, err.into())),
        };

        if self.model.len() < 2 {
            info!(generation, live = self.model.len(), "too few points left, clearing route");
            self.clear_route();
            return Ok(DrawOutcome::Cleared);
        }

        if let Err(err) = self.reconcile(&pending, &descriptor) {
            warn!(generation, error = %err, "route response is stale");
            self.sync.step(SyncEvent::DrawStale { generation, at: now });
            let err = PlannerError::from(err);
            self.last_error = Some(err.to_string());
            return Err(err);
        }

        let summary = descriptor.summary();
        info!(generation, policy = %pending.policy, %summary, "route drawn");
        self.route = Some(DrawnRoute {
            policy: pending.policy,
            path,
            summary,
            generation,
        });
        self.last_error = None;
        self.sync.step(SyncEvent::DrawSucceeded { generation, at: now });
        Ok(DrawOutcome::Drawn)
    }

    fn reconcile(&mut self, pending: &PendingDraw, descriptor: &RouteDescriptor) -> Result<(), ReconcileError> {
        let current: Vec<PointId> = self
            .model
            .base_sequence(pending.policy)
            .iter()
            .map(|p| p.id())
            .collect();
        if current != pending.sent {
            return Err(ReconcileError::BaseChanged);
        }

        match pending.policy {
            RoutePolicy::Priority => self.model.apply_optimized_order(&[], RoutePolicy::Priority),
            RoutePolicy::Shortest => {
                let identity: Vec<usize>;
                let permutation = match &descriptor.permutation {
                    Some(permutation) => permutation.as_slice(),
                    None => {
                        identity = (0..pending.sent.len().saturating_sub(1)).collect();
                        identity.as_slice()
                    }
                };
                self.model.apply_optimized_order(permutation, RoutePolicy::Shortest)
            }
        }
    }

    fn fail(&mut self, generation: u64, err: PlannerError) -> PlannerError {
        warn!(generation, error = %err, "route draw failed, keeping previous route");
        self.sync.step(SyncEvent::DrawFailed { generation });
        self.last_error = Some(err.to_string());
        err
    }

    /// Delivers a clock tick to the sync controller.
    pub fn tick(&mut self, now: Instant) -> PlannerResult<TickOutcome> {
        let action = self.sync.step(SyncEvent::Poll {
            now,
            live_points: self.model.len(),
        });
        match action {
            SyncAction::Recompute => match self.prepare_draw() {
                Ok(pending) => Ok(TickOutcome::Recompute(pending)),
                Err(err) => {
                    self.last_error = Some(err.to_string());
                    Err(err)
                }
            },
            SyncAction::ClearRoute => {
                info!("route cleared after points dropped below two");
                self.route = None;
                Ok(TickOutcome::Cleared)
            }
            SyncAction::None | SyncAction::AwaitDraw { .. } => Ok(TickOutcome::Nothing),
        }
    }

    /// `tick` followed by running any recompute against the provider.
    pub fn sync(&mut self, now: Instant) -> PlannerResult<Option<DrawOutcome>> {
        match self.tick(now)? {
            TickOutcome::Nothing => Ok(None),
            TickOutcome::Cleared => Ok(Some(DrawOutcome::Cleared)),
            TickOutcome::Recompute(pending) => {
                let result = self.provider.compute_route(&pending.request);
                self.complete_draw(pending, result, now).map(Some)
            }
        }
    }
}
