//! Folds a provider-computed visit permutation back into the model.
//!
//! The optimizer keeps waypoint 0 fixed as the origin and only permutes the
//! remaining waypoints, so its permutation is indexed over `1..N`.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::error::ReconcileError;
use crate::ordering::OrderingModel;
use crate::point::{DeliveryPoint, PointId, RoutePolicy};

impl OrderingModel {
    /// The exact point ordering that is sent as waypoints for `policy`.
    ///
    /// Rebuilt from stable keys so that a response can be matched against
    /// the sequence its request was built from.
    pub fn base_sequence(&self, policy: RoutePolicy) -> Vec<&DeliveryPoint> {
        match policy {
            RoutePolicy::Priority => self.sorted_view(RoutePolicy::Priority),
            RoutePolicy::Shortest => {
                let mut base: Vec<&DeliveryPoint> = self.points.iter().collect();
                base.sort_by_key(|p| (p.created_order, p.order));
                base
            }
        }
    }

    /// Rewrites every `order` from a provider permutation.
    ///
    /// For `Shortest`, `permutation[k]` is the 0-based index, among the
    /// non-origin waypoints, of the stop visited `k`-th after the origin. For
    /// `Priority` no optimization happened and the priority view is committed
    /// as is. On error the model is left untouched.
    pub fn apply_optimized_order(
        &mut self,
        permutation: &[usize],
        source_policy: RoutePolicy,
    ) -> Result<(), ReconcileError> {
        if self.points.is_empty() {
            return Err(ReconcileError::Empty);
        }

        match source_policy {
            RoutePolicy::Priority => {
                self.commit_order(RoutePolicy::Priority);
                Ok(())
            }
            RoutePolicy::Shortest => {
                let base: Vec<PointId> = self
                    .base_sequence(RoutePolicy::Shortest)
                    .iter()
                    .map(|p| p.id())
                    .collect();
                let reordered = resolve_permutation(&base, permutation)?;
                debug!(stops = reordered.len(), "optimized order applied");
                self.assign_order(&reordered);
                Ok(())
            }
        }
    }
}

/// Maps `[0] ++ (permutation + 1)` onto `base`.
fn resolve_permutation(base: &[PointId], permutation: &[usize]) -> Result<Vec<PointId>, ReconcileError> {
    let expected = base.len().saturating_sub(1);
    if permutation.len() != expected {
        warn!(
            permutation = permutation.len(),
            expected, "permutation length does not match base sequence"
        );
        return Err(ReconcileError::LengthMismatch {
            permutation: permutation.len(),
            expected,
        });
    }

    let mut seen = HashSet::with_capacity(base.len());
    let reordered: Vec<PointId> = std::iter::once(Some(0))
        .chain(permutation.iter().map(|index| index.checked_add(1)))
        .filter_map(|index| index.and_then(|index| base.get(index).copied()))
        .filter(|id| seen.insert(*id))
        .collect();

    if reordered.is_empty() {
        return Err(ReconcileError::Empty);
    }
    if reordered.len() != base.len() {
        return Err(ReconcileError::Unresolved {
            resolved: reordered.len(),
            expected: base.len(),
        });
    }
    Ok(reordered)
}
