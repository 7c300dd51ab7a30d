//! Ordering model: the canonical point collection and its derived views.

use std::collections::HashMap;

use tracing::debug;

use crate::config::PriorityRanks;
use crate::error::ValidationError;
use crate::point::{Coordinates, DeliveryPoint, PointDetails, PointId, PointUpdate, Priority, RoutePolicy};

/// Owns the delivery points and exposes a sorted view per policy.
///
/// Operations on an unknown id are no-ops and report `false`.
#[derive(Debug, Clone, Default)]
pub struct OrderingModel {
    pub(crate) points: Vec<DeliveryPoint>,
    ranks: PriorityRanks,
    next_id: u64,
    /// Highest `created_order` ever handed out, including removed points.
    created_high_water: u32,
}

impl OrderingModel {
    pub fn new(ranks: PriorityRanks) -> Self {
        Self {
            points: Vec::new(),
            ranks,
            next_id: 1,
            created_high_water: 0,
        }
    }

    /// Restores a model from previously exported points.
    ///
    /// Rejects the whole set if any point carries out-of-range coordinates.
    pub fn with_points(ranks: PriorityRanks, points: Vec<DeliveryPoint>) -> Result<Self, ValidationError> {
        for point in &points {
            point.coordinates.validate()?;
        }
        let next_id = points.iter().map(|p| p.id.0).max().unwrap_or(0).saturating_add(1);
        let created_high_water = points.iter().map(|p| p.created_order).max().unwrap_or(0);
        Ok(Self {
            points,
            ranks,
            next_id,
            created_high_water,
        })
    }

    pub fn ranks(&self) -> &PriorityRanks {
        &self.ranks
    }

    pub fn points(&self) -> &[DeliveryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, id: PointId) -> Option<&DeliveryPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn add_point(
        &mut self,
        coordinates: Coordinates,
        details: PointDetails,
        priority: Priority,
    ) -> DeliveryPoint {
        let created_order = self
            .points
            .iter()
            .map(|p| p.created_order)
            .max()
            .unwrap_or(0)
            .max(self.created_high_water)
            + 1;
        let priority_sort_order = self.next_band_slot(priority);
        let order = self
            .points
            .iter()
            .map(|p| if p.order > 0 { p.order } else { p.created_order })
            .max()
            .unwrap_or(0)
            + 1;

        let id = PointId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        self.created_high_water = created_order;

        let point = DeliveryPoint {
            id,
            coordinates,
            priority,
            name: details.name,
            address: details.address,
            notes: details.notes,
            created_order,
            priority_sort_order: Some(priority_sort_order),
            order,
        };
        debug!(%id, created_order, %priority, "delivery point added");
        self.points.push(point.clone());
        point
    }

    pub fn remove_point(&mut self, id: PointId) -> bool {
        let before = self.points.len();
        self.points.retain(|p| p.id != id);
        let removed = self.points.len() != before;
        if removed {
            debug!(%id, remaining = self.points.len(), "delivery point removed");
        }
        removed
    }

    /// Applies a partial update. A priority change moves the point to the
    /// back of its new band.
    pub fn update_point(&mut self, id: PointId, update: PointUpdate) -> bool {
        let Some(index) = self.points.iter().position(|p| p.id == id) else {
            return false;
        };

        if let Some(priority) = update.priority {
            if priority != self.points[index].priority {
                let slot = self.next_band_slot(priority);
                let point = &mut self.points[index];
                point.priority = priority;
                point.priority_sort_order = Some(slot);
                debug!(%id, %priority, slot, "delivery point moved to new band");
            }
        }

        let point = &mut self.points[index];
        if let Some(name) = update.name {
            point.name = name;
        }
        if let Some(address) = update.address {
            point.address = address;
        }
        if let Some(notes) = update.notes {
            point.notes = notes;
        }
        true
    }

    /// Removes every point. Identity counters keep running.
    pub fn clear_all(&mut self) -> bool {
        let had_points = !self.points.is_empty();
        self.points.clear();
        had_points
    }

    pub fn points_by_priority(&self, priority: Priority) -> Vec<&DeliveryPoint> {
        self.points.iter().filter(|p| p.priority == priority).collect()
    }

    pub fn priority_counts(&self) -> HashMap<Priority, usize> {
        let mut counts = HashMap::new();
        for point in &self.points {
            *counts.entry(point.priority).or_insert(0) += 1;
        }
        counts
    }

    /// Sorted view for a policy. Does not touch stored `order` values.
    pub fn sorted_view(&self, policy: RoutePolicy) -> Vec<&DeliveryPoint> {
        let mut view: Vec<&DeliveryPoint> = self.points.iter().collect();
        match policy {
            RoutePolicy::Priority => view.sort_by_key(|p| (self.ranks.rank(p.priority), p.band_key())),
            RoutePolicy::Shortest => view.sort_by_key(|p| (p.order, p.created_order)),
        }
        view
    }

    /// Rewrites every `order` to its 1-based position in `sorted_view(policy)`.
    pub fn commit_order(&mut self, policy: RoutePolicy) {
        let ids: Vec<PointId> = self.sorted_view(policy).iter().map(|p| p.id).collect();
        self.assign_order(&ids);
    }

    /// Dense 1..N relabel following `ids`.
    pub(crate) fn assign_order(&mut self, ids: &[PointId]) {
        let positions: HashMap<PointId, u32> = ids
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index as u32 + 1))
            .collect();
        for point in &mut self.points {
            if let Some(position) = positions.get(&point.id) {
                point.order = *position;
            }
        }
    }

    fn next_band_slot(&self, priority: Priority) -> u32 {
        self.points
            .iter()
            .filter(|p| p.priority == priority)
            .filter_map(|p| p.priority_sort_order)
            .max()
            .unwrap_or(0)
            + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(lat: f64, lng: f64) -> Coordinates {
        Coordinates { lat, lng }
    }

    fn model() -> OrderingModel {
        OrderingModel::new(PriorityRanks::default())
    }

    #[test]
    fn test_restore_rejects_invalid_coordinates() {
        let mut source = model();
        source.add_point(coords(41.0, 29.0), PointDetails::default(), Priority::High);
        let mut points = source.points().to_vec();
        let broken = DeliveryPoint {
            id: PointId(2),
            coordinates: coords(f64::NAN, 29.0),
            ..points[0].clone()
        };
        points.push(broken);

        let err = OrderingModel::with_points(PriorityRanks::default(), points.clone()).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidCoordinates { .. }));

        points.pop();
        let restored = OrderingModel::with_points(PriorityRanks::default(), points).unwrap();
        assert_eq!(restored.len(), 1);
    }

    #[test]
    fn test_add_assigns_keys() {
        let mut model = model();
        let a = model.add_point(coords(41.0, 29.0), PointDetails::default(), Priority::High);
        let b = model.add_point(coords(41.1, 29.1), PointDetails::default(), Priority::Low);
        let c = model.add_point(coords(41.2, 29.2), PointDetails::default(), Priority::High);

        assert_eq!((a.created_order(), b.created_order(), c.created_order()), (1, 2, 3));
        assert_eq!(a.priority_sort_order(), Some(1));
        assert_eq!(b.priority_sort_order(), Some(1));
        assert_eq!(c.priority_sort_order(), Some(2));
        assert_eq!((a.order(), b.order(), c.order()), (1, 2, 3));
        assert_ne!(a.id(), c.id());
    }

    #[test]
    fn test_created_order_survives_removal_of_latest() {
        let mut model = model();
        model.add_point(coords(0.0, 0.0), PointDetails::default(), Priority::Normal);
        let b = model.add_point(coords(1.0, 1.0), PointDetails::default(), Priority::Normal);
        assert!(model.remove_point(b.id()));
        let c = model.add_point(coords(2.0, 2.0), PointDetails::default(), Priority::Normal);
        assert_eq!(c.created_order(), 3);
        assert_ne!(c.id(), b.id());
    }

    #[test]
    fn test_remove_unknown_is_noop() {
        let mut model = model();
        model.add_point(coords(0.0, 0.0), PointDetails::default(), Priority::Normal);
        let before = model.points().to_vec();
        assert!(!model.remove_point(PointId(999)));
        assert_eq!(model.points(), &before[..]);
    }

    #[test]
    fn test_update_priority_reseeds_band_slot() {
        let mut model = model();
        let a = model.add_point(coords(0.0, 0.0), PointDetails::default(), Priority::High);
        model.add_point(coords(1.0, 1.0), PointDetails::default(), Priority::Low);
        model.add_point(coords(2.0, 2.0), PointDetails::default(), Priority::Low);

        assert!(model.update_point(a.id(), PointUpdate::default().priority(Priority::Low)));
        let moved = model.get(a.id()).unwrap();
        assert_eq!(moved.priority, Priority::Low);
        assert_eq!(moved.priority_sort_order(), Some(3));
        assert_eq!(moved.created_order(), 1);
    }

    #[test]
    fn test_update_same_priority_keeps_slot() {
        let mut model = model();
        let a = model.add_point(coords(0.0, 0.0), PointDetails::default(), Priority::High);
        model.add_point(coords(1.0, 1.0), PointDetails::default(), Priority::High);
        assert!(model.update_point(
            a.id(),
            PointUpdate::default().priority(Priority::High).notes(Some("gate code 4411".into()))
        ));
        let point = model.get(a.id()).unwrap();
        assert_eq!(point.priority_sort_order(), Some(1));
        assert_eq!(point.notes.as_deref(), Some("gate code 4411"));
    }

    #[test]
    fn test_sorted_view_priority_bands() {
        let mut model = model();
        let low = model.add_point(coords(0.0, 0.0), PointDetails::default(), Priority::Low);
        let high = model.add_point(coords(1.0, 1.0), PointDetails::default(), Priority::High);
        let normal = model.add_point(coords(2.0, 2.0), PointDetails::default(), Priority::Normal);

        let ids: Vec<PointId> = model.sorted_view(RoutePolicy::Priority).iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![high.id(), normal.id(), low.id()]);

        // view does not rewrite order
        assert_eq!(model.get(low.id()).unwrap().order(), 1);
    }

    #[test]
    fn test_commit_order_relabels_densely() {
        let mut model = model();
        let low = model.add_point(coords(0.0, 0.0), PointDetails::default(), Priority::Low);
        let high = model.add_point(coords(1.0, 1.0), PointDetails::default(), Priority::High);
        model.commit_order(RoutePolicy::Priority);
        assert_eq!(model.get(high.id()).unwrap().order(), 1);
        assert_eq!(model.get(low.id()).unwrap().order(), 2);

        let ids: Vec<PointId> = model.sorted_view(RoutePolicy::Shortest).iter().map(|p| p.id()).collect();
        assert_eq!(ids, vec![high.id(), low.id()]);
    }

    #[test]
    fn test_priority_counts_and_clear() {
        let mut model = model();
        model.add_point(coords(0.0, 0.0), PointDetails::default(), Priority::Low);
        model.add_point(coords(1.0, 1.0), PointDetails::default(), Priority::Low);
        model.add_point(coords(2.0, 2.0), PointDetails::default(), Priority::High);

        let counts = model.priority_counts();
        assert_eq!(counts.get(&Priority::Low), Some(&2));
        assert_eq!(counts.get(&Priority::Normal), None);
        assert_eq!(model.points_by_priority(Priority::High).len(), 1);

        assert!(model.clear_all());
        assert!(!model.clear_all());
        let next = model.add_point(coords(3.0, 3.0), PointDetails::default(), Priority::High);
        assert_eq!(next.created_order(), 4);
    }
}
