//! Manual drag-reorder inside a priority band.

use std::collections::HashMap;

use tracing::debug;

use crate::ordering::OrderingModel;
use crate::point::PointId;

impl OrderingModel {
    /// Moves `active_id` to `target_id`'s position within their shared
    /// priority band and relabels the band's `priority_sort_order` 1..N.
    ///
    /// Missing ids, identical ids and cross-band moves change nothing and
    /// return `false`.
    pub fn reorder(&mut self, active_id: PointId, target_id: PointId) -> bool {
        if active_id == target_id {
            return false;
        }
        let (Some(active), Some(target)) = (self.get(active_id), self.get(target_id)) else {
            return false;
        };
        if active.priority != target.priority {
            debug!(%active_id, %target_id, "cross-band reorder rejected");
            return false;
        }
        let priority = active.priority;

        let mut band: Vec<(u32, u32, PointId)> = self
            .points
            .iter()
            .filter(|p| p.priority == priority)
            .map(|p| (p.band_key(), p.created_order, p.id))
            .collect();
        band.sort_unstable();
        let mut band: Vec<PointId> = band.into_iter().map(|(_, _, id)| id).collect();

        let (Some(from), Some(to)) = (
            band.iter().position(|id| *id == active_id),
            band.iter().position(|id| *id == target_id),
        ) else {
            return false;
        };
        let moved = band.remove(from);
        band.insert(to, moved);

        let slots: HashMap<PointId, u32> = band
            .iter()
            .enumerate()
            .map(|(index, id)| (*id, index as u32 + 1))
            .collect();
        for point in self.points.iter_mut().filter(|p| p.priority == priority) {
            point.priority_sort_order = slots.get(&point.id).copied();
        }
        debug!(%active_id, %target_id, %priority, from, to, "band reordered");
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::config::PriorityRanks;
    use crate::ordering::OrderingModel;
    use crate::point::{Coordinates, PointDetails, PointId, Priority, RoutePolicy};

    fn add(model: &mut OrderingModel, priority: Priority) -> PointId {
        model
            .add_point(Coordinates { lat: 0.0, lng: 0.0 }, PointDetails::default(), priority)
            .id()
    }

    fn view(model: &OrderingModel) -> Vec<PointId> {
        model.sorted_view(RoutePolicy::Priority).iter().map(|p| p.id()).collect()
    }

    #[test]
    fn test_move_down_is_list_move_not_swap() {
        let mut model = OrderingModel::new(PriorityRanks::default());
        let a = add(&mut model, Priority::Normal);
        let b = add(&mut model, Priority::Normal);
        let c = add(&mut model, Priority::Normal);

        assert!(model.reorder(a, c));
        assert_eq!(view(&model), vec![b, c, a]);
        let slots: Vec<Option<u32>> = [a, b, c]
            .iter()
            .map(|id| model.get(*id).unwrap().priority_sort_order())
            .collect();
        assert_eq!(slots, vec![Some(3), Some(1), Some(2)]);
    }

    #[test]
    fn test_move_up() {
        let mut model = OrderingModel::new(PriorityRanks::default());
        let a = add(&mut model, Priority::Low);
        let b = add(&mut model, Priority::Low);
        let c = add(&mut model, Priority::Low);

        assert!(model.reorder(c, a));
        assert_eq!(view(&model), vec![c, a, b]);
    }

    #[test]
    fn test_rejected_moves_change_nothing() {
        let mut model = OrderingModel::new(PriorityRanks::default());
        let a = add(&mut model, Priority::High);
        let b = add(&mut model, Priority::Low);
        let before = model.points().to_vec();

        assert!(!model.reorder(a, b));
        assert!(!model.reorder(a, a));
        assert!(!model.reorder(a, PointId(404)));
        assert_eq!(model.points(), &before[..]);
    }

    #[test]
    fn test_reorder_never_touches_order_or_created_order() {
        let mut model = OrderingModel::new(PriorityRanks::default());
        let a = add(&mut model, Priority::High);
        let b = add(&mut model, Priority::High);
        model.reorder(b, a);
        let a = model.get(a).unwrap();
        let b = model.get(b).unwrap();
        assert_eq!((a.order(), a.created_order()), (1, 1));
        assert_eq!((b.order(), b.created_order()), (2, 2));
    }
}
