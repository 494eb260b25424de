//! Capacity reconciliation planning.
//!
//! Pure functions that compute, against a consistent snapshot of a lot's
//! spots, which spots to create or remove and how to renumber the
//! survivors. The guarded storage operation re-validates the plan inside
//! its transaction, so a stale snapshot surfaces as a `Conflict` rather
//! than a lost update.

use super::{DomainError, DomainResult, Spot, SpotStatus};

/// Outcome of planning a lot resize.
#[derive(Debug, Clone, Default)]
pub struct ResizePlan {
    /// Slot numbers for spots to create, all Available.
    pub create_numbers: Vec<i32>,
    /// Ids of spots to remove (highest-numbered Available first).
    pub remove_ids: Vec<i64>,
    /// (spot id, new number) assignments restoring the 1..N invariant.
    pub renumber: Vec<(i64, i32)>,
}

impl ResizePlan {
    pub fn is_noop(&self) -> bool {
        self.create_numbers.is_empty() && self.remove_ids.is_empty() && self.renumber.is_empty()
    }
}

/// Slot numbers to create when growing from `current_count` spots.
pub fn plan_growth(current_count: i32, new_capacity: i32) -> Vec<i32> {
    (current_count + 1..=new_capacity).collect()
}

/// Select `remove_count` removable spots, highest-numbered Available
/// first. Occupied spots are never selected; insufficient Available
/// spots is a `Conflict`.
pub fn plan_shrink(spots: &[Spot], remove_count: usize) -> DomainResult<Vec<i64>> {
    let mut available: Vec<&Spot> = spots
        .iter()
        .filter(|s| s.status == SpotStatus::Available)
        .collect();
    if available.len() < remove_count {
        return Err(DomainError::Conflict(format!(
            "cannot remove {} spots: only {} available",
            remove_count,
            available.len()
        )));
    }
    available.sort_by(|a, b| b.number.cmp(&a.number));
    Ok(available
        .into_iter()
        .take(remove_count)
        .map(|s| s.id)
        .collect())
}

/// Reassign slot numbers 1..N in ascending order of current number,
/// preserving relative order. Returns only the assignments that change,
/// so applying the plan twice is the same as applying it once.
pub fn plan_renumber(spots: &[Spot]) -> Vec<(i64, i32)> {
    let mut ordered: Vec<&Spot> = spots.iter().collect();
    ordered.sort_by_key(|s| s.number);
    ordered
        .iter()
        .enumerate()
        .filter_map(|(idx, s)| {
            let target = (idx + 1) as i32;
            (s.number != target).then_some((s.id, target))
        })
        .collect()
}

/// Plan the full reconciliation of a lot's spot set against a requested
/// capacity.
///
/// Rejects with `Validation` when the target is below the occupied count;
/// never plans removal of an occupied spot.
pub fn plan_resize(spots: &[Spot], new_capacity: i32) -> DomainResult<ResizePlan> {
    if new_capacity < 0 {
        return Err(DomainError::Validation(
            "capacity must not be negative".into(),
        ));
    }

    let occupied = spots.iter().filter(|s| s.is_occupied()).count() as i32;
    if new_capacity < occupied {
        return Err(DomainError::Validation(format!(
            "cannot shrink capacity to {}: {} spots are occupied",
            new_capacity, occupied
        )));
    }

    let current = spots.len() as i32;
    let mut plan = ResizePlan::default();

    if new_capacity > current {
        plan.create_numbers = plan_growth(current, new_capacity);
    } else if new_capacity < current {
        plan.remove_ids = plan_shrink(spots, (current - new_capacity) as usize)?;
        let survivors: Vec<Spot> = spots
            .iter()
            .filter(|s| !plan.remove_ids.contains(&s.id))
            .cloned()
            .collect();
        plan.renumber = plan_renumber(&survivors);
    }

    Ok(plan)
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn spots(statuses: &[SpotStatus]) -> Vec<Spot> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, st)| {
                let mut s = Spot::available(1, (i + 1) as i32);
                s.id = (i + 1) as i64;
                if *st == SpotStatus::Occupied {
                    s.occupy("u1", "alice", "V-1", Utc::now()).unwrap();
                }
                s
            })
            .collect()
    }

    use SpotStatus::{Available as A, Occupied as O};

    #[test]
    fn growth_plans_next_numbers() {
        assert_eq!(plan_growth(3, 6), vec![4, 5, 6]);
        assert!(plan_growth(6, 6).is_empty());
    }

    #[test]
    fn resize_up_creates_missing_spots() {
        let plan = plan_resize(&spots(&[A, O, A]), 5).unwrap();
        assert_eq!(plan.create_numbers, vec![4, 5]);
        assert!(plan.remove_ids.is_empty());
        assert!(plan.renumber.is_empty());
    }

    #[test]
    fn resize_down_removes_highest_available_first() {
        // spots 1..5, #5 occupied; shrinking to 3 must remove #4 and #3
        let plan = plan_resize(&spots(&[A, A, A, A, O]), 3).unwrap();
        assert_eq!(plan.remove_ids, vec![4, 3]);
        // survivors 1, 2, 5 renumber to 1, 2, 3
        assert_eq!(plan.renumber, vec![(5, 3)]);
    }

    #[test]
    fn resize_below_occupied_count_is_validation_error() {
        let err = plan_resize(&spots(&[O, O, A]), 1).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn resize_to_occupied_count_removes_all_available() {
        let plan = plan_resize(&spots(&[O, A, O, A]), 2).unwrap();
        assert_eq!(plan.remove_ids, vec![4, 2]);
        assert_eq!(plan.renumber, vec![(3, 2)]);
    }

    #[test]
    fn resize_noop_when_capacity_matches() {
        let plan = plan_resize(&spots(&[A, O, A]), 3).unwrap();
        assert!(plan.is_noop());
    }

    #[test]
    fn negative_capacity_is_validation_error() {
        let err = plan_resize(&spots(&[A]), -1).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn shrink_with_insufficient_available_is_conflict() {
        let set = spots(&[O, O, A]);
        let err = plan_shrink(&set, 2).unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn shrink_never_selects_occupied() {
        let set = spots(&[A, O, A, O, A]);
        let ids = plan_shrink(&set, 3).unwrap();
        assert_eq!(ids, vec![5, 3, 1]);
    }

    #[test]
    fn renumber_closes_gaps_preserving_order() {
        let mut set = spots(&[A, A, A, A, A]);
        set.retain(|s| s.number != 2 && s.number != 4);
        let plan = plan_renumber(&set);
        assert_eq!(plan, vec![(3, 2), (5, 3)]);
    }

    #[test]
    fn renumber_is_idempotent() {
        let mut set = spots(&[A, A, A, A]);
        set.retain(|s| s.number != 1);
        let first = plan_renumber(&set);
        assert_eq!(first, vec![(2, 1), (3, 2), (4, 3)]);

        // apply the plan, then plan again: nothing left to change
        for (id, n) in &first {
            set.iter_mut().find(|s| s.id == *id).unwrap().number = *n;
        }
        assert!(plan_renumber(&set).is_empty());
    }

    #[test]
    fn renumber_of_contiguous_set_is_empty() {
        assert!(plan_renumber(&spots(&[A, O, A])).is_empty());
    }
}
