//! Ordering engine
//!
//! Computes the new total order after a drag gesture. Drop targeting is
//! deliberately coarse: the gesture model only distinguishes "moved up"
//! (dragged step goes first) from "moved down" (dragged step goes last),
//! decided by the vertical displacement between drag start and drag end.

use snowplan_model::{Step, StepKey};
use std::collections::{BTreeMap, HashMap};

/// Where the dragged step lands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeHint {
    /// Place before all other steps
    Top,
    /// Place after all other steps
    Bottom,
}

impl EdgeHint {
    /// Derive the hint from pointer/touch displacement
    ///
    /// `None` when the pointer did not move vertically; callers treat
    /// that as a no-op gesture.
    #[inline]
    #[must_use]
    pub fn from_displacement(start_y: f64, end_y: f64) -> Option<Self> {
        if end_y < start_y {
            Some(EdgeHint::Top)
        } else if end_y > start_y {
            Some(EdgeHint::Bottom)
        } else {
            None
        }
    }
}

/// Compute a complete remapping of step keys to contiguous orders in
/// `[0, N-1]`
///
/// With `Some(Top)` the dragged key lands at 0, with `Some(Bottom)` at
/// N-1; the remaining steps keep their relative order. With `None` the
/// current order is kept (renumbered contiguously, which is the identity
/// for any committed order). The caller must have validated that
/// `dragged` exists in `steps`.
#[must_use]
pub fn reorder(
    steps: &HashMap<StepKey, Step>,
    dragged: &StepKey,
    hint: Option<EdgeHint>,
) -> BTreeMap<StepKey, u32> {
    let mut sorted: Vec<(&StepKey, u32)> = steps.iter().map(|(k, s)| (k, s.order)).collect();
    sorted.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    let mut orders = BTreeMap::new();
    match hint {
        Some(EdgeHint::Top) => {
            orders.insert(dragged.clone(), 0);
            let mut next = 1;
            for (key, _) in sorted {
                if key != dragged {
                    orders.insert(key.clone(), next);
                    next += 1;
                }
            }
        }
        Some(EdgeHint::Bottom) => {
            let mut next = 0;
            for (key, _) in sorted {
                if key != dragged {
                    orders.insert(key.clone(), next);
                    next += 1;
                }
            }
            orders.insert(dragged.clone(), next);
        }
        None => {
            for (idx, (key, _)) in sorted.into_iter().enumerate() {
                orders.insert(key.clone(), idx as u32);
            }
        }
    }
    orders
}
