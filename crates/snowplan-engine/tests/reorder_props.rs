//! Property tests for the ordering engine.

use proptest::prelude::*;
use snowplan_engine::{reorder, EdgeHint};
use snowplan_model::{Step, StepKey};
use std::collections::HashMap;

fn step_map(keys: &[String]) -> HashMap<StepKey, Step> {
    keys.iter()
        .enumerate()
        .map(|(idx, key)| {
            (
                StepKey::from(key.as_str()),
                Step::new(key.clone(), "📝", idx as u32),
            )
        })
        .collect()
}

fn key_sets() -> impl Strategy<Value = Vec<String>> {
    prop::collection::hash_set("[a-z]{1,8}", 1..12).prop_map(|set| set.into_iter().collect())
}

proptest! {
    #[test]
    fn top_yields_contiguous_permutation_with_dragged_first(
        keys in key_sets(),
        pick in any::<prop::sample::Index>(),
    ) {
        let dragged = StepKey::from(keys[pick.index(keys.len())].as_str());
        let steps = step_map(&keys);

        let orders = reorder(&steps, &dragged, Some(EdgeHint::Top));

        let mut values: Vec<u32> = orders.values().copied().collect();
        values.sort_unstable();
        let expected: Vec<u32> = (0..keys.len() as u32).collect();
        prop_assert_eq!(values, expected);
        prop_assert_eq!(orders[&dragged], 0);
    }

    #[test]
    fn bottom_yields_contiguous_permutation_with_dragged_last(
        keys in key_sets(),
        pick in any::<prop::sample::Index>(),
    ) {
        let dragged = StepKey::from(keys[pick.index(keys.len())].as_str());
        let steps = step_map(&keys);

        let orders = reorder(&steps, &dragged, Some(EdgeHint::Bottom));

        let mut values: Vec<u32> = orders.values().copied().collect();
        values.sort_unstable();
        let expected: Vec<u32> = (0..keys.len() as u32).collect();
        prop_assert_eq!(values, expected);
        prop_assert_eq!(orders[&dragged], keys.len() as u32 - 1);
    }

    #[test]
    fn undragged_steps_keep_their_relative_order(
        keys in key_sets(),
        pick in any::<prop::sample::Index>(),
        to_top in any::<bool>(),
    ) {
        let dragged = StepKey::from(keys[pick.index(keys.len())].as_str());
        let steps = step_map(&keys);
        let hint = if to_top { EdgeHint::Top } else { EdgeHint::Bottom };

        let orders = reorder(&steps, &dragged, Some(hint));

        for (a, step_a) in &steps {
            for (b, step_b) in &steps {
                if a == &dragged || b == &dragged {
                    continue;
                }
                if step_a.order < step_b.order {
                    prop_assert!(orders[a] < orders[b]);
                }
            }
        }
    }
}
