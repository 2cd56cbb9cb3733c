// Chain invariant: for every state with at least one outgoing transition,
// outgoing probabilities sum to 1.0 within float error.

use std::collections::HashSet;

use proptest::prelude::*;

use sliver_core::store::SymbolStore;

fn transition_strategy() -> impl Strategy<Value = Vec<(String, String, u64)>> {
    proptest::collection::vec(
        ("[a-f]", "[a-f]", 1u64..50).prop_map(|(from, to, count)| (from, to, count)),
        1..40,
    )
}

proptest! {
    #[test]
    fn outgoing_probabilities_sum_to_one(raw in transition_strategy()) {
        // Collapse duplicate (from, to) pairs the way a builder would.
        let mut merged: std::collections::HashMap<(String, String), u64> =
            std::collections::HashMap::new();
        for (from, to, count) in raw {
            *merged.entry((from, to)).or_insert(0) += count;
        }
        let transitions: Vec<(String, String, u64)> = merged
            .into_iter()
            .map(|((from, to), count)| (from, to, count))
            .collect();

        let mut store = SymbolStore::in_memory().unwrap();
        store.replace_chain("prop_chain", "", &transitions).unwrap();

        let states: HashSet<&String> = transitions.iter().map(|(from, _, _)| from).collect();
        for state in states {
            let outgoing = store.transitions_from("prop_chain", state).unwrap();
            prop_assert!(!outgoing.is_empty());
            let total: f64 = outgoing.iter().map(|t| t.probability).sum();
            prop_assert!((total - 1.0).abs() < 1e-9, "state {state}: sum {total}");
        }
    }

    #[test]
    fn increments_preserve_row_normalization(
        initial in transition_strategy(),
        bump_count in 1u64..20
    ) {
        let mut merged: std::collections::HashMap<(String, String), u64> =
            std::collections::HashMap::new();
        for (from, to, count) in initial {
            *merged.entry((from, to)).or_insert(0) += count;
        }
        let transitions: Vec<(String, String, u64)> = merged
            .into_iter()
            .map(|((from, to), count)| (from, to, count))
            .collect();

        let mut store = SymbolStore::in_memory().unwrap();
        store.replace_chain("prop_chain", "", &transitions).unwrap();

        let bumped_state = transitions[0].0.clone();
        store
            .increment_transition("prop_chain", &bumped_state, "zz", bump_count)
            .unwrap();

        let outgoing = store.transitions_from("prop_chain", &bumped_state).unwrap();
        let total: f64 = outgoing.iter().map(|t| t.probability).sum();
        prop_assert!((total - 1.0).abs() < 1e-9, "state {bumped_state}: sum {total}");
    }
}
