//! Property-based tests for the iteration controller.
//!
//! The controller must be total over any state, deterministic, and bump the
//! counter by exactly one whenever it decides to continue.

use proptest::prelude::*;
use serde_json::{Value, json};
use turnloop_core::{State, StateStore, Verdict};
use turnloop_workflow::{IterationController, StopPredicate};

fn critic() -> IterationController {
    IterationController::builder("critic")
        .result_key("current_draft")
        .predicate(StopPredicate::counter_at_least(25, 90))
        .build()
        .unwrap()
}

fn checker() -> IterationController {
    IterationController::builder("checker")
        .predicate(StopPredicate::result_contains("42"))
        .build()
        .unwrap()
}

/// Arbitrary JSON scalars, including ones that are not valid counters.
fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        any::<f64>().prop_filter("finite", |f| f.is_finite()).prop_map(|f| json!(f)),
        "[a-z0-9 ?]{0,16}".prop_map(Value::from),
    ]
}

fn arb_state() -> impl Strategy<Value = StateStore> {
    prop::collection::hash_map(
        prop_oneof![
            Just("iteration".to_string()),
            Just("last_response".to_string()),
            Just("current_draft".to_string()),
            Just("feedback".to_string()),
            "[a-z_]{1,12}",
        ],
        arb_value(),
        0..6,
    )
    .prop_map(|values| StateStore::with_values(values).unwrap())
}

proptest! {
    #[test]
    fn prop_evaluate_is_total_and_deterministic(state in arb_state()) {
        for controller in [critic(), checker()] {
            let first = controller.evaluate(&state);
            let second = controller.evaluate(&state);
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn prop_continue_increments_counter_by_one(counter in -1_000i64..1_000) {
        let mut state = StateStore::new();
        state.set("iteration".to_string(), json!(counter)).unwrap();

        let eval = critic().evaluate(&state);
        if counter * 25 >= 90 {
            prop_assert_eq!(eval.verdict, Verdict::Stop);
            prop_assert!(eval.state_delta.is_empty());
        } else {
            prop_assert_eq!(eval.verdict, Verdict::Continue);
            prop_assert_eq!(eval.state_delta.get("iteration"), Some(&json!(counter + 1)));
        }
    }

    #[test]
    fn prop_absent_counter_behaves_as_zero(result in "[a-z0-9 ?]{0,24}") {
        let mut absent = StateStore::new();
        absent.set("last_response".to_string(), json!(result.clone())).unwrap();
        let mut zero = absent.clone();
        zero.set("iteration".to_string(), json!(0)).unwrap();

        for controller in [critic(), checker()] {
            prop_assert_eq!(controller.evaluate(&absent), controller.evaluate(&zero));
        }
    }

    #[test]
    fn prop_evaluate_never_mutates_input(state in arb_state()) {
        let before = state.clone();
        let _ = checker().evaluate(&state);
        prop_assert_eq!(state, before);
    }
}
