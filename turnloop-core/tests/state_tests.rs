use proptest::prelude::*;
use serde_json::json;
use std::collections::HashMap;
use turnloop_core::{ReadonlyState, State, StateDelta, StateStore, Worker};

#[test]
fn test_snapshot_is_independent() {
    let mut state = StateStore::new();
    state.set("current_draft".to_string(), json!("v1")).unwrap();

    let snapshot = state.snapshot();
    state.set("current_draft".to_string(), json!("v2")).unwrap();

    assert_eq!(snapshot.text("current_draft"), "v1");
    assert_eq!(state.text("current_draft"), "v2");
}

#[test]
fn test_with_values_validates_keys() {
    let result = StateStore::with_values([("bad\u{7}key".to_string(), json!(1))]);
    assert!(result.is_err());
}

struct Echo;

#[async_trait::async_trait]
impl Worker for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn output_keys(&self) -> Vec<String> {
        vec!["echo".to_string()]
    }

    async fn run(&self, state: &StateStore) -> turnloop_core::Result<StateDelta> {
        let mut delta = StateDelta::new();
        delta.insert("echo".to_string(), json!(state.text("topic")));
        Ok(delta)
    }
}

#[tokio::test]
async fn test_worker_trait_object() {
    let worker: Box<dyn Worker> = Box::new(Echo);
    let state = StateStore::with_values([("topic".to_string(), json!("rust"))]).unwrap();

    let delta = worker.run(&state).await.unwrap();
    assert_eq!(delta.get("echo"), Some(&json!("rust")));
    assert_eq!(worker.output_keys(), vec!["echo".to_string()]);
}

proptest! {
    #[test]
    fn prop_merge_matches_hashmap_extend(
        base in prop::collection::hash_map("[a-z]{1,6}", any::<i64>(), 0..8),
        delta in prop::collection::hash_map("[a-z]{1,6}", any::<i64>(), 0..8),
    ) {
        let mut state = StateStore::with_values(
            base.iter().map(|(k, v)| (k.clone(), json!(v))),
        ).unwrap();
        state.merge(delta.iter().map(|(k, v)| (k.clone(), json!(v))).collect()).unwrap();

        let mut expected: HashMap<String, i64> = base.clone();
        expected.extend(delta.clone());

        prop_assert_eq!(state.len(), expected.len());
        for (key, value) in expected {
            prop_assert_eq!(state.counter(&key), value);
        }
    }
}
