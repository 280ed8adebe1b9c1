use crate::error::{Result, TurnloopError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Keys to overwrite in a [`State`], produced by workers and controllers.
pub type StateDelta = HashMap<String, Value>;

pub const MAX_STATE_KEY_LEN: usize = 256;

/// Checks that `key` can be stored: non-empty, bounded length, no control characters.
pub fn validate_state_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(TurnloopError::State("state key must not be empty".to_string()));
    }
    if key.len() > MAX_STATE_KEY_LEN {
        return Err(TurnloopError::State(format!(
            "state key exceeds {MAX_STATE_KEY_LEN} bytes: {}...",
            key.chars().take(32).collect::<String>()
        )));
    }
    if key.chars().any(char::is_control) {
        return Err(TurnloopError::State(format!("state key contains control characters: {key:?}")));
    }
    Ok(())
}

/// Reads a value as a loop counter.
///
/// Integers are used as-is, floats are truncated, numeric strings are parsed.
/// Everything else, including `null`, counts as zero.
pub fn counter_value(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)).unwrap_or(0),
        Value::String(s) => s.trim().parse::<i64>().unwrap_or(0),
        _ => 0,
    }
}

/// Reads a value as text. `null` is empty; non-string values render as compact JSON.
pub fn text_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub trait ReadonlyState: Send + Sync {
    fn get(&self, key: &str) -> Option<Value>;
    fn all(&self) -> HashMap<String, Value>;

    /// Counter stored under `key`, or 0 when absent.
    fn counter(&self, key: &str) -> i64 {
        self.get(key).as_ref().map(counter_value).unwrap_or(0)
    }

    /// Text stored under `key`, or an empty string when absent.
    fn text(&self, key: &str) -> String {
        self.get(key).as_ref().map(text_value).unwrap_or_default()
    }
}

pub trait State: ReadonlyState {
    fn set(&mut self, key: String, value: Value) -> Result<()>;

    /// Applies every entry of `delta`. Keys are validated up front so a bad
    /// delta leaves the state untouched.
    fn merge(&mut self, delta: StateDelta) -> Result<()> {
        for key in delta.keys() {
            validate_state_key(key)?;
        }
        for (key, value) in delta {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// In-memory state threaded through the rounds of a loop.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateStore {
    values: HashMap<String, Value>,
}

impl StateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a store from `values`, validating every key.
    pub fn with_values(values: impl IntoIterator<Item = (String, Value)>) -> Result<Self> {
        let mut store = Self::new();
        store.merge(values.into_iter().collect())?;
        Ok(store)
    }

    /// Immutable copy handed to workers and controllers.
    pub fn snapshot(&self) -> StateStore {
        self.clone()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ReadonlyState for StateStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn all(&self) -> HashMap<String, Value> {
        self.values.clone()
    }
}

impl State for StateStore {
    fn set(&mut self, key: String, value: Value) -> Result<()> {
        validate_state_key(&key)?;
        self.values.insert(key, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_absent_keys_use_defaults() {
        let state = StateStore::new();
        assert_eq!(state.counter("iteration"), 0);
        assert_eq!(state.text("last_response"), "");
    }

    #[test]
    fn test_counter_coercion() {
        assert_eq!(counter_value(&json!(4)), 4);
        assert_eq!(counter_value(&json!(3.9)), 3);
        assert_eq!(counter_value(&json!(" 7 ")), 7);
        assert_eq!(counter_value(&json!("seven")), 0);
        assert_eq!(counter_value(&json!(null)), 0);
        assert_eq!(counter_value(&json!([1, 2])), 0);
    }

    #[test]
    fn test_text_coercion() {
        assert_eq!(text_value(&json!("Is it 42?")), "Is it 42?");
        assert_eq!(text_value(&json!(null)), "");
        assert_eq!(text_value(&json!(42)), "42");
        assert_eq!(text_value(&json!({"a": 1})), r#"{"a":1}"#);
    }

    #[test]
    fn test_merge_overwrites() {
        let mut state = StateStore::new();
        state.set("iteration".to_string(), json!(1)).unwrap();

        let mut delta = StateDelta::new();
        delta.insert("iteration".to_string(), json!(2));
        delta.insert("feedback".to_string(), json!("more detail"));
        state.merge(delta).unwrap();

        assert_eq!(state.counter("iteration"), 2);
        assert_eq!(state.text("feedback"), "more detail");
        assert_eq!(state.len(), 2);
    }

    #[test]
    fn test_merge_rejects_bad_key_without_partial_write() {
        let mut state = StateStore::new();
        let mut delta = StateDelta::new();
        delta.insert("good".to_string(), json!(1));
        delta.insert(String::new(), json!(2));

        let err = state.merge(delta).unwrap_err();
        assert!(matches!(err, TurnloopError::State(_)));
        assert!(state.is_empty());
    }

    #[test]
    fn test_validate_state_key() {
        assert!(validate_state_key("current_draft").is_ok());
        assert!(validate_state_key("").is_err());
        assert!(validate_state_key("bad\nkey").is_err());
        assert!(validate_state_key(&"k".repeat(MAX_STATE_KEY_LEN + 1)).is_err());
        assert!(validate_state_key(&"k".repeat(MAX_STATE_KEY_LEN)).is_ok());
    }

    #[test]
    fn test_serde_is_transparent() {
        let state =
            StateStore::with_values([("iteration".to_string(), json!(3))]).unwrap();
        let encoded = serde_json::to_value(&state).unwrap();
        assert_eq!(encoded, json!({"iteration": 3}));
    }
}
