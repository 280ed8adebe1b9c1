use crate::predicate::{Progress, StopPredicate};
use serde_json::Value;
use std::sync::Arc;
use turnloop_core::{
    Evaluation, ReadonlyState, Result, StateDelta, TurnloopError, validate_state_key,
};

pub const DEFAULT_COUNTER_KEY: &str = "iteration";
pub const DEFAULT_RESULT_KEY: &str = "last_response";
pub const DEFAULT_FEEDBACK_KEY: &str = "feedback";

type MessageFn = Arc<dyn Fn(&Progress) -> String + Send + Sync>;

/// Decides after every round whether a bounded loop keeps going.
///
/// `evaluate` is a pure function of the state it is given: it never writes to
/// the state and keeps nothing between calls. On continue it hands back a delta
/// bumping the counter by one and setting the feedback key for the next round.
#[derive(Clone)]
pub struct IterationController {
    name: String,
    description: String,
    counter_key: String,
    result_key: String,
    feedback_key: String,
    predicate: StopPredicate,
    continue_message: MessageFn,
    stop_message: MessageFn,
}

impl IterationController {
    pub fn builder(name: impl Into<String>) -> IterationControllerBuilder {
        IterationControllerBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn counter_key(&self) -> &str {
        &self.counter_key
    }

    pub fn result_key(&self) -> &str {
        &self.result_key
    }

    pub fn feedback_key(&self) -> &str {
        &self.feedback_key
    }

    pub fn predicate(&self) -> &StopPredicate {
        &self.predicate
    }

    pub fn progress(&self, state: &dyn ReadonlyState) -> Progress {
        Progress { counter: state.counter(&self.counter_key), result: state.text(&self.result_key) }
    }

    pub fn evaluate(&self, state: &dyn ReadonlyState) -> Evaluation {
        let progress = self.progress(state);

        if self.predicate.is_satisfied(&progress, state) {
            return Evaluation::stop(&self.name, (self.stop_message)(&progress));
        }

        let message = (self.continue_message)(&progress);
        let mut delta = StateDelta::new();
        delta.insert(self.counter_key.clone(), Value::from(progress.counter.saturating_add(1)));
        delta.insert(self.feedback_key.clone(), Value::String(message.clone()));
        Evaluation::proceed(&self.name, message, delta)
    }

    /// Keys the predicate needs that this controller does not write itself.
    pub fn required_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        if self.predicate.reads_result() {
            keys.push(self.result_key.clone());
        }
        for key in self.predicate.declared_reads() {
            if key != self.counter_key && key != self.feedback_key && !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    /// Keys written by a continue verdict.
    pub fn output_keys(&self) -> Vec<String> {
        vec![self.counter_key.clone(), self.feedback_key.clone()]
    }
}

impl std::fmt::Debug for IterationController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IterationController")
            .field("name", &self.name)
            .field("counter_key", &self.counter_key)
            .field("result_key", &self.result_key)
            .field("feedback_key", &self.feedback_key)
            .field("predicate", &self.predicate)
            .finish_non_exhaustive()
    }
}

pub struct IterationControllerBuilder {
    name: String,
    description: String,
    counter_key: String,
    result_key: String,
    feedback_key: String,
    predicate: Option<StopPredicate>,
    continue_message: MessageFn,
    stop_message: MessageFn,
}

impl IterationControllerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            counter_key: DEFAULT_COUNTER_KEY.to_string(),
            result_key: DEFAULT_RESULT_KEY.to_string(),
            feedback_key: DEFAULT_FEEDBACK_KEY.to_string(),
            predicate: None,
            continue_message: Arc::new(|_| "continue".to_string()),
            stop_message: Arc::new(|_| "stop".to_string()),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn counter_key(mut self, key: impl Into<String>) -> Self {
        self.counter_key = key.into();
        self
    }

    pub fn result_key(mut self, key: impl Into<String>) -> Self {
        self.result_key = key.into();
        self
    }

    pub fn feedback_key(mut self, key: impl Into<String>) -> Self {
        self.feedback_key = key.into();
        self
    }

    pub fn predicate(mut self, predicate: StopPredicate) -> Self {
        self.predicate = Some(predicate);
        self
    }

    /// Message reported (and stored under the feedback key) when the loop continues.
    pub fn continue_message<F>(mut self, f: F) -> Self
    where
        F: Fn(&Progress) -> String + Send + Sync + 'static,
    {
        self.continue_message = Arc::new(f);
        self
    }

    /// Message reported when the predicate stops the loop.
    pub fn stop_message<F>(mut self, f: F) -> Self
    where
        F: Fn(&Progress) -> String + Send + Sync + 'static,
    {
        self.stop_message = Arc::new(f);
        self
    }

    pub fn build(self) -> Result<IterationController> {
        let predicate = self.predicate.ok_or_else(|| {
            TurnloopError::Config(format!("controller '{}' requires a stop predicate", self.name))
        })?;
        predicate.validate()?;

        for key in [&self.counter_key, &self.result_key, &self.feedback_key] {
            validate_state_key(key).map_err(|e| {
                TurnloopError::Config(format!("controller '{}': {e}", self.name))
            })?;
        }

        if self.counter_key == self.result_key
            || self.counter_key == self.feedback_key
            || self.result_key == self.feedback_key
        {
            return Err(TurnloopError::Config(format!(
                "controller '{}' needs distinct counter, result and feedback keys \
                 (got '{}', '{}', '{}')",
                self.name, self.counter_key, self.result_key, self.feedback_key
            )));
        }

        Ok(IterationController {
            name: self.name,
            description: self.description,
            counter_key: self.counter_key,
            result_key: self.result_key,
            feedback_key: self.feedback_key,
            predicate,
            continue_message: self.continue_message,
            stop_message: self.stop_message,
        })
    }
}
