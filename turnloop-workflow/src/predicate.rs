//! Stopping predicates for the iteration controller.
//!
//! Predicates are pure: the same progress and state always give the same answer.

use std::sync::Arc;
use turnloop_core::{ReadonlyState, Result, TurnloopError, validate_state_key};

/// What a controller knows about the loop when it evaluates a round.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Progress {
    /// Counter read from state, 0 when absent.
    pub counter: i64,
    /// Latest worker result read from state, empty when absent.
    pub result: String,
}

impl Progress {
    /// Score out of 100 earned at `step` points per completed round.
    pub fn score(&self, step: i64) -> i64 {
        self.counter.saturating_mul(step).min(100)
    }
}

pub type PredicateFn = Arc<dyn Fn(&Progress, &dyn ReadonlyState) -> bool + Send + Sync>;

/// Decides whether a loop should stop after the current round.
#[derive(Clone)]
pub enum StopPredicate {
    /// Stop once `counter * step >= threshold`.
    CounterAtLeast { step: i64, threshold: i64 },
    /// Stop once the result text contains `needle`.
    ResultContains { needle: String },
    /// Stop when any inner predicate holds.
    Any(Vec<StopPredicate>),
    /// Stop when every inner predicate holds.
    All(Vec<StopPredicate>),
    /// Caller-supplied predicate. `reads` lists the state keys it looks at.
    Custom { reads: Vec<String>, f: PredicateFn },
}

impl StopPredicate {
    pub fn counter_at_least(step: i64, threshold: i64) -> Self {
        Self::CounterAtLeast { step, threshold }
    }

    pub fn result_contains(needle: impl Into<String>) -> Self {
        Self::ResultContains { needle: needle.into() }
    }

    pub fn custom<I, K, F>(reads: I, f: F) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
        F: Fn(&Progress, &dyn ReadonlyState) -> bool + Send + Sync + 'static,
    {
        Self::Custom { reads: reads.into_iter().map(Into::into).collect(), f: Arc::new(f) }
    }

    pub fn is_satisfied(&self, progress: &Progress, state: &dyn ReadonlyState) -> bool {
        match self {
            Self::CounterAtLeast { step, threshold } => {
                progress.counter.saturating_mul(*step) >= *threshold
            }
            Self::ResultContains { needle } => progress.result.contains(needle.as_str()),
            Self::Any(inner) => inner.iter().any(|p| p.is_satisfied(progress, state)),
            Self::All(inner) => inner.iter().all(|p| p.is_satisfied(progress, state)),
            Self::Custom { f, .. } => f(progress, state),
        }
    }

    /// Rejects predicates that are malformed or can never fire.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::CounterAtLeast { step, threshold } => {
                if *step <= 0 && *threshold > 0 {
                    return Err(TurnloopError::Config(format!(
                        "counter predicate with step {step} can never reach threshold {threshold}"
                    )));
                }
                Ok(())
            }
            Self::ResultContains { needle } => {
                if needle.is_empty() {
                    return Err(TurnloopError::Config(
                        "result_contains needle must not be empty".to_string(),
                    ));
                }
                Ok(())
            }
            Self::Any(inner) | Self::All(inner) => {
                if inner.is_empty() {
                    return Err(TurnloopError::Config(
                        "predicate combinator needs at least one predicate".to_string(),
                    ));
                }
                inner.iter().try_for_each(StopPredicate::validate)
            }
            Self::Custom { reads, .. } => {
                reads.iter().try_for_each(|key| {
                    validate_state_key(key).map_err(|e| TurnloopError::Config(e.to_string()))
                })
            }
        }
    }

    pub(crate) fn reads_result(&self) -> bool {
        match self {
            Self::CounterAtLeast { .. } => false,
            Self::ResultContains { .. } => true,
            Self::Any(inner) | Self::All(inner) => inner.iter().any(StopPredicate::reads_result),
            Self::Custom { .. } => false,
        }
    }

    pub(crate) fn declared_reads(&self) -> Vec<String> {
        match self {
            Self::Custom { reads, .. } => reads.clone(),
            Self::Any(inner) | Self::All(inner) => {
                inner.iter().flat_map(StopPredicate::declared_reads).collect()
            }
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Debug for StopPredicate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CounterAtLeast { step, threshold } => f
                .debug_struct("CounterAtLeast")
                .field("step", step)
                .field("threshold", threshold)
                .finish(),
            Self::ResultContains { needle } => {
                f.debug_struct("ResultContains").field("needle", needle).finish()
            }
            Self::Any(inner) => f.debug_tuple("Any").field(inner).finish(),
            Self::All(inner) => f.debug_tuple("All").field(inner).finish(),
            Self::Custom { reads, .. } => f.debug_struct("Custom").field("reads", reads).finish(),
        }
    }
}
