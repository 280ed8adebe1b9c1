use crate::controller::IterationController;
use async_stream::stream;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use std::sync::Arc;
use tracing::{Instrument, debug, info, warn};
use turnloop_core::{
    Evaluation, Result, State, StateDelta, StateStore, TurnloopError, Worker,
};
use turnloop_telemetry::{loop_run_span, record_stop_reason, round_span};

/// Default cap on loop rounds when none is specified.
pub const DEFAULT_MAX_ITERATIONS: u32 = 5;

/// Why a loop finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The controller's predicate held and it returned a stop verdict.
    Predicate,
    /// Every permitted round ran without a stop verdict.
    IterationCap,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            StopReason::Predicate => "predicate",
            StopReason::IterationCap => "iteration_cap",
        }
    }
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened in one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    /// 1-based round number.
    pub round: u32,
    pub worker: String,
    pub worker_delta: StateDelta,
    pub evaluation: Evaluation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopOutcome {
    pub stop_reason: StopReason,
    pub iterations: u32,
    pub rounds: Vec<RoundRecord>,
}

impl LoopOutcome {
    pub fn stopped_by_predicate(&self) -> bool {
        self.stop_reason == StopReason::Predicate
    }

    pub fn stopped_by_cap(&self) -> bool {
        self.stop_reason == StopReason::IterationCap
    }

    pub fn last_evaluation(&self) -> Option<&Evaluation> {
        self.rounds.last().map(|r| &r.evaluation)
    }
}

#[derive(Debug, Clone)]
pub enum LoopEvent {
    Round(RoundRecord),
    Finished { outcome: LoopOutcome, state: StateStore },
}

pub type LoopEventStream = Pin<Box<dyn Stream<Item = Result<LoopEvent>> + Send>>;

/// Loop driver runs a worker and then a controller, round after round, until
/// the controller says stop or `max_iterations` rounds have run.
///
/// Deltas are merged between steps, so the worker of round `n + 1` sees the
/// controller's feedback from round `n`.
#[derive(Clone)]
pub struct LoopDriver {
    name: String,
    description: String,
    worker: Arc<dyn Worker>,
    controller: Arc<IterationController>,
    max_iterations: u32,
}

impl LoopDriver {
    pub fn builder(name: impl Into<String>) -> LoopDriverBuilder {
        LoopDriverBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn worker(&self) -> &Arc<dyn Worker> {
        &self.worker
    }

    pub fn controller(&self) -> &IterationController {
        &self.controller
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    /// Runs the loop over `state`, leaving the final state in place.
    ///
    /// If a worker fails the error is returned and `state` keeps every delta
    /// merged before the failure.
    pub async fn run(&self, state: &mut StateStore) -> Result<LoopOutcome> {
        let span = loop_run_span(&self.name, self.max_iterations);
        async {
            info!(loop.name = %self.name, max_iterations = self.max_iterations, "loop started");
            let mut rounds = Vec::new();
            let mut stop_reason = StopReason::IterationCap;

            for round in 1..=self.max_iterations {
                let record = self.run_round(round, state).await?;
                let stop = record.evaluation.verdict.is_stop();
                rounds.push(record);
                if stop {
                    stop_reason = StopReason::Predicate;
                    break;
                }
            }

            let outcome = self.finish(stop_reason, rounds);
            record_stop_reason(&tracing::Span::current(), stop_reason.as_str());
            Ok::<_, TurnloopError>(outcome)
        }
        .instrument(span)
        .await
    }

    /// Runs the loop, yielding every round as it completes and a final
    /// [`LoopEvent::Finished`] carrying the outcome and state.
    pub fn run_stream(&self, mut state: StateStore) -> LoopEventStream {
        let driver = self.clone();
        let span = loop_run_span(&self.name, self.max_iterations);

        let s = stream! {
            span.in_scope(|| {
                info!(loop.name = %driver.name, max_iterations = driver.max_iterations, "loop started")
            });
            let mut rounds = Vec::new();
            let mut stop_reason = StopReason::IterationCap;

            for round in 1..=driver.max_iterations {
                let record = match driver.run_round(round, &mut state).instrument(span.clone()).await {
                    Ok(record) => record,
                    Err(e) => {
                        yield Err(e);
                        return;
                    }
                };
                let stop = record.evaluation.verdict.is_stop();
                rounds.push(record.clone());
                yield Ok(LoopEvent::Round(record));
                if stop {
                    stop_reason = StopReason::Predicate;
                    break;
                }
            }

            let outcome = span.in_scope(|| driver.finish(stop_reason, rounds));
            record_stop_reason(&span, stop_reason.as_str());
            yield Ok(LoopEvent::Finished { outcome, state });
        };

        Box::pin(s)
    }

    async fn run_round(&self, round: u32, state: &mut StateStore) -> Result<RoundRecord> {
        let snapshot = state.snapshot();
        let worker_delta = match self
            .worker
            .run(&snapshot)
            .instrument(round_span(&self.name, round))
            .await
        {
            Ok(delta) => delta,
            Err(e) => {
                warn!(loop.name = %self.name, round, error = %e, "worker failed");
                return Err(self.worker_error(e));
            }
        };
        state.merge(worker_delta.clone()).map_err(|e| self.worker_error(e))?;

        let evaluation = self.controller.evaluate(&*state);
        state.merge(evaluation.state_delta.clone())?;

        debug!(
            loop.name = %self.name,
            round,
            verdict = %evaluation.verdict,
            message = %evaluation.message,
            "round complete"
        );

        Ok(RoundRecord {
            round,
            worker: self.worker.name().to_string(),
            worker_delta,
            evaluation,
        })
    }

    /// Attributes a failure to the worker unless it already names one.
    fn worker_error(&self, err: TurnloopError) -> TurnloopError {
        match err {
            TurnloopError::Worker { .. } => err,
            other => TurnloopError::worker(self.worker.name(), other.to_string()),
        }
    }

    fn finish(&self, stop_reason: StopReason, rounds: Vec<RoundRecord>) -> LoopOutcome {
        let iterations = rounds.len() as u32;
        info!(loop.name = %self.name, iterations, stop_reason = %stop_reason, "loop finished");
        LoopOutcome { stop_reason, iterations, rounds }
    }
}

impl std::fmt::Debug for LoopDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopDriver")
            .field("name", &self.name)
            .field("worker", &self.worker.name())
            .field("controller", &self.controller)
            .field("max_iterations", &self.max_iterations)
            .finish()
    }
}

pub struct LoopDriverBuilder {
    name: String,
    description: String,
    worker: Option<Arc<dyn Worker>>,
    controller: Option<IterationController>,
    max_iterations: u32,
    seed_keys: Vec<String>,
}

impl LoopDriverBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            worker: None,
            controller: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            seed_keys: Vec::new(),
        }
    }

    pub fn description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn worker(mut self, worker: Arc<dyn Worker>) -> Self {
        self.worker = Some(worker);
        self
    }

    pub fn controller(mut self, controller: IterationController) -> Self {
        self.controller = Some(controller);
        self
    }

    pub fn max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    /// Keys the caller promises to put in the state before running.
    pub fn seed_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.seed_keys.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn build(self) -> Result<LoopDriver> {
        let worker = self.worker.ok_or_else(|| {
            TurnloopError::Config(format!("loop '{}' requires a worker", self.name))
        })?;
        let controller = self.controller.ok_or_else(|| {
            TurnloopError::Config(format!("loop '{}' requires a controller", self.name))
        })?;
        if self.max_iterations == 0 {
            return Err(TurnloopError::Config(format!(
                "loop '{}': max_iterations must be at least 1",
                self.name
            )));
        }

        let produced: Vec<String> = worker
            .output_keys()
            .into_iter()
            .chain(controller.output_keys())
            .chain(self.seed_keys)
            .collect();
        for key in controller.required_keys() {
            if !produced.contains(&key) {
                return Err(TurnloopError::Config(format!(
                    "loop '{}': controller '{}' reads '{key}', which no worker writes and is not seeded",
                    self.name,
                    controller.name()
                )));
            }
        }

        Ok(LoopDriver {
            name: self.name,
            description: self.description,
            worker,
            controller: Arc::new(controller),
            max_iterations: self.max_iterations,
        })
    }
}

/// Drains a [`LoopEventStream`] into its final outcome and state.
pub async fn collect_outcome(mut stream: LoopEventStream) -> Result<(LoopOutcome, StateStore)> {
    while let Some(event) = stream.next().await {
        if let LoopEvent::Finished { outcome, state } = event? {
            return Ok((outcome, state));
        }
    }
    Err(TurnloopError::State("loop stream ended without a final event".to_string()))
}
