use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::Instrument;
use turnloop_core::{Result, State, StateDelta, StateStore, TurnloopError, Worker};
use turnloop_telemetry::worker_run_span;

/// Sequential worker runs its children once in order.
///
/// Each child sees the deltas of the children before it; the combined delta is
/// returned to the caller, later writes winning.
pub struct SequentialWorker {
    name: String,
    description: String,
    workers: Vec<Arc<dyn Worker>>,
}

impl SequentialWorker {
    pub fn new(name: impl Into<String>, workers: Vec<Arc<dyn Worker>>) -> Result<Self> {
        let name = name.into();
        ensure_unique_names(&name, &workers)?;
        Ok(Self { name, description: String::new(), workers })
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = desc.into();
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn workers(&self) -> &[Arc<dyn Worker>] {
        &self.workers
    }
}

#[async_trait]
impl Worker for SequentialWorker {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for key in self.workers.iter().flat_map(|w| w.output_keys()) {
            if !keys.contains(&key) {
                keys.push(key);
            }
        }
        keys
    }

    async fn run(&self, state: &StateStore) -> Result<StateDelta> {
        let mut scratch = state.snapshot();
        let mut combined = StateDelta::new();

        for worker in &self.workers {
            let delta = worker.run(&scratch).instrument(worker_run_span(worker.name())).await?;
            scratch.merge(delta.clone())?;
            combined.extend(delta);
        }

        Ok(combined)
    }
}

pub(crate) fn ensure_unique_names(parent: &str, workers: &[Arc<dyn Worker>]) -> Result<()> {
    let mut seen = HashSet::new();
    for worker in workers {
        if !seen.insert(worker.name()) {
            return Err(TurnloopError::Config(format!(
                "'{parent}' has duplicate sub-worker name: {}",
                worker.name()
            )));
        }
    }
    Ok(())
}
