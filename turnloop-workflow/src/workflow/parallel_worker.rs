use super::sequential_worker::ensure_unique_names;
use async_trait::async_trait;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::Instrument;
use turnloop_core::{Result, StateDelta, StateStore, TurnloopError, Worker};
use turnloop_telemetry::worker_run_span;

/// Parallel worker fans out to its children concurrently
///
/// Every child reads the same snapshot. Their deltas are merged in
/// declaration order; two children writing the same key is an error.
pub struct ParallelWorker {
    name: String,
    description: String,
    workers: Vec<Arc<dyn Worker>>,
}

impl ParallelWorker {
    pub fn new(name: impl Into<String>, workers: Vec<Arc<dyn Worker>>) -> Result<Self> {
        let name = name.into();
        ensure_unique_names(&name, &workers)?;

        {
            let mut owners: HashMap<String, &str> = HashMap::new();
            for worker in &workers {
                for key in worker.output_keys() {
                    if let Some(owner) = owners.insert(key.clone(), worker.name()) {
                        return Err(TurnloopError::Config(format!(
                            "'{name}': branches '{owner}' and '{}' both write '{key}'",
                            worker.name()
                        )));
                    }
                }
            }
        }

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
impl Worker for ParallelWorker {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_keys(&self) -> Vec<String> {
        self.workers.iter().flat_map(|w| w.output_keys()).collect()
    }

    async fn run(&self, state: &StateStore) -> Result<StateDelta> {
        let branches = self
            .workers
            .iter()
            .map(|worker| worker.run(state).instrument(worker_run_span(worker.name())));
        let results = join_all(branches).await;

        let mut combined = StateDelta::new();
        for (worker, result) in self.workers.iter().zip(results) {
            for (key, value) in result? {
                if combined.contains_key(&key) {
                    return Err(TurnloopError::worker(
                        &self.name,
                        format!("branch '{}' wrote '{key}' already written by another branch", worker.name()),
                    ));
                }
                combined.insert(key, value);
            }
        }

        Ok(combined)
    }
}
