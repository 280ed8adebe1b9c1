use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use turnloop_core::{Result, StateDelta, StateStore, TurnloopError, Worker, validate_state_key};

type DeltaHandler = Box<
    dyn Fn(StateStore) -> Pin<Box<dyn Future<Output = Result<StateDelta>> + Send>> + Send + Sync,
>;

type TextHandler =
    Box<dyn Fn(StateStore) -> Pin<Box<dyn Future<Output = Result<String>> + Send>> + Send + Sync>;

enum Handler {
    Delta(DeltaHandler),
    Text(TextHandler),
}

/// Worker backed by an async closure.
///
/// Either produces text stored under a single output key, or a full delta
/// restricted to the keys declared with [`FnWorkerBuilder::writes`].
pub struct FnWorker {
    name: String,
    description: String,
    output_keys: Vec<String>,
    handler: Handler,
}

impl FnWorker {
    pub fn builder(name: impl Into<String>) -> FnWorkerBuilder {
        FnWorkerBuilder::new(name)
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

#[async_trait]
impl Worker for FnWorker {
    fn name(&self) -> &str {
        &self.name
    }

    fn output_keys(&self) -> Vec<String> {
        self.output_keys.clone()
    }

    async fn run(&self, state: &StateStore) -> Result<StateDelta> {
        match &self.handler {
            Handler::Text(handler) => {
                let text = handler(state.snapshot()).await?;
                let mut delta = StateDelta::new();
                delta.insert(self.output_keys[0].clone(), Value::String(text));
                Ok(delta)
            }
            Handler::Delta(handler) => {
                let delta = handler(state.snapshot()).await?;
                if let Some(key) = delta.keys().find(|key| !self.output_keys.contains(key)) {
                    return Err(TurnloopError::worker(
                        &self.name,
                        format!("wrote undeclared key '{key}'"),
                    ));
                }
                Ok(delta)
            }
        }
    }
}

pub struct FnWorkerBuilder {
    name: String,
    description: String,
    output_key: Option<String>,
    writes: Vec<String>,
    handler: Option<Handler>,
}

impl FnWorkerBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            output_key: None,
            writes: Vec::new(),
            handler: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Key that receives the text produced by a [`text_handler`](Self::text_handler).
    pub fn output_key(mut self, key: impl Into<String>) -> Self {
        self.output_key = Some(key.into());
        self
    }

    /// Keys a delta [`handler`](Self::handler) is allowed to write.
    pub fn writes<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.writes.extend(keys.into_iter().map(Into::into));
        self
    }

    pub fn handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(StateStore) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<StateDelta>> + Send + 'static,
    {
        self.handler = Some(Handler::Delta(Box::new(move |state| Box::pin(handler(state)))));
        self
    }

    pub fn text_handler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(StateStore) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        self.handler = Some(Handler::Text(Box::new(move |state| Box::pin(handler(state)))));
        self
    }

    pub fn build(self) -> Result<FnWorker> {
        let handler = self.handler.ok_or_else(|| {
            TurnloopError::Config(format!("worker '{}' requires a handler", self.name))
        })?;

        let output_keys = match &handler {
            Handler::Text(_) => {
                let key = self.output_key.ok_or_else(|| {
                    TurnloopError::Config(format!(
                        "worker '{}' uses a text handler but has no output_key",
                        self.name
                    ))
                })?;
                vec![key]
            }
            Handler::Delta(_) => {
                let mut keys: Vec<String> = Vec::new();
                for key in self.writes.into_iter().chain(self.output_key) {
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
                keys
            }
        };

        for key in &output_keys {
            validate_state_key(key)
                .map_err(|e| TurnloopError::Config(format!("worker '{}': {e}", self.name)))?;
        }

        Ok(FnWorker { name: self.name, description: self.description, output_keys, handler })
    }
}
