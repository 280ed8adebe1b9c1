//! TOML configuration for loops and controllers.
//!
//! ```toml
//! [loop]
//! name = "content_refiner"
//! max_iterations = 5
//!
//! [controller]
//! name = "critic"
//! result_key = "current_draft"
//!
//! [controller.predicate]
//! kind = "counter_at_least"
//! step = 25
//! threshold = 90
//! ```

use crate::controller::{
    DEFAULT_COUNTER_KEY, DEFAULT_FEEDBACK_KEY, DEFAULT_RESULT_KEY, IterationController,
    IterationControllerBuilder,
};
use crate::predicate::StopPredicate;
use crate::workflow::{DEFAULT_MAX_ITERATIONS, LoopDriver, LoopDriverBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use turnloop_core::{Result, TurnloopError, Worker};

/// Environment variable overriding `loop.max_iterations`.
pub const ENV_MAX_ITERATIONS: &str = "TURNLOOP_MAX_ITERATIONS";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopConfig {
    #[serde(rename = "loop", default)]
    pub settings: LoopSettings,
    pub controller: ControllerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoopSettings {
    #[serde(default = "default_loop_name")]
    pub name: String,
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self { name: default_loop_name(), max_iterations: default_max_iterations() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControllerConfig {
    #[serde(default = "default_controller_name")]
    pub name: String,
    #[serde(default = "default_counter_key")]
    pub counter_key: String,
    #[serde(default = "default_result_key")]
    pub result_key: String,
    #[serde(default = "default_feedback_key")]
    pub feedback_key: String,
    pub predicate: PredicateConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredicateConfig {
    CounterAtLeast { step: i64, threshold: i64 },
    ResultContains { needle: String },
    Any { predicates: Vec<PredicateConfig> },
    All { predicates: Vec<PredicateConfig> },
}

impl From<&PredicateConfig> for StopPredicate {
    fn from(config: &PredicateConfig) -> Self {
        match config {
            PredicateConfig::CounterAtLeast { step, threshold } => {
                StopPredicate::counter_at_least(*step, *threshold)
            }
            PredicateConfig::ResultContains { needle } => {
                StopPredicate::result_contains(needle.clone())
            }
            PredicateConfig::Any { predicates } => {
                StopPredicate::Any(predicates.iter().map(StopPredicate::from).collect())
            }
            PredicateConfig::All { predicates } => {
                StopPredicate::All(predicates.iter().map(StopPredicate::from).collect())
            }
        }
    }
}

fn default_loop_name() -> String {
    "loop".to_string()
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

fn default_controller_name() -> String {
    "controller".to_string()
}

fn default_counter_key() -> String {
    DEFAULT_COUNTER_KEY.to_string()
}

fn default_result_key() -> String {
    DEFAULT_RESULT_KEY.to_string()
}

fn default_feedback_key() -> String {
    DEFAULT_FEEDBACK_KEY.to_string()
}

impl LoopConfig {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        toml::from_str(input)
            .map_err(|e| TurnloopError::Config(format!("invalid loop configuration: {e}")))
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loaded loop configuration");
        Self::from_toml_str(&contents)
    }

    /// Applies overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup`.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MAX_ITERATIONS) {
            self.settings.max_iterations = raw.trim().parse().map_err(|_| {
                TurnloopError::Config(format!("{ENV_MAX_ITERATIONS} must be a positive integer, got '{raw}'"))
            })?;
        }
        Ok(())
    }

    /// Controller builder preloaded with the configured keys and predicate,
    /// ready for message customisation.
    pub fn controller_builder(&self) -> IterationControllerBuilder {
        let c = &self.controller;
        IterationController::builder(&c.name)
            .counter_key(&c.counter_key)
            .result_key(&c.result_key)
            .feedback_key(&c.feedback_key)
            .predicate(StopPredicate::from(&c.predicate))
    }

    /// Driver builder with the configured name and cap; worker and controller
    /// still need to be supplied.
    pub fn driver_builder(&self) -> LoopDriverBuilder {
        LoopDriver::builder(&self.settings.name).max_iterations(self.settings.max_iterations)
    }

    /// Builds a driver around `worker` using the default controller messages.
    pub fn build_driver(&self, worker: Arc<dyn Worker>) -> Result<LoopDriver> {
        let controller = self.controller_builder().build()?;
        self.driver_builder().worker(worker).controller(controller).build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REFINER: &str = r#"
        [loop]
        name = "content_refiner"
        max_iterations = 5

        [controller]
        name = "critic"
        result_key = "current_draft"

        [controller.predicate]
        kind = "counter_at_least"
        step = 25
        threshold = 90
    "#;

    #[test]
    fn test_parse_refiner_config() {
        let config = LoopConfig::from_toml_str(REFINER).unwrap();
        assert_eq!(config.settings.name, "content_refiner");
        assert_eq!(config.settings.max_iterations, 5);
        assert_eq!(config.controller.counter_key, "iteration");
        assert_eq!(config.controller.result_key, "current_draft");
        assert_eq!(config.controller.feedback_key, "feedback");
        assert_eq!(
            config.controller.predicate,
            PredicateConfig::CounterAtLeast { step: 25, threshold: 90 }
        );
    }

    #[test]
    fn test_from_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(REFINER.as_bytes()).unwrap();

        let config = LoopConfig::from_file(file.path()).unwrap();
        assert_eq!(config, LoopConfig::from_toml_str(REFINER).unwrap());

        let missing = file.path().with_extension("missing");
        let err = LoopConfig::from_file(&missing).unwrap_err();
        assert!(matches!(err, TurnloopError::Io(_)));
    }

    #[test]
    fn test_loop_section_defaults() {
        let config = LoopConfig::from_toml_str(
            r#"
            [controller.predicate]
            kind = "result_contains"
            needle = "42"
            "#,
        )
        .unwrap();
        assert_eq!(config.settings, LoopSettings::default());
        assert_eq!(config.settings.max_iterations, DEFAULT_MAX_ITERATIONS);
        assert_eq!(config.controller.name, "controller");
    }

    #[test]
    fn test_nested_predicates() {
        let config = LoopConfig::from_toml_str(
            r#"
            [controller.predicate]
            kind = "any"
            predicates = [
                { kind = "result_contains", needle = "42" },
                { kind = "counter_at_least", step = 1, threshold = 3 },
            ]
            "#,
        )
        .unwrap();
        let predicate = StopPredicate::from(&config.controller.predicate);
        assert!(matches!(predicate, StopPredicate::Any(ref inner) if inner.len() == 2));
    }

    #[test]
    fn test_unknown_predicate_kind_is_config_error() {
        let err = LoopConfig::from_toml_str(
            r#"
            [controller.predicate]
            kind = "sometimes"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, TurnloopError::Config(_)));
    }

    #[test]
    fn test_env_override() {
        let mut config = LoopConfig::from_toml_str(REFINER).unwrap();
        config
            .apply_overrides_from(|key| (key == ENV_MAX_ITERATIONS).then(|| "8".to_string()))
            .unwrap();
        assert_eq!(config.settings.max_iterations, 8);

        let err = config
            .apply_overrides_from(|_| Some("many".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_MAX_ITERATIONS));
    }

    #[test]
    fn test_invalid_predicate_fails_controller_build() {
        let config = LoopConfig::from_toml_str(
            r#"
            [controller.predicate]
            kind = "counter_at_least"
            step = 0
            threshold = 90
            "#,
        )
        .unwrap();
        assert!(config.controller_builder().build().is_err());
    }
}
