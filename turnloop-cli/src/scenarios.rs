//! The sample loops shipped with the CLI.
//!
//! Workers here are scripted stand-ins for model calls: the interesting part
//! is how the controller and driver steer them.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use turnloop_core::{ReadonlyState, Result, StateStore, TurnloopError, Worker};
use turnloop_workflow::{
    FnWorker, IterationController, LoopConfig, LoopDriver, LoopOutcome, ParallelWorker,
    PredicateConfig, SequentialWorker, StopPredicate,
};

const DEFAULT_REFINER_CONFIG: &str = include_str!("../config/refiner.toml");

/// Final result of a sample loop and how it ended.
#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub scenario: &'static str,
    pub result: String,
    pub outcome: LoopOutcome,
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.result)?;
        write!(
            f,
            "[{}] stopped by {} after {} round(s)",
            self.scenario, self.outcome.stop_reason, self.outcome.iterations
        )
    }
}

/// Guessing loop: the guesser cycles through `guesses`, the checker stops
/// once a guess mentions 42.
pub fn guessing_loop(guesses: Vec<String>, max_iterations: u32) -> Result<LoopDriver> {
    if guesses.is_empty() {
        return Err(TurnloopError::Config("guessing loop needs at least one guess".to_string()));
    }
    let guesses = Arc::new(guesses);

    let guesser = FnWorker::builder("guesser")
        .description("Makes a guess at the target number")
        .output_key("last_response")
        .text_handler(move |state| {
            let guesses = guesses.clone();
            async move {
                let turn = state.counter("iteration").rem_euclid(guesses.len() as i64) as usize;
                Ok(guesses[turn].clone())
            }
        })
        .build()?;

    let checker = IterationController::builder("checker")
        .description("Checks whether the guess is correct")
        .predicate(StopPredicate::result_contains("42"))
        .build()?;

    LoopDriver::builder("guessing_loop")
        .description("Repeatedly guesses a number until correct or max iterations reached")
        .worker(Arc::new(guesser))
        .controller(checker)
        .max_iterations(max_iterations)
        .build()
}

pub async fn run_guess(guesses: Vec<String>, max_iterations: u32) -> Result<ScenarioReport> {
    let driver = guessing_loop(guesses, max_iterations)?;
    let mut state = StateStore::new();
    let outcome = driver.run(&mut state).await?;
    Ok(ScenarioReport { scenario: "guess", result: state.text("last_response"), outcome })
}

pub fn generate_draft(topic: &str) -> String {
    format!("Initial draft about {topic}: This is a basic overview of the subject matter...")
}

pub fn improve_draft(draft: &str, feedback: &str) -> String {
    format!("Improved draft based on feedback: {draft}\n\nAddressed issues: {feedback}")
}

/// Configuration used by `refine` when no file is given.
pub fn default_refiner_config() -> Result<LoopConfig> {
    LoopConfig::from_toml_str(DEFAULT_REFINER_CONFIG)
}

/// Points per round of the first counter predicate, searching inside `any`/`all`.
fn score_step(predicate: &PredicateConfig) -> Option<i64> {
    match predicate {
        PredicateConfig::CounterAtLeast { step, .. } => Some(*step),
        PredicateConfig::ResultContains { .. } => None,
        PredicateConfig::Any { predicates } | PredicateConfig::All { predicates } => {
            predicates.iter().find_map(score_step)
        }
    }
}

/// Content refiner: the writer drafts then revises, the critic scores each
/// revision and hands back feedback until the draft is good enough.
pub fn content_refiner(config: &LoopConfig) -> Result<LoopDriver> {
    let draft_key = config.controller.result_key.clone();
    let feedback_key = config.controller.feedback_key.clone();
    let step = score_step(&config.controller.predicate).ok_or_else(|| {
        TurnloopError::Config(format!(
            "refiner '{}' needs a counter_at_least predicate to score drafts",
            config.settings.name
        ))
    })?;

    let writer = FnWorker::builder("writer")
        .description("Writes and refines content drafts")
        .output_key(draft_key.clone())
        .text_handler(move |state| {
            let draft = state.text(&draft_key);
            let feedback = state.text(&feedback_key);
            let topic = state.text("topic");
            async move {
                if draft.is_empty() {
                    Ok(generate_draft(&topic))
                } else {
                    Ok(improve_draft(&draft, &feedback))
                }
            }
        })
        .build()?;

    let critic = config
        .controller_builder()
        .description("Evaluates content quality and provides feedback")
        .continue_message(move |p| {
            format!("Quality {}/100. Needs more clarity and detail.", p.score(step))
        })
        .stop_message(|_| "Draft is excellent, no further changes needed.".to_string())
        .build()?;

    config
        .driver_builder()
        .description("Iteratively refines content until quality threshold is met")
        .worker(Arc::new(writer))
        .controller(critic)
        .seed_keys(["topic"])
        .build()
}

pub async fn run_refine(topic: &str, config: &LoopConfig) -> Result<ScenarioReport> {
    let driver = content_refiner(config)?;
    let mut state = StateStore::with_values([("topic".to_string(), Value::from(topic))])?;
    let outcome = driver.run(&mut state).await?;
    Ok(ScenarioReport {
        scenario: "refine",
        result: state.text(&config.controller.result_key).trim().to_string(),
        outcome,
    })
}

fn search_source(
    name: &str,
    output_key: &str,
    label: &'static str,
    finding: &'static str,
) -> Result<Arc<dyn Worker>> {
    let worker = FnWorker::builder(name)
        .output_key(output_key)
        .text_handler(move |state| {
            let topic = state.text("topic");
            async move { Ok(format!("{label} for {topic}: {finding}")) }
        })
        .build()?;
    Ok(Arc::new(worker))
}

/// Research pipeline: three sources searched in parallel, then merged into
/// one report. Runs as a single-round loop that stops once the report exists.
pub fn research_pipeline() -> Result<LoopDriver> {
    let sources = ParallelWorker::new(
        "parallel_researcher",
        vec![
            search_source(
                "news_researcher",
                "news_results",
                "News results",
                "Latest developments include XYZ...",
            )?,
            search_source(
                "academic_researcher",
                "academic_results",
                "Academic results",
                "Recent papers discuss ABC...",
            )?,
            search_source(
                "social_researcher",
                "social_results",
                "Social media trends",
                "People are discussing DEF...",
            )?,
        ],
    )?
    .with_description("Fetches news, academic, and social results in parallel");

    let merger = FnWorker::builder("research_merger")
        .description("Merges research from multiple sources")
        .output_key("merged_report")
        .text_handler(|state| {
            let report = format!(
                "Combined Research Report:\n\n\
                 News Insights: {}\n\n\
                 Academic Findings: {}\n\n\
                 Social Trends: {}\n\n\
                 This comprehensive view provides a well-rounded perspective on the topic.",
                state.text("news_results"),
                state.text("academic_results"),
                state.text("social_results"),
            );
            async move { Ok(report) }
        })
        .build()?;

    let stages: Vec<Arc<dyn Worker>> = vec![Arc::new(sources), Arc::new(merger)];
    let pipeline = SequentialWorker::new("research_pipeline", stages)?
        .with_description("Runs parallel research and then merges the outputs");

    let done = IterationController::builder("report_check")
        .result_key("merged_report")
        .predicate(StopPredicate::custom(["merged_report"], |progress, _| {
            !progress.result.is_empty()
        }))
        .build()?;

    LoopDriver::builder("research")
        .worker(Arc::new(pipeline))
        .controller(done)
        .max_iterations(1)
        .seed_keys(["topic"])
        .build()
}

pub async fn run_research(topic: &str) -> Result<ScenarioReport> {
    let driver = research_pipeline()?;
    let mut state = StateStore::with_values([("topic".to_string(), Value::from(topic))])?;
    let outcome = driver.run(&mut state).await?;
    Ok(ScenarioReport { scenario: "research", result: state.text("merged_report"), outcome })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_refiner_config_parses() {
        let config = default_refiner_config().unwrap();
        assert_eq!(config.settings.name, "content_refiner");
        assert_eq!(config.controller.result_key, "current_draft");
    }

    #[test]
    fn test_guessing_loop_needs_guesses() {
        assert!(guessing_loop(Vec::new(), 5).is_err());
    }

    #[test]
    fn test_score_step_searches_combinators() {
        let nested = PredicateConfig::Any {
            predicates: vec![
                PredicateConfig::ResultContains { needle: "done".to_string() },
                PredicateConfig::All {
                    predicates: vec![PredicateConfig::CounterAtLeast { step: 10, threshold: 50 }],
                },
            ],
        };
        assert_eq!(score_step(&nested), Some(10));
        assert_eq!(
            score_step(&PredicateConfig::ResultContains { needle: "done".to_string() }),
            None
        );
    }

    #[test]
    fn test_refiner_rejects_predicate_without_counter() {
        let config = LoopConfig::from_toml_str(
            r#"
            [controller]
            result_key = "current_draft"

            [controller.predicate]
            kind = "result_contains"
            needle = "excellent"
            "#,
        )
        .unwrap();
        let err = content_refiner(&config).unwrap_err();
        assert!(matches!(err, TurnloopError::Config(_)));
    }

    #[test]
    fn test_improve_draft_mentions_feedback() {
        let improved = improve_draft("draft", "Quality 25/100.");
        assert!(improved.ends_with("Addressed issues: Quality 25/100."));
    }
}
