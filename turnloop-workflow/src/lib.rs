//! # turnloop-workflow
//!
//! Bounded loops steered by an iteration controller.
//!
//! - [`IterationController`] - pure continue/stop decision over loop state
//! - [`StopPredicate`] - what makes a controller stop
//! - [`LoopDriver`] - runs worker then controller per round, up to a hard cap
//! - [`FnWorker`], [`SequentialWorker`], [`ParallelWorker`] - round workers
//! - [`LoopConfig`] - TOML configuration
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use turnloop_core::StateStore;
//! use turnloop_workflow::{FnWorker, IterationController, LoopDriver, StopPredicate};
//!
//! # async fn demo() -> turnloop_core::Result<()> {
//! let guesser = FnWorker::builder("guesser")
//!     .output_key("last_response")
//!     .text_handler(|_state| async { Ok("Is it 42?".to_string()) })
//!     .build()?;
//!
//! let checker = IterationController::builder("checker")
//!     .predicate(StopPredicate::result_contains("42"))
//!     .build()?;
//!
//! let driver = LoopDriver::builder("guessing_loop")
//!     .worker(Arc::new(guesser))
//!     .controller(checker)
//!     .max_iterations(5)
//!     .build()?;
//!
//! let mut state = StateStore::new();
//! let outcome = driver.run(&mut state).await?;
//! assert!(outcome.stopped_by_predicate());
//! # Ok(())
//! # }
//! ```

pub mod config;
mod controller;
mod predicate;
mod worker;
mod workflow;

pub use config::{ControllerConfig, LoopConfig, LoopSettings, PredicateConfig};
pub use controller::{
    DEFAULT_COUNTER_KEY, DEFAULT_FEEDBACK_KEY, DEFAULT_RESULT_KEY, IterationController,
    IterationControllerBuilder,
};
pub use predicate::{PredicateFn, Progress, StopPredicate};
pub use turnloop_core::Worker;
pub use worker::{FnWorker, FnWorkerBuilder};
pub use workflow::{
    DEFAULT_MAX_ITERATIONS, LoopDriver, LoopDriverBuilder, LoopEvent, LoopEventStream,
    LoopOutcome, ParallelWorker, RoundRecord, SequentialWorker, StopReason, collect_outcome,
};
