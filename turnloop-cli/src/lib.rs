//! # turnloop-cli
//!
//! Command-line runner for the turnloop sample loops.
//!
//! - `guess` - guess until the answer mentions 42, or the round cap is hit
//! - `refine` - draft and revise until the critic's score clears the threshold
//! - `research` - fan out to several sources in parallel, then merge
//!
//! Every run prints the final result and whether the loop stopped on its
//! predicate or on the iteration cap.

pub mod cli;
pub mod config;
pub mod scenarios;

pub use scenarios::{ScenarioReport, run_guess, run_refine, run_research};
