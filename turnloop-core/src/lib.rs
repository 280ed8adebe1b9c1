//! # turnloop-core
//!
//! Core traits and types for turnloop loops, workers and controllers.
//!
//! ## Overview
//!
//! - [`StateStore`] / [`State`] / [`ReadonlyState`] - the map threaded through loop rounds
//! - [`StateDelta`] - keys a worker or controller wants overwritten
//! - [`Verdict`] / [`Evaluation`] - a controller's continue/stop decision
//! - [`Worker`] - the unit of work run once per round
//! - [`TurnloopError`] / [`Result`] - unified error handling
//!
//! ## State defaults
//!
//! Reading a missing key never fails: counters default to `0`, text to `""`.
//!
//! ```rust
//! use turnloop_core::{ReadonlyState, StateStore};
//!
//! let state = StateStore::new();
//! assert_eq!(state.counter("iteration"), 0);
//! assert_eq!(state.text("last_response"), "");
//! ```

pub mod error;
pub mod state;
pub mod verdict;
pub mod worker;

pub use error::{Result, TurnloopError};
pub use state::{
    MAX_STATE_KEY_LEN, ReadonlyState, State, StateDelta, StateStore, counter_value, text_value,
    validate_state_key,
};
pub use verdict::{Evaluation, Verdict};
pub use worker::Worker;
