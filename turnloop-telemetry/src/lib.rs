//! # turnloop telemetry
//!
//! Structured logging for turnloop using `tracing`.
//!
//! ## Usage
//!
//! ```rust
//! use turnloop_telemetry::{init_telemetry, info, loop_run_span};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_telemetry("my-loop")?;
//!
//!     let span = loop_run_span("guessing_loop", 5);
//!     let _enter = span.enter();
//!     info!("loop started");
//!     Ok(())
//! }
//! ```

pub mod init;
pub mod spans;

// Re-export tracing macros for convenience
pub use tracing::{Instrument, Span, debug, error, info, instrument, trace, warn};

pub use init::{LogFormat, init_telemetry, init_telemetry_with};
pub use spans::*;
