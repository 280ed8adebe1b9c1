//! Span helpers for loop execution
//!
//! Provides pre-configured spans for instrumenting loops, rounds and workers.

use tracing::Span;

/// Create a span covering a whole bounded loop
///
/// # Example
/// ```
/// use turnloop_telemetry::loop_run_span;
/// let span = loop_run_span("content_refiner", 5);
/// let _enter = span.enter();
/// ```
pub fn loop_run_span(loop_name: &str, max_iterations: u32) -> Span {
    tracing::info_span!(
        "loop.run",
        loop.name = loop_name,
        loop.max_iterations = max_iterations,
        loop.stop_reason = tracing::field::Empty,
    )
}

/// Create a span for a single round of a loop
pub fn round_span(loop_name: &str, round: u32) -> Span {
    tracing::debug_span!("loop.round", loop.name = loop_name, round = round)
}

/// Create a span for a worker invocation
pub fn worker_run_span(worker_name: &str) -> Span {
    tracing::debug_span!("worker.run", worker.name = worker_name)
}

/// Record why a loop stopped on its span
pub fn record_stop_reason(span: &Span, reason: &str) {
    span.record("loop.stop_reason", reason);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spans_without_subscriber() {
        let span = loop_run_span("guessing_loop", 5);
        record_stop_reason(&span, "predicate");
        let _enter = span.enter();
        let _round = round_span("guessing_loop", 1).entered();
        let _worker = worker_run_span("guesser").entered();
    }
}
