mod loop_driver;
mod parallel_worker;
mod sequential_worker;

pub use loop_driver::{
    DEFAULT_MAX_ITERATIONS, LoopDriver, LoopDriverBuilder, LoopEvent, LoopEventStream,
    LoopOutcome, RoundRecord, StopReason, collect_outcome,
};
pub use parallel_worker::ParallelWorker;
pub use sequential_worker::SequentialWorker;
