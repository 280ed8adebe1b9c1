use crate::error::Result;
use crate::state::{StateDelta, StateStore};
use async_trait::async_trait;

/// One round's unit of work.
///
/// A worker reads a snapshot of the loop state and answers with the keys it
/// wants to overwrite. It never mutates the state directly.
#[async_trait]
pub trait Worker: Send + Sync {
    fn name(&self) -> &str;

    /// Keys this worker may write. Used to check at build time that every key
    /// a stop predicate reads can actually be produced.
    fn output_keys(&self) -> Vec<String>;

    async fn run(&self, state: &StateStore) -> Result<StateDelta>;
}
