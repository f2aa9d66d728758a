pub mod memory;

pub use memory::InMemoryRunStore;

use thiserror::Error;

use crate::types::{Run, RunId};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("run {0} not found")]
    NotFound(RunId),
}

/// Concurrency-safe mapping from run id to run record. The store is the
/// single source of truth for run state; the lifecycle engine is its only
/// writer.
pub trait RunStore: Send + Sync {
    /// Inserts or overwrites the record for `run.run_id`. Overwriting a
    /// terminal record is ignored (frozen-record invariant).
    fn put(&self, run: Run);

    /// Snapshot of the current record. A snapshot of an in-flight run may
    /// be stale by the time the caller looks at it.
    fn get(&self, id: &RunId) -> Result<Run, StoreError>;

    /// Atomic read-modify-write, returning the post-mutation snapshot.
    /// If the stored record is already terminal the closure is not invoked
    /// and the frozen snapshot is returned. All state transitions go
    /// through this primitive so that a completing worker and a concurrent
    /// cancel request cannot produce a lost update.
    fn mutate(&self, id: &RunId, apply: &mut dyn FnMut(&mut Run)) -> Result<Run, StoreError>;
}
