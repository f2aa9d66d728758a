use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{RunStore, StoreError};
use crate::types::{Run, RunId};

/// Process-scoped run store backed by a locked map. Unbounded by default;
/// `with_capacity` bounds it by evicting the oldest terminal record on
/// insert once full. In-flight runs are never evicted.
#[derive(Clone)]
pub struct InMemoryRunStore {
    runs: Arc<RwLock<HashMap<RunId, Run>>>,
    capacity: Option<usize>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self {
            runs: Arc::new(RwLock::new(HashMap::new())),
            capacity: None,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            runs: Arc::new(RwLock::new(HashMap::new())),
            capacity: Some(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.runs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.read().unwrap().is_empty()
    }

    fn evict_oldest_terminal(runs: &mut HashMap<RunId, Run>) {
        let oldest = runs
            .values()
            .filter(|r| r.is_terminal())
            .min_by_key(|r| r.finished_at)
            .map(|r| r.run_id);

        if let Some(id) = oldest {
            runs.remove(&id);
        }
    }
}

impl Default for InMemoryRunStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStore for InMemoryRunStore {
    fn put(&self, run: Run) {
        let mut runs = self.runs.write().unwrap();

        if let Some(existing) = runs.get(&run.run_id) {
            if existing.is_terminal() {
                return;
            }
        } else if self.capacity.map(|cap| runs.len() >= cap).unwrap_or(false) {
            Self::evict_oldest_terminal(&mut runs);
        }

        runs.insert(run.run_id, run);
    }

    fn get(&self, id: &RunId) -> Result<Run, StoreError> {
        let runs = self.runs.read().unwrap();
        runs.get(id).cloned().ok_or(StoreError::NotFound(*id))
    }

    fn mutate(&self, id: &RunId, apply: &mut dyn FnMut(&mut Run)) -> Result<Run, StoreError> {
        let mut runs = self.runs.write().unwrap();
        let run = runs.get_mut(id).ok_or(StoreError::NotFound(*id))?;

        if !run.is_terminal() {
            apply(run);
        }

        Ok(run.clone())
    }
}
