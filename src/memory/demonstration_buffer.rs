use crate::misc::replay_memory::ReplayMemory;
use std::sync::{Arc, Mutex};
use tch::Tensor;

/// One expert (state, action) pair.
pub struct Demonstration {
    pub state: Tensor,
    pub action: Tensor,
}

// Tensor does not implement Sync due to its raw pointer; buffer access is
// serialized behind the owning buffer's lock.
unsafe impl Sync for Demonstration {}

/// Bounded store of expert pairs for imitation learning, shareable across
/// adapters. Oldest demonstrations are overwritten once full.
pub struct DemonstrationBuffer {
    memory: Mutex<ReplayMemory<Arc<Demonstration>>>,
}

impl DemonstrationBuffer {
    pub fn new(capacity: usize) -> Self {
        DemonstrationBuffer {
            memory: Mutex::new(ReplayMemory::new(capacity)),
        }
    }

    pub fn append(&self, state: Tensor, action: Tensor) -> Arc<Demonstration> {
        let demonstration = Arc::new(Demonstration { state, action });
        self.memory.lock().unwrap().push(demonstration.clone());
        demonstration
    }

    pub fn sample(&self, num_demonstrations: usize) -> Vec<Arc<Demonstration>> {
        self.memory
            .lock()
            .unwrap()
            .sample_with_replacement(num_demonstrations)
    }

    pub fn all(&self) -> Vec<Arc<Demonstration>> {
        self.memory.lock().unwrap().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.memory.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.memory.lock().unwrap().clear();
    }
}
