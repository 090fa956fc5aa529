use std::sync::{Arc, Mutex};
use tch::Tensor;
use ulid::Ulid;

pub struct Experience {
    pub agent_id: Ulid,
    pub episode_id: Ulid,
    pub state: Tensor,
    pub action: Option<Tensor>,
    /// Reward observed on arriving at `state`.
    pub reward_for_this_state: f64,
    pub is_episode_terminal: bool,
    /// Filled once the n-step horizon completes or the episode ends.
    pub n_step_discounted_reward: Mutex<Option<f64>>,
    /// The experience n steps later; None when the episode ended first.
    pub n_step_after_experience: Mutex<Option<Arc<Experience>>>,
}

// Tensor does not implement Sync due to its raw pointer; buffer access is
// serialized behind the owning buffer's lock.
unsafe impl Sync for Experience {}
