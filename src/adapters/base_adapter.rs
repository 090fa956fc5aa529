use crate::config::AgentVariant;
use tch::{TchError, Tensor};
use ulid::Ulid;

/// Capability interface every agent adapter satisfies: construction is
/// variant-specific, everything else is what a training or serving harness
/// needs to drive the agent.
pub trait AgentAdapter {
    /// Greedy action for `obs`, without learning.
    fn act(&self, obs: &Tensor) -> Tensor;
    /// Action for `obs` while learning. `reward` is the reward observed on
    /// arriving at `obs`.
    fn act_and_train(&mut self, obs: &Tensor, reward: f64) -> Tensor;
    /// Expert (state, action) pair for imitation learners. Reward-driven
    /// agents ignore it.
    fn observe_demonstration(&mut self, obs: &Tensor, action: &Tensor);
    fn stop_episode_and_train(&mut self, obs: &Tensor, reward: f64);
    fn get_statistics(&self) -> Vec<(String, f64)>;
    fn get_agent_id(&self) -> &Ulid;
    fn variant(&self) -> AgentVariant;
    fn save(&self, dirname: &str) -> Result<(), TchError>;
    fn load(&mut self, dirname: &str) -> Result<(), TchError>;
}
