use super::base_adapter::AgentAdapter;
use crate::config::AgentVariant;
use crate::misc::batch_states::batch_states;
use crate::models::BasePolicy;
use crate::prob_distributions::BaseDistribution;
use std::fs;
use std::path::Path;
use tch::{no_grad, TchError, Tensor};
use ulid::Ulid;

/// Tutorial step 2: runs a policy network for inference. `act` is greedy,
/// `act_and_train` samples from the policy. Still no learning.
pub struct SimpleBCAgentAdapterTutorialStep2 {
    agent_id: Ulid,
    policy: Box<dyn BasePolicy>,
}

unsafe impl Send for SimpleBCAgentAdapterTutorialStep2 {}

impl SimpleBCAgentAdapterTutorialStep2 {
    pub fn new(policy: Box<dyn BasePolicy>) -> Self {
        SimpleBCAgentAdapterTutorialStep2 {
            agent_id: Ulid::new(),
            policy,
        }
    }
}

impl AgentAdapter for SimpleBCAgentAdapterTutorialStep2 {
    fn act(&self, obs: &Tensor) -> Tensor {
        no_grad(|| {
            let state = batch_states(&[obs.shallow_clone()], self.policy.device());
            self.policy.forward(&state).most_probable()
        })
    }

    fn act_and_train(&mut self, obs: &Tensor, _reward: f64) -> Tensor {
        no_grad(|| {
            let state = batch_states(&[obs.shallow_clone()], self.policy.device());
            self.policy.forward(&state).sample()
        })
    }

    fn observe_demonstration(&mut self, _obs: &Tensor, _action: &Tensor) {}

    fn stop_episode_and_train(&mut self, _obs: &Tensor, _reward: f64) {}

    fn get_statistics(&self) -> Vec<(String, f64)> {
        vec![]
    }

    fn get_agent_id(&self) -> &Ulid {
        &self.agent_id
    }

    fn variant(&self) -> AgentVariant {
        AgentVariant::TutorialStep2
    }

    fn save(&self, dirname: &str) -> Result<(), TchError> {
        fs::create_dir_all(dirname).map_err(TchError::Io)?;
        self.policy.var_store().save(Path::new(dirname).join("policy.ot"))
    }

    fn load(&mut self, dirname: &str) -> Result<(), TchError> {
        self.policy
            .var_store_mut()
            .load(Path::new(dirname).join("policy.ot"))
    }
}
