use super::base_adapter::AgentAdapter;
use crate::config::AgentVariant;
use rand::Rng;
use tch::{TchError, Tensor};
use ulid::Ulid;

/// Tutorial step 1: the bare adapter skeleton. Picks uniformly random
/// discrete actions and never learns.
pub struct SimpleBCAgentAdapterTutorialStep1 {
    agent_id: Ulid,
    n_actions: usize,
}

impl SimpleBCAgentAdapterTutorialStep1 {
    pub fn new(n_actions: usize) -> Self {
        assert!(n_actions > 0);
        SimpleBCAgentAdapterTutorialStep1 {
            agent_id: Ulid::new(),
            n_actions,
        }
    }

    fn random_action(&self) -> Tensor {
        let action = rand::thread_rng().gen_range(0..self.n_actions);
        Tensor::from_slice(&[action as i64])
    }
}

impl AgentAdapter for SimpleBCAgentAdapterTutorialStep1 {
    fn act(&self, _obs: &Tensor) -> Tensor {
        self.random_action()
    }

    fn act_and_train(&mut self, _obs: &Tensor, _reward: f64) -> Tensor {
        self.random_action()
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
        AgentVariant::TutorialStep1
    }

    fn save(&self, _dirname: &str) -> Result<(), TchError> {
        Ok(())
    }

    fn load(&mut self, _dirname: &str) -> Result<(), TchError> {
        Ok(())
    }
}
