use super::base_adapter::AgentAdapter;
use crate::config::AgentVariant;
use crate::memory::DemonstrationBuffer;
use crate::misc::batch_states::batch_states;
use crate::models::BasePolicy;
use crate::prob_distributions::BaseDistribution;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tch::{nn, no_grad, Kind, TchError, Tensor};
use ulid::Ulid;

const STATISTICS_DECAY: f64 = 0.99;

/// Tutorial step 4: the complete behavioral-cloning adapter. Expert pairs go
/// into a bounded buffer; every `update_interval` demonstrations the policy
/// takes a minibatch negative log-likelihood step.
pub struct SimpleBCAgentAdapterTutorialStep4 {
    agent_id: Ulid,
    policy: Box<dyn BasePolicy>,
    optimizer: nn::Optimizer,
    demonstrations: Arc<DemonstrationBuffer>,
    batch_size: usize,
    update_interval: usize,
    n_demonstrations: usize,
    average_loss: f64,
    average_entropy: f64,
}

unsafe impl Send for SimpleBCAgentAdapterTutorialStep4 {}

impl SimpleBCAgentAdapterTutorialStep4 {
    pub fn new(
        policy: Box<dyn BasePolicy>,
        optimizer: nn::Optimizer,
        demonstrations: Arc<DemonstrationBuffer>,
        batch_size: usize,
        update_interval: usize,
    ) -> Self {
        assert!(batch_size > 0);
        assert!(update_interval > 0);
        SimpleBCAgentAdapterTutorialStep4 {
            agent_id: Ulid::new(),
            policy,
            optimizer,
            demonstrations,
            batch_size,
            update_interval,
            n_demonstrations: 0,
            average_loss: 0.0,
            average_entropy: 0.0,
        }
    }

    fn _update(&mut self) {
        if self.demonstrations.len() < self.batch_size {
            return;
        }
        let minibatch = self.demonstrations.sample(self.batch_size);
        let device = self.policy.device();
        let states: Vec<Tensor> = minibatch.iter().map(|d| d.state.shallow_clone()).collect();
        let actions: Vec<Tensor> = minibatch.iter().map(|d| d.action.shallow_clone()).collect();
        let states = batch_states(&states, device);
        let actions = Tensor::stack(&actions, 0)
            .to_kind(Kind::Int64)
            .to_device(device);

        let dist = self.policy.forward(&states);
        let loss = -dist.log_prob(&actions).mean(Kind::Float);
        self.optimizer.zero_grad();
        loss.backward();
        self.optimizer.step();

        let entropy = dist.entropy().mean(Kind::Float).double_value(&[]);
        self.average_loss +=
            (1.0 - STATISTICS_DECAY) * (loss.double_value(&[]) - self.average_loss);
        self.average_entropy += (1.0 - STATISTICS_DECAY) * (entropy - self.average_entropy);
    }
}

impl AgentAdapter for SimpleBCAgentAdapterTutorialStep4 {
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

    fn observe_demonstration(&mut self, obs: &Tensor, action: &Tensor) {
        self.demonstrations
            .append(obs.shallow_clone(), action.shallow_clone());
        self.n_demonstrations += 1;
        if self.n_demonstrations % self.update_interval == 0 {
            self._update();
        }
    }

    fn stop_episode_and_train(&mut self, _obs: &Tensor, _reward: f64) {}

    fn get_statistics(&self) -> Vec<(String, f64)> {
        vec![
            ("average_loss".to_string(), self.average_loss),
            ("average_entropy".to_string(), self.average_entropy),
        ]
    }

    fn get_agent_id(&self) -> &Ulid {
        &self.agent_id
    }

    fn variant(&self) -> AgentVariant {
        AgentVariant::TutorialStep4
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
