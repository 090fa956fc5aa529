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

const AVERAGE_LOSS_DECAY: f64 = 0.99;

/// Tutorial step 3: first learning step. Collects expert pairs and fits the
/// policy with a full-batch negative log-likelihood step every
/// `update_interval` demonstrations.
pub struct SimpleBCAgentAdapterTutorialStep3 {
    agent_id: Ulid,
    policy: Box<dyn BasePolicy>,
    optimizer: nn::Optimizer,
    demonstrations: Arc<DemonstrationBuffer>,
    update_interval: usize,
    n_demonstrations: usize,
    average_loss: f64,
}

unsafe impl Send for SimpleBCAgentAdapterTutorialStep3 {}

impl SimpleBCAgentAdapterTutorialStep3 {
    pub fn new(
        policy: Box<dyn BasePolicy>,
        optimizer: nn::Optimizer,
        demonstrations: Arc<DemonstrationBuffer>,
        update_interval: usize,
    ) -> Self {
        assert!(update_interval > 0);
        SimpleBCAgentAdapterTutorialStep3 {
            agent_id: Ulid::new(),
            policy,
            optimizer,
            demonstrations,
            update_interval,
            n_demonstrations: 0,
            average_loss: 0.0,
        }
    }

    fn _update(&mut self) {
        let demonstrations = self.demonstrations.all();
        if demonstrations.is_empty() {
            return;
        }
        let device = self.policy.device();
        let states: Vec<Tensor> = demonstrations
            .iter()
            .map(|d| d.state.shallow_clone())
            .collect();
        let actions: Vec<Tensor> = demonstrations
            .iter()
            .map(|d| d.action.shallow_clone())
            .collect();
        let states = batch_states(&states, device);
        let actions = Tensor::stack(&actions, 0)
            .to_kind(Kind::Int64)
            .to_device(device);

        let dist = self.policy.forward(&states);
        let loss = -dist.log_prob(&actions).mean(Kind::Float);
        self.optimizer.zero_grad();
        loss.backward();
        self.optimizer.step();

        self.average_loss +=
            (1.0 - AVERAGE_LOSS_DECAY) * (loss.double_value(&[]) - self.average_loss);
    }
}

impl AgentAdapter for SimpleBCAgentAdapterTutorialStep3 {
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
        vec![("average_loss".to_string(), self.average_loss)]
    }

    fn get_agent_id(&self) -> &Ulid {
        &self.agent_id
    }

    fn variant(&self) -> AgentVariant {
        AgentVariant::TutorialStep3
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
