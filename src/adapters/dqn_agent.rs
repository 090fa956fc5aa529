use super::base_adapter::AgentAdapter;
use crate::config::AgentVariant;
use crate::explorers::BaseExplorer;
use crate::memory::TransitionBuffer;
use crate::misc::batch_states::batch_states;
use crate::models::BaseQFunction;
use rand::Rng;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tch::{nn, no_grad, Kind, TchError, Tensor};
use ulid::Ulid;

const STATISTICS_DECAY: f64 = 0.99;

/// Double-DQN over a shared n-step transition buffer.
pub struct DQNAgent {
    agent_id: Ulid,
    model: Box<dyn BaseQFunction>,
    target_model: Box<dyn BaseQFunction>,
    optimizer: nn::Optimizer,
    transition_buffer: Arc<TransitionBuffer>,
    explorer: Box<dyn BaseExplorer>,
    n_actions: usize,
    batch_size: usize,
    update_interval: usize,
    target_update_interval: usize,
    gamma: f64,
    t: usize,
    current_episode_id: Ulid,
    average_q: f64,
    average_loss: f64,
}

unsafe impl Send for DQNAgent {}

impl DQNAgent {
    pub fn new(
        model: Box<dyn BaseQFunction>,
        optimizer: nn::Optimizer,
        transition_buffer: Arc<TransitionBuffer>,
        explorer: Box<dyn BaseExplorer>,
        n_actions: usize,
        batch_size: usize,
        update_interval: usize,
        target_update_interval: usize,
        gamma: f64,
    ) -> Self {
        assert!(n_actions > 0);
        assert!(batch_size > 0);
        assert!(update_interval > 0);
        assert!(target_update_interval > 0);
        assert!((0.0..=1.0).contains(&gamma));
        let target_model = model.clone();
        DQNAgent {
            agent_id: Ulid::new(),
            model,
            target_model,
            optimizer,
            transition_buffer,
            explorer,
            n_actions,
            batch_size,
            update_interval,
            target_update_interval,
            gamma,
            t: 0,
            current_episode_id: Ulid::new(),
            average_q: 0.0,
            average_loss: 0.0,
        }
    }

    fn _update(&mut self) {
        if self.transition_buffer.len() < self.batch_size {
            return;
        }
        let experiences = self.transition_buffer.sample(self.batch_size, true);
        let mut states: Vec<Tensor> = vec![];
        let mut actions: Vec<Tensor> = vec![];
        let mut next_states: Vec<Tensor> = vec![];
        let mut rewards: Vec<f64> = vec![];
        let mut non_terminal: Vec<f64> = vec![];
        for experience in &experiences {
            states.push(experience.state.shallow_clone());
            actions.push(experience.action.as_ref().unwrap().shallow_clone());
            rewards.push(experience.n_step_discounted_reward.lock().unwrap().unwrap());
            match &*experience.n_step_after_experience.lock().unwrap() {
                Some(after) if !after.is_episode_terminal => {
                    next_states.push(after.state.shallow_clone());
                    non_terminal.push(1.0);
                }
                Some(after) => {
                    next_states.push(after.state.shallow_clone());
                    non_terminal.push(0.0);
                }
                None => {
                    next_states.push(experience.state.shallow_clone());
                    non_terminal.push(0.0);
                }
            }
        }
        let device = self.model.device();
        let states = batch_states(&states, device);
        let next_states = batch_states(&next_states, device);
        let actions = Tensor::stack(&actions, 0)
            .to_kind(Kind::Int64)
            .to_device(device);
        let rewards = Tensor::from_slice(&rewards)
            .to_kind(Kind::Float)
            .to_device(device);
        let non_terminal = Tensor::from_slice(&non_terminal)
            .to_kind(Kind::Float)
            .to_device(device);

        let gamma_n = self.gamma.powi(self.transition_buffer.n_steps() as i32);
        let targets = no_grad(|| {
            // Double DQN: the online network selects, the target evaluates.
            let greedy = self.model.forward(&next_states).argmax(1, true);
            let next_q = self
                .target_model
                .forward(&next_states)
                .gather(1, &greedy, false)
                .squeeze_dim(1);
            rewards + next_q * non_terminal * gamma_n
        });
        let pred_q = self
            .model
            .forward(&states)
            .gather(1, &actions, false)
            .squeeze_dim(1);
        let loss = (&pred_q - targets).square().mean(Kind::Float);
        self.optimizer.zero_grad();
        loss.backward();
        self.optimizer.step();

        self.average_q += (1.0 - STATISTICS_DECAY)
            * (pred_q.mean(Kind::Float).double_value(&[]) - self.average_q);
        self.average_loss +=
            (1.0 - STATISTICS_DECAY) * (loss.double_value(&[]) - self.average_loss);
    }

    fn _sync_target_model(&mut self) {
        self.target_model = self.model.clone();
    }
}

impl AgentAdapter for DQNAgent {
    fn act(&self, obs: &Tensor) -> Tensor {
        no_grad(|| {
            let state = batch_states(&[obs.shallow_clone()], self.model.device());
            self.model.forward(&state).argmax(1, false)
        })
    }

    fn act_and_train(&mut self, obs: &Tensor, reward: f64) -> Tensor {
        self.t += 1;
        let q_values = no_grad(|| {
            let state = batch_states(&[obs.shallow_clone()], self.model.device());
            self.model.forward(&state)
        });

        let greedy_action_func = || q_values.argmax(1, false).int64_value(&[0]) as usize;
        let random_action_func = || rand::thread_rng().gen_range(0..self.n_actions);
        let action_idx =
            self.explorer
                .select_action(self.t, &random_action_func, &greedy_action_func);
        let action = Tensor::from_slice(&[action_idx as i64]);

        self.transition_buffer.append(
            self.agent_id,
            self.current_episode_id,
            obs.shallow_clone(),
            Some(action.shallow_clone()),
            reward,
            false,
            self.gamma,
        );

        if self.t % self.update_interval == 0 {
            self._update();
        }
        if self.t % self.target_update_interval == 0 {
            self._sync_target_model();
        }
        action
    }

    fn observe_demonstration(&mut self, _obs: &Tensor, _action: &Tensor) {}

    fn stop_episode_and_train(&mut self, obs: &Tensor, reward: f64) {
        self.transition_buffer.append(
            self.agent_id,
            self.current_episode_id,
            obs.shallow_clone(),
            None,
            reward,
            true,
            self.gamma,
        );
        self.current_episode_id = Ulid::new();
    }

    fn get_statistics(&self) -> Vec<(String, f64)> {
        vec![
            ("average_q".to_string(), self.average_q),
            ("average_loss".to_string(), self.average_loss),
        ]
    }

    fn get_agent_id(&self) -> &Ulid {
        &self.agent_id
    }

    fn variant(&self) -> AgentVariant {
        AgentVariant::Dqn
    }

    fn save(&self, dirname: &str) -> Result<(), TchError> {
        fs::create_dir_all(dirname).map_err(TchError::Io)?;
        self.model.var_store().save(Path::new(dirname).join("model.ot"))
    }

    fn load(&mut self, dirname: &str) -> Result<(), TchError> {
        self.model
            .var_store_mut()
            .load(Path::new(dirname).join("model.ot"))?;
        self._sync_target_model();
        Ok(())
    }
}
