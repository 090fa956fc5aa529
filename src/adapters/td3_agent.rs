use super::base_adapter::AgentAdapter;
use crate::config::AgentVariant;
use crate::memory::TransitionBuffer;
use crate::misc::batch_states::batch_states;
use crate::misc::soft_update::soft_update;
use crate::models::{BaseDeterministicPolicy, BaseQFunction};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tch::{nn, no_grad, Kind, TchError, Tensor};
use ulid::Ulid;

const STATISTICS_DECAY: f64 = 0.99;

/// Twin-delayed DDPG for continuous actions: clipped double-Q targets with
/// smoothing noise, actor updates delayed by `policy_delay` critic updates,
/// Polyak-averaged target networks.
pub struct TD3Agent {
    agent_id: Ulid,
    actor: Box<dyn BaseDeterministicPolicy>,
    target_actor: Box<dyn BaseDeterministicPolicy>,
    critic1: Box<dyn BaseQFunction>,
    critic2: Box<dyn BaseQFunction>,
    target_critic1: Box<dyn BaseQFunction>,
    target_critic2: Box<dyn BaseQFunction>,
    actor_optimizer: nn::Optimizer,
    critic1_optimizer: nn::Optimizer,
    critic2_optimizer: nn::Optimizer,
    transition_buffer: Arc<TransitionBuffer>,
    gamma: f64,
    tau: f64,
    batch_size: usize,
    update_interval: usize,
    policy_delay: usize,
    exploration_sigma: f64,
    target_noise_sigma: f64,
    target_noise_clip: f64,
    min_action: f64,
    max_action: f64,
    t: usize,
    n_critic_updates: usize,
    current_episode_id: Ulid,
    average_critic_loss: f64,
    average_actor_loss: f64,
}

unsafe impl Send for TD3Agent {}

impl TD3Agent {
    pub fn new(
        actor: Box<dyn BaseDeterministicPolicy>,
        critic1: Box<dyn BaseQFunction>,
        critic2: Box<dyn BaseQFunction>,
        actor_optimizer: nn::Optimizer,
        critic1_optimizer: nn::Optimizer,
        critic2_optimizer: nn::Optimizer,
        transition_buffer: Arc<TransitionBuffer>,
        gamma: f64,
        tau: f64,
        batch_size: usize,
        update_interval: usize,
        policy_delay: usize,
        exploration_sigma: f64,
        target_noise_sigma: f64,
        target_noise_clip: f64,
        min_action: f64,
        max_action: f64,
    ) -> Self {
        assert!((0.0..=1.0).contains(&gamma));
        assert!(tau > 0.0 && tau <= 1.0);
        assert!(batch_size > 0);
        assert!(update_interval > 0);
        assert!(policy_delay > 0);
        assert!(exploration_sigma >= 0.0);
        assert!(target_noise_sigma >= 0.0);
        assert!(target_noise_clip >= 0.0);
        assert!(min_action < max_action);
        let target_actor = actor.clone();
        let target_critic1 = critic1.clone();
        let target_critic2 = critic2.clone();
        TD3Agent {
            agent_id: Ulid::new(),
            actor,
            target_actor,
            critic1,
            critic2,
            target_critic1,
            target_critic2,
            actor_optimizer,
            critic1_optimizer,
            critic2_optimizer,
            transition_buffer,
            gamma,
            tau,
            batch_size,
            update_interval,
            policy_delay,
            exploration_sigma,
            target_noise_sigma,
            target_noise_clip,
            min_action,
            max_action,
            t: 0,
            n_critic_updates: 0,
            current_episode_id: Ulid::new(),
            average_critic_loss: 0.0,
            average_actor_loss: 0.0,
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
        let device = self.actor.device();
        let states = batch_states(&states, device);
        let next_states = batch_states(&next_states, device);
        let actions = Tensor::stack(&actions, 0)
            .to_kind(Kind::Float)
            .to_device(device);
        let rewards = Tensor::from_slice(&rewards)
            .to_kind(Kind::Float)
            .to_device(device);
        let non_terminal = Tensor::from_slice(&non_terminal)
            .to_kind(Kind::Float)
            .to_device(device);

        let gamma_n = self.gamma.powi(self.transition_buffer.n_steps() as i32);
        let targets = no_grad(|| {
            // Target policy smoothing: perturb the target action with
            // clipped noise before evaluating the target critics.
            let noise = (Tensor::randn_like(&actions) * self.target_noise_sigma)
                .clamp(-self.target_noise_clip, self.target_noise_clip);
            let next_actions = (self.target_actor.forward(&next_states) + noise)
                .clamp(self.min_action, self.max_action);
            let next_input = Tensor::cat(&[&next_states, &next_actions], 1);
            let q1 = self.target_critic1.forward(&next_input).squeeze_dim(1);
            let q2 = self.target_critic2.forward(&next_input).squeeze_dim(1);
            rewards + q1.minimum(&q2) * non_terminal * gamma_n
        });

        let input = Tensor::cat(&[&states, &actions], 1);
        let q1_pred = self.critic1.forward(&input).squeeze_dim(1);
        let q2_pred = self.critic2.forward(&input).squeeze_dim(1);
        let critic_loss = (&q1_pred - &targets).square().mean(Kind::Float)
            + (&q2_pred - &targets).square().mean(Kind::Float);
        self.critic1_optimizer.zero_grad();
        self.critic2_optimizer.zero_grad();
        critic_loss.backward();
        self.critic1_optimizer.step();
        self.critic2_optimizer.step();
        self.n_critic_updates += 1;
        self.average_critic_loss +=
            (1.0 - STATISTICS_DECAY) * (critic_loss.double_value(&[]) - self.average_critic_loss);

        if self.n_critic_updates % self.policy_delay == 0 {
            let actor_actions = self.actor.forward(&states);
            let actor_input = Tensor::cat(&[&states, &actor_actions], 1);
            let actor_loss = -self
                .critic1
                .forward(&actor_input)
                .squeeze_dim(1)
                .mean(Kind::Float);
            self.actor_optimizer.zero_grad();
            actor_loss.backward();
            self.actor_optimizer.step();
            self.average_actor_loss += (1.0 - STATISTICS_DECAY)
                * (actor_loss.double_value(&[]) - self.average_actor_loss);

            soft_update(self.target_actor.parameters(), &self.actor.parameters(), self.tau);
            soft_update(
                self.target_critic1.parameters(),
                &self.critic1.parameters(),
                self.tau,
            );
            soft_update(
                self.target_critic2.parameters(),
                &self.critic2.parameters(),
                self.tau,
            );
        }
    }

    fn _sync_target_models(&mut self) {
        self.target_actor = self.actor.clone();
        self.target_critic1 = self.critic1.clone();
        self.target_critic2 = self.critic2.clone();
    }
}

impl AgentAdapter for TD3Agent {
    fn act(&self, obs: &Tensor) -> Tensor {
        no_grad(|| {
            let state = batch_states(&[obs.shallow_clone()], self.actor.device());
            self.actor.forward(&state).squeeze_dim(0)
        })
    }

    fn act_and_train(&mut self, obs: &Tensor, reward: f64) -> Tensor {
        self.t += 1;
        let action = no_grad(|| {
            let state = batch_states(&[obs.shallow_clone()], self.actor.device());
            let greedy = self.actor.forward(&state);
            let noise = Tensor::randn_like(&greedy) * self.exploration_sigma;
            (greedy + noise)
                .clamp(self.min_action, self.max_action)
                .squeeze_dim(0)
        });

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
            ("average_critic_loss".to_string(), self.average_critic_loss),
            ("average_actor_loss".to_string(), self.average_actor_loss),
        ]
    }

    fn get_agent_id(&self) -> &Ulid {
        &self.agent_id
    }

    fn variant(&self) -> AgentVariant {
        AgentVariant::Td3
    }

    fn save(&self, dirname: &str) -> Result<(), TchError> {
        fs::create_dir_all(dirname).map_err(TchError::Io)?;
        let dirname = Path::new(dirname);
        self.actor.var_store().save(dirname.join("actor.ot"))?;
        self.critic1.var_store().save(dirname.join("critic1.ot"))?;
        self.critic2.var_store().save(dirname.join("critic2.ot"))
    }

    fn load(&mut self, dirname: &str) -> Result<(), TchError> {
        let dirname = Path::new(dirname);
        self.actor.var_store_mut().load(dirname.join("actor.ot"))?;
        self.critic1.var_store_mut().load(dirname.join("critic1.ot"))?;
        self.critic2.var_store_mut().load(dirname.join("critic2.ot"))?;
        self._sync_target_models();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FCDeterministicPolicy, FCQNetwork};
    use tch::nn::{OptimizerConfig, VarStore};
    use tch::Device;

    const OBS_DIM: i64 = 3;
    const ACTION_DIM: i64 = 2;

    fn make_agent(buffer: Arc<TransitionBuffer>) -> TD3Agent {
        let actor_vs = VarStore::new(Device::Cpu);
        let actor_optimizer = nn::Adam::default().build(&actor_vs, 1e-3).unwrap();
        let actor =
            FCDeterministicPolicy::new(actor_vs, OBS_DIM, ACTION_DIM, &[32, 32], -2.0, 2.0);

        let critic1_vs = VarStore::new(Device::Cpu);
        let critic1_optimizer = nn::Adam::default().build(&critic1_vs, 1e-3).unwrap();
        let critic1 = FCQNetwork::new(critic1_vs, OBS_DIM + ACTION_DIM, 1, &[32, 32]);

        let critic2_vs = VarStore::new(Device::Cpu);
        let critic2_optimizer = nn::Adam::default().build(&critic2_vs, 1e-3).unwrap();
        let critic2 = FCQNetwork::new(critic2_vs, OBS_DIM + ACTION_DIM, 1, &[32, 32]);

        TD3Agent::new(
            Box::new(actor),
            Box::new(critic1),
            Box::new(critic2),
            actor_optimizer,
            critic1_optimizer,
            critic2_optimizer,
            buffer,
            0.99,
            0.01,
            8,
            4,
            2,
            0.1,
            0.2,
            0.5,
            -2.0,
            2.0,
        )
    }

    fn random_obs() -> Tensor {
        Tensor::randn([OBS_DIM], (Kind::Float, Device::Cpu))
    }

    #[test]
    fn test_new() {
        let agent = make_agent(Arc::new(TransitionBuffer::new(1000, 1)));
        assert_eq!(agent.batch_size, 8);
        assert_eq!(agent.policy_delay, 2);
        assert_eq!(agent.t, 0);
        assert_eq!(agent.variant(), AgentVariant::Td3);
    }

    #[test]
    fn test_actions_within_bounds() {
        let mut agent = make_agent(Arc::new(TransitionBuffer::new(1000, 1)));
        for _ in 0..50 {
            let obs = random_obs();
            let greedy = agent.act(&obs);
            let explored = agent.act_and_train(&obs, 0.0);
            assert_eq!(greedy.size(), vec![ACTION_DIM]);
            assert_eq!(explored.size(), vec![ACTION_DIM]);
            assert!(greedy.min().double_value(&[]) >= -2.0);
            assert!(greedy.max().double_value(&[]) <= 2.0);
            assert!(explored.min().double_value(&[]) >= -2.0);
            assert!(explored.max().double_value(&[]) <= 2.0);
        }
    }

    #[test]
    fn test_updates_and_delayed_policy_steps() {
        let buffer = Arc::new(TransitionBuffer::new(1000, 1));
        let mut agent = make_agent(Arc::clone(&buffer));

        for _ in 0..200 {
            agent.act_and_train(&random_obs(), 1.0);
        }

        assert!(agent.n_critic_updates > 0);
        // Actor updates lag the critics by policy_delay.
        assert!(agent.n_critic_updates / agent.policy_delay > 0);
        assert!(agent.average_critic_loss != 0.0);
        assert!(agent.average_actor_loss != 0.0);
        assert!(buffer.len() > 0);
    }

    #[test]
    fn test_target_networks_track_slowly() {
        let mut agent = make_agent(Arc::new(TransitionBuffer::new(1000, 1)));

        for _ in 0..100 {
            agent.act_and_train(&random_obs(), 0.5);
        }

        let obs = batch_states(&[random_obs()], Device::Cpu);
        let online = agent.actor.forward(&obs);
        let target = agent.target_actor.forward(&obs);
        // Polyak updates moved the target, but it must not equal the online
        // network after this few steps.
        assert!(!online.allclose(&target, 1e-9, 1e-9, false));
    }

    #[test]
    fn test_episode_boundary() {
        let buffer = Arc::new(TransitionBuffer::new(1000, 1));
        let mut agent = make_agent(Arc::clone(&buffer));

        let first_episode = agent.current_episode_id;
        agent.act_and_train(&random_obs(), 0.0);
        agent.stop_episode_and_train(&random_obs(), 1.0);
        assert_ne!(agent.current_episode_id, first_episode);

        // The stored experience bootstraps from the terminal state only
        // through the mask, never past it.
        for experience in buffer.sample(10, true) {
            let after = experience.n_step_after_experience.lock().unwrap();
            assert!(after.as_ref().unwrap().is_episode_terminal);
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let mut agent = make_agent(Arc::new(TransitionBuffer::new(1000, 1)));
        for _ in 0..100 {
            agent.act_and_train(&random_obs(), 1.0);
        }

        let dirname = std::env::temp_dir().join(format!("simple_bc_td3_{}", Ulid::new()));
        let dirname = dirname.to_str().unwrap();
        agent.save(dirname).unwrap();

        let mut restored = make_agent(Arc::new(TransitionBuffer::new(1000, 1)));
        restored.load(dirname).unwrap();

        let obs = random_obs();
        assert!(restored.act(&obs).allclose(&agent.act(&obs), 1e-6, 1e-6, false));
        std::fs::remove_dir_all(dirname).unwrap();
    }
}
