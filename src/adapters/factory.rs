use super::base_adapter::AgentAdapter;
use super::dqn_agent::DQNAgent;
use super::td3_agent::TD3Agent;
use super::tutorial_1::SimpleBCAgentAdapterTutorialStep1;
use super::tutorial_2::SimpleBCAgentAdapterTutorialStep2;
use super::tutorial_3::SimpleBCAgentAdapterTutorialStep3;
use super::tutorial_4::SimpleBCAgentAdapterTutorialStep4;
use crate::config::{AdapterConfig, AgentVariant};
use crate::explorers::EpsilonGreedy;
use crate::memory::{DemonstrationBuffer, TransitionBuffer};
use crate::models::{FCDeterministicPolicy, FCQNetwork, FCSoftmaxPolicy};
use std::sync::Arc;
use tch::nn::{self, OptimizerConfig, VarStore};
use tch::{Device, TchError};

/// Resolves the configured variant once and wires its networks, optimizers,
/// and buffers. Callers hold the result behind the common trait and never
/// learn which concrete adapter is active.
pub fn build_adapter(config: &AdapterConfig) -> Result<Box<dyn AgentAdapter>, TchError> {
    let device = Device::cuda_if_available();
    let adapter: Box<dyn AgentAdapter> = match config.variant {
        AgentVariant::TutorialStep1 => Box::new(SimpleBCAgentAdapterTutorialStep1::new(
            config.action_dim as usize,
        )),
        AgentVariant::TutorialStep2 => {
            let vs = VarStore::new(device);
            let policy = FCSoftmaxPolicy::new(
                vs,
                config.obs_dim,
                config.action_dim,
                &config.hidden_sizes,
                config.min_prob,
            );
            Box::new(SimpleBCAgentAdapterTutorialStep2::new(Box::new(policy)))
        }
        AgentVariant::TutorialStep3 => {
            let vs = VarStore::new(device);
            let optimizer = nn::Adam::default().build(&vs, config.learning_rate)?;
            let policy = FCSoftmaxPolicy::new(
                vs,
                config.obs_dim,
                config.action_dim,
                &config.hidden_sizes,
                config.min_prob,
            );
            Box::new(SimpleBCAgentAdapterTutorialStep3::new(
                Box::new(policy),
                optimizer,
                Arc::new(DemonstrationBuffer::new(config.demo_capacity)),
                config.update_interval,
            ))
        }
        AgentVariant::TutorialStep4 => {
            let vs = VarStore::new(device);
            let optimizer = nn::Adam::default().build(&vs, config.learning_rate)?;
            let policy = FCSoftmaxPolicy::new(
                vs,
                config.obs_dim,
                config.action_dim,
                &config.hidden_sizes,
                config.min_prob,
            );
            Box::new(SimpleBCAgentAdapterTutorialStep4::new(
                Box::new(policy),
                optimizer,
                Arc::new(DemonstrationBuffer::new(config.demo_capacity)),
                config.batch_size,
                config.update_interval,
            ))
        }
        AgentVariant::Dqn => {
            let vs = VarStore::new(device);
            let optimizer = nn::Adam::default().build(&vs, config.learning_rate)?;
            let model = FCQNetwork::new(
                vs,
                config.obs_dim,
                config.action_dim,
                &config.hidden_sizes,
            );
            let explorer = EpsilonGreedy::new(
                config.start_epsilon,
                config.end_epsilon,
                config.decay_steps,
            );
            Box::new(DQNAgent::new(
                Box::new(model),
                optimizer,
                Arc::new(TransitionBuffer::new(config.replay_capacity, config.n_steps)),
                Box::new(explorer),
                config.action_dim as usize,
                config.batch_size,
                config.update_interval,
                config.target_update_interval,
                config.gamma,
            ))
        }
        AgentVariant::Td3 => {
            let actor_vs = VarStore::new(device);
            let actor_optimizer = nn::Adam::default().build(&actor_vs, config.learning_rate)?;
            let actor = FCDeterministicPolicy::new(
                actor_vs,
                config.obs_dim,
                config.action_dim,
                &config.hidden_sizes,
                config.min_action,
                config.max_action,
            );

            let critic_input_dim = config.obs_dim + config.action_dim;
            let critic1_vs = VarStore::new(device);
            let critic1_optimizer =
                nn::Adam::default().build(&critic1_vs, config.learning_rate)?;
            let critic1 = FCQNetwork::new(critic1_vs, critic_input_dim, 1, &config.hidden_sizes);
            let critic2_vs = VarStore::new(device);
            let critic2_optimizer =
                nn::Adam::default().build(&critic2_vs, config.learning_rate)?;
            let critic2 = FCQNetwork::new(critic2_vs, critic_input_dim, 1, &config.hidden_sizes);

            Box::new(TD3Agent::new(
                Box::new(actor),
                Box::new(critic1),
                Box::new(critic2),
                actor_optimizer,
                critic1_optimizer,
                critic2_optimizer,
                Arc::new(TransitionBuffer::new(config.replay_capacity, config.n_steps)),
                config.gamma,
                config.tau,
                config.batch_size,
                config.update_interval,
                config.policy_delay,
                config.exploration_sigma,
                config.target_noise_sigma,
                config.target_noise_clip,
                config.min_action,
                config.max_action,
            ))
        }
    };
    Ok(adapter)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_builds_td3() {
        let adapter = build_adapter(&AdapterConfig::default()).unwrap();
        assert_eq!(adapter.variant(), AgentVariant::Td3);
    }

    #[test]
    fn test_every_variant_builds_and_acts() {
        for variant in AgentVariant::all() {
            let config = AdapterConfig {
                variant,
                ..AdapterConfig::default()
            };
            let mut adapter = build_adapter(&config).unwrap();
            assert_eq!(adapter.variant(), variant);

            let obs = tch::Tensor::from_slice(&[0.1, 0.2, 0.3, 0.4]).to_kind(tch::Kind::Float);
            let _ = adapter.act(&obs);
            let _ = adapter.act_and_train(&obs, 0.0);
        }
    }

    #[test]
    fn test_selection_is_deterministic() {
        let config = AdapterConfig::from_json(r#"{"variant": "tutorial_step4"}"#).unwrap();
        let first = build_adapter(&config).unwrap();
        let second = build_adapter(&config).unwrap();
        assert_eq!(first.variant(), second.variant());
        assert_eq!(first.variant(), AgentVariant::TutorialStep4);
    }

    #[test]
    fn test_variant_comes_from_config_not_code() {
        let config = AdapterConfig::from_json(r#"{"variant": "dqn"}"#).unwrap();
        let adapter = build_adapter(&config).unwrap();
        assert_eq!(adapter.variant(), AgentVariant::Dqn);
    }
}
