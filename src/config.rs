use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read adapter config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse adapter config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("unknown agent variant: {0}")]
    UnknownVariant(String),
}

/// The interchangeable agent-adapter implementations. The active variant is
/// an explicit configuration value resolved once at startup; `Td3` is the
/// default and matches the `SimpleBCAgentAdapter` alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentVariant {
    TutorialStep1,
    TutorialStep2,
    TutorialStep3,
    TutorialStep4,
    Dqn,
    #[default]
    Td3,
}

impl AgentVariant {
    pub fn all() -> [AgentVariant; 6] {
        [
            AgentVariant::TutorialStep1,
            AgentVariant::TutorialStep2,
            AgentVariant::TutorialStep3,
            AgentVariant::TutorialStep4,
            AgentVariant::Dqn,
            AgentVariant::Td3,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            AgentVariant::TutorialStep1 => "tutorial_step1",
            AgentVariant::TutorialStep2 => "tutorial_step2",
            AgentVariant::TutorialStep3 => "tutorial_step3",
            AgentVariant::TutorialStep4 => "tutorial_step4",
            AgentVariant::Dqn => "dqn",
            AgentVariant::Td3 => "td3",
        }
    }
}

impl FromStr for AgentVariant {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AgentVariant::all()
            .into_iter()
            .find(|variant| variant.name() == s)
            .ok_or_else(|| ConfigError::UnknownVariant(s.to_string()))
    }
}

/// Everything needed to wire any of the six variants. Discrete agents read
/// `action_dim` as the number of actions; TD3 reads it as the number of
/// continuous action components.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdapterConfig {
    pub variant: AgentVariant,
    pub obs_dim: i64,
    pub action_dim: i64,
    pub hidden_sizes: Vec<i64>,
    pub gamma: f64,
    pub learning_rate: f64,
    pub batch_size: usize,
    pub update_interval: usize,
    pub target_update_interval: usize,
    pub replay_capacity: usize,
    pub n_steps: usize,
    pub demo_capacity: usize,
    pub min_prob: f64,
    pub start_epsilon: f64,
    pub end_epsilon: f64,
    pub decay_steps: usize,
    pub tau: f64,
    pub policy_delay: usize,
    pub exploration_sigma: f64,
    pub target_noise_sigma: f64,
    pub target_noise_clip: f64,
    pub min_action: f64,
    pub max_action: f64,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        AdapterConfig {
            variant: AgentVariant::default(),
            obs_dim: 4,
            action_dim: 2,
            hidden_sizes: vec![64, 64],
            gamma: 0.99,
            learning_rate: 3e-4,
            batch_size: 32,
            update_interval: 8,
            target_update_interval: 100,
            replay_capacity: 10000,
            n_steps: 1,
            demo_capacity: 10000,
            min_prob: 0.0,
            start_epsilon: 1.0,
            end_epsilon: 0.05,
            decay_steps: 10000,
            tau: 0.005,
            policy_delay: 2,
            exploration_sigma: 0.1,
            target_noise_sigma: 0.2,
            target_noise_clip: 0.5,
            min_action: -1.0,
            max_action: 1.0,
        }
    }
}

impl AdapterConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Self::from_json(&fs::read_to_string(path)?)
    }
}
