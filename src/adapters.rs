mod base_adapter;
mod dqn_agent;
mod factory;
mod td3_agent;
mod tutorial_1;
mod tutorial_2;
mod tutorial_3;
mod tutorial_4;

pub use base_adapter::AgentAdapter;
pub use dqn_agent::DQNAgent;
pub use factory::build_adapter;
pub use td3_agent::TD3Agent;
pub use tutorial_1::SimpleBCAgentAdapterTutorialStep1;
pub use tutorial_2::SimpleBCAgentAdapterTutorialStep2;
pub use tutorial_3::SimpleBCAgentAdapterTutorialStep3;
pub use tutorial_4::SimpleBCAgentAdapterTutorialStep4;

/// The adapter training harnesses depend on. Bound to one variant for the
/// whole process; switch variants through `AdapterConfig` and
/// `build_adapter` rather than by editing this alias.
pub type SimpleBCAgentAdapter = TD3Agent;
