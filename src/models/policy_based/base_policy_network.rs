use crate::prob_distributions::BaseDistribution;
use tch::{nn, Device, Tensor};

/// Stochastic policy: maps an observation batch to an action distribution.
pub trait BasePolicy {
    fn forward(&self, x: &Tensor) -> Box<dyn BaseDistribution>;
    fn device(&self) -> Device;
    fn var_store(&self) -> &nn::VarStore;
    fn var_store_mut(&mut self) -> &mut nn::VarStore;
}

/// Deterministic policy: maps an observation batch straight to actions.
pub trait BaseDeterministicPolicy {
    fn forward(&self, x: &Tensor) -> Tensor;
    fn device(&self) -> Device;
    fn clone(&self) -> Box<dyn BaseDeterministicPolicy>;
    /// Same positional pairing contract as `BaseQFunction::parameters`.
    fn parameters(&self) -> Vec<Tensor>;
    fn var_store(&self) -> &nn::VarStore;
    fn var_store_mut(&mut self) -> &mut nn::VarStore;
}
