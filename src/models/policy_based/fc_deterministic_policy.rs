use super::base_policy_network::BaseDeterministicPolicy;
use crate::misc::soft_update::soft_update;
use crate::misc::weight_initializer::{he_init, xavier_init};
use tch::nn::{linear, Init, Linear, LinearConfig, Module, VarStore};
use tch::{Device, Tensor};

/// Fully connected deterministic actor. The tanh output head is rescaled so
/// every action component lies in [min_action, max_action].
pub struct FCDeterministicPolicy {
    vs: VarStore,
    layers: Vec<Linear>,
    input_dim: i64,
    action_dim: i64,
    hidden_sizes: Vec<i64>,
    min_action: f64,
    max_action: f64,
}

impl FCDeterministicPolicy {
    pub fn new(
        vs: VarStore,
        input_dim: i64,
        action_dim: i64,
        hidden_sizes: &[i64],
        min_action: f64,
        max_action: f64,
    ) -> Self {
        assert!(!hidden_sizes.is_empty());
        assert!(min_action < max_action);
        let root = vs.root();
        let mut layers: Vec<Linear> = Vec::new();

        let mut in_dim = input_dim;
        for &out_dim in hidden_sizes {
            layers.push(linear(
                &root,
                in_dim,
                out_dim,
                LinearConfig {
                    ws_init: he_init(in_dim),
                    bs_init: Some(Init::Const(0.0)),
                    bias: true,
                },
            ));
            in_dim = out_dim;
        }
        layers.push(linear(
            &root,
            in_dim,
            action_dim,
            LinearConfig {
                ws_init: xavier_init(in_dim, action_dim),
                bs_init: Some(Init::Const(0.0)),
                bias: true,
            },
        ));

        FCDeterministicPolicy {
            vs,
            layers,
            input_dim,
            action_dim,
            hidden_sizes: hidden_sizes.to_vec(),
            min_action,
            max_action,
        }
    }
}

impl BaseDeterministicPolicy for FCDeterministicPolicy {
    fn forward(&self, x: &Tensor) -> Tensor {
        let mut h = x.view([-1, self.input_dim]);
        for (i, layer) in self.layers.iter().enumerate() {
            h = layer.forward(&h);
            if i + 1 < self.layers.len() {
                h = h.relu();
            }
        }
        let half_range = (self.max_action - self.min_action) / 2.0;
        let midpoint = (self.max_action + self.min_action) / 2.0;
        h.tanh() * half_range + midpoint
    }

    fn device(&self) -> Device {
        self.vs.device()
    }

    fn clone(&self) -> Box<dyn BaseDeterministicPolicy> {
        let cloned = FCDeterministicPolicy::new(
            VarStore::new(self.device()),
            self.input_dim,
            self.action_dim,
            &self.hidden_sizes,
            self.min_action,
            self.max_action,
        );
        soft_update(cloned.parameters(), &self.parameters(), 1.0);
        Box::new(cloned)
    }

    fn parameters(&self) -> Vec<Tensor> {
        let mut params = Vec::new();
        for layer in &self.layers {
            params.push(layer.ws.shallow_clone());
            if let Some(bs) = &layer.bs {
                params.push(bs.shallow_clone());
            }
        }
        params
    }

    fn var_store(&self) -> &VarStore {
        &self.vs
    }

    fn var_store_mut(&mut self) -> &mut VarStore {
        &mut self.vs
    }
}
