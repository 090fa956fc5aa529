use super::base_policy_network::BasePolicy;
use crate::misc::weight_initializer::{he_init, xavier_init};
use crate::prob_distributions::{BaseDistribution, SoftmaxDistribution};
use tch::nn::{linear, Init, Linear, LinearConfig, Module, VarStore};
use tch::{Device, Tensor};

/// Fully connected policy over a discrete action set. The emitted
/// distribution keeps every action probability at or above `min_prob`.
pub struct FCSoftmaxPolicy {
    vs: VarStore,
    hidden_layers: Vec<Linear>,
    logits_layer: Linear,
    input_dim: i64,
    min_prob: f64,
}

impl FCSoftmaxPolicy {
    pub fn new(
        vs: VarStore,
        input_dim: i64,
        n_actions: i64,
        hidden_sizes: &[i64],
        min_prob: f64,
    ) -> Self {
        assert!(!hidden_sizes.is_empty());
        assert!(min_prob >= 0.0);
        let root = vs.root();
        let mut hidden_layers: Vec<Linear> = Vec::new();

        let mut in_dim = input_dim;
        for &out_dim in hidden_sizes {
            hidden_layers.push(linear(
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
        let logits_layer = linear(
            &root,
            in_dim,
            n_actions,
            LinearConfig {
                ws_init: xavier_init(in_dim, n_actions),
                bs_init: Some(Init::Const(0.0)),
                bias: true,
            },
        );

        FCSoftmaxPolicy {
            vs,
            hidden_layers,
            logits_layer,
            input_dim,
            min_prob,
        }
    }

    fn compute_logits(&self, x: &Tensor) -> Tensor {
        let mut h = x.view([-1, self.input_dim]);
        for layer in &self.hidden_layers {
            h = layer.forward(&h).relu();
        }
        self.logits_layer.forward(&h)
    }
}

impl BasePolicy for FCSoftmaxPolicy {
    fn forward(&self, x: &Tensor) -> Box<dyn BaseDistribution> {
        let logits = self.compute_logits(x);
        Box::new(SoftmaxDistribution::new(logits, 1.0, self.min_prob))
    }

    fn device(&self) -> Device {
        self.vs.device()
    }

    fn var_store(&self) -> &VarStore {
        &self.vs
    }

    fn var_store_mut(&mut self) -> &mut VarStore {
        &mut self.vs
    }
}
