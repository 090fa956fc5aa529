use super::base_q_network::BaseQFunction;
use crate::misc::soft_update::soft_update;
use crate::misc::weight_initializer::{he_init, xavier_init};
use tch::nn::{linear, Init, Linear, LinearConfig, Module, VarStore};
use tch::{Device, Tensor};

/// Fully connected Q-network. Maps a (possibly flattened) input batch to one
/// value per output head, ReLU between layers, linear output.
pub struct FCQNetwork {
    vs: VarStore,
    layers: Vec<Linear>,
    input_dim: i64,
    output_dim: i64,
    hidden_sizes: Vec<i64>,
}

impl FCQNetwork {
    pub fn new(vs: VarStore, input_dim: i64, output_dim: i64, hidden_sizes: &[i64]) -> Self {
        assert!(!hidden_sizes.is_empty());
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
            output_dim,
            LinearConfig {
                ws_init: xavier_init(in_dim, output_dim),
                bs_init: Some(Init::Const(0.0)),
                bias: true,
            },
        ));

        FCQNetwork {
            vs,
            layers,
            input_dim,
            output_dim,
            hidden_sizes: hidden_sizes.to_vec(),
        }
    }
}

impl BaseQFunction for FCQNetwork {
    fn forward(&self, x: &Tensor) -> Tensor {
        let mut h = x.view([-1, self.input_dim]);
        for (i, layer) in self.layers.iter().enumerate() {
            h = layer.forward(&h);
            if i + 1 < self.layers.len() {
                h = h.relu();
            }
        }
        h.view([-1, self.output_dim])
    }

    fn device(&self) -> Device {
        self.vs.device()
    }

    fn clone(&self) -> Box<dyn BaseQFunction> {
        let cloned = FCQNetwork::new(
            VarStore::new(self.device()),
            self.input_dim,
            self.output_dim,
            &self.hidden_sizes,
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
