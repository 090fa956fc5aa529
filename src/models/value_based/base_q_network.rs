use tch::{nn, Device, Tensor};

pub trait BaseQFunction {
    fn forward(&self, x: &Tensor) -> Tensor;
    fn device(&self) -> Device;
    fn clone(&self) -> Box<dyn BaseQFunction>;
    /// Trainable tensors in a fixed structural order, paired positionally
    /// with the parameters of any network built from the same sizes.
    fn parameters(&self) -> Vec<Tensor>;
    fn var_store(&self) -> &nn::VarStore;
    fn var_store_mut(&mut self) -> &mut nn::VarStore;
}
