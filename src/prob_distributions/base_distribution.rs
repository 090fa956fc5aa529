use tch::Tensor;

pub trait BaseDistribution {
    fn sample(&self) -> Tensor;
    fn most_probable(&self) -> Tensor;
    fn prob(&self, x: &Tensor) -> Tensor;
    fn log_prob(&self, x: &Tensor) -> Tensor;
    fn entropy(&self) -> Tensor;
}
