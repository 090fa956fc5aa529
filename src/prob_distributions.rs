mod base_distribution;
mod softmax;

pub use base_distribution::BaseDistribution;
pub use softmax::SoftmaxDistribution;
