use super::base_distribution::BaseDistribution;
use tch::{Kind, Tensor};

/// Categorical distribution over action logits with inverse temperature
/// `beta` and an optional probability floor `min_prob`.
pub struct SoftmaxDistribution {
    logits: Tensor,
    beta: f64,
    min_prob: f64,
}

impl SoftmaxDistribution {
    pub fn new(logits: Tensor, beta: f64, min_prob: f64) -> Self {
        assert!(beta > 0.0);
        assert!(min_prob >= 0.0);
        let n_actions = *logits.size().last().unwrap();
        assert!(min_prob * n_actions as f64 <= 1.0);
        SoftmaxDistribution {
            logits,
            beta,
            min_prob,
        }
    }

    pub fn all_prob(&self) -> Tensor {
        let probs = (&self.logits * self.beta).softmax(-1, Kind::Float);
        if self.min_prob > 0.0 {
            let n_actions = *self.logits.size().last().unwrap();
            probs * (1.0 - self.min_prob * n_actions as f64) + self.min_prob
        } else {
            probs
        }
    }

    pub fn all_log_prob(&self) -> Tensor {
        if self.min_prob > 0.0 {
            self.all_prob().log()
        } else {
            (&self.logits * self.beta).log_softmax(-1, Kind::Float)
        }
    }
}

impl BaseDistribution for SoftmaxDistribution {
    fn sample(&self) -> Tensor {
        self.all_prob().multinomial(1, true).squeeze_dim(-1)
    }

    fn most_probable(&self) -> Tensor {
        self.all_prob().argmax(-1, false)
    }

    fn prob(&self, x: &Tensor) -> Tensor {
        self.all_prob().gather(-1, x, false).squeeze_dim(-1)
    }

    fn log_prob(&self, x: &Tensor) -> Tensor {
        self.all_log_prob().gather(-1, x, false).squeeze_dim(-1)
    }

    fn entropy(&self) -> Tensor {
        -(self.all_prob() * self.all_log_prob()).sum_dim_intlist(
            [-1].as_ref(),
            false,
            Kind::Float,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logits_1234() -> Tensor {
        Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0]).reshape([1, 4])
    }

    #[test]
    fn test_all_prob_sums_to_one() {
        let dist = SoftmaxDistribution::new(logits_1234(), 1.0, 0.0);
        let total = dist.all_prob().sum(Kind::Float).double_value(&[]);
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_all_prob_respects_floor() {
        let dist = SoftmaxDistribution::new(logits_1234(), 1.0, 0.1);
        let min_val = dist.all_prob().min().double_value(&[]);
        assert!(min_val >= 0.1);
        let total = dist.all_prob().sum(Kind::Float).double_value(&[]);
        assert!((total - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_prob() {
        let dist = SoftmaxDistribution::new(logits_1234(), 1.0, 0.0);
        let expected = [0.032058604, 0.087144318, 0.236882818, 0.643914260];
        for (i, &p) in expected.iter().enumerate() {
            let x = Tensor::from_slice(&[i as i64]).reshape([1, 1]);
            assert!((dist.prob(&x).double_value(&[]) - p).abs() < 1e-6);
        }
    }

    #[test]
    fn test_log_prob() {
        let dist = SoftmaxDistribution::new(logits_1234(), 1.0, 0.0);
        let expected = [-3.440189702, -2.440189702, -1.440189702, -0.440189702];
        for (i, &lp) in expected.iter().enumerate() {
            let x = Tensor::from_slice(&[i as i64]).reshape([1, 1]);
            assert!((dist.log_prob(&x).double_value(&[]) - lp).abs() < 1e-6);
        }
    }

    #[test]
    fn test_entropy() {
        let dist = SoftmaxDistribution::new(logits_1234(), 1.0, 0.0);
        let entropy = dist.entropy().double_value(&[]);
        assert!((entropy - 0.947536964).abs() < 1e-6);
    }

    #[test]
    fn test_sample_in_support() {
        let dist = SoftmaxDistribution::new(logits_1234(), 1.0, 0.0);
        for _ in 0..20 {
            let sample = dist.sample();
            assert_eq!(sample.size(), vec![1]);
            let value = sample.int64_value(&[0]);
            assert!((0..4).contains(&value));
        }
    }

    #[test]
    fn test_most_probable() {
        let dist = SoftmaxDistribution::new(logits_1234(), 1.0, 0.0);
        assert_eq!(dist.most_probable().int64_value(&[]), 3);

        let logits = Tensor::from_slice(&[1.0, 3.5, 1.0, 2.0]).reshape([1, 4]);
        let dist = SoftmaxDistribution::new(logits, 1.0, 0.1);
        assert_eq!(dist.most_probable().int64_value(&[]), 1);
    }

    #[test]
    fn test_invalid_min_prob() {
        let result = std::panic::catch_unwind(|| {
            SoftmaxDistribution::new(logits_1234(), 1.0, 0.3);
        });
        assert!(result.is_err());
    }
}
