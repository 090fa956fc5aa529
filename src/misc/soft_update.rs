use tch::{no_grad, Tensor};

/// Polyak update: target <- tau * source + (1 - tau) * target.
/// Both slices must come from structurally identical networks so that
/// parameters pair up positionally.
pub(crate) fn soft_update(mut target: Vec<Tensor>, source: &[Tensor], tau: f64) {
    assert_eq!(target.len(), source.len());
    no_grad(|| {
        for (t, s) in target.iter_mut().zip(source.iter()) {
            let blended = s * tau + t.shallow_clone() * (1.0 - tau);
            t.copy_(&blended);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_soft_update_blends() {
        let target = Tensor::from_slice(&[0.0, 0.0]);
        let source = Tensor::from_slice(&[1.0, 2.0]);

        soft_update(vec![target.shallow_clone()], &[source], 0.1);

        assert!((target.double_value(&[0]) - 0.1).abs() < 1e-6);
        assert!((target.double_value(&[1]) - 0.2).abs() < 1e-6);
    }

    #[test]
    fn test_soft_update_full_copy_at_tau_one() {
        let target = Tensor::from_slice(&[5.0]);
        let source = Tensor::from_slice(&[-3.0]);

        soft_update(vec![target.shallow_clone()], &[source], 1.0);

        assert!((target.double_value(&[0]) + 3.0).abs() < 1e-6);
    }

    #[test]
    #[should_panic]
    fn test_soft_update_length_mismatch() {
        let target = Tensor::from_slice(&[0.0]);
        soft_update(vec![target], &[], 0.5);
    }
}
