use tch::{Device, Tensor};

/// Stacks single observations into the batch given as input to a model.
pub(crate) fn batch_states(states: &[Tensor], device: Device) -> Tensor {
    Tensor::stack(states, 0).to_device(device)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_states_shape() {
        let states = vec![
            Tensor::from_slice(&[1.0, 2.0, 3.0]),
            Tensor::from_slice(&[4.0, 5.0, 6.0]),
        ];

        let batch = batch_states(&states, Device::Cpu);
        assert_eq!(batch.size(), vec![2, 3]);
        assert_eq!(batch.device(), Device::Cpu);
    }

    #[test]
    fn test_batch_states_values() {
        let states = vec![
            Tensor::from_slice(&[1.0, 2.0]),
            Tensor::from_slice(&[3.0, 4.0]),
        ];

        let batch = batch_states(&states, Device::Cpu);
        assert_eq!(batch.double_value(&[0, 0]), 1.0);
        assert_eq!(batch.double_value(&[1, 1]), 4.0);
    }
}
