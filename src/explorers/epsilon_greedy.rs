use super::base_explorer::BaseExplorer;
use rand::Rng;

/// Epsilon-greedy exploration with linear decay from `start_epsilon` to
/// `end_epsilon` over `decay_steps` steps.
pub struct EpsilonGreedy {
    start_epsilon: f64,
    end_epsilon: f64,
    decay_steps: usize,
}

impl EpsilonGreedy {
    pub fn new(start_epsilon: f64, end_epsilon: f64, decay_steps: usize) -> Self {
        assert!((0.0..=1.0).contains(&start_epsilon));
        assert!((0.0..=1.0).contains(&end_epsilon));
        assert!(decay_steps > 0);
        EpsilonGreedy {
            start_epsilon,
            end_epsilon,
            decay_steps,
        }
    }

    fn epsilon_at(&self, t: usize) -> f64 {
        if t >= self.decay_steps {
            return self.end_epsilon;
        }
        let progress = t as f64 / self.decay_steps as f64;
        self.start_epsilon + (self.end_epsilon - self.start_epsilon) * progress
    }
}

impl BaseExplorer for EpsilonGreedy {
    fn select_action(
        &self,
        t: usize,
        random_action_func: &dyn Fn() -> usize,
        greedy_action_func: &dyn Fn() -> usize,
    ) -> usize {
        if rand::thread_rng().gen::<f64>() < self.epsilon_at(t) {
            random_action_func()
        } else {
            greedy_action_func()
        }
    }
}
