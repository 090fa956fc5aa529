use crate::memory::Experience;
use crate::misc::cumsum::cumsum_rev;
use crate::misc::recent_window::RecentWindow;
use crate::misc::replay_memory::ReplayMemory;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tch::Tensor;
use ulid::Ulid;

/// Shared n-step experience store. An experience becomes sampleable once its
/// n-step horizon completes or its episode terminates. Terminal experiences
/// carry no action and are never sampleable themselves; experiences flushed
/// by a terminal keep a truncated discounted reward and no bootstrap
/// successor.
pub struct TransitionBuffer {
    memory: Mutex<ReplayMemory<Arc<Experience>>>,
    windows: Mutex<HashMap<Ulid, RecentWindow<Arc<Experience>>>>,
    n_steps: usize,
}

impl TransitionBuffer {
    pub fn new(capacity: usize, n_steps: usize) -> Self {
        assert!(capacity > 0);
        assert!(n_steps > 0);
        TransitionBuffer {
            memory: Mutex::new(ReplayMemory::new(capacity)),
            windows: Mutex::new(HashMap::new()),
            n_steps,
        }
    }

    pub fn append(
        &self,
        agent_id: Ulid,
        episode_id: Ulid,
        state: Tensor,
        action: Option<Tensor>,
        reward: f64,
        is_episode_terminal: bool,
        gamma: f64,
    ) -> Arc<Experience> {
        let experience = Arc::new(Experience {
            agent_id,
            episode_id,
            state,
            action,
            reward_for_this_state: reward,
            is_episode_terminal,
            n_step_discounted_reward: Mutex::new(None),
            n_step_after_experience: Mutex::new(None),
        });

        let mut windows = self.windows.lock().unwrap();
        let window = windows
            .entry(episode_id)
            .or_insert_with(|| RecentWindow::new(self.n_steps));

        if let Some(completed) = window.push(experience.clone()) {
            // The window now holds exactly the n successors of `completed`,
            // newest last.
            let rewards: Vec<f64> = window.iter().map(|e| e.reward_for_this_state).collect();
            *completed.n_step_discounted_reward.lock().unwrap() =
                Some(cumsum_rev(&rewards, gamma)[0]);
            *completed.n_step_after_experience.lock().unwrap() = Some(experience.clone());
            self.memory.lock().unwrap().push(completed);
        }

        if is_episode_terminal {
            let tail = window.drain();
            windows.remove(&episode_id);
            let rewards: Vec<f64> = tail.iter().map(|e| e.reward_for_this_state).collect();
            let discounted = cumsum_rev(&rewards, gamma);
            let mut memory = self.memory.lock().unwrap();
            for (i, exp) in tail.iter().enumerate() {
                if exp.is_episode_terminal {
                    continue;
                }
                *exp.n_step_discounted_reward.lock().unwrap() = Some(discounted[i + 1]);
                memory.push(exp.clone());
            }
        }

        experience
    }

    pub fn sample(&self, num_experiences: usize, replacement: bool) -> Vec<Arc<Experience>> {
        let memory = self.memory.lock().unwrap();
        if replacement {
            memory.sample_with_replacement(num_experiences)
        } else {
            memory.sample_without_replacement(num_experiences)
        }
    }

    pub fn len(&self) -> usize {
        self.memory.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn n_steps(&self) -> usize {
        self.n_steps
    }

    pub fn clear(&self) {
        self.memory.lock().unwrap().clear();
        self.windows.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tch::Tensor;
    use tokio::task;
    use tokio::task::LocalSet;

    fn append_state(
        buffer: &TransitionBuffer,
        agent_id: Ulid,
        episode_id: Ulid,
        value: f64,
        reward: f64,
        terminal: bool,
        gamma: f64,
    ) -> Arc<Experience> {
        let action = if terminal {
            None
        } else {
            Some(Tensor::from_slice(&[0_i64]))
        };
        buffer.append(
            agent_id,
            episode_id,
            Tensor::from_slice(&[value]),
            action,
            reward,
            terminal,
            gamma,
        )
    }

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer = TransitionBuffer::new(100, 5);
        assert!(buffer.is_empty());
        assert_eq!(buffer.n_steps(), 5);
    }

    #[test]
    fn test_append_fills_after_horizon() {
        let buffer = TransitionBuffer::new(100, 1);
        let agent = Ulid::new();
        let episode = Ulid::new();
        append_state(&buffer, agent, episode, 0.0, 0.0, false, 1.0);
        assert_eq!(buffer.len(), 0);
        append_state(&buffer, agent, episode, 1.0, 1.0, false, 1.0);
        assert_eq!(buffer.len(), 1);
        append_state(&buffer, agent, episode, 2.0, 1.0, false, 1.0);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_terminal_clears_episode_window() {
        let buffer = TransitionBuffer::new(100, 5);
        let agent = Ulid::new();
        let episode = Ulid::new();
        for i in 0..5 {
            append_state(&buffer, agent, episode, i as f64, 1.0, i == 4, 1.0);
        }
        assert!(buffer.windows.lock().unwrap().is_empty());
    }

    #[test]
    fn test_n_step_rewards_and_successors() {
        let buffer = TransitionBuffer::new(100, 2);
        let agent = Ulid::new();
        let gamma = 0.9;

        let episode = Ulid::new();
        append_state(&buffer, agent, episode, 0.0, 0.0, false, gamma);
        append_state(&buffer, agent, episode, 1.0, 2.0, false, gamma);
        append_state(&buffer, agent, episode, 2.0, 3.0, true, gamma);

        let episode = Ulid::new();
        append_state(&buffer, agent, episode, 3.0, 0.0, false, gamma);
        append_state(&buffer, agent, episode, 4.0, 0.0, false, gamma);
        append_state(&buffer, agent, episode, 5.0, 1.0, false, gamma);
        append_state(&buffer, agent, episode, 6.0, 5.0, true, gamma);

        assert_eq!(buffer.len(), 5);
        for experience in buffer.sample(500, true) {
            let discounted = experience.n_step_discounted_reward.lock().unwrap().unwrap();
            let after = experience.n_step_after_experience.lock().unwrap();
            match experience.state.double_value(&[]) as i64 {
                // Completed two-step horizon, bootstraps from the terminal
                // state (masked by the agent).
                0 => {
                    assert!((discounted - (2.0 + 0.9 * 3.0)).abs() < 1e-6);
                    assert_eq!(after.as_ref().unwrap().state.double_value(&[]), 2.0);
                }
                // Flushed by the terminal: truncated horizon, no successor.
                1 => {
                    assert!((discounted - 3.0).abs() < 1e-6);
                    assert!(after.is_none());
                }
                3 => {
                    assert!((discounted - (0.0 + 0.9 * 1.0)).abs() < 1e-6);
                    assert_eq!(after.as_ref().unwrap().state.double_value(&[]), 5.0);
                }
                4 => {
                    assert!((discounted - (1.0 + 0.9 * 5.0)).abs() < 1e-6);
                    assert_eq!(after.as_ref().unwrap().state.double_value(&[]), 6.0);
                    assert!(after.as_ref().unwrap().is_episode_terminal);
                }
                5 => {
                    assert!((discounted - 5.0).abs() < 1e-6);
                    assert!(after.is_none());
                }
                other => panic!("Unexpected state {other}"),
            }
        }
    }

    #[test]
    fn test_interleaved_episodes_stay_separate() {
        let buffer = TransitionBuffer::new(100, 1);
        let agent = Ulid::new();
        let episode_a = Ulid::new();
        let episode_b = Ulid::new();

        append_state(&buffer, agent, episode_a, 0.0, 0.0, false, 1.0);
        append_state(&buffer, agent, episode_b, 10.0, 0.0, false, 1.0);
        append_state(&buffer, agent, episode_a, 1.0, 1.0, false, 1.0);
        append_state(&buffer, agent, episode_b, 11.0, 7.0, false, 1.0);

        for experience in buffer.sample(100, true) {
            let after = experience.n_step_after_experience.lock().unwrap();
            let successor = after.as_ref().unwrap().state.double_value(&[]);
            match experience.state.double_value(&[]) as i64 {
                0 => assert_eq!(successor, 1.0),
                10 => assert_eq!(successor, 11.0),
                other => panic!("Unexpected state {other}"),
            }
        }
    }

    #[test]
    fn test_clear() {
        let buffer = TransitionBuffer::new(100, 1);
        let agent = Ulid::new();
        let episode = Ulid::new();
        for i in 0..5 {
            append_state(&buffer, agent, episode, i as f64, 0.0, false, 0.99);
        }
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.windows.lock().unwrap().is_empty());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_concurrent_appends() {
        let local = LocalSet::new();

        local
            .run_until(async {
                let buffer = Arc::new(TransitionBuffer::new(200, 3));

                let tasks: Vec<_> = (0..10)
                    .map(|i| {
                        let buffer = Arc::clone(&buffer);
                        task::spawn_local(async move {
                            let agent = Ulid::new();
                            let episode = Ulid::new();
                            for j in 0..10 {
                                append_state(
                                    &buffer,
                                    agent,
                                    episode,
                                    (i * 10 + j) as f64,
                                    1.0,
                                    false,
                                    0.99,
                                );
                                tokio::time::sleep(std::time::Duration::from_millis(1)).await;
                            }
                        })
                    })
                    .collect();

                for t in tasks {
                    t.await.unwrap();
                }

                assert_eq!(buffer.len(), 70);
                let samples = buffer.sample(5, false);
                assert_eq!(samples.len(), 5);
            })
            .await;
    }
}
