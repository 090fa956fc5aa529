use rand::prelude::SliceRandom;
use rand::Rng;

/// Fixed-capacity store that overwrites its oldest entry once full.
pub struct ReplayMemory<T> {
    items: Vec<T>,
    next: usize,
    capacity: usize,
}

impl<T: Clone> ReplayMemory<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0);
        ReplayMemory {
            items: Vec::new(),
            next: 0,
            capacity,
        }
    }

    pub fn push(&mut self, item: T) {
        if self.items.len() < self.capacity {
            self.items.push(item);
        } else {
            self.items[self.next] = item;
            self.next = (self.next + 1) % self.capacity;
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.next = 0;
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn sample_with_replacement(&self, k: usize) -> Vec<T> {
        assert!(!self.items.is_empty(), "sample from empty ReplayMemory");
        let mut rng = rand::thread_rng();
        (0..k)
            .map(|_| self.items[rng.gen_range(0..self.items.len())].clone())
            .collect()
    }

    pub fn sample_without_replacement(&self, k: usize) -> Vec<T> {
        if k > self.items.len() {
            panic!("Cannot sample more elements than stored in ReplayMemory");
        }
        let mut indices: Vec<usize> = (0..self.items.len()).collect();
        indices.shuffle(&mut rand::thread_rng());
        indices
            .into_iter()
            .take(k)
            .map(|i| self.items[i].clone())
            .collect()
    }
}
