// Fixed-capacity per-container time series of rate samples

use std::collections::VecDeque;

use crate::models::RateSample;

/// Bounded ring of the last K rate samples, oldest first. Appending at capacity evicts the oldest.
///
/// The ring itself is not synchronized; it lives inside a container record whose lock is
/// held only for the duration of an append or a copy, so readers always see whole entries.
#[derive(Debug, Clone)]
pub struct HistoryRing {
    entries: VecDeque<RateSample>,
    capacity: usize,
}

impl HistoryRing {
    /// Capacity is fixed for the life of the ring; zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn append(&mut self, sample: RateSample) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(sample);
    }

    /// Ordered copy, oldest first.
    pub fn snapshot(&self) -> Vec<RateSample> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
