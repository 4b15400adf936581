//! Rolling statistics over recent frame signals.
//!
//! The classifier judges each frame against the video's own recent
//! behavior rather than fixed absolutes. [`RollingWindow`] keeps a bounded
//! FIFO of the most recent values and produces the mean and population
//! standard deviation used as adaptive baselines.

use std::collections::VecDeque;

/// A bounded, order-preserving history of recent values.
///
/// Pushing past capacity evicts the oldest value. The current frame's own
/// value is pushed *before* the statistics are read; this ordering is part
/// of the detector's contract.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl RollingWindow {
    /// Create a window holding up to `capacity` values.
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity.max(1)),
            capacity: capacity.max(1),
        }
    }

    /// Push a value, evicting the oldest if the window is full.
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        if self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    /// Number of values currently held. Never exceeds the capacity.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// `true` if no values have been pushed yet.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Mean of the current contents, or 0.0 when empty.
    pub fn mean(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        self.values.iter().sum::<f64>() / self.values.len() as f64
    }

    /// Population standard deviation of the current contents.
    ///
    /// Returns 0.0 with fewer than two values.
    pub fn std_dev(&self) -> f64 {
        if self.values.len() < 2 {
            return 0.0;
        }
        let mean = self.mean();
        let variance = self
            .values
            .iter()
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / self.values.len() as f64;
        variance.sqrt()
    }

    /// Iterate the contents oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.iter().copied()
    }
}
