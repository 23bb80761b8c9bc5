//! Priority backlog: tasks not yet dispatched.
//!
//! One FIFO per tier instead of re-sorting the whole backlog on every enqueue.
//! Pop order is high -> medium -> low, FIFO inside a tier.

use std::collections::VecDeque;

use crate::domain::Priority;

#[derive(Debug)]
pub struct Backlog<T> {
    high: VecDeque<T>,
    medium: VecDeque<T>,
    low: VecDeque<T>,
}

impl<T> Backlog<T> {
    pub fn new() -> Self {
        Self {
            high: VecDeque::new(),
            medium: VecDeque::new(),
            low: VecDeque::new(),
        }
    }

    fn tier_mut(&mut self, priority: Priority) -> &mut VecDeque<T> {
        match priority {
            Priority::High => &mut self.high,
            Priority::Medium => &mut self.medium,
            Priority::Low => &mut self.low,
        }
    }

    /// Append at the back of the given tier.
    pub fn push(&mut self, priority: Priority, item: T) {
        self.tier_mut(priority).push_back(item);
    }

    /// Remove the front of the highest non-empty tier.
    pub fn pop(&mut self) -> Option<T> {
        self.high
            .pop_front()
            .or_else(|| self.medium.pop_front())
            .or_else(|| self.low.pop_front())
    }

    pub fn len(&self) -> usize {
        self.high.len() + self.medium.len() + self.low.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn len_of(&self, priority: Priority) -> usize {
        match priority {
            Priority::High => self.high.len(),
            Priority::Medium => self.medium.len(),
            Priority::Low => self.low.len(),
        }
    }

    /// Take everything out, highest tier first.
    pub fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len());
        out.extend(self.high.drain(..));
        out.extend(self.medium.drain(..));
        out.extend(self.low.drain(..));
        out
    }
}

impl<T> Default for Backlog<T> {
    fn default() -> Self {
        Self::new()
    }
}
