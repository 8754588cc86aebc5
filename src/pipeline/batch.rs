//! Bounded collection of featured candidates between broadcast ticks

use crate::mention::FeaturedMention;
use std::collections::VecDeque;

/// Pending batch with drop-oldest overflow
///
/// Under an ingestion burst the newest mentions are kept, since the tick
/// that drains them features recent activity.
#[derive(Debug)]
pub struct PendingBatch {
    items: VecDeque<FeaturedMention>,
    capacity: usize,
    dropped: u64,
}

impl PendingBatch {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            items: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            dropped: 0,
        }
    }

    pub fn push(&mut self, mention: FeaturedMention) {
        if self.items.len() == self.capacity {
            self.items.pop_front();
            self.dropped += 1;
        }
        self.items.push_back(mention);
    }

    /// Take every pending mention in arrival order, leaving the batch empty
    pub fn drain(&mut self) -> Vec<FeaturedMention> {
        self.items.drain(..).collect()
    }

    /// Overflow count since the last call
    pub fn take_dropped(&mut self) -> u64 {
        std::mem::take(&mut self.dropped)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
