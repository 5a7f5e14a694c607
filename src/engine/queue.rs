//! Index-tracked priority queue of activations
//!
//! One queue per rule-base partition. The queue is a binary max-heap over
//! the activation arena; every sift writes the element's position back
//! into `Activation::queue_index`, so removal by identity resolves through
//! the stored index in O(log n) without scanning.

use super::activation::{Activation, ActivationArena, ActivationId, OrderKey};
use super::error::{AgendaError, AgendaResult};

/// Ordered queue of pending activations for one partition
#[derive(Debug, Default)]
pub struct ActivationQueue {
    heap: Vec<ActivationId>,
}

impl ActivationQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self { heap: Vec::new() }
    }

    /// Number of queued activations
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Highest-priority activation without removing it
    pub fn peek(&self) -> Option<ActivationId> {
        self.heap.first().copied()
    }

    /// Insert an activation in sorted position
    ///
    /// Inserting an activation that is already queued signals
    /// `DuplicateActivation`.
    pub(crate) fn insert(&mut self, arena: &mut ActivationArena, id: ActivationId) -> AgendaResult<()> {
        {
            let activation = arena
                .get(&id)
                .ok_or_else(|| AgendaError::InvalidActivation(format!("unknown activation #{id}")))?;
            if activation.queued {
                return Err(AgendaError::DuplicateActivation(id));
            }
        }

        self.heap.push(id);
        let index = self.heap.len() - 1;
        if let Some(activation) = arena.get_mut(&id) {
            activation.queued = true;
            activation.queue_index = Some(index);
        }
        self.sift_up(arena, index);
        Ok(())
    }

    /// Remove an activation by identity
    ///
    /// Removing an activation that is not present is a no-op and leaves the
    /// index bookkeeping of every other entry intact. Returns whether the
    /// activation was removed.
    pub(crate) fn remove(&mut self, arena: &mut ActivationArena, id: ActivationId) -> bool {
        let Some(index) = arena.get(&id).and_then(|activation| activation.queue_index) else {
            return false;
        };
        if self.heap.get(index).copied() != Some(id) {
            return false;
        }

        self.remove_at(arena, index);
        if let Some(activation) = arena.get_mut(&id) {
            activation.queued = false;
            activation.queue_index = None;
        }
        true
    }

    /// Re-sort a single activation after its salience changed
    ///
    /// Modeled as remove plus reinsert, which keeps the index bookkeeping
    /// trivially consistent. Returns whether the activation was queued.
    pub(crate) fn reposition(&mut self, arena: &mut ActivationArena, id: ActivationId) -> bool {
        let Some(index) = arena.get(&id).and_then(|activation| activation.queue_index) else {
            return false;
        };
        if self.heap.get(index).copied() != Some(id) {
            return false;
        }

        self.remove_at(arena, index);
        self.heap.push(id);
        let end = self.heap.len() - 1;
        if let Some(activation) = arena.get_mut(&id) {
            activation.queue_index = Some(end);
        }
        self.sift_up(arena, end);
        true
    }

    fn remove_at(&mut self, arena: &mut ActivationArena, index: usize) {
        let last = self.heap.len() - 1;
        self.heap.swap(index, last);
        self.heap.pop();

        if index < self.heap.len() {
            let moved = self.heap[index];
            if let Some(activation) = arena.get_mut(&moved) {
                activation.queue_index = Some(index);
            }
            self.sift_down(arena, index);
            self.sift_up(arena, index);
        }
    }

    fn sift_up(&mut self, arena: &mut ActivationArena, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if Self::key(arena, self.heap[index]) <= Self::key(arena, self.heap[parent]) {
                break;
            }
            self.swap_entries(arena, index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, arena: &mut ActivationArena, mut index: usize) {
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut largest = index;

            if left < self.heap.len()
                && Self::key(arena, self.heap[left]) > Self::key(arena, self.heap[largest])
            {
                largest = left;
            }
            if right < self.heap.len()
                && Self::key(arena, self.heap[right]) > Self::key(arena, self.heap[largest])
            {
                largest = right;
            }
            if largest == index {
                break;
            }

            self.swap_entries(arena, index, largest);
            index = largest;
        }
    }

    fn swap_entries(&mut self, arena: &mut ActivationArena, a: usize, b: usize) {
        self.heap.swap(a, b);
        if let Some(activation) = arena.get_mut(&self.heap[a]) {
            activation.queue_index = Some(a);
        }
        if let Some(activation) = arena.get_mut(&self.heap[b]) {
            activation.queue_index = Some(b);
        }
    }

    fn key(arena: &ActivationArena, id: ActivationId) -> OrderKey {
        arena.get(&id).map_or(
            OrderKey {
                salience: i32::MIN,
                number: u64::MAX,
            },
            Activation::order_key,
        )
    }
}
