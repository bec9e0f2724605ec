//! Owner-gated binary min-heap over packed 256-bit order keys.
//!
//! The heap is a plain `Vec<U256>` kept in heap order, compared as unsigned
//! 256-bit integers. Reads (`top`, `size`) are open to anyone. Mutations
//! (`push`, `pop`, `set_owner`) are accepted only from the stored owner; any
//! other caller gets a silent no-op and a default return value.
//!
//! `0` doubles as the "empty" sentinel for `top` and `pop`.

use cyberdyne_types::{Address, CyberdyneError, Result, U256};
use serde::{Deserialize, Serialize};

/// Owner-gated min-heap of order keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityHeap {
    /// Identity of this heap instance.
    id: Address,
    /// The only identity allowed to mutate the heap.
    owner: Address,
    /// Keys in heap order: `keys[i] <= keys[2i+1]` and `keys[i] <= keys[2i+2]`.
    keys: Vec<U256>,
}

impl PriorityHeap {
    /// Create an empty heap owned by its creator.
    #[must_use]
    pub fn new(id: Address, creator: Address) -> Self {
        Self {
            id,
            owner: creator,
            keys: Vec::new(),
        }
    }

    // =================================================================
    // Mutation (owner only)
    // =================================================================

    /// Insert a key. No-op unless `caller` is the owner.
    pub fn push(&mut self, caller: Address, key: U256) {
        if !self.authorize(caller, "push") {
            return;
        }
        self.keys.push(key);
        self.sift_up(self.keys.len() - 1);
    }

    /// Remove and return the minimum key.
    ///
    /// Returns `0` without mutating when the heap is empty or `caller` is
    /// not the owner.
    pub fn pop(&mut self, caller: Address) -> U256 {
        if !self.authorize(caller, "pop") {
            return U256::zero();
        }
        let Some(last) = self.keys.pop() else {
            return U256::zero();
        };
        if self.keys.is_empty() {
            return last;
        }
        let root = std::mem::replace(&mut self.keys[0], last);
        self.sift_down(0);
        root
    }

    /// Hand the heap to a new owner. No-op unless `caller` is the owner.
    pub fn set_owner(&mut self, caller: Address, new_owner: Address) {
        if !self.authorize(caller, "set_owner") {
            return;
        }
        tracing::debug!(
            heap = %self.id,
            from = %self.owner,
            to = %new_owner,
            "Heap ownership transferred"
        );
        self.owner = new_owner;
    }

    // =================================================================
    // Queries (anyone)
    // =================================================================

    /// The minimum key, or `0` when empty.
    #[must_use]
    pub fn top(&self) -> U256 {
        self.keys.first().copied().unwrap_or_else(U256::zero)
    }

    /// Number of keys held.
    #[must_use]
    pub fn size(&self) -> usize {
        self.keys.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[must_use]
    pub fn id(&self) -> Address {
        self.id
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    #[must_use]
    pub fn is_owner(&self, caller: Address) -> bool {
        self.owner == caller
    }

    /// Keys in storage (heap) order.
    pub fn keys(&self) -> impl Iterator<Item = &U256> {
        self.keys.iter()
    }

    /// Check the min-heap property over the whole backing sequence.
    pub fn check_invariant(&self) -> Result<()> {
        for index in 1..self.keys.len() {
            if self.keys[(index - 1) / 2] > self.keys[index] {
                return Err(CyberdyneError::HeapInvariantViolation { index });
            }
        }
        Ok(())
    }

    // =================================================================
    // Internals
    // =================================================================

    fn authorize(&self, caller: Address, op: &'static str) -> bool {
        if self.owner == caller {
            return true;
        }
        tracing::warn!(heap = %self.id, caller = %caller, op, "Unauthorised heap mutation ignored");
        false
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.keys[parent] <= self.keys[index] {
                break;
            }
            self.keys.swap(parent, index);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.keys.len();
        loop {
            let left = 2 * index + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let smaller = if right < len && self.keys[right] < self.keys[left] {
                right
            } else {
                left
            };
            if self.keys[index] <= self.keys[smaller] {
                break;
            }
            self.keys.swap(index, smaller);
            index = smaller;
        }
    }
}
