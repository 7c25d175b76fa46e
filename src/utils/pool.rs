//! Pooled FIFO queue whose nodes live in a dense slot array.
//!
//! Every pushed value gets a slot index that stays valid until the value is
//! popped or removed, so callers can unlink an arbitrary entry in O(1).
//! Freed slots go back to a free list and are reused before the slot array grows.

#[derive(Debug, Clone)]
struct Node<T> {
    value: Option<T>,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Doubly linked FIFO backed by recycled slots.
#[derive(Debug, Clone)]
pub struct PooledQueue<T> {
    nodes: Vec<Node<T>>,
    free: Vec<usize>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl<T: Copy> PooledQueue<T> {
    /// Creates a queue with `capacity` nodes already sitting on the free list.
    pub fn with_capacity(capacity: usize) -> Self {
        let mut queue = Self {
            nodes: Vec::with_capacity(capacity),
            free: Vec::with_capacity(capacity),
            head: None,
            tail: None,
            len: 0,
        };
        queue.grow(capacity);
        queue
    }

    fn grow(&mut self, additional: usize) {
        let start = self.nodes.len();
        self.nodes.extend((0..additional).map(|_| Node {
            value: None,
            prev: None,
            next: None,
        }));
        // Reverse so the lowest index is handed out first.
        self.free.extend((start..start + additional).rev());
    }

    /// Appends `value` and returns the slot it occupies.
    pub fn push_back(&mut self, value: T) -> usize {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                let first_new = self.nodes.len();
                self.grow(first_new.max(1));
                self.free.pop().unwrap_or(first_new)
            }
        };

        self.nodes[slot] = Node {
            value: Some(value),
            prev: self.tail,
            next: None,
        };
        match self.tail {
            Some(tail) => self.nodes[tail].next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;
        slot
    }

    /// Unlinks the entry at `slot` and recycles its node.
    pub fn remove(&mut self, slot: usize) -> Option<T> {
        let node = self.nodes.get_mut(slot)?;
        let value = node.value.take()?;
        let (prev, next) = (node.prev.take(), node.next.take());

        match prev {
            Some(prev) => self.nodes[prev].next = next,
            None => self.head = next,
        }
        match next {
            Some(next) => self.nodes[next].prev = prev,
            None => self.tail = prev,
        }

        self.free.push(slot);
        self.len -= 1;
        Some(value)
    }

    pub fn front(&self) -> Option<T> {
        self.head.and_then(|slot| self.nodes[slot].value)
    }

    pub fn pop_front(&mut self) -> Option<T> {
        let head = self.head?;
        self.remove(head)
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            let slot = cursor?;
            cursor = self.nodes[slot].next;
            self.nodes[slot].value
        })
    }

    pub fn clear(&mut self) {
        while self.pop_front().is_some() {}
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total number of nodes owned by the pool, in use or free.
    pub fn capacity(&self) -> usize {
        self.nodes.len()
    }

    pub fn free_nodes(&self) -> usize {
        self.free.len()
    }
}
