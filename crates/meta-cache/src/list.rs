//! Intrusive doubly linked list backing the LRU bookkeeping.
//!
//! Nodes live in an arena and refer to their neighbours by index, so a node
//! can be unlinked from anywhere in the list in O(1) without owning pointers.
//! Index 0 is a permanent sentinel that closes the ring:
//!
//! ```text
//!            next -->                              <-- prev
//!   ------------    ---------    ---------    ---------
//!   | sentinel | <> | newest| <> |  ...  | <> | oldest| <--|
//!   ------------    ---------    ---------    ---------    |
//!        ^--------------------------------------------------|
//! ```
//!
//! Handles are generational: once a node is released its slot may be reused,
//! and any handle still pointing at the old occupant stops resolving.
//!
//! The list has no internal locking. The cache guards it with its own mutex.

use crate::error::{CacheError, Result};
use std::fmt;

/// Arena index of the sentinel.
const SENTINEL: usize = 0;

/// Link value of a node that is not part of the ring.
const NIL: usize = usize::MAX;

/// Handle to a node allocated by [`LinkedList::create_node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: usize,
    generation: u64,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}@{}", self.index, self.generation)
    }
}

#[derive(Debug)]
struct Slot<K, V> {
    generation: u64,
    prev: usize,
    next: usize,
    payload: Option<(K, V)>,
}

impl<K, V> Slot<K, V> {
    fn is_unlinked(&self) -> bool {
        self.prev == NIL && self.next == NIL
    }
}

/// Sentinel-rooted circular list ordered from most to least recently used.
pub struct LinkedList<K, V> {
    slots: Vec<Slot<K, V>>,
    /// Released slots available for reuse
    free: Vec<usize>,
    len: usize,
}

impl<K, V> LinkedList<K, V> {
    /// Create an empty list whose sentinel points at itself
    pub fn new() -> Self {
        let sentinel = Slot {
            generation: 0,
            prev: SENTINEL,
            next: SENTINEL,
            payload: None,
        };
        Self {
            slots: vec![sentinel],
            free: Vec::new(),
            len: 0,
        }
    }

    /// Allocate a new, unlinked node.
    pub fn create_node(&mut self, key: K, value: V) -> NodeId {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.payload = Some((key, value));
                NodeId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len();
                self.slots.push(Slot {
                    generation: 0,
                    prev: NIL,
                    next: NIL,
                    payload: Some((key, value)),
                });
                NodeId {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Insert `id` right after the sentinel, making it the most recently used node.
    ///
    /// Fails with [`CacheError::NodeAlreadyLinked`] if the node is already in the
    /// list and with [`CacheError::StaleNode`] if the handle no longer resolves.
    pub fn add_head(&mut self, id: NodeId) -> Result<()> {
        let index = self.resolve(id).ok_or(CacheError::StaleNode(id))?;
        if !self.slots[index].is_unlinked() {
            return Err(CacheError::NodeAlreadyLinked(id));
        }

        let old_head = self.slots[SENTINEL].next;
        self.slots[index].prev = SENTINEL;
        self.slots[index].next = old_head;
        self.slots[old_head].prev = index;
        self.slots[SENTINEL].next = index;
        self.len += 1;
        Ok(())
    }

    /// Unlink `id` from wherever it sits.
    ///
    /// Returns `None` for the sentinel, for nodes that are not linked and for
    /// stale handles. The node stays allocated and can be added again.
    pub fn remove_node(&mut self, id: NodeId) -> Option<NodeId> {
        let index = self.resolve(id)?;
        let (prev, next) = (self.slots[index].prev, self.slots[index].next);
        if prev == NIL || next == NIL {
            return None;
        }

        self.slots[prev].next = next;
        self.slots[next].prev = prev;

        let slot = &mut self.slots[index];
        slot.prev = NIL;
        slot.next = NIL;
        self.len -= 1;
        Some(id)
    }

    /// Unlink the least recently used node.
    pub fn remove_tail(&mut self) -> Option<NodeId> {
        let tail = self.slots[SENTINEL].prev;
        if tail == SENTINEL {
            return None;
        }
        self.remove_node(self.id_at(tail))
    }

    /// Free an unlinked node and hand back its key and value.
    ///
    /// Linked nodes and stale handles are left untouched. The slot's generation
    /// is bumped so that `id` never resolves again.
    pub fn release(&mut self, id: NodeId) -> Option<(K, V)> {
        let index = self.resolve(id)?;
        if !self.slots[index].is_unlinked() {
            return None;
        }

        let slot = &mut self.slots[index];
        slot.generation = slot.generation.wrapping_add(1);
        let payload = slot.payload.take();
        self.free.push(index);
        payload
    }

    /// Handle of the sentinel. It can never be removed or released.
    pub fn sentinel(&self) -> NodeId {
        self.id_at(SENTINEL)
    }

    /// Whether `id` still refers to an allocated node
    pub fn contains(&self, id: NodeId) -> bool {
        self.resolve(id).is_some()
    }

    /// Whether `id` is currently part of the ring
    pub fn is_linked(&self, id: NodeId) -> bool {
        self.resolve(id)
            .map(|index| !self.slots[index].is_unlinked())
            .unwrap_or(false)
    }

    /// Key stored in `id`, `None` for stale handles
    pub fn key(&self, id: NodeId) -> Option<&K> {
        let index = self.resolve(id)?;
        self.slots[index].payload.as_ref().map(|(key, _)| key)
    }

    /// Value stored in `id`, `None` for stale handles
    pub fn value(&self, id: NodeId) -> Option<&V> {
        let index = self.resolve(id)?;
        self.slots[index].payload.as_ref().map(|(_, value)| value)
    }

    /// Most recently used node
    pub fn head(&self) -> Option<NodeId> {
        let head = self.slots[SENTINEL].next;
        (head != SENTINEL).then(|| self.id_at(head))
    }

    /// Least recently used node
    pub fn tail(&self) -> Option<NodeId> {
        let tail = self.slots[SENTINEL].prev;
        (tail != SENTINEL).then(|| self.id_at(tail))
    }

    /// Number of linked nodes, sentinel excluded
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if no node is linked
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Iterate linked nodes from most to least recently used.
    /// Use `.rev()` for eviction order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            front: self.slots[SENTINEL].next,
            back: self.slots[SENTINEL].prev,
            remaining: self.len,
        }
    }

    fn resolve(&self, id: NodeId) -> Option<usize> {
        if id.index == SENTINEL {
            return None;
        }
        let slot = self.slots.get(id.index)?;
        (slot.generation == id.generation && slot.payload.is_some()).then_some(id.index)
    }

    fn id_at(&self, index: usize) -> NodeId {
        NodeId {
            index,
            generation: self.slots[index].generation,
        }
    }
}

impl<K, V> Default for LinkedList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for LinkedList<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkedList")
            .field("len", &self.len)
            .field("allocated", &(self.slots.len() - 1 - self.free.len()))
            .field("free", &self.free.len())
            .finish()
    }
}

/// Iterator over linked nodes, see [`LinkedList::iter`].
pub struct Iter<'a, K, V> {
    list: &'a LinkedList<K, V>,
    front: usize,
    back: usize,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (NodeId, &'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let index = self.front;
        let slot = &self.list.slots[index];
        self.front = slot.next;
        self.remaining -= 1;
        slot.payload
            .as_ref()
            .map(|(key, value)| (self.list.id_at(index), key, value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<'a, K, V> DoubleEndedIterator for Iter<'a, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let index = self.back;
        let slot = &self.list.slots[index];
        self.back = slot.prev;
        self.remaining -= 1;
        slot.payload
            .as_ref()
            .map(|(key, value)| (self.list.id_at(index), key, value))
    }
}

impl<'a, K, V> ExactSizeIterator for Iter<'a, K, V> {}
