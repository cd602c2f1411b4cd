//! Per-variable unique subtables with intrusive collision chains.
//!
//! Every BDD variable and every cover variable owns one subtable. All nodes
//! of a subtable share the variable, so the key is just the `(low, high)`
//! pair. Buckets hold the head of a chain, and chains are threaded through
//! [`Node::next`] inside the global store:
//!
//! ```text
//! buckets: [NodeId; 2^bits]
//!   [0] ─────► Node@5 ──► Node@12 ──► ∅
//!   [1] ─────► ∅
//!   [2] ─────► Node@3 ──► ∅
//! ```
//!
//! Reordering moves whole nodes between subtables by unlinking them by id
//! ([`Subtable::remove_id`]) and relinking under the new variable.

use log::debug;

use crate::node::Node;
use crate::reference::Ref;
use crate::types::{NodeId, Var};
use crate::utils::MyHash;

const INITIAL_BUCKET_BITS: usize = 8;

/// Average chain length that triggers doubling of the bucket array.
const MAX_LOAD: usize = 4;

#[derive(Debug, Clone)]
pub struct Subtable {
    pub variable: Var,
    buckets: Vec<NodeId>,
    bitmask: u64,
    count: usize,
}

impl Subtable {
    pub fn new(variable: Var) -> Self {
        Self::with_bucket_bits(variable, INITIAL_BUCKET_BITS)
    }

    pub fn with_bucket_bits(variable: Var, bits: usize) -> Self {
        let num_buckets = 1usize << bits;
        Self {
            variable,
            buckets: vec![Node::NO_NEXT; num_buckets],
            bitmask: (num_buckets - 1) as u64,
            count: 0,
        }
    }

    #[inline]
    fn bucket_index(&self, low: Ref, high: Ref) -> usize {
        (MyHash::hash(&(low, high)) & self.bitmask) as usize
    }

    /// Looks up the node with the given children.
    pub fn find(&self, low: Ref, high: Ref, nodes: &[Node]) -> Option<NodeId> {
        let mut current = self.buckets[self.bucket_index(low, high)];
        while current != Node::NO_NEXT {
            let node = &nodes[current.index()];
            if node.low == low && node.high == high {
                return Some(current);
            }
            current = node.next;
        }
        None
    }

    /// Links node `id` (whose children are already stored) into its chain.
    pub fn insert(&mut self, id: NodeId, nodes: &mut [Node]) {
        if self.count >= self.buckets.len() * MAX_LOAD {
            self.grow(nodes);
        }
        self.link(id, nodes);
    }

    fn link(&mut self, id: NodeId, nodes: &mut [Node]) {
        let node = nodes[id.index()];
        let bucket = self.bucket_index(node.low, node.high);
        nodes[id.index()].next = self.buckets[bucket];
        self.buckets[bucket] = id;
        self.count += 1;
    }

    /// Unlinks node `id`. Its `low`/`high` must still be the ones it was
    /// inserted with.
    pub fn remove_id(&mut self, id: NodeId, nodes: &mut [Node]) -> bool {
        let node = nodes[id.index()];
        let bucket = self.bucket_index(node.low, node.high);
        let mut prev = Node::NO_NEXT;
        let mut current = self.buckets[bucket];
        while current != Node::NO_NEXT {
            let next = nodes[current.index()].next;
            if current == id {
                if prev == Node::NO_NEXT {
                    self.buckets[bucket] = next;
                } else {
                    nodes[prev.index()].next = next;
                }
                nodes[id.index()].next = Node::NO_NEXT;
                self.count -= 1;
                return true;
            }
            prev = current;
            current = next;
        }
        false
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Collects the ids of all nodes in the subtable.
    pub fn ids(&self, nodes: &[Node]) -> Vec<NodeId> {
        let mut ids = Vec::with_capacity(self.count);
        for &head in &self.buckets {
            let mut current = head;
            while current != Node::NO_NEXT {
                ids.push(current);
                current = nodes[current.index()].next;
            }
        }
        ids
    }

    fn grow(&mut self, nodes: &mut [Node]) {
        let new_len = self.buckets.len() * 2;
        debug!(
            "Growing subtable of {}: {} -> {} buckets",
            self.variable,
            self.buckets.len(),
            new_len
        );
        let ids = self.ids(nodes);
        self.buckets = vec![Node::NO_NEXT; new_len];
        self.bitmask = (new_len - 1) as u64;
        self.count = 0;
        for id in ids {
            self.link(id, nodes);
        }
    }
}
