use crate::reference::Ref;
use crate::types::{NodeId, Var};

/// Which family of diagrams a store slot belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NodeKind {
    Terminal,
    /// A BDD decision node (complement edges, reduced Shannon rule).
    Decision,
    /// A cover node (no complement edges, zero-suppressed rule).
    Cover,
    /// A reclaimed slot on the free list.
    Free,
}

/// A slot of the node store.
///
/// `next` threads the intrusive collision chain of the owning subtable.
#[derive(Debug, Copy, Clone)]
pub struct Node {
    pub variable: Var,
    pub low: Ref,
    pub high: Ref,
    pub next: NodeId,
    pub refs: u32,
    pub kind: NodeKind,
}

impl Node {
    /// End-of-chain marker.
    pub const NO_NEXT: NodeId = NodeId::INVALID;

    /// Reference count of pinned nodes; they are never collected.
    pub const PINNED: u32 = u32::MAX;

    pub fn new(kind: NodeKind, variable: Var, low: Ref, high: Ref) -> Self {
        Self {
            variable,
            low,
            high,
            next: Self::NO_NEXT,
            refs: 0,
            kind,
        }
    }

    pub fn terminal() -> Self {
        Self {
            variable: Var::ZERO,
            low: Ref::ONE,
            high: Ref::ONE,
            next: Self::NO_NEXT,
            refs: Self::PINNED,
            kind: NodeKind::Terminal,
        }
    }

    pub fn is_pinned(&self) -> bool {
        self.refs == Self::PINNED
    }

    pub fn is_dead(&self) -> bool {
        self.refs == 0 && matches!(self.kind, NodeKind::Decision | NodeKind::Cover)
    }

    pub fn is_free(&self) -> bool {
        self.kind == NodeKind::Free
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new(NodeKind::Free, Var::ZERO, Ref::INVALID, Ref::INVALID)
    }
}
