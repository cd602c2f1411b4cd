//! Debug utilities for inspecting and verifying the node store.
//!
//! These are primarily useful in tests and during development.

use std::collections::{HashMap, HashSet};
use std::fmt::Write;

use crate::bdd::Bdd;
use crate::node::NodeKind;
use crate::reference::Ref;
use crate::types::{Level, NodeId, Var};

/// Detailed information about a single node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub node_ref: Ref,
    /// `None` for the terminal.
    pub variable: Option<Var>,
    pub level: Option<usize>,
    pub low: Option<Ref>,
    pub high: Option<Ref>,
    pub refs: u32,
    pub kind: NodeKind,
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.variable, self.low, self.high) {
            (Some(var), Some(low), Some(high)) => write!(
                f,
                "{}(var={}, level={}, low={}, high={}, refs={})",
                self.node_ref,
                var,
                self.level.map_or("-".to_string(), |l| l.to_string()),
                low,
                high,
                self.refs
            ),
            _ if self.node_ref.is_one() => write!(f, "ONE"),
            _ => write!(f, "ZERO"),
        }
    }
}

impl Bdd {
    /// Information about the node behind `f`, with cofactors seen through
    /// `f`'s polarity.
    pub fn node_info(&self, f: Ref) -> NodeInfo {
        let node = self.node(f.id());
        if f.is_terminal() {
            return NodeInfo {
                node_ref: f,
                variable: None,
                level: None,
                low: None,
                high: None,
                refs: node.refs,
                kind: node.kind,
            };
        }
        let level = match node.kind {
            NodeKind::Decision => Some(self.level(node.variable).index()),
            _ => None,
        };
        NodeInfo {
            node_ref: f,
            variable: Some(node.variable),
            level,
            low: Some(self.low_node(f)),
            high: Some(self.high_node(f)),
            refs: node.refs,
            kind: node.kind,
        }
    }

    /// Compact listing of the nodes of `f`, sorted by level.
    pub fn debug_string(&self, f: Ref) -> String {
        let mut infos: Vec<NodeInfo> = self
            .descendants([f])
            .into_iter()
            .map(|id| self.node_info(Ref::positive(id)))
            .collect();
        infos.sort_by_key(|n| (n.level.unwrap_or(usize::MAX), n.node_ref));

        let mut result = String::new();
        let _ = writeln!(result, "BDD {} (size={}):", f, infos.len());
        for info in &infos {
            let _ = writeln!(result, "  {}", info);
        }
        result
    }

    /// The variable order and per-level subtable sizes.
    pub fn dump_state(&self) -> String {
        let mut result = String::new();
        let _ = writeln!(result, "=== Store state ===");
        let _ = writeln!(result, "{:?}", self.stats());
        let subtables = self.subtables.borrow();
        for (i, &var) in self.var_order.borrow().iter().enumerate() {
            let _ = writeln!(result, "  L{} {}: {} nodes", i, var, subtables[var.slot()].len());
        }
        let covers: usize = self.cover_subtables.borrow().iter().map(|st| st.len()).sum();
        let _ = writeln!(result, "  cover nodes: {}", covers);
        result
    }

    /// Verifies the structural invariants of the whole store.
    ///
    /// Checks that every allocated node sits in the right subtable exactly
    /// once, that decision nodes are reduced, have a regular high edge and
    /// children strictly below them, that cover nodes are zero-suppressed,
    /// ordered and free of complement edges, that no two nodes are
    /// duplicates, and that every reference count covers at least the
    /// in-store parents, with the dead counter in agreement.
    pub fn check_invariants(&self) -> Result<(), String> {
        let nodes = self.nodes.borrow();
        let subtables = self.subtables.borrow();
        let cover_subtables = self.cover_subtables.borrow();
        let free: HashSet<NodeId> = self.free.borrow().iter().copied().collect();

        let order = self.var_order.borrow();
        for (i, &var) in order.iter().enumerate() {
            if self.levels.borrow()[var.slot()] != Level::new(i) {
                return Err(format!("level map of {} disagrees with the order", var));
            }
        }

        let mut in_tables = HashSet::new();
        for st in subtables.iter().chain(cover_subtables.iter()) {
            for id in st.ids(&nodes) {
                if !in_tables.insert(id) {
                    return Err(format!("{} is chained more than once", id));
                }
                if nodes[id.index()].variable != st.variable {
                    return Err(format!("{} is in the subtable of {}", id, st.variable));
                }
            }
        }

        let mut parents: HashMap<NodeId, u32> = HashMap::new();
        let mut seen = HashMap::new();
        let mut dead = 0;
        for i in 1..nodes.len() {
            let id = NodeId::from_raw(i as u32);
            let node = nodes[i];
            match node.kind {
                NodeKind::Free => {
                    if !free.contains(&id) {
                        return Err(format!("{} is free but not on the free list", id));
                    }
                    continue;
                }
                NodeKind::Terminal => return Err(format!("{} is a second terminal", id)),
                NodeKind::Decision => {
                    if node.low == node.high {
                        return Err(format!("{} has equal children", id));
                    }
                    if node.high.is_negated() {
                        return Err(format!("{} has a complemented high edge", id));
                    }
                    let level = self.level(node.variable).index();
                    for child in [node.low, node.high] {
                        if self.level_of(child) <= level {
                            return Err(format!("child {} of {} is not below it", child, id));
                        }
                    }
                }
                NodeKind::Cover => {
                    if node.high == Ref::ZERO {
                        return Err(format!("cover node {} has an empty high child", id));
                    }
                    for child in [node.low, node.high] {
                        if !child.is_terminal() && child.is_negated() {
                            return Err(format!("cover node {} has a complemented edge", id));
                        }
                        let child_var = nodes[child.index()].variable;
                        if !child.is_terminal() && child_var <= node.variable {
                            return Err(format!("child {} of cover node {} is not below it", child, id));
                        }
                    }
                }
            }
            if !in_tables.contains(&id) {
                return Err(format!("{} is missing from its subtable", id));
            }
            if seen.insert((node.kind == NodeKind::Cover, node.variable, node.low, node.high), id).is_some() {
                return Err(format!("{} duplicates another node", id));
            }
            if node.is_dead() {
                dead += 1;
            }
            for child in [node.low, node.high] {
                if !child.is_terminal() {
                    *parents.entry(child.id()).or_default() += 1;
                }
            }
        }

        for (id, count) in parents {
            let node = nodes[id.index()];
            if node.is_free() {
                return Err(format!("{} is referenced but free", id));
            }
            if !node.is_pinned() && node.refs < count {
                return Err(format!("{} has {} refs but {} parents", id, node.refs, count));
            }
        }
        if dead != self.dead.get() {
            return Err(format!("dead counter is {} but {} nodes are dead", self.dead.get(), dead));
        }
        Ok(())
    }
}
