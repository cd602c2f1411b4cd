//! The decision-diagram manager.
//!
//! A [`Bdd`] owns one node store shared by two families of diagrams:
//! Boolean functions (decision nodes with complement edges) and covers
//! (zero-suppressed sets of cubes, see [`cover`](crate::cover)). Both live
//! in the same slot vector, are reference counted the same way and are
//! reclaimed by the same collector; they only differ in their unique
//! subtables and reduction rule.
//!
//! # Reference counting
//!
//! Every result handed out by a public operation carries one reference
//! that the caller owns and must eventually give back with
//! [`Bdd::release`] (or by wrapping it in a [`Held`](crate::guard::Held)).
//! Nodes whose count drops to zero become *dead*: they stay in their
//! subtable and may be resurrected by a later lookup until the next
//! [`collect_garbage`](Bdd::collect_garbage). Projection functions of
//! variables are pinned and never collected.
//!
//! # Epochs
//!
//! The epoch counter advances whenever the variable order changes. A
//! computation that observes a different epoch at its end is discarded and
//! restarted (see [`guard`](crate::guard)).

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt::{self, Debug};

use log::debug;

use crate::cache::{ComputedTable, OpKey};
use crate::error::{DdError, DdResult};
use crate::node::{Node, NodeKind};
use crate::reference::Ref;
use crate::subtable::Subtable;
use crate::types::{Level, NodeId, Var};

const MAX_CACHE_BITS: usize = 24;

/// Tunables of a manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BddConfig {
    /// Hard limit on the number of allocated (live or dead) nodes.
    pub max_nodes: usize,
    /// Initial computed table size, as a power of two.
    pub cache_bits: usize,
    /// Number of dead nodes that triggers a collection on allocation.
    pub gc_threshold: usize,
    /// Whether growth past `reorder_threshold` live nodes triggers sifting.
    pub auto_reorder: bool,
    pub reorder_threshold: usize,
}

impl Default for BddConfig {
    fn default() -> Self {
        Self {
            max_nodes: 1 << 26,
            cache_bits: 16,
            gc_threshold: 1 << 14,
            auto_reorder: false,
            reorder_threshold: 4096,
        }
    }
}

impl BddConfig {
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    pub fn with_cache_bits(mut self, bits: usize) -> Self {
        self.cache_bits = bits;
        self
    }

    pub fn with_gc_threshold(mut self, dead: usize) -> Self {
        self.gc_threshold = dead;
        self
    }

    /// Enables automatic sifting once `threshold` live nodes are reached.
    pub fn with_auto_reorder(mut self, threshold: usize) -> Self {
        self.auto_reorder = true;
        self.reorder_threshold = threshold;
        self
    }
}

/// A snapshot of the manager counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BddStats {
    /// Allocated nodes, live and dead, terminal excluded.
    pub nodes: usize,
    pub live: usize,
    pub dead: usize,
    pub peak: usize,
    /// Total number of node allocations since creation.
    pub allocated: u64,
    pub gc_runs: usize,
    pub reorderings: usize,
    pub epoch: u64,
    pub cache_hits: usize,
    pub cache_misses: usize,
}

pub struct Bdd {
    pub(crate) nodes: RefCell<Vec<Node>>,
    pub(crate) free: RefCell<Vec<NodeId>>,
    pub(crate) subtables: RefCell<Vec<Subtable>>,
    pub(crate) cover_subtables: RefCell<Vec<Subtable>>,
    pub(crate) var_order: RefCell<Vec<Var>>,
    pub(crate) levels: RefCell<Vec<Level>>,
    projections: RefCell<Vec<Ref>>,
    cache: RefCell<ComputedTable>,
    config: BddConfig,
    epoch: Cell<u64>,
    pub(crate) dead: Cell<usize>,
    allocated: Cell<u64>,
    peak: Cell<usize>,
    gc_runs: Cell<usize>,
    pub(crate) reorderings: Cell<usize>,
    reorder_threshold: Cell<usize>,
    /// Set while the order is being changed: disables collection and
    /// reordering triggers, and the level checks of [`Bdd::unique`].
    pub(crate) reordering: Cell<bool>,
}

impl Bdd {
    pub fn new(config: BddConfig) -> Self {
        let cache_bits = config.cache_bits.min(MAX_CACHE_BITS);
        let reorder_threshold = config.reorder_threshold;
        Self {
            nodes: RefCell::new(vec![Node::terminal()]),
            free: RefCell::new(Vec::new()),
            subtables: RefCell::new(Vec::new()),
            cover_subtables: RefCell::new(Vec::new()),
            var_order: RefCell::new(Vec::new()),
            levels: RefCell::new(Vec::new()),
            projections: RefCell::new(Vec::new()),
            cache: RefCell::new(ComputedTable::new(cache_bits)),
            config,
            epoch: Cell::new(0),
            dead: Cell::new(0),
            allocated: Cell::new(0),
            peak: Cell::new(0),
            gc_runs: Cell::new(0),
            reorderings: Cell::new(0),
            reorder_threshold: Cell::new(reorder_threshold),
            reordering: Cell::new(false),
        }
    }
}

impl Default for Bdd {
    fn default() -> Self {
        Bdd::new(BddConfig::default())
    }
}

impl Debug for Bdd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bdd")
            .field("vars", &self.num_vars())
            .field("nodes", &self.num_nodes())
            .field("dead", &self.dead.get())
            .field("epoch", &self.epoch.get())
            .finish()
    }
}

// ========================================================================
// Terminals and node access
// ========================================================================

impl Bdd {
    pub fn one(&self) -> Ref {
        Ref::ONE
    }

    pub fn zero(&self) -> Ref {
        Ref::ZERO
    }

    pub fn constant(&self, value: bool) -> Ref {
        Ref::constant(value)
    }

    pub fn is_one(&self, f: Ref) -> bool {
        f.is_one()
    }

    pub fn is_zero(&self, f: Ref) -> bool {
        f.is_zero()
    }

    pub fn is_terminal(&self, f: Ref) -> bool {
        f.is_terminal()
    }

    pub fn config(&self) -> &BddConfig {
        &self.config
    }

    pub(crate) fn node(&self, id: NodeId) -> Node {
        self.nodes.borrow()[id.index()]
    }

    /// Variable labelling the node behind `f`.
    pub fn variable(&self, f: Ref) -> Var {
        self.node(f.id()).variable
    }

    /// Stored low child (ignores the complement bit of `f`).
    pub fn low(&self, f: Ref) -> Ref {
        self.node(f.id()).low
    }

    /// Stored high child (ignores the complement bit of `f`).
    pub fn high(&self, f: Ref) -> Ref {
        self.node(f.id()).high
    }

    /// Negative cofactor of `f` with respect to its top variable.
    pub fn low_node(&self, f: Ref) -> Ref {
        self.low(f).not_if(f.is_negated())
    }

    /// Positive cofactor of `f` with respect to its top variable.
    pub fn high_node(&self, f: Ref) -> Ref {
        self.high(f).not_if(f.is_negated())
    }

    /// Reference count of the node behind `f`.
    pub fn ref_count(&self, f: Ref) -> u32 {
        self.node(f.id()).refs
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.get()
    }

    pub(crate) fn bump_epoch(&self) {
        self.epoch.set(self.epoch.get() + 1);
    }

    pub(crate) fn allocated(&self) -> u64 {
        self.allocated.get()
    }

    /// Allocated nodes (live or dead), terminal excluded.
    pub fn num_nodes(&self) -> usize {
        self.nodes.borrow().len() - 1 - self.free.borrow().len()
    }

    /// Nodes with a non-zero reference count, terminal excluded.
    pub fn node_count(&self) -> usize {
        self.num_nodes() - self.dead.get()
    }

    pub fn dead_nodes(&self) -> usize {
        self.dead.get()
    }

    pub fn stats(&self) -> BddStats {
        let cache = self.cache.borrow();
        BddStats {
            nodes: self.num_nodes(),
            live: self.node_count(),
            dead: self.dead.get(),
            peak: self.peak.get(),
            allocated: self.allocated.get(),
            gc_runs: self.gc_runs.get(),
            reorderings: self.reorderings.get(),
            epoch: self.epoch.get(),
            cache_hits: cache.hits(),
            cache_misses: cache.misses(),
        }
    }
}

// ========================================================================
// Variables and levels
// ========================================================================

impl Bdd {
    pub fn num_vars(&self) -> usize {
        self.var_order.borrow().len()
    }

    /// Creates variables up to `var` (appended at the bottom of the order).
    ///
    /// Projection nodes are allocated without checking
    /// [`BddConfig::max_nodes`].
    ///
    /// # Panics
    ///
    /// Panics if `var` is [`Var::ZERO`], or if the node id space is exhausted.
    pub fn ensure_var(&self, var: Var) {
        assert!(!var.is_zero(), "Variable ids must be >= 1");
        while self.num_vars() < var.id() as usize {
            let v = Var::new(self.num_vars() as u32 + 1);
            let level = Level::new(self.num_vars());
            self.subtables.borrow_mut().push(Subtable::new(v));
            self.var_order.borrow_mut().push(v);
            self.levels.borrow_mut().push(level);
            let id = match self.alloc_raw(NodeKind::Decision, v, Ref::ZERO, Ref::ONE) {
                Ok(id) => id,
                Err(e) => panic!("cannot allocate the projection of {}: {}", v, e),
            };
            self.nodes.borrow_mut()[id.index()].refs = Node::PINNED;
            self.dead.set(self.dead.get() - 1);
            self.projections.borrow_mut().push(Ref::positive(id));
            debug!("Created variable {} at level {}", v, level);
        }
    }

    /// Projection function of variable `v` (created on demand).
    ///
    /// Projections are pinned, so the result needs no release.
    pub fn mk_var(&self, v: impl Into<Var>) -> Ref {
        let var = v.into();
        self.ensure_var(var);
        self.projections.borrow()[var.slot()]
    }

    pub fn level(&self, var: Var) -> Level {
        self.levels.borrow()[var.slot()]
    }

    pub fn var_at_level(&self, level: Level) -> Var {
        self.var_order.borrow()[level.index()]
    }

    /// The current order, top to bottom.
    pub fn var_order(&self) -> Vec<Var> {
        self.var_order.borrow().clone()
    }

    /// Level of the top node of `f`; terminals sit at `num_vars()`.
    pub fn level_of(&self, f: Ref) -> usize {
        if f.is_terminal() {
            self.num_vars()
        } else {
            self.level(self.variable(f)).index()
        }
    }

    /// Cofactors of `f` with respect to the variable at `level`, if `f`'s
    /// top node sits there; otherwise `f` does not depend on it.
    pub(crate) fn cofactors_at(&self, f: Ref, level: usize) -> (Ref, Ref) {
        if self.level_of(f) == level {
            (self.low_node(f), self.high_node(f))
        } else {
            (f, f)
        }
    }

    /// Cofactors of `f` with respect to `var`, assuming `var` is not below
    /// the top node of `f`.
    pub fn top_cofactors(&self, f: Ref, var: Var) -> (Ref, Ref) {
        assert!(
            f.is_terminal() || self.level(var) <= self.level(self.variable(f)),
            "{} is below the top variable of {}",
            var,
            f
        );
        self.cofactors_at(f, self.level(var).index())
    }

    pub(crate) fn ensure_cover_var(&self, cv: Var) {
        let mut tables = self.cover_subtables.borrow_mut();
        while tables.len() < cv.id() as usize {
            let v = Var::new(tables.len() as u32 + 1);
            tables.push(Subtable::new(v));
        }
    }
}

// ========================================================================
// Reference counting
// ========================================================================

impl Bdd {
    fn inc_in(nodes: &mut [Node], dead: &Cell<usize>, f: Ref) {
        if f.is_terminal() {
            return;
        }
        let node = &mut nodes[f.index()];
        if node.is_pinned() {
            return;
        }
        assert!(node.refs < Node::PINNED - 1, "reference count overflow on {}", f);
        if node.refs == 0 {
            dead.set(dead.get() - 1);
        }
        node.refs += 1;
    }

    /// Returns whether the node became dead.
    pub(crate) fn dec_in(nodes: &mut [Node], dead: &Cell<usize>, f: Ref) -> bool {
        if f.is_terminal() {
            return false;
        }
        let node = &mut nodes[f.index()];
        if node.is_pinned() {
            return false;
        }
        assert!(node.refs > 0, "release of unreferenced node {}", f);
        node.refs -= 1;
        if node.refs == 0 {
            dead.set(dead.get() + 1);
            true
        } else {
            false
        }
    }

    /// Takes one reference to `f`, resurrecting it if it was dead.
    ///
    /// # Panics
    ///
    /// Panics if the reference count would reach the pinned value.
    pub fn acquire(&self, f: Ref) {
        Self::inc_in(&mut self.nodes.borrow_mut(), &self.dead, f);
    }

    /// Gives back one reference to `f`.
    ///
    /// # Panics
    ///
    /// Panics if `f` is not referenced.
    pub fn release(&self, f: Ref) {
        Self::dec_in(&mut self.nodes.borrow_mut(), &self.dead, f);
    }

    /// Reclaims all dead nodes and wipes the computed table.
    ///
    /// Returns the number of freed nodes.
    pub fn collect_garbage(&self) -> usize {
        if self.dead.get() == 0 {
            return 0;
        }
        let mut freed = 0;
        {
            let mut nodes = self.nodes.borrow_mut();
            let mut subtables = self.subtables.borrow_mut();
            let mut cover_subtables = self.cover_subtables.borrow_mut();
            let mut free = self.free.borrow_mut();

            let mut stack: Vec<NodeId> = (1..nodes.len())
                .filter(|&i| nodes[i].is_dead())
                .map(|i| NodeId::from_raw(i as u32))
                .collect();

            while let Some(id) = stack.pop() {
                let node = nodes[id.index()];
                if !node.is_dead() {
                    continue;
                }
                match node.kind {
                    NodeKind::Decision => subtables[node.variable.slot()].remove_id(id, &mut nodes),
                    _ => cover_subtables[node.variable.slot()].remove_id(id, &mut nodes),
                };
                for child in [node.low, node.high] {
                    if Self::dec_in(&mut nodes, &self.dead, child) {
                        stack.push(child.id());
                    }
                }
                nodes[id.index()] = Node::default();
                free.push(id);
                self.dead.set(self.dead.get() - 1);
                freed += 1;
            }
        }
        self.cache.borrow_mut().clear();
        self.gc_runs.set(self.gc_runs.get() + 1);
        debug!("Garbage collection freed {} nodes, {} remain", freed, self.num_nodes());
        freed
    }
}

// ========================================================================
// Allocation
// ========================================================================

impl Bdd {
    /// Finds or creates the decision node `(var, low, high)`.
    ///
    /// Applies the reduction rule (equal children) and keeps the high edge
    /// regular by complementing the result. The returned reference is not
    /// acquired: it is only valid until the next allocation unless the
    /// caller takes a reference.
    pub(crate) fn unique(&self, var: Var, low: Ref, high: Ref) -> DdResult<Ref> {
        if low == high {
            return Ok(low);
        }
        if high.is_negated() {
            return self.unique(var, -low, -high).map(|r| -r);
        }
        debug_assert!(
            self.reordering.get() || self.level(var).index() < self.level_of(low).min(self.level_of(high)),
            "{} is not above its children {} and {}",
            var,
            low,
            high
        );

        let found = self.subtables.borrow()[var.slot()].find(low, high, &self.nodes.borrow());
        if let Some(id) = found {
            return Ok(Ref::positive(id));
        }
        self.maintain(NodeKind::Decision)?;
        let id = self.alloc_raw(NodeKind::Decision, var, low, high)?;
        Ok(Ref::positive(id))
    }

    /// Housekeeping before an allocation: reordering, collection, limit.
    pub(crate) fn maintain(&self, kind: NodeKind) -> DdResult<()> {
        if self.reordering.get() {
            return Ok(());
        }
        if kind == NodeKind::Decision && self.config.auto_reorder && self.node_count() >= self.reorder_threshold.get() {
            let threshold = self.reorder_threshold.get();
            self.reorder_threshold.set(threshold.saturating_mul(2));
            debug!("Live nodes reached {}, sifting", threshold);
            self.collect_garbage();
            self.sift_all()?;
            return Err(DdError::Reordered);
        }
        if self.dead.get() >= self.config.gc_threshold {
            self.collect_garbage();
        }
        if self.num_nodes() >= self.config.max_nodes {
            self.collect_garbage();
            if self.num_nodes() >= self.config.max_nodes {
                return Err(DdError::StoreExhausted {
                    limit: self.config.max_nodes,
                });
            }
        }
        Ok(())
    }

    /// Stores a new node without any lookup or housekeeping.
    ///
    /// The node starts dead; its children gain one reference each.
    pub(crate) fn alloc_raw(&self, kind: NodeKind, var: Var, low: Ref, high: Ref) -> DdResult<NodeId> {
        let id = {
            let mut nodes = self.nodes.borrow_mut();
            let node = Node::new(kind, var, low, high);
            let id = match self.free.borrow_mut().pop() {
                Some(id) => {
                    nodes[id.index()] = node;
                    id
                }
                None => {
                    if nodes.len() as u64 > NodeId::MAX as u64 {
                        return Err(DdError::StoreExhausted { limit: nodes.len() });
                    }
                    nodes.push(node);
                    NodeId::from_raw((nodes.len() - 1) as u32)
                }
            };
            self.dead.set(self.dead.get() + 1);
            Self::inc_in(&mut nodes, &self.dead, low);
            Self::inc_in(&mut nodes, &self.dead, high);
            match kind {
                NodeKind::Decision => self.subtables.borrow_mut()[var.slot()].insert(id, &mut nodes),
                _ => self.cover_subtables.borrow_mut()[var.slot()].insert(id, &mut nodes),
            }
            id
        };
        self.allocated.set(self.allocated.get() + 1);
        let size = self.num_nodes();
        if size > self.peak.get() {
            self.peak.set(size);
        }
        let mut cache = self.cache.borrow_mut();
        if size > 2 * cache.capacity() && cache.bits() < MAX_CACHE_BITS {
            let bits = cache.bits() + 1;
            debug!("Store grew to {} nodes, resizing computed table to 2^{}", size, bits);
            cache.resize(bits);
        }
        Ok(id)
    }

    pub(crate) fn cache_get(&self, key: &OpKey) -> Option<Ref> {
        self.cache.borrow().get(key)
    }

    pub(crate) fn cache_insert(&self, key: OpKey, value: Ref) {
        self.cache.borrow_mut().insert(key, value);
    }

    pub(crate) fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }
}

// ========================================================================
// Structural queries
// ========================================================================

impl Bdd {
    /// Node ids reachable from the given roots, terminal included.
    pub fn descendants(&self, roots: impl IntoIterator<Item = Ref>) -> HashSet<NodeId> {
        let mut visited = HashSet::new();
        let mut stack: Vec<Ref> = roots.into_iter().collect();
        while let Some(f) = stack.pop() {
            if !visited.insert(f.id()) || f.is_terminal() {
                continue;
            }
            let node = self.node(f.id());
            stack.push(node.low);
            stack.push(node.high);
        }
        visited
    }

    /// Number of distinct nodes of `f`, terminal included.
    pub fn size(&self, f: Ref) -> usize {
        self.descendants([f]).len()
    }

    /// Variables `f` depends on, ordered by current level.
    pub fn support(&self, f: Ref) -> Vec<Var> {
        let mut vars: Vec<Var> = self
            .descendants([f])
            .into_iter()
            .filter(|id| !id.is_terminal())
            .map(|id| self.node(id).variable)
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        vars.sort_unstable_by_key(|&v| self.level(v));
        vars
    }
}
