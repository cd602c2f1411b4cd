//! Dynamic variable reordering by in-place adjacent swaps.
//!
//! Swapping the variables `x` (level `i`) and `y` (level `i+1`) rewrites
//! only the `x`-nodes that have a `y`-child. Such a node keeps its slot
//! (so every edge pointing to it, and every external handle, stays valid)
//! but is relabelled with `y`, and gets fresh `x`-children:
//!
//! ```text
//!        x                     y
//!      /   \                 /   \
//!     y     y      =>       x     x
//!    / \   / \             / \   / \
//!  f00 f01 f10 f11       f00 f10 f01 f11
//! ```
//!
//! Every swap advances the epoch and wipes the computed table.

use log::debug;

use crate::bdd::Bdd;
use crate::error::{DdError, DdResult};
use crate::node::Node;
use crate::reference::Ref;
use crate::types::{Level, NodeId, Var};

/// Statistics of a reordering run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReorderStats {
    pub swaps: usize,
    pub initial_size: usize,
    pub final_size: usize,
    pub variables_processed: usize,
}

impl Bdd {
    /// Frees the dead nodes of `var`'s subtable. Children that die in turn
    /// are left for the next collection.
    fn free_dead_at(&self, var: Var) {
        let mut nodes = self.nodes.borrow_mut();
        let mut subtables = self.subtables.borrow_mut();
        let mut free = self.free.borrow_mut();
        for id in subtables[var.slot()].ids(&nodes) {
            let node = nodes[id.index()];
            if !node.is_dead() {
                continue;
            }
            subtables[var.slot()].remove_id(id, &mut nodes);
            nodes[id.index()] = Node::default();
            free.push(id);
            self.dead.set(self.dead.get() - 1);
            Bdd::dec_in(&mut nodes, &self.dead, node.low);
            Bdd::dec_in(&mut nodes, &self.dead, node.high);
        }
    }

    /// Swaps the variables at `level` and `level + 1`.
    ///
    /// Returns the number of live nodes afterwards.
    pub fn swap_adjacent(&self, level: Level) -> DdResult<usize> {
        let n = self.num_vars();
        assert!(level.index() + 1 < n, "cannot swap level {} of {} levels", level, n);
        let x = self.var_at_level(level);
        let y = self.var_at_level(level.next());

        let was_reordering = self.reordering.replace(true);
        let res = self.swap_levels(level, x, y);
        self.reordering.set(was_reordering);
        self.bump_epoch();
        self.clear_cache();
        res.map(|()| self.node_count())
    }

    fn swap_levels(&self, level: Level, x: Var, y: Var) -> DdResult<()> {
        self.free_dead_at(x);

        let candidates: Vec<NodeId> = {
            let nodes = self.nodes.borrow();
            self.subtables.borrow()[x.slot()]
                .ids(&nodes)
                .into_iter()
                .filter(|id| {
                    let node = nodes[id.index()];
                    [node.low, node.high]
                        .iter()
                        .any(|c| !c.is_terminal() && nodes[c.index()].variable == y)
                })
                .collect()
        };

        for id in candidates {
            let node = self.node(id);
            let (f0, f1) = (node.low, node.high);
            let (f00, f01) = self.cofactors_of_var(f0, y);
            let (f10, f11) = self.cofactors_of_var(f1, y);

            {
                let mut nodes = self.nodes.borrow_mut();
                self.subtables.borrow_mut()[x.slot()].remove_id(id, &mut nodes);
            }

            let new_low = self.unique(x, f00, f10)?;
            self.acquire(new_low);
            let new_high = self.unique(x, f01, f11)?;
            self.acquire(new_high);
            debug_assert!(!new_high.is_negated());
            self.release(f0);
            self.release(f1);

            let mut nodes = self.nodes.borrow_mut();
            let slot = &mut nodes[id.index()];
            slot.variable = y;
            slot.low = new_low;
            slot.high = new_high;
            self.subtables.borrow_mut()[y.slot()].insert(id, &mut nodes);
        }

        {
            let mut order = self.var_order.borrow_mut();
            let mut levels = self.levels.borrow_mut();
            order.swap(level.index(), level.index() + 1);
            levels[x.slot()] = level.next();
            levels[y.slot()] = level;
        }
        Ok(())
    }

    /// Cofactors of a child edge with respect to `y`, looking one level down.
    fn cofactors_of_var(&self, f: Ref, y: Var) -> (Ref, Ref) {
        if !f.is_terminal() && self.variable(f) == y {
            (self.low_node(f), self.high_node(f))
        } else {
            (f, f)
        }
    }

    /// Moves `var` to `target` by adjacent swaps.
    fn move_var(&self, var: Var, target: usize) -> DdResult<usize> {
        let mut swaps = 0;
        let mut current = self.level(var).index();
        while current > target {
            self.swap_adjacent(Level::new(current - 1))?;
            current -= 1;
            swaps += 1;
        }
        while current < target {
            self.swap_adjacent(Level::new(current))?;
            current += 1;
            swaps += 1;
        }
        Ok(swaps)
    }

    /// Sifts one variable through all levels and leaves it at the position
    /// with the fewest live nodes.
    ///
    /// Returns the number of swaps performed.
    pub fn sift_variable(&self, var: Var) -> DdResult<usize> {
        let n = self.num_vars();
        if n <= 1 {
            return Ok(0);
        }
        let start = self.level(var).index();
        let mut best = (self.node_count(), start);
        let mut swaps = 0;

        // Up to the top, then all the way down.
        let mut current = start;
        while current > 0 {
            let size = self.swap_adjacent(Level::new(current - 1))?;
            current -= 1;
            swaps += 1;
            if size < best.0 {
                best = (size, current);
            }
        }
        while current + 1 < n {
            let size = self.swap_adjacent(Level::new(current))?;
            current += 1;
            swaps += 1;
            if size < best.0 {
                best = (size, current);
            }
        }
        swaps += self.move_var(var, best.1)?;
        debug!("Sifted {}: level {} -> {}, {} live nodes", var, start, best.1, best.0);
        Ok(swaps)
    }

    /// Rudell's sifting over all variables, largest subtables first.
    pub fn sift_all(&self) -> DdResult<ReorderStats> {
        let was_reordering = self.reordering.replace(true);
        let res = self.sift_all_vars();
        self.reordering.set(was_reordering);
        self.reorderings.set(self.reorderings.get() + 1);
        res
    }

    fn sift_all_vars(&self) -> DdResult<ReorderStats> {
        self.collect_garbage();
        let initial_size = self.node_count();

        let mut vars: Vec<(usize, Var)> = {
            let subtables = self.subtables.borrow();
            subtables.iter().map(|st| (st.len(), st.variable)).collect()
        };
        vars.sort_by(|a, b| b.0.cmp(&a.0));

        let mut swaps = 0;
        for &(_, var) in &vars {
            swaps += self.sift_variable(var)?;
        }
        self.collect_garbage();

        let stats = ReorderStats {
            swaps,
            initial_size,
            final_size: self.node_count(),
            variables_processed: vars.len(),
        };
        debug!(
            "Sifting done: {} -> {} live nodes, {} swaps",
            stats.initial_size, stats.final_size, stats.swaps
        );
        Ok(stats)
    }

    /// Rearranges the variables into `order` (top to bottom).
    pub fn reorder_to(&self, order: &[Var]) -> DdResult<ReorderStats> {
        let mut sorted: Vec<Var> = order.to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        let expected: Vec<Var> = (1..=self.num_vars() as u32).map(Var::new).collect();
        if sorted != expected || order.len() != expected.len() {
            return Err(DdError::invalid(format!("{:?} is not a permutation of the variables", order)));
        }

        let was_reordering = self.reordering.replace(true);
        let initial_size = self.node_count();
        let mut swaps = 0;
        let mut res = Ok(());
        for (target, &var) in order.iter().enumerate() {
            match self.move_var(var, target) {
                Ok(n) => swaps += n,
                Err(e) => {
                    res = Err(e);
                    break;
                }
            }
        }
        self.reordering.set(was_reordering);
        self.reorderings.set(self.reorderings.get() + 1);
        res.map(|()| ReorderStats {
            swaps,
            initial_size,
            final_size: self.node_count(),
            variables_processed: order.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_swap_preserves_functions() {
        let bdd = Bdd::default();
        let x1 = bdd.mk_var(1);
        let x2 = bdd.mk_var(2);
        let x3 = bdd.mk_var(3);
        let f = bdd.apply_ite(x1, x2, x3).unwrap();
        let g = bdd.apply_xor(x1, x2).unwrap();
        let epoch = bdd.epoch();

        bdd.swap_adjacent(Level::new(0)).unwrap();
        assert_eq!(bdd.var_order(), vec![Var::new(2), Var::new(1), Var::new(3)]);
        assert!(bdd.epoch() > epoch);
        assert!(bdd.check_invariants().is_ok());

        // Handles survive and still denote the same functions.
        assert_eq!(bdd.apply_ite(x1, x2, x3).unwrap(), f);
        assert_eq!(bdd.apply_xor(x1, x2).unwrap(), g);
        assert_eq!(bdd.variable(f), Var::new(2));
    }

    #[test]
    fn test_swap_back_and_forth() {
        let bdd = Bdd::default();
        let x1 = bdd.mk_var(1);
        let x2 = bdd.mk_var(2);
        let x3 = bdd.mk_var(3);
        let x4 = bdd.mk_var(4);
        let a = bdd.apply_and(x1, x3).unwrap();
        let b = bdd.apply_and(x2, x4).unwrap();
        let f = bdd.apply_or(a, b).unwrap();

        bdd.swap_adjacent(Level::new(1)).unwrap();
        bdd.swap_adjacent(Level::new(2)).unwrap();
        bdd.swap_adjacent(Level::new(1)).unwrap();
        assert!(bdd.check_invariants().is_ok());
        assert_eq!(bdd.apply_or(a, b).unwrap(), f);
    }

    #[test]
    fn test_sift_all_shrinks_interleaved_and() {
        let bdd = Bdd::default();
        // x1x4 + x2x5 + x3x6 is exponential in the order 1..6, linear in 1,4,2,5,3,6.
        let mut f = bdd.zero();
        for i in 1..=3u32 {
            let a = bdd.mk_var(i);
            let b = bdd.mk_var(i + 3);
            let ab = bdd.apply_and(a, b).unwrap();
            f = bdd.apply_or(f, ab).unwrap();
        }
        let before = bdd.size(f);
        let stats = bdd.sift_all().unwrap();
        assert!(bdd.size(f) <= before);
        assert_eq!(stats.variables_processed, 6);
        assert!(bdd.check_invariants().is_ok());
    }

    #[test]
    fn test_reorder_to() {
        let bdd = Bdd::default();
        let x1 = bdd.mk_var(1);
        let x2 = bdd.mk_var(2);
        let x3 = bdd.mk_var(3);
        let f = bdd.apply_ite(x1, x2, x3).unwrap();
        let order = vec![Var::new(3), Var::new(1), Var::new(2)];
        bdd.reorder_to(&order).unwrap();
        assert_eq!(bdd.var_order(), order);
        assert_eq!(bdd.apply_ite(x1, x2, x3).unwrap(), f);
        assert!(bdd.check_invariants().is_ok());
    }
}
