//! Per-level node and edge profiles of a diagram.
//!
//! All profiles are vectors indexed by level, of length `num_vars() + 1`;
//! the last slot stands for the terminal.

use std::collections::{HashMap, HashSet};

use log::debug;

use crate::bdd::Bdd;
use crate::reference::Ref;
use crate::types::NodeId;

impl Bdd {
    /// Number of distinct nodes of `f` at each level.
    ///
    /// A node reached through both polarities counts once. Traversal stops
    /// at `cut`: nodes at level `cut` or below are neither counted nor
    /// expanded. With `cut = None` the profile sums to [`Bdd::size`].
    pub fn node_profile(&self, f: Ref, cut: Option<usize>) -> Vec<usize> {
        let cut = cut.unwrap_or(usize::MAX);
        let mut profile = vec![0; self.num_vars() + 1];
        let mut visited: HashSet<NodeId> = HashSet::new();
        let mut stack = vec![f];
        while let Some(g) = stack.pop() {
            let level = self.level_of(g);
            if level >= cut || !visited.insert(g.id()) {
                continue;
            }
            profile[level] += 1;
            if !g.is_terminal() {
                stack.push(self.low(g));
                stack.push(self.high(g));
            }
        }
        debug!("node_profile(f = {}, cut = {}): {:?}", f, cut, profile);
        profile
    }

    /// Like [`Bdd::node_profile`], but a node reached with both polarities
    /// counts twice.
    pub fn node_profile_polar(&self, f: Ref, cut: Option<usize>) -> Vec<usize> {
        let cut = cut.unwrap_or(usize::MAX);
        let mut profile = vec![0; self.num_vars() + 1];
        let mut visited: HashSet<Ref> = HashSet::new();
        let mut stack = vec![f];
        while let Some(g) = stack.pop() {
            let level = self.level_of(g);
            if level >= cut || !visited.insert(g) {
                continue;
            }
            profile[level] += 1;
            if !g.is_terminal() {
                stack.push(self.low_node(g));
                stack.push(self.high_node(g));
            }
        }
        profile
    }

    /// Number of edges of `f` by length, the level difference between
    /// child and parent. Slot 0 is always zero.
    pub fn edge_profile(&self, f: Ref) -> Vec<usize> {
        let mut profile = vec![0; self.num_vars() + 1];
        for id in self.descendants([f]) {
            if id.is_terminal() {
                continue;
            }
            let node = self.node(id);
            let level = self.level(node.variable).index();
            for child in [node.low, node.high] {
                profile[self.level_of(child) - level] += 1;
            }
        }
        profile
    }

    /// Width of `f` at each level boundary: the number of distinct nodes at
    /// or below level `i` that are the root or have a parent above `i`.
    pub fn profile_width(&self, f: Ref) -> Vec<usize> {
        let n = self.num_vars();
        let nodes = self.descendants([f]);

        // Highest parent level of every node.
        let mut top_parent: HashMap<NodeId, usize> = HashMap::new();
        for &id in &nodes {
            if id.is_terminal() {
                continue;
            }
            let node = self.node(id);
            let level = self.level(node.variable).index();
            for child in [node.low, node.high] {
                top_parent
                    .entry(child.id())
                    .and_modify(|p| *p = (*p).min(level))
                    .or_insert(level);
            }
        }

        // A node is crossed by boundaries `(first, level]`.
        let mut delta = vec![0isize; n + 2];
        for &id in &nodes {
            let level = self.level_of(Ref::positive(id));
            let first = if id == f.id() {
                0
            } else {
                match top_parent.get(&id) {
                    Some(&p) => p + 1,
                    None => continue,
                }
            };
            if first <= level {
                delta[first] += 1;
                delta[level + 1] -= 1;
            }
        }
        let mut width = Vec::with_capacity(n + 1);
        let mut acc = 0isize;
        for d in delta.iter().take(n + 1) {
            acc += d;
            width.push(acc as usize);
        }
        width
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn xor3(bdd: &Bdd) -> Ref {
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let z = bdd.mk_var(3);
        let xy = bdd.apply_xor(x, y).unwrap();
        bdd.apply_xor(xy, z).unwrap()
    }

    #[test]
    fn test_node_profile_sums_to_size() {
        let bdd = Bdd::default();
        let f = xor3(&bdd);
        let profile = bdd.node_profile(f, None);
        assert_eq!(profile, vec![1, 1, 1, 1]);
        assert_eq!(profile.iter().sum::<usize>(), bdd.size(f));
    }

    #[test]
    fn test_node_profile_cut() {
        let bdd = Bdd::default();
        let f = xor3(&bdd);
        assert_eq!(bdd.node_profile(f, Some(2)), vec![1, 1, 0, 0]);
        assert_eq!(bdd.node_profile(f, Some(0)), vec![0, 0, 0, 0]);
    }

    #[test]
    fn test_node_profile_polar() {
        let bdd = Bdd::default();
        let f = xor3(&bdd);
        // Below the root, each xor node is reached in both polarities.
        assert_eq!(bdd.node_profile_polar(f, None), vec![1, 2, 2, 2]);
    }

    #[test]
    fn test_edge_profile() {
        let bdd = Bdd::default();
        let f = xor3(&bdd);
        assert_eq!(bdd.edge_profile(f), vec![0, 6, 0, 0]);

        let x = bdd.mk_var(1);
        bdd.mk_var(3);
        assert_eq!(bdd.edge_profile(x), vec![0, 0, 0, 2]);
    }

    #[test]
    fn test_profile_width() {
        let bdd = Bdd::default();
        let f = xor3(&bdd);
        assert_eq!(bdd.profile_width(f), vec![1, 1, 1, 1]);

        let a = bdd.cube([1, 3]).unwrap();
        // The false edge of the root crosses every boundary down to the terminal.
        assert_eq!(bdd.profile_width(a), vec![1, 2, 2, 1]);
        assert_eq!(bdd.profile_width(bdd.one()), vec![1, 1, 1, 1]);
    }
}
