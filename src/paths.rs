//! Lazy enumeration of BDD paths and cover cubes.
//!
//! Both iterators keep a stack of pending branches and a single reusable
//! path buffer; only the yielded vectors are allocated. The number of items
//! can be exponential in the number of variables.

use crate::bdd::Bdd;
use crate::cover::Cover;
use crate::guard::Handle;
use crate::reference::Ref;
use crate::types::Lit;

impl Bdd {
    /// Iterator over the paths from `f` to the true terminal.
    ///
    /// Each path is the list of literals along it, top to bottom.
    ///
    /// ```
    /// use bdd_logic::bdd::Bdd;
    /// use bdd_logic::types::Lit;
    ///
    /// let bdd = Bdd::default();
    /// let f = bdd.cube([1, -2]).unwrap();
    /// let paths: Vec<_> = bdd.paths(f).collect();
    /// assert_eq!(paths, vec![vec![Lit::from(1), Lit::from(-2)]]);
    /// ```
    pub fn paths(&self, f: Ref) -> BddPaths<'_> {
        BddPaths {
            bdd: self,
            stack: vec![(f, 0, None)],
            path: Vec::new(),
        }
    }

    /// Iterator over the cubes of a cover, restartable with [`CoverCubes::reset`].
    ///
    /// The iterator holds a reference to the cover while it is alive.
    pub fn cubes(&self, cover: Cover) -> CoverCubes<'_> {
        self.acquire(cover.edge());
        CoverCubes {
            bdd: self,
            root: cover,
            stack: vec![(cover.edge(), 0, None)],
            path: Vec::new(),
        }
    }
}

/// A pending branch: target node, path length at the branch point, and the
/// literal taken on the way (if any).
type Pending = (Ref, usize, Option<Lit>);

pub struct BddPaths<'a> {
    bdd: &'a Bdd,
    stack: Vec<Pending>,
    path: Vec<Lit>,
}

impl Iterator for BddPaths<'_> {
    type Item = Vec<Lit>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, depth, lit)) = self.stack.pop() {
            self.path.truncate(depth);
            self.path.extend(lit);
            if node.is_zero() {
                continue;
            }
            if node.is_one() {
                return Some(self.path.clone());
            }
            let var = self.bdd.variable(node);
            let depth = self.path.len();
            self.stack.push((self.bdd.low_node(node), depth, Some(var.neg())));
            self.stack.push((self.bdd.high_node(node), depth, Some(var.pos())));
        }
        None
    }
}

/// Lazy iterator over the cubes of a cover.
///
/// Each cube is yielded as its literals over Boolean variables, in cover
/// variable order. Cloning yields an independent iterator at the same
/// position.
pub struct CoverCubes<'a> {
    bdd: &'a Bdd,
    root: Cover,
    stack: Vec<Pending>,
    path: Vec<Lit>,
}

impl CoverCubes<'_> {
    /// Restarts the enumeration from the first cube.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.stack.push((self.root.edge(), 0, None));
        self.path.clear();
    }

    pub fn cover(&self) -> Cover {
        self.root
    }
}

impl Clone for CoverCubes<'_> {
    fn clone(&self) -> Self {
        self.bdd.acquire(self.root.edge());
        Self {
            bdd: self.bdd,
            root: self.root,
            stack: self.stack.clone(),
            path: self.path.clone(),
        }
    }
}

impl Drop for CoverCubes<'_> {
    fn drop(&mut self) {
        self.bdd.release(self.root.edge());
    }
}

impl Iterator for CoverCubes<'_> {
    type Item = Vec<Lit>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, depth, lit)) = self.stack.pop() {
            self.path.truncate(depth);
            self.path.extend(lit);
            let node = Cover::from_edge(node);
            if node.is_empty() {
                continue;
            }
            if node.is_base() {
                return Some(self.path.clone());
            }
            let n = self.bdd.node(node.edge().id());
            let depth = self.path.len();
            self.stack.push((n.low, depth, None));
            self.stack.push((n.high, depth, Some(Cover::literal_of(n.variable))));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_paths_xor() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let f = bdd.apply_xor(x, y).unwrap();
        let mut paths: Vec<Vec<i32>> = bdd
            .paths(f)
            .map(|p| p.into_iter().map(|l| l.to_dimacs()).collect())
            .collect();
        paths.sort();
        assert_eq!(paths, vec![vec![-1, 2], vec![1, -2]]);
    }

    #[test]
    fn test_paths_terminals() {
        let bdd = Bdd::default();
        assert_eq!(bdd.paths(bdd.one()).collect::<Vec<_>>(), vec![Vec::<Lit>::new()]);
        assert_eq!(bdd.paths(bdd.zero()).count(), 0);
    }

    #[test]
    fn test_cover_cubes_restart() {
        let bdd = Bdd::default();
        let cover = bdd.cover_from_cubes(&[vec![1, -2], vec![3]]).unwrap();
        let mut it = bdd.cubes(cover);
        let first: Vec<Vec<Lit>> = it.by_ref().collect();
        assert_eq!(first.len(), 2);
        assert!(first.contains(&vec![Lit::from(1), Lit::from(-2)]));
        assert!(first.contains(&vec![Lit::from(3)]));
        assert_eq!(it.next(), None);

        it.reset();
        let copy = it.clone();
        assert_eq!(it.count(), 2);
        assert_eq!(copy.count(), 2);
        bdd.release(cover.edge());
        assert!(bdd.check_invariants().is_ok());
    }

    #[test]
    fn test_cover_cubes_base_and_empty() {
        let bdd = Bdd::default();
        assert_eq!(bdd.cubes(Cover::BASE).collect::<Vec<_>>(), vec![Vec::<Lit>::new()]);
        assert_eq!(bdd.cubes(Cover::EMPTY).count(), 0);
    }
}
