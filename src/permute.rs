//! Variable permutation and swapping.
//!
//! A permutation rebuilds the diagram bottom-up through ITE, memoizing
//! node results in a private [`BoundedCache`]. Every memoized node is held
//! by the cache and released when it is dropped. When the cache fills up,
//! the attempt fails with [`DdError::CacheOverflow`], releases everything
//! it built, and the retry loop starts over with twice the capacity.

use std::cell::Cell;

use log::debug;

use crate::bdd::Bdd;
use crate::cache::BoundedCache;
use crate::error::{DdError, DdResult};
use crate::reference::Ref;
use crate::types::{NodeId, Var};

const INITIAL_CAPACITY: usize = 1 << 10;

/// Per-call memo of a permutation: source node to rebuilt function.
struct PermuteCache<'a> {
    bdd: &'a Bdd,
    map: BoundedCache<NodeId, Ref>,
}

impl<'a> PermuteCache<'a> {
    fn new(bdd: &'a Bdd, capacity: usize) -> Self {
        Self {
            bdd,
            map: BoundedCache::new(capacity),
        }
    }

    fn get(&self, id: NodeId) -> Option<Ref> {
        self.map.get(&id)
    }

    fn insert(&mut self, id: NodeId, res: Ref) -> DdResult<()> {
        self.map.try_insert(id, res)?;
        self.bdd.acquire(res);
        Ok(())
    }
}

impl Drop for PermuteCache<'_> {
    fn drop(&mut self) {
        for r in self.map.values() {
            self.bdd.release(r);
        }
    }
}

impl Bdd {
    fn permute_rec(&self, f: Ref, map: &[Var], cache: &mut PermuteCache) -> DdResult<Ref> {
        if f.is_terminal() {
            return Ok(f);
        }
        if let Some(res) = cache.get(f.id()) {
            return Ok(res.not_if(f.is_negated()));
        }
        let node = self.node(f.id());
        let low = self.hold(self.permute_rec(node.low, map, cache)?);
        let high = self.hold(self.permute_rec(node.high, map, cache)?);
        let var = map[node.variable.slot()];
        let res = self.ite_rec(self.mk_var(var), high.get(), low.get())?;
        cache.insert(f.id(), res)?;
        Ok(res.not_if(f.is_negated()))
    }

    /// The full map `x_i -> image` over every variable touched by `perm`.
    fn permutation_map(&self, perm: &[Var]) -> DdResult<Vec<Var>> {
        let n = perm
            .iter()
            .map(|v| v.id() as usize)
            .chain([perm.len(), self.num_vars()])
            .max()
            .unwrap_or(0);
        let map: Vec<Var> = (1..=n as u32)
            .map(|i| perm.get(i as usize - 1).copied().unwrap_or(Var::new(i)))
            .collect();
        if map.iter().any(|v| v.is_zero()) {
            return Err(DdError::invalid("permutation maps to the terminal variable"));
        }
        let mut seen = vec![false; n];
        for &v in &map {
            if std::mem::replace(&mut seen[v.slot()], true) {
                return Err(DdError::invalid(format!("permutation maps two variables to {}", v)));
            }
        }
        Ok(map)
    }

    pub(crate) fn permute_with_capacity(&self, f: Ref, perm: &[Var], capacity: usize) -> DdResult<Ref> {
        let map = self.permutation_map(perm)?;
        for &v in &map {
            self.ensure_var(v);
        }
        debug!("permute(f = {}, perm = {:?})", f, map);
        let capacity = Cell::new(capacity.max(1));
        self.retry("permute", || {
            let mut cache = PermuteCache::new(self, capacity.get());
            match self.permute_rec(f, &map, &mut cache) {
                Ok(res) => Ok(self.acquired(res)),
                Err(DdError::CacheOverflow) => {
                    capacity.set(capacity.get() * 2);
                    debug!("permute: side-cache full, growing to {}", capacity.get());
                    Err(DdError::CacheOverflow)
                }
                Err(e) => Err(e),
            }
        })
    }

    /// Renames the variables of `f`: variable `i` becomes `perm[i-1]`.
    ///
    /// Variables past the end of `perm` keep their name. The resulting map
    /// must be injective.
    pub fn permute(&self, f: Ref, perm: &[Var]) -> DdResult<Ref> {
        self.permute_with_capacity(f, perm, INITIAL_CAPACITY)
    }

    /// Exchanges variables `x` and `y` in `f`.
    pub fn swap_variables(&self, f: Ref, x: impl Into<Var>, y: impl Into<Var>) -> DdResult<Ref> {
        let (x, y) = (x.into(), y.into());
        let n = x.id().max(y.id());
        let mut perm: Vec<Var> = (1..=n).map(Var::new).collect();
        perm.swap(x.slot(), y.slot());
        self.permute(f, &perm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_permute_rename() {
        let bdd = Bdd::default();
        let f = bdd.cube([1, -2]).unwrap();
        let perm = [Var::new(3), Var::new(1), Var::new(2)];
        let g = bdd.permute(f, &perm).unwrap();
        assert_eq!(g, bdd.cube([3, -1]).unwrap());
    }

    #[test]
    fn test_permute_round_trip() {
        let bdd = Bdd::default();
        let x1 = bdd.mk_var(1);
        let x2 = bdd.mk_var(2);
        let x3 = bdd.mk_var(3);
        let f = bdd.apply_ite(x1, x2, -x3).unwrap();
        let perm = [Var::new(2), Var::new(3), Var::new(1)];
        let inverse = [Var::new(3), Var::new(1), Var::new(2)];
        let g = bdd.permute(f, &perm).unwrap();
        assert_ne!(g, f);
        assert_eq!(bdd.permute(g, &inverse).unwrap(), f);
    }

    #[test]
    fn test_permute_restarts_on_overflow() {
        let bdd = Bdd::default();
        let mut f = bdd.zero();
        for i in 1..=4u32 {
            let c = bdd.cube([i as i32, -(i as i32 + 4)]).unwrap();
            f = bdd.apply_or(f, c).unwrap();
        }
        let perm: Vec<Var> = (1..=8).rev().map(Var::new).collect();
        let expected = bdd.permute(f, &perm).unwrap();
        let live = bdd.node_count();
        let g = bdd.permute_with_capacity(f, &perm, 1).unwrap();
        assert_eq!(g, expected);
        // Both results are owned by the test; nothing built by the failed
        // attempts stays referenced.
        assert_eq!(bdd.ref_count(g), 2);
        assert_eq!(bdd.node_count(), live);
        assert!(bdd.check_invariants().is_ok());
    }

    #[test]
    fn test_swap_variables() {
        let bdd = Bdd::default();
        let f = bdd.cube([1, -3]).unwrap();
        let g = bdd.swap_variables(f, 1u32, 3u32).unwrap();
        assert_eq!(g, bdd.cube([3, -1]).unwrap());
    }

    #[test]
    fn test_permute_rejects_non_injective() {
        let bdd = Bdd::default();
        let f = bdd.mk_var(1);
        bdd.mk_var(2);
        let res = bdd.permute(f, &[Var::new(2)]);
        assert!(matches!(res, Err(DdError::InvalidArgument(_))));
    }
}
