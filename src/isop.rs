//! Irredundant sum-of-products covers (Minato-Morreale).
//!
//! Given an interval `lower ≤ f ≤ upper` (the on-set and the on-set with
//! the don't-cares), [`Bdd::isop`] returns an irredundant cover of some
//! function in the interval together with the BDD of that function.

use log::{debug, trace};

use crate::bdd::Bdd;
use crate::cache::{OpKey, OpTag};
use crate::cover::{Cover, CoverParts};
use crate::error::{DdError, DdResult};
use crate::guard::Handle;
use crate::limits::{Budget, Limits};
use crate::reference::Ref;
use crate::types::Level;

impl Bdd {
    pub(crate) fn isop_rec(&self, lower: Ref, upper: Ref, budget: &Budget) -> DdResult<(Cover, Ref)> {
        trace!("isop(lower = {}, upper = {})", lower, upper);

        if lower.is_zero() {
            return Ok((Cover::EMPTY, Ref::ZERO));
        }
        if upper.is_one() {
            return Ok((Cover::BASE, Ref::ONE));
        }

        let cover_key = OpKey::binary(OpTag::IsopCover, lower, upper);
        let func_key = OpKey::binary(OpTag::IsopFunction, lower, upper);
        if let (Some(c), Some(r)) = (self.cache_get(&cover_key), self.cache_get(&func_key)) {
            return Ok((Cover::from_edge(c), r));
        }
        budget.check(self)?;

        let m = self.level_of(lower).min(self.level_of(upper));
        let var = self.var_at_level(Level::new(m));
        let (l0, l1) = self.cofactors_at(lower, m);
        let (u0, u1) = self.cofactors_at(upper, m);

        // Minterms that can only be covered by cubes with the literal.
        let only0 = self.hold(self.and_rec(l0, -u1, budget)?);
        let only1 = self.hold(self.and_rec(l1, -u0, budget)?);

        let (c0, r0) = self.isop_rec(only0.get(), u0, budget)?;
        let (c0, r0) = (self.hold_cover(c0), self.hold(r0));
        let (c1, r1) = self.isop_rec(only1.get(), u1, budget)?;
        let (c1, r1) = (self.hold_cover(c1), self.hold(r1));

        // What is left for cubes without the literal.
        let rest0 = self.hold(self.and_rec(l0, -r0.get(), budget)?);
        let rest1 = self.hold(self.and_rec(l1, -r1.get(), budget)?);
        let rest = self.hold(self.or_rec(rest0.get(), rest1.get(), budget)?);
        let both = self.hold(self.and_rec(u0, u1, budget)?);
        let (cd, rd) = self.isop_rec(rest.get(), both.get(), budget)?;
        let (cd, rd) = (self.hold_cover(cd), self.hold(rd));

        let high = self.hold(self.or_rec(r1.get(), rd.get(), budget)?);
        let low = self.hold(self.or_rec(r0.get(), rd.get(), budget)?);
        let func = self.hold(self.unique(var, low.get(), high.get())?);
        let cover = self.compose_rec(
            var,
            CoverParts {
                neg: c0.get(),
                pos: c1.get(),
                without: cd.get(),
            },
        )?;

        self.cache_insert(cover_key, cover.edge());
        self.cache_insert(func_key, func.get());
        Ok((cover, func.get()))
    }

    fn run_isop(&self, op: &str, lower: Ref, upper: Ref, limits: &Limits) -> DdResult<(Cover, Ref)> {
        debug!("{}(lower = {}, upper = {}, limits = {:?})", op, lower, upper, limits);
        if !self.is_implies(lower, upper) {
            return Err(DdError::invalid(format!("{} does not imply {}", lower, upper)));
        }
        self.retry(op, || {
            let budget = Budget::start(self, limits);
            let (cover, func) = self.isop_rec(lower, upper, &budget)?;
            Ok((self.acquired(cover), self.acquired(func)))
        })
    }

    /// Irredundant cover of a function between `lower` and `upper`.
    ///
    /// Returns the cover and the function it denotes, both acquired.
    /// `lower` must imply `upper`.
    ///
    /// ```
    /// use bdd_logic::bdd::Bdd;
    ///
    /// let bdd = Bdd::default();
    /// let a = bdd.mk_var(1);
    /// let b = bdd.mk_var(2);
    /// let f = bdd.apply_or(a, b).unwrap();
    /// let (cover, func) = bdd.isop(f, f).unwrap();
    /// assert_eq!(func, f);
    /// assert_eq!(bdd.cubes(cover).count(), 2);
    /// ```
    pub fn isop(&self, lower: Ref, upper: Ref) -> DdResult<(Cover, Ref)> {
        self.run_isop("isop", lower, upper, &Limits::none())
    }

    /// Like [`Bdd::isop`], returning only the cover.
    pub fn isop_cover(&self, lower: Ref, upper: Ref) -> DdResult<Cover> {
        let (cover, func) = self.isop(lower, upper)?;
        self.release(func);
        Ok(cover)
    }

    /// [`Bdd::isop`] under a deadline and a node budget.
    pub fn isop_limited(&self, lower: Ref, upper: Ref, limits: &Limits) -> DdResult<(Cover, Ref)> {
        self.run_isop("isop_limited", lower, upper, limits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AbortReason;
    use crate::types::Lit;
    use test_log::test;

    fn majority(bdd: &Bdd) -> Ref {
        let a = bdd.mk_var(1);
        let b = bdd.mk_var(2);
        let c = bdd.mk_var(3);
        let ab = bdd.apply_and(a, b).unwrap();
        let ac = bdd.apply_and(a, c).unwrap();
        let bc = bdd.apply_and(b, c).unwrap();
        bdd.apply_or_many([ab, ac, bc]).unwrap()
    }

    #[test]
    fn test_isop_majority() {
        let bdd = Bdd::default();
        let f = majority(&bdd);
        let (cover, func) = bdd.isop(f, f).unwrap();
        assert_eq!(func, f);
        let mut cubes: Vec<Vec<Lit>> = bdd.cubes(cover).collect();
        cubes.sort();
        let expected: Vec<Vec<Lit>> = vec![vec![1, 2], vec![1, 3], vec![2, 3]]
            .into_iter()
            .map(|c| c.into_iter().map(Lit::from).collect())
            .collect();
        assert_eq!(cubes, expected);
        assert_eq!(bdd.cover_to_bdd(cover).unwrap(), f);
    }

    #[test]
    fn test_isop_uses_dont_cares() {
        let bdd = Bdd::default();
        let on = bdd.cube([1, 2]).unwrap();
        let upper = bdd.mk_var(1);
        let (cover, func) = bdd.isop(on, upper).unwrap();
        assert!(bdd.is_implies(on, func));
        assert!(bdd.is_implies(func, upper));
        assert_eq!(bdd.cubes(cover).collect::<Vec<_>>(), vec![vec![Lit::from(1)]]);
    }

    #[test]
    fn test_isop_terminals() {
        let bdd = Bdd::default();
        assert_eq!(bdd.isop_cover(bdd.zero(), bdd.zero()).unwrap(), Cover::EMPTY);
        assert_eq!(bdd.isop_cover(bdd.one(), bdd.one()).unwrap(), Cover::BASE);
    }

    #[test]
    fn test_isop_rejects_empty_interval() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let res = bdd.isop(x, -x);
        assert!(matches!(res, Err(DdError::InvalidArgument(_))));
    }

    #[test]
    fn test_isop_limited() {
        let bdd = Bdd::default();
        let f = majority(&bdd);
        let res = bdd.isop_limited(f, f, &Limits::none().with_node_budget(0));
        assert_eq!(res, Err(DdError::Aborted(AbortReason::NodeBudget)));
        assert!(bdd.check_invariants().is_ok());

        let (cover, func) = bdd.isop_limited(f, f, &Limits::none()).unwrap();
        assert_eq!(func, f);
        assert_eq!(bdd.cubes(cover).count(), 3);
    }
}
