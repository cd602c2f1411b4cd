//! Conjunction, disjunction and difference under a deadline and a node budget.
//!
//! The limits are checked on every recursive call that misses the terminal
//! cases and the computed table. An aborted call leaves
//! the manager consistent: every intermediate is held by a guard and is
//! released while the error propagates.

use log::{debug, trace};

use crate::bdd::Bdd;
use crate::cache::{OpKey, OpTag};
use crate::error::DdResult;
use crate::limits::{Budget, Limits};
use crate::reference::Ref;
use crate::types::Level;

impl Bdd {
    pub(crate) fn and_rec(&self, f: Ref, g: Ref, budget: &Budget) -> DdResult<Ref> {
        trace!("and(f = {}, g = {})", f, g);

        if f.is_zero() || g.is_zero() || f == -g {
            return Ok(Ref::ZERO);
        }
        if f == g || g.is_one() {
            return Ok(f);
        }
        if f.is_one() {
            return Ok(g);
        }

        let key = OpKey::commutative(OpTag::And, f, g);
        if let Some(res) = self.cache_get(&key) {
            return Ok(res);
        }
        budget.check(self)?;

        let m = self.level_of(f).min(self.level_of(g));
        let var = self.var_at_level(Level::new(m));
        let (f0, f1) = self.cofactors_at(f, m);
        let (g0, g1) = self.cofactors_at(g, m);

        let t = self.hold(self.and_rec(f1, g1, budget)?);
        let e = self.hold(self.and_rec(f0, g0, budget)?);
        let res = self.unique(var, e.get(), t.get())?;
        self.cache_insert(key, res);
        Ok(res)
    }

    pub(crate) fn or_rec(&self, f: Ref, g: Ref, budget: &Budget) -> DdResult<Ref> {
        self.and_rec(-f, -g, budget).map(|r| -r)
    }

    fn bounded_and(&self, op: &str, f: Ref, g: Ref, limits: &Limits) -> DdResult<Ref> {
        debug!("{}(f = {}, g = {}, limits = {:?})", op, f, g, limits);
        self.retry(op, || {
            let budget = Budget::start(self, limits);
            let res = self.and_rec(f, g, &budget)?;
            Ok(self.acquired(res))
        })
    }

    /// `f ∧ g`, or [`DdError::Aborted`](crate::error::DdError::Aborted) when a limit is hit.
    pub fn and_limited(&self, f: Ref, g: Ref, limits: &Limits) -> DdResult<Ref> {
        self.bounded_and("and_limited", f, g, limits)
    }

    /// `f ∨ g` under limits.
    pub fn or_limited(&self, f: Ref, g: Ref, limits: &Limits) -> DdResult<Ref> {
        self.bounded_and("or_limited", -f, -g, limits).map(|r| -r)
    }

    /// `f ∧ ¬g` under limits.
    pub fn diff_limited(&self, f: Ref, g: Ref, limits: &Limits) -> DdResult<Ref> {
        self.bounded_and("diff_limited", f, -g, limits)
    }
}
