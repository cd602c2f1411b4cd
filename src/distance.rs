//! Distance-1 growth and the decomposition of an on-set into components
//! that are closed under single-bit flips.

use log::{debug, trace};

use crate::bdd::Bdd;
use crate::cache::{OpKey, OpTag};
use crate::error::DdResult;
use crate::guard::{Held, HeldList};
use crate::limits::Budget;
use crate::reference::Ref;
use crate::types::Level;

impl Bdd {
    /// `core` plus every on-set point of `func` at Hamming distance one
    /// from a point of `core`.
    pub(crate) fn grow_rec(&self, func: Ref, core: Ref) -> DdResult<Ref> {
        trace!("grow(func = {}, core = {})", func, core);

        if core.is_zero() {
            return Ok(Ref::ZERO);
        }
        if func.is_zero() || func == core {
            return Ok(core);
        }
        if core.is_one() {
            return Ok(Ref::ONE);
        }

        let key = OpKey::binary(OpTag::Grow, func, core);
        if let Some(res) = self.cache_get(&key) {
            return Ok(res);
        }

        let m = self.level_of(func).min(self.level_of(core));
        let var = self.var_at_level(Level::new(m));
        let (f0, f1) = self.cofactors_at(func, m);
        let (c0, c1) = self.cofactors_at(core, m);
        let budget = Budget::unlimited();

        // Growth within a half, plus the points reached by flipping `var`.
        let g1 = self.hold(self.grow_rec(f1, c1)?);
        let flip1 = self.hold(self.and_rec(f1, c0, &budget)?);
        let r1 = self.hold(self.or_rec(g1.get(), flip1.get(), &budget)?);
        let g0 = self.hold(self.grow_rec(f0, c0)?);
        let flip0 = self.hold(self.and_rec(f0, c1, &budget)?);
        let r0 = self.hold(self.or_rec(g0.get(), flip0.get(), &budget)?);

        let res = self.unique(var, r0.get(), r1.get())?;
        self.cache_insert(key, res);
        Ok(res)
    }

    /// One step of distance-1 growth of `core` inside `func`.
    pub fn grow(&self, func: Ref, core: Ref) -> DdResult<Ref> {
        debug!("grow(func = {}, core = {})", func, core);
        self.retry("grow", || {
            let res = self.grow_rec(func, core)?;
            Ok(self.acquired(res))
        })
    }

    /// Every point at distance at most one from `f`.
    pub fn distance1_closure(&self, f: Ref) -> DdResult<Ref> {
        self.grow(Ref::ONE, f)
    }

    /// The component of `func` containing `seed`: the smallest set holding
    /// `seed ∧ func` that distance-1 growth inside `func` does not enlarge.
    pub fn distance1_component(&self, func: Ref, seed: Ref) -> DdResult<Ref> {
        let mut current = self.apply_and(func, seed)?;
        let mut steps = 0;
        loop {
            let next = self.grow(func, current);
            self.release(current);
            let next = next?;
            if next == current {
                debug!("distance1_component: fixpoint after {} steps", steps);
                return Ok(next);
            }
            current = next;
            steps += 1;
        }
    }

    /// Splits `func` into its distance-1 components.
    ///
    /// The components are disjoint and their union is `func`. A single
    /// component means no nontrivial decomposition exists; the constant
    /// false function has none. All returned references are acquired.
    pub fn distance1_decompose(&self, func: Ref) -> DdResult<Vec<Ref>> {
        debug!("distance1_decompose(func = {})", func);
        let mut components = HeldList::new(self);
        let mut remaining = self.hold(func);
        while !remaining.get().is_zero() {
            let Some(path) = self.one_sat(remaining.get()) else {
                break;
            };
            let seed = Held::adopt(self, self.cube(path.iter().map(|l| l.to_dimacs()))?);
            let component = Held::adopt(self, self.distance1_component(remaining.get(), seed.get())?);
            components.push(component.get());
            let rest = self.apply_diff(remaining.get(), component.get())?;
            remaining = Held::adopt(self, rest);
        }
        debug!("distance1_decompose: {} components", components.len());
        Ok(components.into_vec())
    }
}
