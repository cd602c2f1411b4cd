//! ITE and the Boolean operations built on it.

use std::collections::HashSet;

use log::{debug, trace};

use crate::bdd::Bdd;
use crate::cache::{OpKey, OpTag};
use crate::error::DdResult;
use crate::guard::Held;
use crate::reference::Ref;
use crate::types::{Level, Lit, Var};

impl Bdd {
    /// Canonical node testing `var` with the given cofactors.
    ///
    /// When `var` is not above both children (for instance after the order
    /// changed) the result is the same function built through ITE.
    pub fn mk_node(&self, var: impl Into<Var>, low: Ref, high: Ref) -> DdResult<Ref> {
        let var = var.into();
        self.ensure_var(var);
        self.retry("mk_node", || {
            let level = self.level(var).index();
            let res = if level < self.level_of(low) && level < self.level_of(high) {
                self.unique(var, low, high)?
            } else {
                self.ite_rec(self.mk_var(var), high, low)?
            };
            Ok(self.acquired(res))
        })
    }

    pub(crate) fn ite_rec(&self, f: Ref, g: Ref, h: Ref) -> DdResult<Ref> {
        trace!("ite(f = {}, g = {}, h = {})", f, g, h);

        // Base cases:
        //   ite(1,G,H) => G
        //   ite(0,G,H) => H
        if f.is_one() {
            return Ok(g);
        }
        if f.is_zero() {
            return Ok(h);
        }

        // More base cases:
        //   ite(F,G,G) => G
        //   ite(F,1,0) => F
        //   ite(F,0,1) => ~F
        //   ite(F,1,~F) => 1
        //   ite(F,F,1) => 1
        //   ite(F,~F,0) => 0
        //   ite(F,0,F) => 0
        if g == h {
            return Ok(g);
        }
        if g.is_one() && h.is_zero() {
            return Ok(f);
        }
        if g.is_zero() && h.is_one() {
            return Ok(-f);
        }
        if (g.is_one() && h == -f) || (g == f && h.is_one()) {
            return Ok(Ref::ONE);
        }
        if g == -f && h.is_zero() {
            return Ok(Ref::ZERO);
        }
        if g.is_zero() && h == f {
            return Ok(Ref::ZERO);
        }

        // Standard triples:
        //   ite(F,F,H) => ite(F,1,H)
        //   ite(F,G,F) => ite(F,G,0)
        //   ite(F,~F,H) => ite(F,0,H)
        //   ite(F,G,~F) => ite(F,G,1)
        if g == f {
            return self.ite_rec(f, Ref::ONE, h);
        }
        if h == f {
            return self.ite_rec(f, g, Ref::ZERO);
        }
        if g == -f {
            return self.ite_rec(f, Ref::ZERO, h);
        }
        if h == -f {
            return self.ite_rec(f, g, Ref::ONE);
        }

        let i = self.level_of(f);
        let j = self.level_of(g);
        let k = self.level_of(h);

        // Equivalent pairs (pick the one with the topmost first argument):
        //   ite(F,1,H) == ite(H,1,F) == F ∨ H
        //   ite(F,G,0) == ite(G,F,0) == F ∧ G
        //   ite(F,G,1) == ite(~G,~F,1) == F -> G
        //   ite(F,0,H) == ite(~H,0,~F) == ~F ∧ H
        //   ite(F,G,~G) == ite(G,F,~F)
        if g.is_one() && k < i {
            return self.ite_rec(h, Ref::ONE, f);
        }
        if h.is_zero() && j < i {
            return self.ite_rec(g, f, Ref::ZERO);
        }
        if h.is_one() && j < i {
            return self.ite_rec(-g, -f, Ref::ONE);
        }
        if g.is_zero() && k < i {
            return self.ite_rec(-h, Ref::ZERO, -f);
        }
        if g == -h && j < i {
            return self.ite_rec(g, f, -f);
        }

        // Make F and G regular:
        //   ite(~F,G,H) => ite(F,H,G)
        //   ite(F,~G,H) => ~ite(F,G,~H)
        let (mut f, mut g, mut h) = (f, g, h);
        if f.is_negated() {
            f = -f;
            std::mem::swap(&mut g, &mut h);
        }
        let n = g.is_negated();
        if n {
            g = -g;
            h = -h;
        }

        let key = OpKey::ternary(OpTag::Ite, f, g, h);
        if let Some(res) = self.cache_get(&key) {
            return Ok(res.not_if(n));
        }

        let m = i.min(j).min(k);
        let var = self.var_at_level(Level::new(m));
        let (f0, f1) = self.cofactors_at(f, m);
        let (g0, g1) = self.cofactors_at(g, m);
        let (h0, h1) = self.cofactors_at(h, m);

        let t = self.hold(self.ite_rec(f1, g1, h1)?);
        let e = self.hold(self.ite_rec(f0, g0, h0)?);
        let res = self.unique(var, e.get(), t.get())?;
        self.cache_insert(key, res);
        Ok(res.not_if(n))
    }

    /// Apply the ITE operation to the arguments.
    ///
    /// ```text
    /// ITE(x, y, z) = (x ∧ y) ∨ (¬x ∧ z)
    /// ```
    ///
    /// # Examples
    ///
    /// ```
    /// use bdd_logic::bdd::Bdd;
    ///
    /// let bdd = Bdd::default();
    /// let x = bdd.mk_var(1);
    /// let y = bdd.mk_var(2);
    /// let z = bdd.mk_var(3);
    /// let f = bdd.apply_ite(x, y, z).unwrap();
    /// let x_and_y = bdd.apply_and(x, y).unwrap();
    /// let not_x_and_z = bdd.apply_and(-x, z).unwrap();
    /// assert_eq!(f, bdd.apply_or(x_and_y, not_x_and_z).unwrap());
    /// ```
    pub fn apply_ite(&self, f: Ref, g: Ref, h: Ref) -> DdResult<Ref> {
        debug!("apply_ite(f = {}, g = {}, h = {})", f, g, h);
        self.retry("apply_ite", || {
            let res = self.ite_rec(f, g, h)?;
            Ok(self.acquired(res))
        })
    }

    /// Complement; takes a new reference to the (shared) node.
    pub fn apply_not(&self, f: Ref) -> Ref {
        self.acquired(-f)
    }

    pub fn apply_and(&self, u: Ref, v: Ref) -> DdResult<Ref> {
        self.apply_ite(u, v, Ref::ZERO)
    }

    pub fn apply_or(&self, u: Ref, v: Ref) -> DdResult<Ref> {
        self.apply_ite(u, Ref::ONE, v)
    }

    pub fn apply_xor(&self, u: Ref, v: Ref) -> DdResult<Ref> {
        self.apply_ite(u, -v, v)
    }

    pub fn apply_eq(&self, u: Ref, v: Ref) -> DdResult<Ref> {
        self.apply_ite(u, v, -v)
    }

    pub fn apply_imply(&self, u: Ref, v: Ref) -> DdResult<Ref> {
        self.apply_ite(u, v, Ref::ONE)
    }

    /// `u ∧ ¬v`
    pub fn apply_diff(&self, u: Ref, v: Ref) -> DdResult<Ref> {
        self.apply_ite(u, -v, Ref::ZERO)
    }

    pub fn apply_and_many(&self, nodes: impl IntoIterator<Item = Ref>) -> DdResult<Ref> {
        let mut acc = Held::adopt(self, Ref::ONE);
        for node in nodes {
            acc = Held::adopt(self, self.apply_and(acc.get(), node)?);
        }
        Ok(acc.into_inner())
    }

    pub fn apply_or_many(&self, nodes: impl IntoIterator<Item = Ref>) -> DdResult<Ref> {
        let mut acc = Held::adopt(self, Ref::ZERO);
        for node in nodes {
            acc = Held::adopt(self, self.apply_or(acc.get(), node)?);
        }
        Ok(acc.into_inner())
    }

    /// Checks `f → g` without allocating.
    pub fn is_implies(&self, f: Ref, g: Ref) -> bool {
        let mut proven = HashSet::new();
        self.leq_rec(f, g, &mut proven)
    }

    fn leq_rec(&self, f: Ref, g: Ref, proven: &mut HashSet<(Ref, Ref)>) -> bool {
        if f == g || f.is_zero() || g.is_one() {
            return true;
        }
        if f.is_one() || g.is_zero() || f == -g {
            return false;
        }
        if proven.contains(&(f, g)) {
            return true;
        }
        let m = self.level_of(f).min(self.level_of(g));
        let (f0, f1) = self.cofactors_at(f, m);
        let (g0, g1) = self.cofactors_at(g, m);
        let holds = self.leq_rec(f0, g0, proven) && self.leq_rec(f1, g1, proven);
        if holds {
            proven.insert((f, g));
        }
        holds
    }
}

// ========================================================================
// Cubes and clauses
// ========================================================================

impl Bdd {
    /// Conjunction of DIMACS literals.
    pub fn cube(&self, literals: impl IntoIterator<Item = i32>) -> DdResult<Ref> {
        let lits: Vec<Lit> = literals.into_iter().map(Lit::from).collect();
        debug!("cube(literals = {:?})", lits);
        self.build_term("cube", lits, false)
    }

    /// Disjunction of DIMACS literals.
    pub fn clause(&self, literals: impl IntoIterator<Item = i32>) -> DdResult<Ref> {
        let lits: Vec<Lit> = literals.into_iter().map(Lit::from).collect();
        debug!("clause(literals = {:?})", lits);
        self.build_term("clause", lits, true)
    }

    fn build_term(&self, op: &str, mut lits: Vec<Lit>, clause: bool) -> DdResult<Ref> {
        for lit in &lits {
            self.ensure_var(lit.var());
        }
        lits.sort_unstable();
        lits.dedup();
        if lits.windows(2).any(|w| w[0].var() == w[1].var()) {
            // x ∧ ¬x, or x ∨ ¬x
            return Ok(Ref::constant(clause));
        }
        self.retry(op, || {
            let res = self.term_rec(&lits, clause)?;
            Ok(self.acquired(res))
        })
    }

    pub(crate) fn term_rec(&self, lits: &[Lit], clause: bool) -> DdResult<Ref> {
        let mut lits = lits.to_vec();
        lits.sort_unstable_by_key(|lit| std::cmp::Reverse(self.level(lit.var())));
        let absorbing = Ref::constant(clause);
        let mut current = self.hold(Ref::constant(!clause));
        for lit in lits {
            let rest = current.get();
            let (low, high) = match (clause, lit.is_negated()) {
                (false, false) => (absorbing, rest),
                (false, true) => (rest, absorbing),
                (true, false) => (rest, absorbing),
                (true, true) => (absorbing, rest),
            };
            current = self.hold(self.unique(lit.var(), low, high)?);
        }
        Ok(current.get())
    }
}

// ========================================================================
// Cofactors and quantification
// ========================================================================

impl Bdd {
    pub(crate) fn restrict_rec(&self, f: Ref, var: Var, value: bool) -> DdResult<Ref> {
        if f.is_negated() {
            return self.restrict_rec(-f, var, value).map(|r| -r);
        }
        let level = self.level(var).index();
        let top = self.level_of(f);
        if top > level {
            return Ok(f);
        }
        if top == level {
            return Ok(if value { self.high_node(f) } else { self.low_node(f) });
        }

        let key = OpKey::ternary(OpTag::Restrict, f, self.mk_var(var), Ref::constant(value));
        if let Some(res) = self.cache_get(&key) {
            return Ok(res);
        }
        let t = self.hold(self.restrict_rec(self.high(f), var, value)?);
        let e = self.hold(self.restrict_rec(self.low(f), var, value)?);
        let res = self.unique(self.variable(f), e.get(), t.get())?;
        self.cache_insert(key, res);
        Ok(res)
    }

    /// `f` with `var` fixed to `value`.
    pub fn restrict(&self, f: Ref, var: impl Into<Var>, value: bool) -> DdResult<Ref> {
        let var = var.into();
        self.ensure_var(var);
        self.retry("restrict", || {
            let res = self.restrict_rec(f, var, value)?;
            Ok(self.acquired(res))
        })
    }

    /// Both cofactors `(f|var=0, f|var=1)` for any variable, not only the top one.
    pub fn cofactors(&self, f: Ref, var: impl Into<Var>) -> DdResult<(Ref, Ref)> {
        let var = var.into();
        self.ensure_var(var);
        self.retry("cofactors", || {
            let low = self.hold(self.restrict_rec(f, var, false)?);
            let high = self.restrict_rec(f, var, true)?;
            let high = self.acquired(high);
            Ok((low.into_inner(), high))
        })
    }

    /// `∂f/∂var = f|var=0 ⊕ f|var=1`
    pub fn boolean_difference(&self, f: Ref, var: impl Into<Var>) -> DdResult<Ref> {
        let var = var.into();
        self.ensure_var(var);
        self.retry("boolean_difference", || {
            let low = self.hold(self.restrict_rec(f, var, false)?);
            let high = self.hold(self.restrict_rec(f, var, true)?);
            let res = self.ite_rec(low.get(), -high.get(), high.get())?;
            Ok(self.acquired(res))
        })
    }

    fn exists_rec(&self, f: Ref, cube: Ref) -> DdResult<Ref> {
        if f.is_terminal() || cube.is_one() {
            return Ok(f);
        }
        let top = self.level_of(f);
        let mut cube = cube;
        while self.level_of(cube) < top {
            cube = self.high_node(cube);
        }
        if cube.is_one() {
            return Ok(f);
        }

        let key = OpKey::binary(OpTag::Exists, f, cube);
        if let Some(res) = self.cache_get(&key) {
            return Ok(res);
        }
        let (f0, f1) = (self.low_node(f), self.high_node(f));
        let res = if self.level_of(cube) == top {
            let rest = self.high_node(cube);
            let t = self.hold(self.exists_rec(f1, rest)?);
            if t.get().is_one() {
                Ref::ONE
            } else {
                let e = self.hold(self.exists_rec(f0, rest)?);
                self.ite_rec(t.get(), Ref::ONE, e.get())?
            }
        } else {
            let t = self.hold(self.exists_rec(f1, cube)?);
            let e = self.hold(self.exists_rec(f0, cube)?);
            self.unique(self.variable(f), e.get(), t.get())?
        };
        self.cache_insert(key, res);
        Ok(res)
    }

    /// Existential abstraction of `vars` from `f`.
    pub fn exists(&self, f: Ref, vars: &[Var]) -> DdResult<Ref> {
        let lits: Vec<Lit> = vars.iter().map(|&v| Lit::pos(v)).collect();
        for &v in vars {
            self.ensure_var(v);
        }
        self.retry("exists", || {
            let cube = self.hold(self.term_rec(&lits, false)?);
            let res = self.exists_rec(f, cube.get())?;
            Ok(self.acquired(res))
        })
    }

    /// Universal abstraction of `vars` from `f`.
    pub fn forall(&self, f: Ref, vars: &[Var]) -> DdResult<Ref> {
        self.exists(-f, vars).map(|r| -r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_cube() {
        let bdd = Bdd::default();
        let x1 = bdd.mk_var(1);
        let x2 = bdd.mk_var(2);
        let x3 = bdd.mk_var(3);
        let f = bdd.cube([1, -2, 3]).unwrap();
        let g = bdd.apply_and_many([x1, -x2, x3]).unwrap();
        assert_eq!(f, g);
        assert_eq!(bdd.cube([1, -1]).unwrap(), bdd.zero());
        assert_eq!(bdd.cube([2, 2]).unwrap(), x2);
    }

    #[test]
    fn test_clause() {
        let bdd = Bdd::default();
        let x1 = bdd.mk_var(1);
        let x2 = bdd.mk_var(2);
        let x3 = bdd.mk_var(3);
        let f = bdd.clause([1, -2, 3]).unwrap();
        let g = bdd.apply_or_many([x1, -x2, x3]).unwrap();
        assert_eq!(f, g);
        assert_eq!(bdd.clause([3, -3]).unwrap(), bdd.one());
    }

    #[test]
    fn test_de_morgan() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let and = bdd.apply_and(x, y).unwrap();
        let or = bdd.apply_or(-x, -y).unwrap();
        assert_eq!(and, -or);
    }

    #[test]
    fn test_xor() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        assert_eq!(bdd.apply_xor(x, x).unwrap(), bdd.zero());
        assert_eq!(bdd.apply_xor(x, -x).unwrap(), bdd.one());
        let f = bdd.apply_xor(x, y).unwrap();
        let g = bdd.apply_eq(x, y).unwrap();
        assert_eq!(f, -g);
    }

    #[test]
    fn test_apply_ite() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let z = bdd.mk_var(3);
        let f = bdd.apply_ite(x, y, z).unwrap();
        assert_eq!(bdd.low_node(f), z);
        assert_eq!(bdd.high_node(f), y);
        assert_eq!(bdd.apply_ite(-x, z, y).unwrap(), f);
    }

    #[test]
    fn test_ite_degenerate_triples() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let f = bdd.apply_or(x, y).unwrap();
        for g in [x, -x, f, -f] {
            assert_eq!(bdd.apply_ite(g, bdd.zero(), g).unwrap(), bdd.zero());
            assert_eq!(bdd.apply_ite(g, g, bdd.one()).unwrap(), bdd.one());
            assert_eq!(bdd.apply_ite(g, -g, bdd.zero()).unwrap(), bdd.zero());
            assert_eq!(bdd.apply_ite(g, bdd.one(), -g).unwrap(), bdd.one());
            assert_eq!(bdd.apply_ite(g, bdd.one(), g).unwrap(), g);
            assert_eq!(bdd.apply_ite(g, g, bdd.zero()).unwrap(), g);
        }
    }

    #[test]
    fn test_negation_in_ite_cache() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let z = bdd.mk_var(3);
        let f = bdd.apply_ite(x, -y, z).unwrap();
        let g = bdd.apply_ite(x, y, -z).unwrap();
        assert_eq!(f, -g);
    }

    #[test]
    fn test_mk_node() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let f = bdd.mk_node(1, bdd.zero(), y).unwrap();
        assert_eq!(f, bdd.apply_and(x, y).unwrap());
        // Not above its children: same function via ITE.
        let g = bdd.mk_node(2, bdd.zero(), x).unwrap();
        assert_eq!(g, bdd.apply_and(x, y).unwrap());
    }

    #[test]
    fn test_is_implies() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let and = bdd.apply_and(x, y).unwrap();
        let or = bdd.apply_or(x, y).unwrap();
        assert!(bdd.is_implies(and, x));
        assert!(bdd.is_implies(and, or));
        assert!(bdd.is_implies(bdd.zero(), and));
        assert!(!bdd.is_implies(or, and));
        assert!(!bdd.is_implies(x, -x));
    }

    #[test]
    fn test_restrict() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let z = bdd.mk_var(3);
        let f = bdd.apply_ite(x, y, z).unwrap();
        assert_eq!(bdd.restrict(f, 1, true).unwrap(), y);
        assert_eq!(bdd.restrict(f, 1, false).unwrap(), z);
        let g = bdd.restrict(f, 2, true).unwrap();
        assert_eq!(g, bdd.apply_or(x, z).unwrap());
        assert_eq!(bdd.restrict(-f, 2, true).unwrap(), -g);
    }

    #[test]
    fn test_cofactors_and_difference() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let z = bdd.mk_var(3);
        let f = bdd.apply_ite(x, y, z).unwrap();
        let (f0, f1) = bdd.cofactors(f, 3).unwrap();
        assert_eq!(f0, bdd.apply_and(x, y).unwrap());
        assert_eq!(f1, bdd.apply_or(-x, y).unwrap());
        let d = bdd.boolean_difference(f, 1).unwrap();
        assert_eq!(d, bdd.apply_xor(y, z).unwrap());
    }

    #[test]
    fn test_quantification() {
        let bdd = Bdd::default();
        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let z = bdd.mk_var(3);
        let f = bdd.apply_ite(x, y, z).unwrap();
        let e = bdd.exists(f, &[Var::new(1)]).unwrap();
        assert_eq!(e, bdd.apply_or(y, z).unwrap());
        let a = bdd.forall(f, &[Var::new(1)]).unwrap();
        assert_eq!(a, bdd.apply_and(y, z).unwrap());
        let all = bdd.exists(f, &[Var::new(1), Var::new(2), Var::new(3)]).unwrap();
        assert_eq!(all, bdd.one());
    }
}
