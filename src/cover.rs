//! Covers: sets of cubes stored as zero-suppressed diagrams.
//!
//! A cover lives in the same node store as the Boolean functions, in its
//! own subtables. Each Boolean variable `b` owns two cover variables,
//! `2b-1` for the positive literal and `2b` for the negative one, and cover
//! variables are ordered by id. A cover node `(v, lo, hi)` denotes the
//! cubes of `lo` together with the cubes of `hi` extended by literal `v`.
//! The zero-suppression rule removes nodes whose `hi` is empty, and there
//! are no complement edges. The two terminals are the empty set
//! ([`Cover::EMPTY`]) and the set holding only the empty cube
//! ([`Cover::BASE`], the tautology).
//!
//! Splitting a cover on a Boolean variable gives three parts (see
//! [`CoverParts`]): the cubes with the negative literal, those with the
//! positive literal, and those without either. Most operations here recurse
//! on that three-way split.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use log::{debug, trace};
use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::cache::{OpKey, OpTag};
use crate::error::{DdError, DdResult};
use crate::guard::{Handle, Held, Owned};
use crate::node::NodeKind;
use crate::reference::Ref;
use crate::types::{Lit, Var};

/// Handle to a cover.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Cover(Ref);

impl Cover {
    /// The empty set of cubes (the constant false function).
    pub const EMPTY: Cover = Cover(Ref::ZERO);
    /// The set holding the empty cube (the constant true function).
    pub const BASE: Cover = Cover(Ref::ONE);

    pub(crate) const fn from_edge(edge: Ref) -> Self {
        Cover(edge)
    }

    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }

    pub fn is_base(self) -> bool {
        self == Self::BASE
    }

    pub fn is_terminal(self) -> bool {
        self.0.is_terminal()
    }

    /// Cover variable of the positive literal of `var`.
    pub fn pos_var(var: Var) -> Var {
        Var::new(2 * var.id() - 1)
    }

    /// Cover variable of the negative literal of `var`.
    pub fn neg_var(var: Var) -> Var {
        Var::new(2 * var.id())
    }

    pub fn lit_var(lit: Lit) -> Var {
        if lit.is_negated() {
            Self::neg_var(lit.var())
        } else {
            Self::pos_var(lit.var())
        }
    }

    /// The literal a cover variable stands for.
    pub fn literal_of(cv: Var) -> Lit {
        let var = Var::new(cv.id().div_ceil(2));
        Lit::new(var, cv.id() % 2 == 0)
    }
}

impl Handle for Cover {
    fn edge(self) -> Ref {
        self.0
    }
}

impl Owned for Cover {
    fn for_each_edge(&self, f: &mut dyn FnMut(Ref)) {
        f(self.0)
    }
}

impl Display for Cover {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            Cover::EMPTY => write!(f, "{{}}"),
            Cover::BASE => write!(f, "{{()}}"),
            Cover(r) => write!(f, "cover{}", r),
        }
    }
}

/// The three-way split of a cover on one Boolean variable.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct CoverParts {
    /// Cubes containing the negative literal, with the literal removed.
    pub neg: Cover,
    /// Cubes containing the positive literal, with the literal removed.
    pub pos: Cover,
    /// Cubes mentioning neither literal.
    pub without: Cover,
}

impl Owned for CoverParts {
    fn for_each_edge(&self, f: &mut dyn FnMut(Ref)) {
        f(self.neg.0);
        f(self.pos.0);
        f(self.without.0);
    }
}

// ========================================================================
// Nodes and structure
// ========================================================================

impl Bdd {
    pub(crate) fn hold_cover(&self, c: Cover) -> Held<'_, Cover> {
        Held::new(self, c)
    }

    /// Id of the top cover variable of `f`, `u32::MAX` for terminals.
    pub(crate) fn cover_top(&self, f: Cover) -> u32 {
        if f.is_terminal() {
            u32::MAX
        } else {
            self.node(f.0.id()).variable.id()
        }
    }

    /// The Boolean variable whose literal is on top of `f`.
    fn cover_top_bool(&self, f: Cover) -> u32 {
        match self.cover_top(f) {
            u32::MAX => u32::MAX,
            cv => cv.div_ceil(2),
        }
    }

    fn cover_lo(&self, f: Cover) -> Cover {
        Cover(self.node(f.0.id()).low)
    }

    fn cover_hi(&self, f: Cover) -> Cover {
        Cover(self.node(f.0.id()).high)
    }

    /// `(lo, hi)` of `f` with respect to cover variable `cv`, which must
    /// not be below the top of `f`.
    fn cover_cofactors(&self, f: Cover, cv: u32) -> (Cover, Cover) {
        debug_assert!(cv <= self.cover_top(f));
        if self.cover_top(f) == cv {
            (self.cover_lo(f), self.cover_hi(f))
        } else {
            (f, Cover::EMPTY)
        }
    }

    /// Finds or creates the cover node `(cv, lo, hi)`. Not acquired.
    pub(crate) fn cover_node(&self, cv: Var, lo: Cover, hi: Cover) -> DdResult<Cover> {
        if hi.is_empty() {
            return Ok(lo);
        }
        debug_assert!(
            cv.id() < self.cover_top(lo) && cv.id() < self.cover_top(hi),
            "cover variable {} is not above its children {} and {}",
            cv,
            lo,
            hi
        );
        self.ensure_cover_var(cv);
        let found = self.cover_subtables.borrow()[cv.slot()].find(lo.0, hi.0, &self.nodes.borrow());
        if let Some(id) = found {
            return Ok(Cover(Ref::positive(id)));
        }
        self.maintain(NodeKind::Cover)?;
        let id = self.alloc_raw(NodeKind::Cover, cv, lo.0, hi.0)?;
        Ok(Cover(Ref::positive(id)))
    }

    /// Three-way split on `var`, assuming no literal above `var` is on top of `f`.
    pub(crate) fn cover_parts(&self, f: Cover, var: Var) -> CoverParts {
        let pv = Cover::pos_var(var).id();
        let (rest, pos) = self.cover_cofactors(f, pv);
        let (without, neg) = self.cover_cofactors(rest, pv + 1);
        CoverParts { neg, pos, without }
    }

    /// Builds `(¬var ∧ neg) ∪ (var ∧ pos) ∪ without` from parts lying below
    /// `var`'s literals.
    fn compose_below(&self, var: Var, parts: CoverParts) -> DdResult<Cover> {
        let lo = self.hold_cover(self.cover_node(Cover::neg_var(var), parts.without, parts.neg)?);
        self.cover_node(Cover::pos_var(var), lo.get(), parts.pos)
    }

    fn parts_below(&self, var: Var, parts: &CoverParts) -> bool {
        let nv = Cover::neg_var(var).id();
        [parts.neg, parts.pos, parts.without]
            .iter()
            .all(|&p| self.cover_top(p) > nv)
    }

    pub(crate) fn compose_rec(&self, var: Var, parts: CoverParts) -> DdResult<Cover> {
        if self.parts_below(var, &parts) {
            return self.compose_below(var, parts);
        }
        let pos_lit = self.hold_cover(self.cover_literal(var.pos())?);
        let neg_lit = self.hold_cover(self.cover_literal(var.neg())?);
        let p = self.hold_cover(self.cover_product_rec(parts.pos, pos_lit.get())?);
        let n = self.hold_cover(self.cover_product_rec(parts.neg, neg_lit.get())?);
        let pn = self.hold_cover(self.cover_union_rec(p.get(), n.get())?);
        self.cover_union_rec(pn.get(), parts.without)
    }

    fn cover_literal(&self, lit: Lit) -> DdResult<Cover> {
        self.cover_node(Cover::lit_var(lit), Cover::EMPTY, Cover::BASE)
    }

    /// Whether `f` contains the empty cube.
    pub fn cover_contains_empty(&self, f: Cover) -> bool {
        let mut current = f;
        while !current.is_terminal() {
            current = self.cover_lo(current);
        }
        current.is_base()
    }
}

// ========================================================================
// Set algebra
// ========================================================================

impl Bdd {
    pub(crate) fn cover_union_rec(&self, f: Cover, g: Cover) -> DdResult<Cover> {
        if f.is_empty() || f == g {
            return Ok(g);
        }
        if g.is_empty() {
            return Ok(f);
        }
        let key = OpKey::commutative(OpTag::CoverUnion, f.0, g.0);
        if let Some(res) = self.cache_get(&key) {
            return Ok(Cover(res));
        }
        let v = self.cover_top(f).min(self.cover_top(g));
        let (f0, f1) = self.cover_cofactors(f, v);
        let (g0, g1) = self.cover_cofactors(g, v);
        let lo = self.hold_cover(self.cover_union_rec(f0, g0)?);
        let hi = self.hold_cover(self.cover_union_rec(f1, g1)?);
        let res = self.cover_node(Var::new(v), lo.get(), hi.get())?;
        self.cache_insert(key, res.0);
        Ok(res)
    }

    pub(crate) fn cover_intersection_rec(&self, f: Cover, g: Cover) -> DdResult<Cover> {
        if f.is_empty() || g.is_empty() {
            return Ok(Cover::EMPTY);
        }
        if f == g {
            return Ok(f);
        }
        let key = OpKey::commutative(OpTag::CoverIntersection, f.0, g.0);
        if let Some(res) = self.cache_get(&key) {
            return Ok(Cover(res));
        }
        let (tf, tg) = (self.cover_top(f), self.cover_top(g));
        let res = if tf < tg {
            self.cover_intersection_rec(self.cover_lo(f), g)?
        } else if tf > tg {
            self.cover_intersection_rec(f, self.cover_lo(g))?
        } else {
            let lo = self.hold_cover(self.cover_intersection_rec(self.cover_lo(f), self.cover_lo(g))?);
            let hi = self.hold_cover(self.cover_intersection_rec(self.cover_hi(f), self.cover_hi(g))?);
            self.cover_node(Var::new(tf), lo.get(), hi.get())?
        };
        self.cache_insert(key, res.0);
        Ok(res)
    }

    pub(crate) fn cover_difference_rec(&self, f: Cover, g: Cover) -> DdResult<Cover> {
        if f.is_empty() || f == g {
            return Ok(Cover::EMPTY);
        }
        if g.is_empty() {
            return Ok(f);
        }
        let key = OpKey::binary(OpTag::CoverDifference, f.0, g.0);
        if let Some(res) = self.cache_get(&key) {
            return Ok(Cover(res));
        }
        let (tf, tg) = (self.cover_top(f), self.cover_top(g));
        let res = if tf < tg {
            let lo = self.hold_cover(self.cover_difference_rec(self.cover_lo(f), g)?);
            self.cover_node(Var::new(tf), lo.get(), self.cover_hi(f))?
        } else if tf > tg {
            self.cover_difference_rec(f, self.cover_lo(g))?
        } else {
            let lo = self.hold_cover(self.cover_difference_rec(self.cover_lo(f), self.cover_lo(g))?);
            let hi = self.hold_cover(self.cover_difference_rec(self.cover_hi(f), self.cover_hi(g))?);
            self.cover_node(Var::new(tf), lo.get(), hi.get())?
        };
        self.cache_insert(key, res.0);
        Ok(res)
    }

    /// Cubes of `f` containing cover variable `cv`, with it removed.
    pub(crate) fn cover_subset1_rec(&self, f: Cover, cv: Var) -> DdResult<Cover> {
        let top = self.cover_top(f);
        if top > cv.id() {
            return Ok(Cover::EMPTY);
        }
        if top == cv.id() {
            return Ok(self.cover_hi(f));
        }
        let key = OpKey::with_var(OpTag::CoverSubset1, f.0, cv);
        if let Some(res) = self.cache_get(&key) {
            return Ok(Cover(res));
        }
        let lo = self.hold_cover(self.cover_subset1_rec(self.cover_lo(f), cv)?);
        let hi = self.hold_cover(self.cover_subset1_rec(self.cover_hi(f), cv)?);
        let res = self.cover_node(Var::new(top), lo.get(), hi.get())?;
        self.cache_insert(key, res.0);
        Ok(res)
    }

    /// Cubes of `f` not containing cover variable `cv`.
    pub(crate) fn cover_subset0_rec(&self, f: Cover, cv: Var) -> DdResult<Cover> {
        let top = self.cover_top(f);
        if top > cv.id() {
            return Ok(f);
        }
        if top == cv.id() {
            return Ok(self.cover_lo(f));
        }
        let key = OpKey::with_var(OpTag::CoverSubset0, f.0, cv);
        if let Some(res) = self.cache_get(&key) {
            return Ok(Cover(res));
        }
        let lo = self.hold_cover(self.cover_subset0_rec(self.cover_lo(f), cv)?);
        let hi = self.hold_cover(self.cover_subset0_rec(self.cover_hi(f), cv)?);
        let res = self.cover_node(Var::new(top), lo.get(), hi.get())?;
        self.cache_insert(key, res.0);
        Ok(res)
    }

    /// Toggles cover variable `cv` in every cube of `f`.
    pub(crate) fn cover_change_rec(&self, f: Cover, cv: Var) -> DdResult<Cover> {
        let top = self.cover_top(f);
        if top > cv.id() {
            return self.cover_node(cv, Cover::EMPTY, f);
        }
        if top == cv.id() {
            return self.cover_node(cv, self.cover_hi(f), self.cover_lo(f));
        }
        let key = OpKey::with_var(OpTag::CoverChange, f.0, cv);
        if let Some(res) = self.cache_get(&key) {
            return Ok(Cover(res));
        }
        let lo = self.hold_cover(self.cover_change_rec(self.cover_lo(f), cv)?);
        let hi = self.hold_cover(self.cover_change_rec(self.cover_hi(f), cv)?);
        let res = self.cover_node(Var::new(top), lo.get(), hi.get())?;
        self.cache_insert(key, res.0);
        Ok(res)
    }

    fn cover_set_op(&self, op: &str, f: Cover, g: Cover, rec: impl Fn(Cover, Cover) -> DdResult<Cover>) -> DdResult<Cover> {
        debug!("{}(f = {}, g = {})", op, f, g);
        self.retry(op, || {
            let res = rec(f, g)?;
            Ok(self.acquired(res))
        })
    }

    pub fn cover_union(&self, f: Cover, g: Cover) -> DdResult<Cover> {
        self.cover_set_op("cover_union", f, g, |f, g| self.cover_union_rec(f, g))
    }

    pub fn cover_intersection(&self, f: Cover, g: Cover) -> DdResult<Cover> {
        self.cover_set_op("cover_intersection", f, g, |f, g| self.cover_intersection_rec(f, g))
    }

    pub fn cover_difference(&self, f: Cover, g: Cover) -> DdResult<Cover> {
        self.cover_set_op("cover_difference", f, g, |f, g| self.cover_difference_rec(f, g))
    }

    /// Toggles `lit` in every cube of `f`: cubes holding it lose it, the
    /// others gain it. Cubes holding the opposite literal would become
    /// contradictory and are dropped.
    pub fn cover_change(&self, f: Cover, lit: impl Into<Lit>) -> DdResult<Cover> {
        let lit = lit.into();
        debug!("cover_change(f = {}, lit = {})", f, lit);
        let (cv, opposite) = (Cover::lit_var(lit), Cover::lit_var(-lit));
        self.retry("cover_change", || {
            let with = self.hold_cover(self.cover_subset1_rec(f, cv)?);
            let without = self.hold_cover(self.cover_subset0_rec(f, cv)?);
            let free = self.hold_cover(self.cover_subset0_rec(without.get(), opposite)?);
            let gained = self.hold_cover(self.cover_change_rec(free.get(), cv)?);
            let res = self.cover_union_rec(with.get(), gained.get())?;
            Ok(self.acquired(res))
        })
    }
}

// ========================================================================
// Decomposition
// ========================================================================

impl Bdd {
    /// Splits `f` on the literals of `var`.
    ///
    /// The three parts are returned acquired; give them back with
    /// [`Bdd::release_all`].
    pub fn decompose(&self, f: Cover, var: impl Into<Var>) -> DdResult<CoverParts> {
        let var = var.into();
        debug!("decompose(f = {}, var = {})", f, var);
        self.retry("decompose", || {
            let parts = if self.cover_top(f) >= Cover::pos_var(var).id() {
                self.cover_parts(f, var)
            } else {
                let (pv, nv) = (Cover::pos_var(var), Cover::neg_var(var));
                let pos = self.hold_cover(self.cover_subset1_rec(f, pv)?);
                let rest = self.hold_cover(self.cover_subset0_rec(f, pv)?);
                let neg = self.hold_cover(self.cover_subset1_rec(rest.get(), nv)?);
                let without = self.cover_subset0_rec(rest.get(), nv)?;
                CoverParts {
                    neg: neg.get(),
                    pos: pos.get(),
                    without,
                }
            };
            self.acquire(parts.neg.0);
            self.acquire(parts.pos.0);
            self.acquire(parts.without.0);
            Ok(parts)
        })
    }

    /// Splits `f` on the Boolean variable whose literal is on top.
    ///
    /// Returns `None` for the terminals. The parts are not acquired: they
    /// are children of `f` and live as long as `f` does.
    pub fn decompose_top(&self, f: Cover) -> Option<(Var, CoverParts)> {
        if f.is_terminal() {
            return None;
        }
        let var = Var::new(self.cover_top_bool(f));
        Some((var, self.cover_parts(f, var)))
    }

    /// Inverse of [`Bdd::decompose`]: `(¬var ∧ neg) ∪ (var ∧ pos) ∪ without`.
    ///
    /// Parts may mention any variable; cubes made contradictory by the
    /// added literal are dropped.
    pub fn compose(&self, neg: Cover, pos: Cover, without: Cover, var: impl Into<Var>) -> DdResult<Cover> {
        let var = var.into();
        debug!("compose(neg = {}, pos = {}, without = {}, var = {})", neg, pos, without, var);
        let parts = CoverParts { neg, pos, without };
        self.retry("compose", || {
            let res = self.compose_rec(var, parts)?;
            Ok(self.acquired(res))
        })
    }
}

// ========================================================================
// Cube-wise operations
// ========================================================================

impl Bdd {
    /// Top Boolean variable of a set of covers, split into parts.
    fn split_top(&self, covers: [Cover; 2]) -> (Var, CoverParts, CoverParts) {
        let b = self.cover_top_bool(covers[0]).min(self.cover_top_bool(covers[1]));
        let var = Var::new(b);
        (var, self.cover_parts(covers[0], var), self.cover_parts(covers[1], var))
    }

    fn union3(&self, a: Cover, b: Cover, c: Cover) -> DdResult<Cover> {
        let ab = self.hold_cover(self.cover_union_rec(a, b)?);
        self.cover_union_rec(ab.get(), c)
    }

    /// Cube-wise conjunction; contradictory cubes are dropped.
    pub(crate) fn cover_product_rec(&self, f: Cover, g: Cover) -> DdResult<Cover> {
        trace!("cover_product(f = {}, g = {})", f, g);
        if f.is_empty() || g.is_empty() {
            return Ok(Cover::EMPTY);
        }
        if f.is_base() {
            return Ok(g);
        }
        if g.is_base() {
            return Ok(f);
        }
        let key = OpKey::commutative(OpTag::CoverProduct, f.0, g.0);
        if let Some(res) = self.cache_get(&key) {
            return Ok(Cover(res));
        }
        let (var, a, b) = self.split_top([f, g]);

        let a1b1 = self.hold_cover(self.cover_product_rec(a.pos, b.pos)?);
        let a1bd = self.hold_cover(self.cover_product_rec(a.pos, b.without)?);
        let adb1 = self.hold_cover(self.cover_product_rec(a.without, b.pos)?);
        let pos = self.hold_cover(self.union3(a1b1.get(), a1bd.get(), adb1.get())?);

        let a0b0 = self.hold_cover(self.cover_product_rec(a.neg, b.neg)?);
        let a0bd = self.hold_cover(self.cover_product_rec(a.neg, b.without)?);
        let adb0 = self.hold_cover(self.cover_product_rec(a.without, b.neg)?);
        let neg = self.hold_cover(self.union3(a0b0.get(), a0bd.get(), adb0.get())?);

        let without = self.hold_cover(self.cover_product_rec(a.without, b.without)?);
        let res = self.compose_below(
            var,
            CoverParts {
                neg: neg.get(),
                pos: pos.get(),
                without: without.get(),
            },
        )?;
        self.cache_insert(key, res.0);
        Ok(res)
    }

    /// Removes every cube that is a literal-superset of another cube.
    pub(crate) fn cover_minimal_rec(&self, f: Cover) -> DdResult<Cover> {
        if f.is_terminal() {
            return Ok(f);
        }
        if self.cover_contains_empty(f) {
            return Ok(Cover::BASE);
        }
        let key = OpKey::unary(OpTag::CoverMinimal, f.0);
        if let Some(res) = self.cache_get(&key) {
            return Ok(Cover(res));
        }
        let (var, x) = match self.decompose_top(f) {
            Some(split) => split,
            None => return Ok(f),
        };
        let md = self.hold_cover(self.cover_minimal_rec(x.without)?);
        let min1 = self.hold_cover(self.cover_minimal_rec(x.pos)?);
        let m1 = self.hold_cover(self.cover_not_superset_rec(min1.get(), md.get())?);
        let min0 = self.hold_cover(self.cover_minimal_rec(x.neg)?);
        let m0 = self.hold_cover(self.cover_not_superset_rec(min0.get(), md.get())?);
        let res = self.compose_below(
            var,
            CoverParts {
                neg: m0.get(),
                pos: m1.get(),
                without: md.get(),
            },
        )?;
        self.cache_insert(key, res.0);
        Ok(res)
    }

    /// Cubes of `x` that are not literal-supersets of any cube of `y`.
    pub(crate) fn cover_not_superset_rec(&self, x: Cover, y: Cover) -> DdResult<Cover> {
        if y.is_empty() {
            return Ok(x);
        }
        if x.is_empty() || x == y || self.cover_contains_empty(y) {
            return Ok(Cover::EMPTY);
        }
        if x.is_base() {
            return Ok(x);
        }
        let key = OpKey::binary(OpTag::CoverNotSuperset, x.0, y.0);
        if let Some(res) = self.cache_get(&key) {
            return Ok(Cover(res));
        }
        let (var, xp, yp) = self.split_top([x, y]);
        let y1d = self.hold_cover(self.cover_union_rec(yp.pos, yp.without)?);
        let r1 = self.hold_cover(self.cover_not_superset_rec(xp.pos, y1d.get())?);
        let y0d = self.hold_cover(self.cover_union_rec(yp.neg, yp.without)?);
        let r0 = self.hold_cover(self.cover_not_superset_rec(xp.neg, y0d.get())?);
        let rd = self.hold_cover(self.cover_not_superset_rec(xp.without, yp.without)?);
        let res = self.compose_below(
            var,
            CoverParts {
                neg: r0.get(),
                pos: r1.get(),
                without: rd.get(),
            },
        )?;
        self.cache_insert(key, res.0);
        Ok(res)
    }

    /// Cubes of `x` that are not literal-subsets of any cube of `y`.
    pub(crate) fn cover_not_subset_rec(&self, x: Cover, y: Cover) -> DdResult<Cover> {
        if x.is_empty() || x == y {
            return Ok(Cover::EMPTY);
        }
        if y.is_empty() {
            return Ok(x);
        }
        if x.is_base() {
            return Ok(Cover::EMPTY);
        }
        let key = OpKey::binary(OpTag::CoverNotSubset, x.0, y.0);
        if let Some(res) = self.cache_get(&key) {
            return Ok(Cover(res));
        }
        let (var, xp, yp) = self.split_top([x, y]);
        let r1 = self.hold_cover(self.cover_not_subset_rec(xp.pos, yp.pos)?);
        let r0 = self.hold_cover(self.cover_not_subset_rec(xp.neg, yp.neg)?);
        let y_all = self.hold_cover(self.union3(yp.pos, yp.neg, yp.without)?);
        let rd = self.hold_cover(self.cover_not_subset_rec(xp.without, y_all.get())?);
        let res = self.compose_below(
            var,
            CoverParts {
                neg: r0.get(),
                pos: r1.get(),
                without: rd.get(),
            },
        )?;
        self.cache_insert(key, res.0);
        Ok(res)
    }

    /// For every pair of cubes, the cube of their common literals.
    pub(crate) fn cover_supercubes_rec(&self, f: Cover, g: Cover) -> DdResult<Cover> {
        if f.is_empty() || g.is_empty() {
            return Ok(Cover::EMPTY);
        }
        if f.is_base() || g.is_base() {
            return Ok(Cover::BASE);
        }
        let key = OpKey::commutative(OpTag::CoverSupercubes, f.0, g.0);
        if let Some(res) = self.cache_get(&key) {
            return Ok(Cover(res));
        }
        let (var, a, b) = self.split_top([f, g]);
        let pos = self.hold_cover(self.cover_supercubes_rec(a.pos, b.pos)?);
        let neg = self.hold_cover(self.cover_supercubes_rec(a.neg, b.neg)?);

        // Pairs that disagree on `var`, or where one side lacks it, lose the literal.
        let a_all = self.hold_cover(self.union3(a.pos, a.neg, a.without)?);
        let b_side = self.hold_cover(self.cover_union_rec(b.pos, b.neg)?);
        let w10 = self.hold_cover(self.cover_supercubes_rec(a.pos, b.neg)?);
        let w01 = self.hold_cover(self.cover_supercubes_rec(a.neg, b.pos)?);
        let wxd = self.hold_cover(self.cover_supercubes_rec(a_all.get(), b.without)?);
        let wdx = self.hold_cover(self.cover_supercubes_rec(a.without, b_side.get())?);
        let w = self.hold_cover(self.union3(w10.get(), w01.get(), wxd.get())?);
        let without = self.hold_cover(self.cover_union_rec(w.get(), wdx.get())?);

        let res = self.compose_below(
            var,
            CoverParts {
                neg: neg.get(),
                pos: pos.get(),
                without: without.get(),
            },
        )?;
        self.cache_insert(key, res.0);
        Ok(res)
    }

    /// Cube-wise conjunction of `f` and `g`.
    pub fn cover_product(&self, f: Cover, g: Cover) -> DdResult<Cover> {
        self.cover_set_op("cover_product", f, g, |f, g| self.cover_product_rec(f, g))
    }

    /// `f` without its non-minimal cubes.
    pub fn cover_minimal(&self, f: Cover) -> DdResult<Cover> {
        self.cover_set_op("cover_minimal", f, Cover::EMPTY, |f, _| self.cover_minimal_rec(f))
    }

    /// Pairwise products of the cubes of `f` and `g`, keeping only the
    /// minimal ones.
    pub fn product_primes(&self, f: Cover, g: Cover) -> DdResult<Cover> {
        self.cover_set_op("product_primes", f, g, |f, g| {
            let product = self.hold_cover(self.cover_product_rec(f, g)?);
            self.cover_minimal_rec(product.get())
        })
    }

    /// Pairwise smallest common generalizations of the cubes of `f` and `g`.
    pub fn supercubes(&self, f: Cover, g: Cover) -> DdResult<Cover> {
        self.cover_set_op("supercubes", f, g, |f, g| self.cover_supercubes_rec(f, g))
    }

    /// Cubes of `x` that contain no cube of `y`.
    pub fn not_superset(&self, x: Cover, y: Cover) -> DdResult<Cover> {
        self.cover_set_op("not_superset", x, y, |x, y| self.cover_not_superset_rec(x, y))
    }

    /// Cubes of `x` contained in no cube of `y`.
    pub fn not_subset(&self, x: Cover, y: Cover) -> DdResult<Cover> {
        self.cover_set_op("not_subset", x, y, |x, y| self.cover_not_subset_rec(x, y))
    }
}

// ========================================================================
// Conversions and counts
// ========================================================================

impl Bdd {
    pub(crate) fn cover_to_bdd_rec(&self, f: Cover) -> DdResult<Ref> {
        if f.is_empty() {
            return Ok(Ref::ZERO);
        }
        if f.is_base() {
            return Ok(Ref::ONE);
        }
        let key = OpKey::unary(OpTag::CoverToBdd, f.0);
        if let Some(res) = self.cache_get(&key) {
            return Ok(res);
        }
        let lit = Cover::literal_of(self.node(f.0.id()).variable);
        let x = self.mk_var(lit.var());
        let lo = self.hold(self.cover_to_bdd_rec(self.cover_lo(f))?);
        let hi = self.hold(self.cover_to_bdd_rec(self.cover_hi(f))?);
        let both = self.hold(self.ite_rec(hi.get(), Ref::ONE, lo.get())?);
        let res = if lit.is_negated() {
            self.ite_rec(x, lo.get(), both.get())?
        } else {
            self.ite_rec(x, both.get(), lo.get())?
        };
        self.cache_insert(key, res);
        Ok(res)
    }

    /// The Boolean function a cover denotes (the union of its cubes).
    pub fn cover_to_bdd(&self, f: Cover) -> DdResult<Ref> {
        debug!("cover_to_bdd(f = {})", f);
        self.retry("cover_to_bdd", || {
            let res = self.cover_to_bdd_rec(f)?;
            Ok(self.acquired(res))
        })
    }

    fn cube_rec(&self, lits: &[Lit]) -> DdResult<Cover> {
        let mut cvs: Vec<Var> = lits.iter().map(|&l| Cover::lit_var(l)).collect();
        cvs.sort_unstable_by(|a, b| b.cmp(a));
        let mut current = self.hold_cover(Cover::BASE);
        for cv in cvs {
            current = self.hold_cover(self.cover_node(cv, Cover::EMPTY, current.get())?);
        }
        Ok(current.get())
    }

    fn check_cube(lits: &mut Vec<Lit>) -> DdResult<()> {
        lits.sort_unstable();
        lits.dedup();
        if let Some(w) = lits.windows(2).find(|w| w[0].var() == w[1].var()) {
            return Err(DdError::invalid(format!("cube contains both {} and {}", w[0], w[1])));
        }
        Ok(())
    }

    /// Builds a cover from cubes of DIMACS literals.
    ///
    /// A cube holding a literal and its negation is an
    /// [`InvalidArgument`](DdError::InvalidArgument).
    pub fn cover_from_cubes(&self, cubes: &[Vec<i32>]) -> DdResult<Cover> {
        let mut parsed = Vec::with_capacity(cubes.len());
        for cube in cubes {
            let mut lits: Vec<Lit> = cube.iter().map(|&l| Lit::from(l)).collect();
            Self::check_cube(&mut lits)?;
            parsed.push(lits);
        }
        debug!("cover_from_cubes({} cubes)", parsed.len());
        self.retry("cover_from_cubes", || {
            let mut acc = self.hold_cover(Cover::EMPTY);
            for lits in &parsed {
                let cube = self.hold_cover(self.cube_rec(lits)?);
                acc = self.hold_cover(self.cover_union_rec(acc.get(), cube.get())?);
            }
            Ok(self.acquired(acc.get()))
        })
    }

    /// The single-cube cover of a BDD that is a conjunction of literals.
    pub fn cube_to_cover(&self, f: Ref) -> DdResult<Cover> {
        let lits = self
            .cube_literals(f)
            .ok_or_else(|| DdError::invalid(format!("{} is not a cube", f)))?;
        self.retry("cube_to_cover", || {
            let res = self.cube_rec(&lits)?;
            Ok(self.acquired(res))
        })
    }

    /// Literals of `f` if it is a cube: every node has a false child.
    pub fn cube_literals(&self, f: Ref) -> Option<Vec<Lit>> {
        if f.is_zero() {
            return None;
        }
        let mut lits = Vec::new();
        let mut current = f;
        while !current.is_one() {
            let var = self.variable(current);
            let (low, high) = (self.low_node(current), self.high_node(current));
            if low.is_zero() {
                lits.push(var.pos());
                current = high;
            } else if high.is_zero() {
                lits.push(var.neg());
                current = low;
            } else {
                return None;
            }
        }
        Some(lits)
    }

    /// Number of cubes in `f`.
    pub fn cube_count(&self, f: Cover) -> BigUint {
        let mut cache = HashMap::new();
        self.cube_count_rec(f, &mut cache)
    }

    fn cube_count_rec(&self, f: Cover, cache: &mut HashMap<Cover, BigUint>) -> BigUint {
        if f.is_empty() {
            return BigUint::ZERO;
        }
        if f.is_base() {
            return BigUint::from(1u32);
        }
        if let Some(n) = cache.get(&f) {
            return n.clone();
        }
        let n = self.cube_count_rec(self.cover_lo(f), cache) + self.cube_count_rec(self.cover_hi(f), cache);
        cache.insert(f, n.clone());
        n
    }

    /// Total number of literals over all cubes of `f`.
    pub fn literal_count(&self, f: Cover) -> BigUint {
        let mut counts = HashMap::new();
        let mut literals = HashMap::new();
        self.literal_count_rec(f, &mut counts, &mut literals)
    }

    fn literal_count_rec(
        &self,
        f: Cover,
        counts: &mut HashMap<Cover, BigUint>,
        literals: &mut HashMap<Cover, BigUint>,
    ) -> BigUint {
        if f.is_terminal() {
            return BigUint::ZERO;
        }
        if let Some(n) = literals.get(&f) {
            return n.clone();
        }
        let (lo, hi) = (self.cover_lo(f), self.cover_hi(f));
        let n = self.literal_count_rec(lo, counts, literals)
            + self.literal_count_rec(hi, counts, literals)
            + self.cube_count_rec(hi, counts);
        literals.insert(f, n.clone());
        n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn cubes_of(bdd: &Bdd, f: Cover) -> Vec<Vec<i32>> {
        let mut cubes: Vec<Vec<i32>> = bdd
            .cubes(f)
            .map(|c| {
                let mut c: Vec<i32> = c.into_iter().map(|l| l.to_dimacs()).collect();
                c.sort_by_key(|l| (l.abs(), *l));
                c
            })
            .collect();
        cubes.sort();
        cubes
    }

    #[test]
    fn test_cover_var_mapping() {
        assert_eq!(Cover::pos_var(Var::new(3)), Var::new(5));
        assert_eq!(Cover::neg_var(Var::new(3)), Var::new(6));
        assert_eq!(Cover::literal_of(Var::new(5)), Lit::from(3));
        assert_eq!(Cover::literal_of(Var::new(6)), Lit::from(-3));
    }

    #[test]
    fn test_from_cubes_and_counts() {
        let bdd = Bdd::default();
        let f = bdd.cover_from_cubes(&[vec![1, -2], vec![2, 3], vec![1, -2]]).unwrap();
        assert_eq!(cubes_of(&bdd, f), vec![vec![1, -2], vec![2, 3]]);
        assert_eq!(bdd.cube_count(f), BigUint::from(2u32));
        assert_eq!(bdd.literal_count(f), BigUint::from(4u32));
        assert!(!bdd.cover_contains_empty(f));
    }

    #[test]
    fn test_contradictory_cube_rejected() {
        let bdd = Bdd::default();
        let res = bdd.cover_from_cubes(&[vec![1, -1]]);
        assert!(matches!(res, Err(DdError::InvalidArgument(_))));
    }

    #[test]
    fn test_set_algebra() {
        let bdd = Bdd::default();
        let f = bdd.cover_from_cubes(&[vec![1], vec![2, 3]]).unwrap();
        let g = bdd.cover_from_cubes(&[vec![2, 3], vec![-1]]).unwrap();
        let u = bdd.cover_union(f, g).unwrap();
        assert_eq!(cubes_of(&bdd, u), vec![vec![-1], vec![1], vec![2, 3]]);
        let i = bdd.cover_intersection(f, g).unwrap();
        assert_eq!(cubes_of(&bdd, i), vec![vec![2, 3]]);
        let d = bdd.cover_difference(f, g).unwrap();
        assert_eq!(cubes_of(&bdd, d), vec![vec![1]]);
        assert!(bdd.check_invariants().is_ok());
    }

    #[test]
    fn test_change() {
        let bdd = Bdd::default();
        let f = bdd.cover_from_cubes(&[vec![1, 2], vec![-1, 3], vec![2, 3]]).unwrap();
        let g = bdd.cover_change(f, 1).unwrap();
        assert_eq!(cubes_of(&bdd, g), vec![vec![1, 2, 3], vec![2]]);
        let h = bdd.cover_change(f, -1).unwrap();
        assert_eq!(cubes_of(&bdd, h), vec![vec![-1, 2, 3], vec![3]]);
        // Toggling twice restores the cubes free of the opposite literal.
        let back = bdd.cover_change(g, 1).unwrap();
        assert_eq!(cubes_of(&bdd, back), vec![vec![1, 2], vec![2, 3]]);
        assert!(bdd.check_invariants().is_ok());
    }

    #[test]
    fn test_decompose_compose_round_trip() {
        let bdd = Bdd::default();
        let f = bdd.cover_from_cubes(&[vec![1, 2], vec![-2, 3], vec![3], vec![2]]).unwrap();
        for var in 1..=3u32 {
            let parts = bdd.decompose(f, var).unwrap();
            let g = bdd.compose(parts.neg, parts.pos, parts.without, var).unwrap();
            assert_eq!(g, f);
            bdd.release_all(&parts);
            bdd.release(g.edge());
        }
        let parts = bdd.decompose(f, 2u32).unwrap();
        assert_eq!(cubes_of(&bdd, parts.pos), vec![vec![], vec![1]]);
        assert_eq!(cubes_of(&bdd, parts.neg), vec![vec![3]]);
        assert_eq!(cubes_of(&bdd, parts.without), vec![vec![3]]);
        bdd.release_all(&parts);
    }

    #[test]
    fn test_decompose_top() {
        let bdd = Bdd::default();
        let f = bdd.cover_from_cubes(&[vec![-2, 3], vec![4]]).unwrap();
        let (var, parts) = bdd.decompose_top(f).unwrap();
        assert_eq!(var, Var::new(2));
        assert!(parts.pos.is_empty());
        assert_eq!(cubes_of(&bdd, parts.neg), vec![vec![3]]);
        assert_eq!(cubes_of(&bdd, parts.without), vec![vec![4]]);
        assert_eq!(bdd.decompose_top(Cover::BASE), None);
    }

    #[test]
    fn test_product_drops_contradictions() {
        let bdd = Bdd::default();
        let f = bdd.cover_from_cubes(&[vec![1], vec![-1, 2]]).unwrap();
        let g = bdd.cover_from_cubes(&[vec![-1], vec![3]]).unwrap();
        let p = bdd.cover_product(f, g).unwrap();
        assert_eq!(cubes_of(&bdd, p), vec![vec![-1, 2], vec![-1, 2, 3], vec![1, 3]]);
        let primes = bdd.product_primes(f, g).unwrap();
        assert_eq!(cubes_of(&bdd, primes), vec![vec![-1, 2], vec![1, 3]]);
    }

    #[test]
    fn test_minimal() {
        let bdd = Bdd::default();
        let f = bdd.cover_from_cubes(&[vec![1], vec![1, 2], vec![2, 3], vec![-1, 2, 3]]).unwrap();
        let m = bdd.cover_minimal(f).unwrap();
        assert_eq!(cubes_of(&bdd, m), vec![vec![1], vec![2, 3]]);
        let with_empty = bdd.cover_union(f, Cover::BASE).unwrap();
        assert_eq!(bdd.cover_minimal(with_empty).unwrap(), Cover::BASE);
    }

    #[test]
    fn test_subsumption_filters() {
        let bdd = Bdd::default();
        let x = bdd.cover_from_cubes(&[vec![1, 2], vec![3], vec![-1, 2]]).unwrap();
        let y = bdd.cover_from_cubes(&[vec![1], vec![3, 4]]).unwrap();
        let ns = bdd.not_superset(x, y).unwrap();
        assert_eq!(cubes_of(&bdd, ns), vec![vec![-1, 2], vec![3]]);
        let nb = bdd.not_subset(x, y).unwrap();
        assert_eq!(cubes_of(&bdd, nb), vec![vec![-1, 2], vec![1, 2]]);
        assert_eq!(bdd.not_superset(x, Cover::BASE).unwrap(), Cover::EMPTY);
        assert_eq!(bdd.not_subset(x, Cover::EMPTY).unwrap(), x);
    }

    #[test]
    fn test_supercubes() {
        let bdd = Bdd::default();
        let f = bdd.cover_from_cubes(&[vec![1, 2, 3]]).unwrap();
        let g = bdd.cover_from_cubes(&[vec![1, -2, 3], vec![2, 4]]).unwrap();
        let s = bdd.supercubes(f, g).unwrap();
        assert_eq!(cubes_of(&bdd, s), vec![vec![1, 3], vec![2]]);
        assert_eq!(bdd.supercubes(f, Cover::BASE).unwrap(), Cover::BASE);
    }

    #[test]
    fn test_to_bdd() {
        let bdd = Bdd::default();
        let f = bdd.cover_from_cubes(&[vec![1, -2], vec![3]]).unwrap();
        let g = bdd.cover_to_bdd(f).unwrap();
        let a = bdd.cube([1, -2]).unwrap();
        let b = bdd.mk_var(3);
        assert_eq!(g, bdd.apply_or(a, b).unwrap());
        assert_eq!(bdd.cover_to_bdd(Cover::EMPTY).unwrap(), bdd.zero());
        assert_eq!(bdd.cover_to_bdd(Cover::BASE).unwrap(), bdd.one());
    }

    #[test]
    fn test_cube_to_cover() {
        let bdd = Bdd::default();
        let c = bdd.cube([2, -3]).unwrap();
        let f = bdd.cube_to_cover(c).unwrap();
        assert_eq!(cubes_of(&bdd, f), vec![vec![2, -3]]);
        assert_eq!(bdd.cube_to_cover(bdd.one()).unwrap(), Cover::BASE);

        let x = bdd.mk_var(1);
        let y = bdd.mk_var(2);
        let not_cube = bdd.apply_or(x, y).unwrap();
        assert!(matches!(bdd.cube_to_cover(not_cube), Err(DdError::InvalidArgument(_))));
        assert!(matches!(bdd.cube_to_cover(bdd.zero()), Err(DdError::InvalidArgument(_))));
    }
}
