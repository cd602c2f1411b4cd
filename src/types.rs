//! Type-safe wrappers for node identifiers, variables, levels and literals.
//!
//! Variables are stable names; levels are positions in the current order and
//! change under reordering. Keeping them as distinct types prevents mixing the
//! two in the recursive algorithms, which always compare *levels*.

use std::fmt;
use std::ops::Neg;

/// Index of a node slot in the manager's store.
///
/// Slot 0 holds the single terminal node.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Largest id that still fits in a [`Ref`](crate::reference::Ref) after the complement bit.
    pub const MAX: u32 = 0x7FFF_FFFE;

    /// Sentinel marking the end of a collision chain.
    pub const INVALID: Self = Self(0x7FFF_FFFF);

    /// The terminal node.
    pub const TERMINAL: Self = Self(0);

    pub fn new(id: u32) -> Self {
        assert!(id <= Self::MAX, "Node id {} exceeds the maximum of {}", id, Self::MAX);
        Self(id)
    }

    pub(crate) const fn from_raw(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_terminal(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        NodeId::new(id)
    }
}

/// A variable identifier (1-indexed).
///
/// Variable ids are stable across reordering. Id 0 is reserved for the
/// terminal node and is only available as [`Var::ZERO`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Var(u32);

impl Var {
    /// Placeholder variable of the terminal node.
    pub const ZERO: Self = Self(0);

    /// Creates a new variable with the given id.
    ///
    /// # Panics
    ///
    /// Panics if `id == 0`.
    pub fn new(id: u32) -> Self {
        assert_ne!(id, 0, "Variable ids must be >= 1");
        Var(id)
    }

    #[inline]
    pub const fn id(self) -> u32 {
        self.0
    }

    /// Zero-based slot of this variable in per-variable tables.
    #[inline]
    pub(crate) const fn slot(self) -> usize {
        self.0 as usize - 1
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Positive literal of this variable.
    pub fn pos(self) -> Lit {
        Lit::pos(self)
    }

    /// Negative literal of this variable.
    pub fn neg(self) -> Lit {
        Lit::neg(self)
    }
}

impl fmt::Display for Var {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", self.0)
    }
}

impl From<u32> for Var {
    fn from(id: u32) -> Self {
        Var::new(id)
    }
}

impl From<Var> for u32 {
    fn from(var: Var) -> Self {
        var.0
    }
}

/// A level in the variable order (0-indexed, level 0 is the root side).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Level(usize);

impl Level {
    pub fn new(index: usize) -> Self {
        Level(index)
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0
    }

    pub fn next(self) -> Self {
        Level(self.0 + 1)
    }

    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(Level)
    }

    pub fn is_top(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl From<usize> for Level {
    fn from(index: usize) -> Self {
        Level(index)
    }
}

impl From<Level> for usize {
    fn from(level: Level) -> Self {
        level.0
    }
}

/// A literal: a variable together with a polarity.
///
/// Converts from DIMACS-style signed integers (`-3` is `¬x3`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Lit {
    var: Var,
    negated: bool,
}

impl Lit {
    pub fn new(var: Var, negated: bool) -> Self {
        Self { var, negated }
    }

    pub fn pos(var: Var) -> Self {
        Self::new(var, false)
    }

    pub fn neg(var: Var) -> Self {
        Self::new(var, true)
    }

    pub fn var(self) -> Var {
        self.var
    }

    pub fn is_negated(self) -> bool {
        self.negated
    }

    pub fn is_positive(self) -> bool {
        !self.negated
    }

    /// Signed DIMACS form of the literal.
    pub fn to_dimacs(self) -> i32 {
        let v = self.var.id() as i32;
        if self.negated {
            -v
        } else {
            v
        }
    }
}

impl From<i32> for Lit {
    fn from(lit: i32) -> Self {
        assert_ne!(lit, 0, "Literal 0 does not name a variable");
        Lit::new(Var::new(lit.unsigned_abs()), lit < 0)
    }
}

impl Neg for Lit {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Lit::new(self.var, !self.negated)
    }
}

impl fmt::Display for Lit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.negated {
            write!(f, "~{}", self.var)
        } else {
            write!(f, "{}", self.var)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_var_creation() {
        let v1 = Var::new(1);
        let v2 = Var::new(2);
        assert_eq!(v1.id(), 1);
        assert_eq!(v2.slot(), 1);
        assert!(v1 < v2);
        assert!(Var::ZERO.is_zero());
    }

    #[test]
    #[should_panic(expected = "Variable ids must be >= 1")]
    fn test_var_zero_panics() {
        Var::new(0);
    }

    #[test]
    fn test_level_navigation() {
        let l0 = Level::new(0);
        let l1 = l0.next();
        assert_eq!(l1.prev(), Some(l0));
        assert_eq!(l0.prev(), None);
        assert!(l0.is_top());
        assert!(!l1.is_top());
    }

    #[test]
    fn test_lit_dimacs() {
        let lit = Lit::from(-3);
        assert_eq!(lit.var(), Var::new(3));
        assert!(lit.is_negated());
        assert_eq!(lit.to_dimacs(), -3);
        assert_eq!((-lit).to_dimacs(), 3);
        assert_eq!(Var::new(5).pos().to_string(), "x5");
        assert_eq!(Var::new(5).neg().to_string(), "~x5");
    }

    #[test]
    fn test_node_id_terminal() {
        assert!(NodeId::TERMINAL.is_terminal());
        assert!(!NodeId::new(3).is_terminal());
        assert_eq!(NodeId::new(3).to_string(), "@3");
    }
}
