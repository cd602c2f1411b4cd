use std::fmt::{Display, Formatter};
use std::ops::Neg;

use crate::types::NodeId;

/// An edge to a node of the store, with a complement bit.
///
/// The least significant bit marks a complemented edge, the remaining bits
/// hold the [`NodeId`]. The terminal node is slot 0, so `one` is `@0` and
/// `zero` is `~@0`.
///
/// A `Ref` is only a name: ownership of a reference count is tracked by the
/// manager (see [`Bdd::acquire`](crate::bdd::Bdd::acquire)).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct Ref(u32);

impl Ref {
    /// Sentinel for "no value", used by empty cache slots.
    pub const INVALID: Self = Self(0xFFFF_FFFF);

    /// The constant true function.
    pub const ONE: Self = Self(0);

    /// The constant false function.
    pub const ZERO: Self = Self(1);

    pub const fn new(id: NodeId, negated: bool) -> Self {
        Self((id.raw() << 1) | (negated as u32))
    }

    pub const fn positive(id: NodeId) -> Self {
        Self::new(id, false)
    }

    pub const fn negative(id: NodeId) -> Self {
        Self::new(id, true)
    }

    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn id(self) -> NodeId {
        NodeId::from_raw(self.0 >> 1)
    }

    #[inline]
    pub const fn index(self) -> usize {
        (self.0 >> 1) as usize
    }

    #[inline]
    pub const fn is_negated(self) -> bool {
        (self.0 & 1) != 0
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// The same edge without its complement bit.
    #[inline]
    pub const fn regular(self) -> Self {
        Self(self.0 & !1)
    }

    /// Complements the edge when `cond` holds.
    #[inline]
    pub const fn not_if(self, cond: bool) -> Self {
        Self(self.0 ^ (cond as u32))
    }

    #[inline]
    pub const fn is_terminal(self) -> bool {
        (self.0 >> 1) == 0
    }

    #[inline]
    pub const fn is_one(self) -> bool {
        self.0 == Self::ONE.0
    }

    #[inline]
    pub const fn is_zero(self) -> bool {
        self.0 == Self::ZERO.0
    }

    /// Constant function for a Boolean value.
    pub const fn constant(value: bool) -> Self {
        if value {
            Self::ONE
        } else {
            Self::ZERO
        }
    }
}

impl Default for Ref {
    fn default() -> Self {
        Self::INVALID
    }
}

impl Neg for Ref {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0 ^ 1)
    }
}

impl Display for Ref {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if *self == Self::INVALID {
            return write!(f, "@?");
        }
        write!(f, "{}@{}", if self.is_negated() { "~" } else { "" }, self.id().raw())
    }
}
