//! Memoization tables for the recursive operations.
//!
//! All operations share one [`ComputedTable`], keyed by an [`OpTag`] and up
//! to three operands. The table is lossy and epoch-scoped: it is wiped by
//! garbage collection, by every reordering swap, and when it is resized to
//! follow store growth. A hit is therefore always a node that exists under
//! the current variable order.
//!
//! [`BoundedCache`] is the small capacity-limited map used by algorithms
//! that need a private side-cache.

mod bounded;
mod direct_mapped;

pub use bounded::BoundedCache;
pub use direct_mapped::DirectMappedCache;

use crate::reference::Ref;
use crate::types::Var;
use crate::utils::{mix, pairing3, MyHash};

/// Identifies the operation a computed-table entry belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Default)]
#[repr(u8)]
pub enum OpTag {
    #[default]
    Ite,
    And,
    Restrict,
    Exists,
    Grow,
    CoverUnion,
    CoverIntersection,
    CoverDifference,
    CoverChange,
    CoverSubset0,
    CoverSubset1,
    CoverProduct,
    CoverMinimal,
    CoverSupercubes,
    CoverNotSubset,
    CoverNotSuperset,
    CoverToBdd,
    IsopCover,
    IsopFunction,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct OpKey {
    tag: OpTag,
    a: Ref,
    b: Ref,
    c: Ref,
}

impl Default for OpKey {
    fn default() -> Self {
        Self {
            tag: OpTag::Ite,
            a: Ref::INVALID,
            b: Ref::INVALID,
            c: Ref::INVALID,
        }
    }
}

impl OpKey {
    pub fn unary(tag: OpTag, a: Ref) -> Self {
        Self::ternary(tag, a, Ref::INVALID, Ref::INVALID)
    }

    pub fn binary(tag: OpTag, a: Ref, b: Ref) -> Self {
        Self::ternary(tag, a, b, Ref::INVALID)
    }

    /// Key of a commutative operation: operands are put in canonical order.
    pub fn commutative(tag: OpTag, a: Ref, b: Ref) -> Self {
        if a <= b {
            Self::binary(tag, a, b)
        } else {
            Self::binary(tag, b, a)
        }
    }

    pub fn ternary(tag: OpTag, a: Ref, b: Ref, c: Ref) -> Self {
        Self { tag, a, b, c }
    }

    /// Key of an operation parameterized by a variable.
    pub fn with_var(tag: OpTag, a: Ref, var: Var) -> Self {
        Self::binary(tag, a, Ref::from_raw(var.id()))
    }
}

impl MyHash for OpKey {
    fn hash(&self) -> u64 {
        let h = pairing3(self.a.raw() as u64, self.b.raw() as u64, self.c.raw() as u64);
        mix(h ^ ((self.tag as u64) << 56))
    }
}

/// The shared computed table.
pub struct ComputedTable {
    inner: DirectMappedCache<OpKey, Ref>,
}

impl ComputedTable {
    pub fn new(bits: usize) -> Self {
        Self {
            inner: DirectMappedCache::new(bits),
        }
    }

    pub fn get(&self, key: &OpKey) -> Option<Ref> {
        self.inner.get(key).copied()
    }

    pub fn insert(&mut self, key: OpKey, value: Ref) {
        self.inner.insert(key, value);
    }

    pub fn clear(&mut self) {
        self.inner.clear();
    }

    pub fn bits(&self) -> usize {
        self.inner.bits()
    }

    pub fn capacity(&self) -> usize {
        self.inner.capacity()
    }

    pub fn resize(&mut self, bits: usize) {
        self.inner.resize(bits);
    }

    pub fn hits(&self) -> usize {
        self.inner.hits()
    }

    pub fn misses(&self) -> usize {
        self.inner.misses()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeId;

    #[test]
    fn test_commutative_key() {
        let a = Ref::positive(NodeId::new(3));
        let b = Ref::negative(NodeId::new(9));
        assert_eq!(
            OpKey::commutative(OpTag::And, a, b),
            OpKey::commutative(OpTag::And, b, a)
        );
        assert_ne!(OpKey::binary(OpTag::Grow, a, b), OpKey::binary(OpTag::Grow, b, a));
    }

    #[test]
    fn test_tags_separate_entries() {
        let mut table = ComputedTable::new(8);
        let a = Ref::positive(NodeId::new(3));
        let b = Ref::positive(NodeId::new(4));
        table.insert(OpKey::commutative(OpTag::CoverUnion, a, b), a);
        assert_eq!(table.get(&OpKey::commutative(OpTag::CoverUnion, b, a)), Some(a));
        assert_eq!(table.get(&OpKey::commutative(OpTag::CoverIntersection, a, b)), None);
        table.clear();
        assert_eq!(table.get(&OpKey::commutative(OpTag::CoverUnion, a, b)), None);
    }
}
