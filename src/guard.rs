//! Scoped ownership of references and the restart combinator.
//!
//! Recursive operations return *unacquired* references. Any intermediate
//! that must survive further allocation is wrapped in a [`Held`] guard,
//! which takes a reference on construction and gives it back on drop, so
//! early returns through `?` never leak or double-release.
//!
//! Public entry points run their recursion through [`Bdd::retry`]: the
//! attempt is repeated whenever the variable order changed underneath it
//! or a bounded side-cache overflowed.

use log::debug;

use crate::bdd::Bdd;
use crate::error::DdResult;
use crate::reference::Ref;

/// A handle whose liveness is tracked through one store edge.
pub trait Handle: Copy {
    fn edge(self) -> Ref;
}

impl Handle for Ref {
    fn edge(self) -> Ref {
        self
    }
}

/// Values that own references to store nodes.
pub trait Owned {
    fn for_each_edge(&self, f: &mut dyn FnMut(Ref));
}

impl Owned for Ref {
    fn for_each_edge(&self, f: &mut dyn FnMut(Ref)) {
        f(*self)
    }
}

impl<A: Owned, B: Owned> Owned for (A, B) {
    fn for_each_edge(&self, f: &mut dyn FnMut(Ref)) {
        self.0.for_each_edge(f);
        self.1.for_each_edge(f);
    }
}

impl<T: Owned> Owned for Vec<T> {
    fn for_each_edge(&self, f: &mut dyn FnMut(Ref)) {
        for item in self {
            item.for_each_edge(f);
        }
    }
}

/// An owned reference that is released when dropped.
#[must_use]
pub struct Held<'a, H: Handle = Ref> {
    bdd: &'a Bdd,
    handle: H,
}

impl<'a, H: Handle> Held<'a, H> {
    /// Takes a new reference to `handle`.
    pub fn new(bdd: &'a Bdd, handle: H) -> Self {
        bdd.acquire(handle.edge());
        Self { bdd, handle }
    }

    /// Takes over a reference the caller already owns.
    pub fn adopt(bdd: &'a Bdd, handle: H) -> Self {
        Self { bdd, handle }
    }

    pub fn get(&self) -> H {
        self.handle
    }

    /// Gives up the guard without releasing; the caller now owns the reference.
    pub fn into_inner(self) -> H {
        let handle = self.handle;
        std::mem::forget(self);
        handle
    }
}

impl<H: Handle> Drop for Held<'_, H> {
    fn drop(&mut self) {
        self.bdd.release(self.handle.edge());
    }
}

/// A growing list of owned references, all released on drop.
pub struct HeldList<'a, H: Handle = Ref> {
    bdd: &'a Bdd,
    items: Vec<H>,
}

impl<'a, H: Handle> HeldList<'a, H> {
    pub fn new(bdd: &'a Bdd) -> Self {
        Self { bdd, items: Vec::new() }
    }

    /// Takes a new reference to `handle` and keeps it.
    pub fn push(&mut self, handle: H) {
        self.bdd.acquire(handle.edge());
        self.items.push(handle);
    }

    pub fn as_slice(&self) -> &[H] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Hands the references over to the caller.
    pub fn into_vec(mut self) -> Vec<H> {
        std::mem::take(&mut self.items)
    }
}

impl<H: Handle> Drop for HeldList<'_, H> {
    fn drop(&mut self) {
        for h in self.items.drain(..) {
            self.bdd.release(h.edge());
        }
    }
}

impl Bdd {
    /// Takes a reference to `f` for the lifetime of the guard.
    pub fn hold(&self, f: Ref) -> Held<'_> {
        Held::new(self, f)
    }

    pub(crate) fn acquired<H: Handle>(&self, h: H) -> H {
        self.acquire(h.edge());
        h
    }

    /// Gives back every reference owned by `value`.
    pub fn release_all(&self, value: &impl Owned) {
        value.for_each_edge(&mut |f| self.release(f));
    }

    /// Runs `attempt` until it completes under a stable variable order.
    ///
    /// The attempt must return owned (acquired) results. If the order
    /// changed while it ran, its results are released and it is run again;
    /// restart requests ([`DdError::Reordered`](crate::error::DdError::Reordered),
    /// [`DdError::CacheOverflow`](crate::error::DdError::CacheOverflow)) are
    /// absorbed the same way. Any other error is returned as is.
    pub(crate) fn retry<T: Owned>(&self, op: &str, mut attempt: impl FnMut() -> DdResult<T>) -> DdResult<T> {
        let mut restarts = 0usize;
        loop {
            let epoch = self.epoch();
            match attempt() {
                Ok(value) if self.epoch() == epoch => {
                    if restarts > 0 {
                        debug!("{} completed after {} restarts", op, restarts);
                    }
                    return Ok(value);
                }
                Ok(value) => {
                    debug!("{}: variable order changed during the attempt, restarting", op);
                    self.release_all(&value);
                }
                Err(e) if e.is_restart() => {
                    debug!("{}: {}, restarting", op, e);
                }
                Err(e) => return Err(e),
            }
            restarts += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DdError;
    use crate::types::Var;
    use test_log::test;

    fn dead_node(bdd: &Bdd) -> Ref {
        bdd.mk_var(1);
        let y = bdd.mk_var(2);
        bdd.unique(Var::new(1), bdd.zero(), y).unwrap()
    }

    #[test]
    fn test_held_releases_on_drop() {
        let bdd = Bdd::default();
        let f = dead_node(&bdd);
        {
            let held = bdd.hold(f);
            assert_eq!(held.get(), f);
            assert_eq!(bdd.ref_count(f), 1);
        }
        assert_eq!(bdd.ref_count(f), 0);
    }

    #[test]
    fn test_into_inner_keeps_reference() {
        let bdd = Bdd::default();
        let f = dead_node(&bdd);
        let r = bdd.hold(f).into_inner();
        assert_eq!(bdd.ref_count(r), 1);
        bdd.release(r);
    }

    #[test]
    fn test_held_list() {
        let bdd = Bdd::default();
        let f = dead_node(&bdd);
        {
            let mut list = HeldList::new(&bdd);
            list.push(f);
            list.push(-f);
            assert_eq!(list.len(), 2);
            assert_eq!(bdd.ref_count(f), 2);
        }
        assert_eq!(bdd.ref_count(f), 0);

        let mut list = HeldList::new(&bdd);
        list.push(f);
        let owned = list.into_vec();
        assert_eq!(bdd.ref_count(f), 1);
        bdd.release_all(&owned);
        assert_eq!(bdd.ref_count(f), 0);
    }

    #[test]
    fn test_retry_restarts_on_request() {
        let bdd = Bdd::default();
        let mut attempts = 0;
        let res = bdd.retry("test", || {
            attempts += 1;
            if attempts < 3 {
                Err(DdError::Reordered)
            } else {
                Ok(bdd.one())
            }
        });
        assert_eq!(res, Ok(bdd.one()));
        assert_eq!(attempts, 3);
    }

    #[test]
    fn test_retry_discards_results_across_epochs() {
        let bdd = Bdd::default();
        let f = dead_node(&bdd);
        let mut attempts = 0;
        let res = bdd.retry("test", || {
            attempts += 1;
            let r = bdd.acquired(f);
            if attempts == 1 {
                bdd.bump_epoch();
            }
            Ok(r)
        });
        assert_eq!(res, Ok(f));
        assert_eq!(attempts, 2);
        assert_eq!(bdd.ref_count(f), 1);
        bdd.release(f);
    }

    #[test]
    fn test_retry_passes_other_errors() {
        let bdd = Bdd::default();
        let res: DdResult<Ref> = bdd.retry("test", || Err(DdError::invalid("nope")));
        assert_eq!(res, Err(DdError::InvalidArgument("nope".to_string())));
    }
}
