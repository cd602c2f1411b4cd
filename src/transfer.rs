//! Copying diagrams between managers.
//!
//! The source and destination stores share nothing: the copy walks the
//! source graph and rebuilds every node in the destination through ITE, so
//! the destination may use any variable order. A per-call memo maps source
//! node ids to the destination functions built for them.

use std::collections::HashMap;

use log::debug;

use crate::bdd::Bdd;
use crate::error::{DdError, DdResult};
use crate::guard::HeldList;
use crate::reference::Ref;
use crate::types::{NodeId, Var};

/// Source node id to the (held) destination function.
struct TransferMemo<'a> {
    dst: &'a Bdd,
    map: HashMap<NodeId, Ref>,
}

impl Drop for TransferMemo<'_> {
    fn drop(&mut self) {
        for &r in self.map.values() {
            self.dst.release(r);
        }
    }
}

fn transfer_rec(src: &Bdd, dst: &Bdd, f: Ref, var_map: &dyn Fn(Var) -> Var, memo: &mut TransferMemo) -> DdResult<Ref> {
    if f.is_terminal() {
        return Ok(f);
    }
    if let Some(&res) = memo.map.get(&f.id()) {
        return Ok(res.not_if(f.is_negated()));
    }
    let node = src.node(f.id());
    let low = dst.hold(transfer_rec(src, dst, node.low, var_map, memo)?);
    let high = dst.hold(transfer_rec(src, dst, node.high, var_map, memo)?);
    let proj = dst.mk_var(var_map(node.variable));
    let res = dst.ite_rec(proj, high.get(), low.get())?;
    dst.acquire(res);
    memo.map.insert(f.id(), res);
    Ok(res.not_if(f.is_negated()))
}

/// Copies the functions `fs` of `src` into `dst`, renaming variable `v` to
/// `var_map(v)`.
///
/// The results are acquired in `dst`. Fails with
/// [`DdError::InvalidArgument`] if a variable of the support is mapped to
/// the terminal variable.
pub fn transfer_many(src: &Bdd, dst: &Bdd, fs: &[Ref], var_map: impl Fn(Var) -> Var) -> DdResult<Vec<Ref>> {
    debug!("transfer({} roots, {} source nodes)", fs.len(), src.descendants(fs.iter().copied()).len());
    for &f in fs {
        for v in src.support(f) {
            let image = var_map(v);
            if image.is_zero() {
                return Err(DdError::invalid(format!("{} is mapped to the terminal variable", v)));
            }
            dst.ensure_var(image);
        }
    }
    dst.retry("transfer", || {
        let mut memo = TransferMemo {
            dst,
            map: HashMap::new(),
        };
        let mut out = HeldList::new(dst);
        for &f in fs {
            let res = transfer_rec(src, dst, f, &var_map, &mut memo)?;
            out.push(res);
        }
        Ok(out.into_vec())
    })
}

/// Copies `f` from `src` into `dst`, keeping variable names unless
/// `var_map` is given (variable `i` becomes `var_map[i-1]`).
pub fn transfer(src: &Bdd, dst: &Bdd, f: Ref, var_map: Option<&[Var]>) -> DdResult<Ref> {
    let rename = |v: Var| match var_map {
        Some(map) => map.get(v.slot()).copied().unwrap_or(v),
        None => v,
    };
    let mut res = transfer_many(src, dst, &[f], rename)?;
    Ok(res.remove(0))
}

impl Bdd {
    /// Copies `f` from another manager into this one.
    pub fn transfer_from(&self, src: &Bdd, f: Ref) -> DdResult<Ref> {
        transfer(src, self, f, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bdd::BddConfig;
    use crate::types::Level;
    use test_log::test;

    #[test]
    fn test_transfer_identity() {
        let src = Bdd::default();
        let dst = Bdd::default();
        let f = src.cube([1, -2]).unwrap();
        let g = src.clause([2, 3]).unwrap();
        let h = src.apply_xor(f, g).unwrap();

        let copied = dst.transfer_from(&src, h).unwrap();
        let f2 = dst.cube([1, -2]).unwrap();
        let g2 = dst.clause([2, 3]).unwrap();
        assert_eq!(copied, dst.apply_xor(f2, g2).unwrap());
        assert_eq!(dst.size(copied), src.size(h));
        assert!(dst.check_invariants().is_ok());
    }

    #[test]
    fn test_transfer_with_map_and_back() {
        let src = Bdd::default();
        let dst = Bdd::default();
        let f = src.cube([1, -2]).unwrap();
        let map = [Var::new(3), Var::new(4)];
        let g = transfer(&src, &dst, f, Some(&map)).unwrap();
        assert_eq!(g, dst.cube([3, -4]).unwrap());

        let back = [Var::new(3), Var::new(4), Var::new(1), Var::new(2)];
        let h = transfer(&dst, &src, g, Some(&back)).unwrap();
        assert_eq!(h, f);
    }

    #[test]
    fn test_transfer_into_different_order() {
        let src = Bdd::default();
        let dst = Bdd::default();
        dst.mk_var(3);
        dst.swap_adjacent(Level::new(0)).unwrap();
        dst.swap_adjacent(Level::new(1)).unwrap();

        let x1 = src.mk_var(1);
        let x2 = src.mk_var(2);
        let x3 = src.mk_var(3);
        let f = src.apply_ite(x1, x2, x3).unwrap();
        let out = transfer_many(&src, &dst, &[f, -f], |v| v).unwrap();
        assert_eq!(out[1], -out[0]);

        let y1 = dst.mk_var(1);
        let y2 = dst.mk_var(2);
        let y3 = dst.mk_var(3);
        assert_eq!(out[0], dst.apply_ite(y1, y2, y3).unwrap());
        dst.release_all(&out);
        assert!(dst.check_invariants().is_ok());
    }

    #[test]
    fn test_transfer_rejects_terminal_variable() {
        let src = Bdd::default();
        let dst = Bdd::default();
        let f = src.cube([1, -2]).unwrap();
        let res = transfer(&src, &dst, f, Some(&[Var::new(2), Var::ZERO]));
        assert!(matches!(res, Err(DdError::InvalidArgument(_))));
        assert_eq!(dst.node_count(), dst.num_vars());
    }

    #[test]
    fn test_transfer_many_releases_on_failure() {
        let src = Bdd::default();
        let small = src.cube([1, 2]).unwrap();
        let mut big = src.zero();
        for i in 1..=4 {
            let c = src.cube([i, i + 4]).unwrap();
            big = src.apply_or(big, c).unwrap();
        }

        // Room for the projections, the small cube and two more nodes.
        let sizing = Bdd::default();
        sizing.mk_var(8);
        sizing.transfer_from(&src, small).unwrap();
        let dst = Bdd::new(BddConfig::default().with_max_nodes(sizing.num_nodes() + 2));
        dst.mk_var(8);
        let baseline = dst.node_count();

        let res = transfer_many(&src, &dst, &[small, big], |v| v);
        assert!(matches!(res, Err(DdError::StoreExhausted { .. })));
        dst.collect_garbage();
        assert_eq!(dst.node_count(), baseline);
        assert!(dst.check_invariants().is_ok());
    }
}
