use std::collections::HashMap;

use num_bigint::BigUint;

use crate::bdd::Bdd;
use crate::reference::Ref;
use crate::types::Lit;

impl Bdd {
    /// Returns one satisfying path of `f`, as the literals along it.
    ///
    /// Variables not on the path are don't-cares. Returns `None` for the
    /// constant false function.
    pub fn one_sat(&self, f: Ref) -> Option<Vec<Lit>> {
        if f.is_zero() {
            return None;
        }
        let mut path = Vec::new();
        let mut current = f;
        while !current.is_one() {
            let var = self.variable(current);
            let high = self.high_node(current);
            if !high.is_zero() {
                path.push(var.pos());
                current = high;
            } else {
                path.push(var.neg());
                current = self.low_node(current);
            }
        }
        Some(path)
    }

    /// Number of satisfying assignments of `f` over `num_vars` variables.
    pub fn sat_count(&self, f: Ref, num_vars: usize) -> BigUint {
        let max = BigUint::from(1u32) << num_vars;
        let mut cache = HashMap::new();
        self.sat_count_rec(f, &max, &mut cache)
    }

    fn sat_count_rec(&self, f: Ref, max: &BigUint, cache: &mut HashMap<Ref, BigUint>) -> BigUint {
        if f.is_zero() {
            return BigUint::ZERO;
        }
        if f.is_one() {
            return max.clone();
        }
        if let Some(count) = cache.get(&f) {
            return count.clone();
        }
        let count_low = self.sat_count_rec(self.low(f), max, cache);
        let count_high = self.sat_count_rec(self.high(f), max, cache);
        let count: BigUint = (count_low + count_high) >> 1;
        let count = if f.is_negated() { max - count } else { count };
        cache.insert(f, count.clone());
        count
    }
}
