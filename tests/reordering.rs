use bdd_logic::bdd::{Bdd, BddConfig};
use bdd_logic::reference::Ref;
use bdd_logic::types::{Level, Var};
use test_log::test;

/// Interleaved pairs `x_i ∧ x_{i+n}`, ORed together: exponential in the
/// natural order, linear once the pairs are adjacent.
fn pairs_function(bdd: &Bdd, pairs: u32) -> Ref {
    let mut f = bdd.zero();
    for i in 1..=pairs {
        let a = bdd.mk_var(i);
        let b = bdd.mk_var(i + pairs);
        let ab = bdd.apply_and(a, b).unwrap();
        let next = bdd.apply_or(f, ab).unwrap();
        bdd.release(ab);
        bdd.release(f);
        f = next;
    }
    f
}

#[test]
fn test_auto_reorder_preserves_results() {
    let reference = Bdd::default();
    let expected = pairs_function(&reference, 5);

    let bdd = Bdd::new(BddConfig::default().with_auto_reorder(24));
    let f = pairs_function(&bdd, 5);
    assert!(bdd.stats().reorderings > 0);
    assert!(bdd.check_invariants().is_ok());

    let copied = reference.transfer_from(&bdd, f).unwrap();
    assert_eq!(copied, expected);
    assert_eq!(bdd.sat_count(f, 10), reference.sat_count(expected, 10));
}

#[test]
fn test_handles_survive_sifting() {
    let bdd = Bdd::default();
    let f = pairs_function(&bdd, 4);
    let count = bdd.sat_count(f, 8);

    let stats = bdd.sift_all().unwrap();
    assert!(stats.final_size <= stats.initial_size);
    assert_eq!(bdd.sat_count(f, 8), count);
    assert!(bdd.check_invariants().is_ok());

    // The handle still denotes the same function.
    let rebuilt = pairs_function(&bdd, 4);
    assert_eq!(rebuilt, f);
}

#[test]
fn test_cover_operations_across_reorder() {
    let bdd = Bdd::default();
    let f = pairs_function(&bdd, 3);
    let cover = bdd.isop_cover(f, f).unwrap();
    assert_eq!(bdd.cubes(cover).count(), 3);

    let order: Vec<Var> = [1, 4, 2, 5, 3, 6].into_iter().map(Var::new).collect();
    bdd.reorder_to(&order).unwrap();
    assert_eq!(bdd.var_order(), order);

    // Covers are ordered by variable name, not level: they are untouched.
    assert_eq!(bdd.cubes(cover).count(), 3);
    assert_eq!(bdd.cover_to_bdd(cover).unwrap(), f);
    assert_eq!(bdd.isop_cover(f, f).unwrap(), cover);
    assert!(bdd.check_invariants().is_ok());
}

#[test]
fn test_swap_adjacent_round_trip() {
    let bdd = Bdd::default();
    let f = pairs_function(&bdd, 2);
    let size = bdd.size(f);
    bdd.swap_adjacent(Level::new(1)).unwrap();
    assert_eq!(bdd.var_at_level(Level::new(1)), Var::new(3));
    bdd.swap_adjacent(Level::new(1)).unwrap();
    assert_eq!(bdd.var_at_level(Level::new(1)), Var::new(2));
    assert_eq!(bdd.size(f), size);
    assert_eq!(pairs_function(&bdd, 2), f);
}

#[test]
fn test_distance1_under_auto_reorder() {
    let reference = Bdd::default();
    let bdd = Bdd::new(BddConfig::default().with_auto_reorder(16));

    let build = |m: &Bdd| {
        let a = m.cube([1, 2, -5, -6]).unwrap();
        let b = m.cube([-1, -2, 5, 6]).unwrap();
        let c = m.cube([3, 4, 7, 8]).unwrap();
        m.apply_or_many([a, b, c]).unwrap()
    };
    let expected = reference.distance1_decompose(build(&reference)).unwrap();
    let parts = bdd.distance1_decompose(build(&bdd)).unwrap();
    assert_eq!(parts.len(), expected.len());

    let mut copied: Vec<Ref> = parts.iter().map(|&p| reference.transfer_from(&bdd, p).unwrap()).collect();
    let mut expected = expected;
    copied.sort();
    expected.sort();
    assert_eq!(copied, expected);
}
