#![cfg(test)]

// Property tests for UnsafeSet kept inside the crate so the storage layer is
// exercised through the same operations the locked variant delegates to.

use crate::unsafe_set::UnsafeSet;
use proptest::prelude::*;
use std::collections::{BTreeSet, HashSet};

// Pool-indexed operations to improve shrinking: indices shrink to earlier
// elements, pool length shrinks, and op lists shrink in length.
#[derive(Clone, Debug)]
enum OpI {
    Add(usize),
    Remove(usize),
    Contains(String),
    Pop,
    Clear,
    Iterate,
}

fn arb_scenario() -> impl Strategy<Value = (Vec<String>, Vec<OpI>)> {
    proptest::collection::vec("[a-z]{0,5}", 1..=8).prop_flat_map(|pool| {
        let idxs: Vec<usize> = (0..pool.len()).collect();
        let idx = proptest::sample::select(idxs);
        let contains_pool = proptest::sample::select(pool.clone());
        let op = prop_oneof![
            4 => idx.clone().prop_map(OpI::Add),
            2 => idx.clone().prop_map(OpI::Remove),
            2 => prop_oneof![
                contains_pool.prop_map(|s: String| s),
                "[a-z]{0,5}".prop_map(|s| s)
            ]
            .prop_map(OpI::Contains),
            1 => Just(OpI::Pop),
            1 => Just(OpI::Clear),
            1 => Just(OpI::Iterate),
        ];
        proptest::collection::vec(op, 1..60).prop_map(move |ops| (pool.clone(), ops))
    })
}

fn small_set() -> impl Strategy<Value = BTreeSet<u8>> {
    proptest::collection::btree_set(0u8..16, 0..10)
}

fn to_model(s: &UnsafeSet<u8>) -> BTreeSet<u8> {
    s.iter().copied().collect()
}

// Property: State-machine equivalence against std::collections::HashSet.
// Invariants exercised across random operation sequences:
// - `add` reports novelty exactly when the model lacks the element.
// - `remove` reports presence; `pop` removes an element the model holds.
// - `iter` yields each live element exactly once; `len` tracks the model.
proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]
    #[test]
    fn prop_state_machine((pool, ops) in arb_scenario()) {
        let mut sut: UnsafeSet<String> = UnsafeSet::new();
        let mut model: HashSet<String> = HashSet::new();

        for op in ops {
            match op {
                OpI::Add(i) => {
                    let e = pool[i].clone();
                    prop_assert_eq!(sut.add(e.clone()), model.insert(e));
                }
                OpI::Remove(i) => {
                    prop_assert_eq!(sut.remove(&pool[i]), model.remove(&pool[i]));
                }
                OpI::Contains(s) => {
                    prop_assert_eq!(sut.contains(s.as_str()), model.contains(&s));
                }
                OpI::Pop => match sut.pop() {
                    Some(e) => {
                        prop_assert!(model.remove(&e), "popped element not in model");
                    }
                    None => {
                        prop_assert!(model.is_empty());
                    }
                },
                OpI::Clear => {
                    sut.clear();
                    model.clear();
                }
                OpI::Iterate => {
                    let seen: Vec<&String> = sut.iter().collect();
                    let unique: HashSet<&String> = seen.iter().copied().collect();
                    prop_assert_eq!(seen.len(), unique.len(), "iteration yielded a duplicate");
                    prop_assert_eq!(unique, model.iter().collect::<HashSet<_>>());
                }
            }
            prop_assert_eq!(sut.len(), model.len());
            prop_assert_eq!(sut.is_empty(), model.is_empty());
        }
    }
}

// Property: the binary algebra agrees with BTreeSet's and obeys the usual
// laws (commutativity of union/intersection/symmetric difference, subset
// antisymmetry, superset as reversed subset).
proptest! {
    #[test]
    fn prop_algebra_matches_model(a in small_set(), b in small_set()) {
        let s: UnsafeSet<u8> = a.iter().copied().collect();
        let t: UnsafeSet<u8> = b.iter().copied().collect();

        prop_assert_eq!(to_model(&s.union(&t)), a.union(&b).copied().collect::<BTreeSet<_>>());
        prop_assert_eq!(to_model(&s.intersect(&t)), a.intersection(&b).copied().collect::<BTreeSet<_>>());
        prop_assert_eq!(to_model(&s.difference(&t)), a.difference(&b).copied().collect::<BTreeSet<_>>());
        prop_assert_eq!(
            to_model(&s.symmetric_difference(&t)),
            a.symmetric_difference(&b).copied().collect::<BTreeSet<_>>()
        );

        prop_assert_eq!(s.union(&t), t.union(&s));
        prop_assert_eq!(s.intersect(&t), t.intersect(&s));
        prop_assert_eq!(s.symmetric_difference(&t), t.symmetric_difference(&s));
        prop_assert_eq!(s.difference(&t) == t.difference(&s), s == t);

        prop_assert_eq!(s.is_subset(&t), a.is_subset(&b));
        prop_assert_eq!(s.is_subset(&t) && t.is_subset(&s), s.equal(&t));
        prop_assert_eq!(s.is_superset(&t), t.is_subset(&s));
        prop_assert_eq!(s.is_proper_subset(&t), a.is_subset(&b) && a != b);
        prop_assert_eq!(s.cartesian_product(&t).len(), a.len() * b.len());
    }

    #[test]
    fn prop_power_set_members_are_subsets(a in proptest::collection::btree_set(0u8..16, 0..6)) {
        let s: UnsafeSet<u8> = a.iter().copied().collect();
        let ps = s.power_set();
        prop_assert_eq!(ps.len(), 1usize << a.len());
        for subset in ps.iter() {
            prop_assert!(subset.is_subset(&s));
        }
        prop_assert!(ps.contains(&s));
        prop_assert!(ps.contains(&UnsafeSet::<u8>::new()));
    }
}
