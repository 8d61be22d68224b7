//! Property-based checks of the bit-set and sum-of-products algebra that
//! the cut-set engines are built on: the operations should hold their
//! algebraic laws for arbitrary inputs, not just the handful of
//! hand-picked cases in the unit tests.

use std::collections::BTreeSet;

use proptest::prelude::*;

use scram_core::bitset::BitSet;
use scram_core::sop::{Expr, Group};

const WIDTH: usize = 8;

fn index_set() -> impl Strategy<Value = BTreeSet<usize>> {
    proptest::collection::btree_set(0..WIDTH, 0..=4)
}

fn bitset_of(indices: &BTreeSet<usize>) -> BitSet {
    BitSet::from_indices(WIDTH, indices.iter().copied())
}

proptest! {
    #[test]
    fn bitset_or_is_commutative(a in index_set(), b in index_set()) {
        let (ba, bb) = (bitset_of(&a), bitset_of(&b));
        prop_assert_eq!(ba.or(&bb), bb.or(&ba));
    }

    #[test]
    fn bitset_and_is_commutative(a in index_set(), b in index_set()) {
        let (ba, bb) = (bitset_of(&a), bitset_of(&b));
        prop_assert_eq!(ba.and(&bb), bb.and(&ba));
    }

    #[test]
    fn bitset_or_contains_both_operands(a in index_set(), b in index_set()) {
        let (ba, bb) = (bitset_of(&a), bitset_of(&b));
        let u = ba.or(&bb);
        prop_assert!(ba.is_subset_of(&u));
        prop_assert!(bb.is_subset_of(&u));
    }

    /// After inserting an arbitrary sequence of groups through
    /// `Expr::or_group`'s absorption rule, no two surviving groups may be
    /// in a subset relationship — that invariant is what makes the result
    /// a genuine set of *minimal* terms.
    #[test]
    fn or_group_insertion_leaves_an_antichain(sets in proptest::collection::vec(index_set(), 0..8)) {
        let mut e = Expr::create(WIDTH);
        for s in &sets {
            e.or_group(Group::new(bitset_of(s)));
        }
        let groups = e.groups();
        for i in 0..groups.len() {
            for j in 0..groups.len() {
                if i == j {
                    continue;
                }
                prop_assert!(
                    !groups[i].bits().is_subset_of(groups[j].bits()),
                    "group {i:?} is a subset of group {j:?} after absorption"
                );
            }
        }
    }

    /// Every input group is either present in the result or dominated by
    /// a surviving group that is its subset (absorption never drops a
    /// term without a more general replacement).
    #[test]
    fn or_group_never_loses_coverage(sets in proptest::collection::vec(index_set(), 0..8)) {
        let mut e = Expr::create(WIDTH);
        for s in &sets {
            e.or_group(Group::new(bitset_of(s)));
        }
        for s in &sets {
            let bits = bitset_of(s);
            prop_assert!(e.groups().iter().any(|g| g.bits().is_subset_of(&bits)));
        }
    }
}
