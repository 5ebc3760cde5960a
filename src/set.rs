//! The operation surface shared by [`UnsafeSet`] and [`SafeSet`].
//!
//! Generic code written against `Set<T>` runs unchanged on either variant.
//! Binary operations take `&Self`, so the operand is always the same
//! concrete variant as the receiver; mixing the two does not compile.
//! Mutators take `&mut self` here so the unsynchronized variant fits;
//! `SafeSet` also offers them on `&self` as inherent methods.

use crate::pair::OrderedPair;
use crate::safe_set::SafeSet;
use crate::unsafe_set::UnsafeSet;
use core::hash::Hash;

#[cfg(feature = "serde")]
use crate::error::SetError;
#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Serialize};

pub trait Set<T>: Sized
where
    T: Eq + Hash + Clone,
{
    /// Result of [`cartesian_product`](Set::cartesian_product).
    type Product;
    /// Result of [`power_set`](Set::power_set).
    type PowerSet;

    fn add(&mut self, elem: T) -> bool;
    fn remove(&mut self, elem: &T) -> bool;
    fn clear(&mut self);
    fn pop(&mut self) -> Option<T>;

    fn contains(&self, elem: &T) -> bool;
    fn contains_all<'a, I>(&self, elems: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a;
    fn cardinality(&self) -> usize;
    fn is_empty(&self) -> bool {
        self.cardinality() == 0
    }
    /// Visits elements until `visit` returns `true`.
    fn each<F>(&self, visit: F)
    where
        F: FnMut(&T) -> bool;
    fn to_vec(&self) -> Vec<T>;
    fn clone_set(&self) -> Self;

    fn equal(&self, other: &Self) -> bool;
    fn is_subset(&self, other: &Self) -> bool;
    fn is_proper_subset(&self, other: &Self) -> bool;
    fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }
    fn is_proper_superset(&self, other: &Self) -> bool {
        other.is_proper_subset(self)
    }

    fn union(&self, other: &Self) -> Self;
    fn intersect(&self, other: &Self) -> Self;
    fn difference(&self, other: &Self) -> Self;
    fn symmetric_difference(&self, other: &Self) -> Self;
    fn cartesian_product(&self, other: &Self) -> Self::Product;
    fn power_set(&self) -> Self::PowerSet;

    #[cfg(feature = "serde")]
    fn marshal(&self) -> Result<String, SetError>
    where
        T: Serialize;
    #[cfg(feature = "serde")]
    fn unmarshal(&mut self, input: &str) -> Result<(), SetError>
    where
        T: DeserializeOwned;
}

// Both impls forward to the inherent methods, which take precedence in
// path resolution.
macro_rules! forward_set_impl {
    ($set:ident) => {
        impl<T> Set<T> for $set<T>
        where
            T: Eq + Hash + Clone,
        {
            type Product = $set<OrderedPair<T, T>>;
            type PowerSet = $set<$set<T>>;

            fn add(&mut self, elem: T) -> bool {
                $set::add(self, elem)
            }
            fn remove(&mut self, elem: &T) -> bool {
                $set::remove(self, elem)
            }
            fn clear(&mut self) {
                $set::clear(self)
            }
            fn pop(&mut self) -> Option<T> {
                $set::pop(self)
            }
            fn contains(&self, elem: &T) -> bool {
                $set::contains(self, elem)
            }
            fn contains_all<'a, I>(&self, elems: I) -> bool
            where
                I: IntoIterator<Item = &'a T>,
                T: 'a,
            {
                $set::contains_all(self, elems)
            }
            fn cardinality(&self) -> usize {
                $set::cardinality(self)
            }
            fn each<F>(&self, visit: F)
            where
                F: FnMut(&T) -> bool,
            {
                $set::each(self, visit)
            }
            fn to_vec(&self) -> Vec<T> {
                $set::to_vec(self)
            }
            fn clone_set(&self) -> Self {
                Clone::clone(self)
            }
            fn equal(&self, other: &Self) -> bool {
                $set::equal(self, other)
            }
            fn is_subset(&self, other: &Self) -> bool {
                $set::is_subset(self, other)
            }
            fn is_proper_subset(&self, other: &Self) -> bool {
                $set::is_proper_subset(self, other)
            }
            fn union(&self, other: &Self) -> Self {
                $set::union(self, other)
            }
            fn intersect(&self, other: &Self) -> Self {
                $set::intersect(self, other)
            }
            fn difference(&self, other: &Self) -> Self {
                $set::difference(self, other)
            }
            fn symmetric_difference(&self, other: &Self) -> Self {
                $set::symmetric_difference(self, other)
            }
            fn cartesian_product(&self, other: &Self) -> Self::Product {
                $set::cartesian_product(self, other)
            }
            fn power_set(&self) -> Self::PowerSet {
                $set::power_set(self)
            }
            #[cfg(feature = "serde")]
            fn marshal(&self) -> Result<String, SetError>
            where
                T: Serialize,
            {
                $set::marshal(self)
            }
            #[cfg(feature = "serde")]
            fn unmarshal(&mut self, input: &str) -> Result<(), SetError>
            where
                T: DeserializeOwned,
            {
                $set::unmarshal(self, input)
            }
        }
    };
}

forward_set_impl!(UnsafeSet);
forward_set_impl!(SafeSet);

#[cfg(test)]
mod tests {
    use super::Set;
    use crate::{SafeSet, UnsafeSet};

    fn scenario_a<S: Set<i32> + From<[i32; 3]>>() {
        let s = S::from([1, 2, 3]);
        let t = S::from([2, 3, 4]);
        let mut u = s.union(&t).to_vec();
        u.sort();
        assert_eq!(u, vec![1, 2, 3, 4]);
        assert_eq!(s.intersect(&t).cardinality(), 2);
        assert_eq!(s.difference(&t).to_vec(), vec![1]);
        let mut d = s.symmetric_difference(&t).to_vec();
        d.sort();
        assert_eq!(d, vec![1, 4]);
        assert!(s.is_superset(&s.difference(&t)));
        assert!(!s.is_proper_superset(&s.clone_set()));
    }

    fn mutators<S: Set<i32> + Default>() {
        let mut s = S::default();
        assert!(s.is_empty());
        assert!(s.add(5));
        assert!(!s.add(5));
        assert!(s.contains_all(&[5]));
        assert_eq!(s.pop(), Some(5));
        assert_eq!(s.pop(), None);
        s.add(1);
        s.add(2);
        assert!(s.remove(&1));
        assert!(!s.remove(&1));
        let mut seen = 0;
        s.each(|_| {
            seen += 1;
            false
        });
        assert_eq!(seen, 1);
        s.clear();
        assert_eq!(s.cardinality(), 0);
    }

    /// Invariant: Both variants behave identically through the trait.
    #[test]
    fn both_variants_share_semantics() {
        scenario_a::<UnsafeSet<i32>>();
        scenario_a::<SafeSet<i32>>();
        mutators::<UnsafeSet<i32>>();
        mutators::<SafeSet<i32>>();
    }

    #[test]
    fn associated_result_types() {
        let s: SafeSet<i32> = SafeSet::from([1, 2]);
        let p: SafeSet<SafeSet<i32>> = Set::power_set(&s);
        assert_eq!(p.len(), 4);
        let u: UnsafeSet<i32> = UnsafeSet::from([1, 2]);
        let c = Set::cartesian_product(&u, &u);
        assert_eq!(c.len(), 4);
    }
}
