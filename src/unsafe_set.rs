//! UnsafeSet: single-threaded set storage and algebra.
//!
//! All mutation goes through `&mut self` and nothing here locks. Sharing an
//! `UnsafeSet` across threads is only sound through a lock, which is what
//! [`SafeSet`](crate::SafeSet) adds.

use crate::pair::OrderedPair;
use crate::table::SlotTable;
pub use crate::table::{IntoIter, Iter};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{Hash, Hasher};
use std::collections::hash_map::DefaultHasher;

#[cfg(feature = "serde")]
use crate::error::SetError;
#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};

/// A hash set without any synchronization.
#[derive(Clone)]
pub struct UnsafeSet<T> {
    table: SlotTable<T>,
}

impl<T> UnsafeSet<T>
where
    T: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            table: SlotTable::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of elements; same as [`len`](Self::len).
    pub fn cardinality(&self) -> usize {
        self.len()
    }

    /// Adds `elem`, returning `true` if it was not already present.
    pub fn add(&mut self, elem: T) -> bool {
        self.table.insert(elem)
    }

    pub fn contains<Q>(&self, elem: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.contains(elem)
    }

    /// `true` iff every given element is present. Vacuously `true` for no
    /// elements.
    pub fn contains_all<'a, I>(&self, elems: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        elems.into_iter().all(|e| self.table.contains(e))
    }

    /// Removes `elem`, returning `true` if it was present.
    pub fn remove<Q>(&mut self, elem: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.remove(elem).is_some()
    }

    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Removes and returns an arbitrary element, or `None` if the set is empty.
    pub fn pop(&mut self) -> Option<T> {
        self.table.pop()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Calls `visit` on each element until it returns `true`.
    pub fn each<F>(&self, mut visit: F)
    where
        F: FnMut(&T) -> bool,
    {
        for elem in self.iter() {
            if visit(elem) {
                break;
            }
        }
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.table.iter()
    }

    pub fn equal(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|e| other.contains(e))
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|e| other.contains(e))
    }

    /// Subset and not equal. Given `is_subset`, inequality is a size check.
    pub fn is_proper_subset(&self, other: &Self) -> bool {
        self.len() < other.len() && self.is_subset(other)
    }

    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    pub fn is_proper_superset(&self, other: &Self) -> bool {
        other.is_proper_subset(self)
    }
}

impl<T> UnsafeSet<T>
where
    T: Eq + Hash + Clone,
{
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    pub fn union(&self, other: &Self) -> Self {
        let mut out = self.clone();
        out.reserve(other.len());
        out.extend(other.iter().cloned());
        out
    }

    pub fn intersect(&self, other: &Self) -> Self {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small
            .iter()
            .filter(|e| large.contains(*e))
            .cloned()
            .collect()
    }

    /// Elements of `self` that are not in `other`.
    pub fn difference(&self, other: &Self) -> Self {
        self.iter()
            .filter(|e| !other.contains(*e))
            .cloned()
            .collect()
    }

    pub fn symmetric_difference(&self, other: &Self) -> Self {
        let mut out = self.difference(other);
        out.extend(other.iter().filter(|e| !self.contains(*e)).cloned());
        out
    }

    /// All ordered pairs `(a, b)` with `a` from `self` and `b` from `other`.
    pub fn cartesian_product<U>(&self, other: &UnsafeSet<U>) -> UnsafeSet<OrderedPair<T, U>>
    where
        U: Eq + Hash + Clone,
    {
        let mut out = UnsafeSet::with_capacity(self.len().saturating_mul(other.len()));
        for a in self.iter() {
            for b in other.iter() {
                out.add(OrderedPair::new(a.clone(), b.clone()));
            }
        }
        out
    }

    /// The set of all subsets, the empty set and `self` included.
    pub fn power_set(&self) -> UnsafeSet<UnsafeSet<T>> {
        let mut subsets: Vec<UnsafeSet<T>> = vec![UnsafeSet::new()];
        for elem in self.iter() {
            let extended: Vec<UnsafeSet<T>> = subsets
                .iter()
                .map(|s| {
                    let mut s = s.clone();
                    s.add(elem.clone());
                    s
                })
                .collect();
            subsets.extend(extended);
        }
        subsets.into_iter().collect()
    }
}

#[cfg(feature = "serde")]
impl<T> UnsafeSet<T>
where
    T: Eq + Hash,
{
    /// Encodes the set as a JSON array. Element order is unspecified.
    pub fn marshal(&self) -> Result<String, SetError>
    where
        T: Serialize,
    {
        serde_json::to_string(self).map_err(SetError::Encode)
    }

    /// Decodes a JSON array and adds its elements. On error the set is left
    /// untouched.
    pub fn unmarshal(&mut self, input: &str) -> Result<(), SetError>
    where
        T: DeserializeOwned,
    {
        let decoded = Self::decode(input)?;
        self.extend(decoded);
        Ok(())
    }

    pub(crate) fn decode(input: &str) -> Result<Vec<T>, SetError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(input).map_err(SetError::Decode)
    }
}

impl<T: Eq + Hash> Default for UnsafeSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Eq + Hash> PartialEq for UnsafeSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl<T: Eq + Hash> Eq for UnsafeSet<T> {}

// Order-independent: equal sets hash equally whatever their slot layout or
// per-table hasher keys.
impl<T: Eq + Hash> Hash for UnsafeSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let sum = self.iter().fold(0u64, |acc, elem| {
            let mut h = DefaultHasher::new();
            elem.hash(&mut h);
            acc.wrapping_add(h.finish())
        });
        state.write_usize(self.len());
        state.write_u64(sum);
    }
}

impl<T: Eq + Hash + fmt::Debug> fmt::Debug for UnsafeSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

/// Formats as `Set{a, b, c}`.
impl<T: Eq + Hash + fmt::Display> fmt::Display for UnsafeSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Set{")?;
        for (i, elem) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", elem)?;
        }
        f.write_str("}")
    }
}

impl<T: Eq + Hash> FromIterator<T> for UnsafeSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = UnsafeSet::new();
        set.extend(iter);
        set
    }
}

impl<T: Eq + Hash> Extend<T> for UnsafeSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        let iter = iter.into_iter();
        self.reserve(iter.size_hint().0);
        for elem in iter {
            self.add(elem);
        }
    }
}

impl<T: Eq + Hash> From<Vec<T>> for UnsafeSet<T> {
    fn from(elems: Vec<T>) -> Self {
        elems.into_iter().collect()
    }
}

impl<T: Eq + Hash, const N: usize> From<[T; N]> for UnsafeSet<T> {
    fn from(elems: [T; N]) -> Self {
        elems.into_iter().collect()
    }
}

impl<T> IntoIterator for UnsafeSet<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        self.table.into_iter()
    }
}

impl<'a, T: Eq + Hash> IntoIterator for &'a UnsafeSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

#[cfg(feature = "serde")]
impl<T: Eq + Hash + Serialize> Serialize for UnsafeSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

#[cfg(feature = "serde")]
impl<'de, T: Eq + Hash + Deserialize<'de>> Deserialize<'de> for UnsafeSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<T>::deserialize(deserializer).map(UnsafeSet::from)
    }
}
