//! SafeSet: an [`UnsafeSet`] behind a reader/writer lock.
//!
//! Locking discipline
//! - Reads (`contains`, `cardinality`, `each`, `to_vec`, formatting,
//!   hashing, `marshal`, `clone`) hold the read lock for the whole call.
//! - Mutations (`add`, `remove`, `clear`, `pop`, `unmarshal`, `extend`) hold
//!   the write lock.
//! - Two-operand operations hold read locks on both sets, taken through
//!   `SafeSet::read_both` only. Locks are always acquired in one global
//!   order, lowest lock address first, whichever set is the receiver. Taking
//!   the receiver first is not enough on its own: `a.union(&b)` and
//!   `b.union(&a)` would then lock in opposite orders, and a writer queued on
//!   each set blocks the second reader of both calls.
//! - An operation whose operands are the same set takes a single guard;
//!   `std::sync::RwLock` may deadlock on recursive read locking.
//! - Set-valued results are re-wrapped by `SafeSet::wrap` into new sets
//!   with their own locks.
//!
//! Poisoning
//! - A panic inside a caller's visitor or an element's `Eq`/`Hash` poisons
//!   the lock. The storage stays structurally valid, so the guard is
//!   recovered, the poison flag cleared and a warning logged.

use crate::iter::SetIterator;
use crate::pair::OrderedPair;
use crate::unsafe_set::UnsafeSet;
use core::borrow::Borrow;
use core::fmt;
use core::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[cfg(feature = "serde")]
use crate::error::SetError;
#[cfg(feature = "serde")]
use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize, Serializer};

pub(crate) fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| {
        log::warn!("recovered set from poisoned lock on read");
        lock.clear_poison();
        poisoned.into_inner()
    })
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| {
        log::warn!("recovered set from poisoned lock on write");
        lock.clear_poison();
        poisoned.into_inner()
    })
}

/// A hash set safe to share between threads.
///
/// All operations take `&self`; share it with `Arc<SafeSet<T>>` or scoped
/// threads. Binary operations only accept another `SafeSet`, so the operand
/// is always guarded by a lock of the same kind.
pub struct SafeSet<T> {
    // Shared only with streaming producers spawned by `iterator`.
    inner: Arc<RwLock<UnsafeSet<T>>>,
}

impl<T> SafeSet<T>
where
    T: Eq + Hash,
{
    pub fn new() -> Self {
        Self::wrap(UnsafeSet::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::wrap(UnsafeSet::with_capacity(capacity))
    }

    /// Takes ownership of an unsynchronized set under a fresh lock.
    pub(crate) fn wrap(set: UnsafeSet<T>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(set)),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, UnsafeSet<T>> {
        read_lock(&self.inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, UnsafeSet<T>> {
        write_lock(&self.inner)
    }

    /// Runs `f(self, other)` with both sets read-locked. Every two-operand
    /// operation goes through here.
    ///
    /// The locks are taken in one fixed order for any pair of sets: lower
    /// lock address first, not receiver first. Receiver-then-argument would
    /// make `a.union(&b)` and `b.union(&a)` lock in opposite orders, and with
    /// a writer queued on each set neither call could take its second read
    /// lock. `f` still sees `self` as the receiver. Aliased operands share
    /// one guard.
    fn read_both<R, F>(&self, other: &Self, f: F) -> R
    where
        F: FnOnce(&UnsafeSet<T>, &UnsafeSet<T>) -> R,
    {
        if Arc::ptr_eq(&self.inner, &other.inner) {
            let both = self.read();
            return f(&*both, &*both);
        }
        let (this, that) = if Arc::as_ptr(&self.inner) < Arc::as_ptr(&other.inner) {
            let this = self.read();
            (this, other.read())
        } else {
            let that = other.read();
            (self.read(), that)
        };
        f(&*this, &*that)
    }

    /// Adds `elem`, returning `true` if it was not already present.
    pub fn add(&self, elem: T) -> bool {
        self.write().add(elem)
    }

    pub fn contains<Q>(&self, elem: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.read().contains(elem)
    }

    /// `true` iff every given element is present.
    pub fn contains_all<'a, I>(&self, elems: I) -> bool
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        self.read().contains_all(elems)
    }

    /// Removes `elem`, returning `true` if it was present.
    pub fn remove<Q>(&self, elem: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.write().remove(elem)
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    /// Removes and returns an arbitrary element, or `None` if the set is empty.
    pub fn pop(&self) -> Option<T> {
        self.write().pop()
    }

    pub fn cardinality(&self) -> usize {
        self.read().len()
    }

    pub fn len(&self) -> usize {
        self.cardinality()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Calls `visit` on each element under the read lock until it returns
    /// `true`. The visitor must not write to this set.
    pub fn each<F>(&self, visit: F)
    where
        F: FnMut(&T) -> bool,
    {
        self.read().each(visit)
    }

    pub fn equal(&self, other: &Self) -> bool {
        self.read_both(other, |this, that| this.equal(that))
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.read_both(other, |this, that| this.is_subset(that))
    }

    pub fn is_proper_subset(&self, other: &Self) -> bool {
        self.read_both(other, |this, that| this.is_proper_subset(that))
    }

    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    pub fn is_proper_superset(&self, other: &Self) -> bool {
        other.is_proper_subset(self)
    }
}

impl<T> SafeSet<T>
where
    T: Eq + Hash + Clone,
{
    pub fn to_vec(&self) -> Vec<T> {
        self.read().to_vec()
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::wrap(self.read_both(other, |this, that| this.union(that)))
    }

    pub fn intersect(&self, other: &Self) -> Self {
        Self::wrap(self.read_both(other, |this, that| this.intersect(that)))
    }

    pub fn difference(&self, other: &Self) -> Self {
        Self::wrap(self.read_both(other, |this, that| this.difference(that)))
    }

    pub fn symmetric_difference(&self, other: &Self) -> Self {
        Self::wrap(self.read_both(other, |this, that| this.symmetric_difference(that)))
    }

    pub fn cartesian_product(&self, other: &Self) -> SafeSet<OrderedPair<T, T>> {
        SafeSet::wrap(self.read_both(other, |this, that| this.cartesian_product(that)))
    }

    /// Every subset as its own `SafeSet`, collected into a new `SafeSet`.
    /// The read lock is released before the subsets are wrapped.
    pub fn power_set(&self) -> SafeSet<SafeSet<T>> {
        let subsets = self.read().power_set();
        subsets.into_iter().map(SafeSet::wrap).collect()
    }

    /// Unwraps the set. If a stream over it is still winding down, the
    /// contents are copied instead.
    pub fn into_inner(self) -> UnsafeSet<T> {
        match Arc::try_unwrap(self.inner) {
            Ok(lock) => lock.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => {
                let set = read_lock(&shared);
                set.clone()
            }
        }
    }
}

impl<T> SafeSet<T>
where
    T: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Streams the elements from a background thread that holds the read
    /// lock until the iterator is drained, stopped or dropped. Each element
    /// is handed over only when the consumer asks for it.
    pub fn iterator(&self) -> SetIterator<T> {
        self.iterator_with_capacity(0)
    }

    /// Like [`iterator`](Self::iterator) with up to `capacity` elements
    /// buffered ahead of the consumer.
    pub fn iterator_with_capacity(&self, capacity: usize) -> SetIterator<T> {
        SetIterator::spawn(Arc::clone(&self.inner), capacity)
    }
}

#[cfg(feature = "serde")]
impl<T> SafeSet<T>
where
    T: Eq + Hash,
{
    /// Encodes the set as a JSON array under the read lock.
    pub fn marshal(&self) -> Result<String, SetError>
    where
        T: Serialize,
    {
        self.read().marshal()
    }

    /// Decodes a JSON array and adds its elements. Decoding happens before
    /// the write lock is taken; on error the set is untouched.
    pub fn unmarshal(&self, input: &str) -> Result<(), SetError>
    where
        T: DeserializeOwned,
    {
        let decoded = UnsafeSet::<T>::decode(input)?;
        self.write().extend(decoded);
        Ok(())
    }
}

impl<T: Eq + Hash> Default for SafeSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Deep copy with its own lock.
impl<T: Eq + Hash + Clone> Clone for SafeSet<T> {
    fn clone(&self) -> Self {
        Self::wrap(self.read().clone())
    }
}

impl<T: Eq + Hash> PartialEq for SafeSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.equal(other)
    }
}

impl<T: Eq + Hash> Eq for SafeSet<T> {}

impl<T: Eq + Hash> Hash for SafeSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.read().hash(state);
    }
}

impl<T: Eq + Hash + fmt::Debug> fmt::Debug for SafeSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = self.read();
        f.debug_set().entries(set.iter()).finish()
    }
}

impl<T: Eq + Hash + fmt::Display> fmt::Display for SafeSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set = self.read();
        fmt::Display::fmt(&*set, f)
    }
}

impl<T: Eq + Hash> From<UnsafeSet<T>> for SafeSet<T> {
    fn from(set: UnsafeSet<T>) -> Self {
        Self::wrap(set)
    }
}

impl<T: Eq + Hash> From<Vec<T>> for SafeSet<T> {
    fn from(elems: Vec<T>) -> Self {
        Self::wrap(UnsafeSet::from(elems))
    }
}

impl<T: Eq + Hash, const N: usize> From<[T; N]> for SafeSet<T> {
    fn from(elems: [T; N]) -> Self {
        Self::wrap(UnsafeSet::from(elems))
    }
}

impl<T: Eq + Hash> FromIterator<T> for SafeSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::wrap(iter.into_iter().collect())
    }
}

impl<T: Eq + Hash> Extend<T> for SafeSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.write().extend(iter);
    }
}

#[cfg(feature = "serde")]
impl<T: Eq + Hash + Serialize> Serialize for SafeSet<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.read().serialize(serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, T: Eq + Hash + Deserialize<'de>> Deserialize<'de> for SafeSet<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        UnsafeSet::deserialize(deserializer).map(SafeSet::wrap)
    }
}
