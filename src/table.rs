//! SlotTable: structural storage for set elements.
//!
//! Elements live in a generational slot map; a raw hash table indexes the
//! slot keys by each element's hash. The hash is computed once on insertion
//! and stored next to the element, so rehashing the index never calls back
//! into `T: Hash`. A dense list of live keys backs `pop`, so taking an
//! arbitrary element never scans vacant slots.

use core::borrow::Borrow;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_table::Entry as TableEntry;
use hashbrown::HashTable;
use slotmap::{DefaultKey, SlotMap};
use std::collections::hash_map::RandomState;

#[derive(Clone, Debug)]
pub(crate) struct Entry<T> {
    elem: T,
    hash: u64,
    pos: usize, // index into `SlotTable::live`
}

#[derive(Clone)]
pub(crate) struct SlotTable<T> {
    hasher: RandomState,
    index: HashTable<DefaultKey>,
    slots: SlotMap<DefaultKey, Entry<T>>, // storage using generational keys
    live: Vec<DefaultKey>,
}

/// Borrowing iterator over the elements of a set.
pub struct Iter<'a, T> {
    it: slotmap::basic::Values<'a, DefaultKey, Entry<T>>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|e| &e.elem)
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

/// Owning iterator over the elements of a set.
pub struct IntoIter<T> {
    it: slotmap::basic::IntoIter<DefaultKey, Entry<T>>,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;
    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, e)| e.elem)
    }
    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<T> SlotTable<T>
where
    T: Eq + Hash,
{
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            hasher: RandomState::new(),
            index: HashTable::with_capacity(capacity),
            slots: SlotMap::with_capacity(capacity),
            live: Vec::with_capacity(capacity),
        }
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    fn find<Q>(&self, q: &Q) -> Option<DefaultKey>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(q);
        self.index
            .find(hash, |&k| {
                self.slots
                    .get(k)
                    .map(|e| e.elem.borrow() == q)
                    .unwrap_or(false)
            })
            .copied()
    }

    pub(crate) fn contains<Q>(&self, q: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.find(q).is_some()
    }

    /// Inserts `elem` unless an equal element is already stored. Returns
    /// whether the table changed; a rejected duplicate is dropped.
    pub(crate) fn insert(&mut self, elem: T) -> bool {
        let hash = self.make_hash(&elem);
        match self.index.entry(
            hash,
            |&k| self.slots.get(k).map(|e| e.elem == elem).unwrap_or(false),
            |&k| self.slots.get(k).map(|e| e.hash).unwrap_or(0),
        ) {
            TableEntry::Occupied(_) => false,
            TableEntry::Vacant(v) => {
                let pos = self.live.len();
                let k = self.slots.insert(Entry { elem, hash, pos });
                let _ = v.insert(k);
                self.live.push(k);
                true
            }
        }
    }

    pub(crate) fn remove<Q>(&mut self, q: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let k = self.find(q)?;
        self.remove_slot(k)
    }

    /// Removes an arbitrary element.
    pub(crate) fn pop(&mut self) -> Option<T> {
        let k = *self.live.last()?;
        self.remove_slot(k)
    }

    fn remove_slot(&mut self, k: DefaultKey) -> Option<T> {
        let entry = self.slots.remove(k)?;
        // Unlink from the index; the slot and the index always agree.
        let _ = self
            .index
            .find_entry(entry.hash, |&kk| kk == k)
            .map(|occupied| occupied.remove());
        self.live.swap_remove(entry.pos);
        if let Some(&moved) = self.live.get(entry.pos) {
            if let Some(e) = self.slots.get_mut(moved) {
                e.pos = entry.pos;
            }
        }
        Some(entry.elem)
    }

    pub(crate) fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.live.clear();
    }

    pub(crate) fn reserve(&mut self, additional: usize) {
        self.index.reserve(additional, |&k| {
            self.slots.get(k).map(|e| e.hash).unwrap_or(0)
        });
        self.slots.reserve(additional);
        self.live.reserve(additional);
    }

    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter {
            it: self.slots.values(),
        }
    }
}

impl<T> IntoIterator for SlotTable<T> {
    type Item = T;
    type IntoIter = IntoIter<T>;

    fn into_iter(self) -> IntoIter<T> {
        IntoIter {
            it: self.slots.into_iter(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::hash::Hasher;

    fn table() -> SlotTable<String> {
        SlotTable::with_capacity(0)
    }

    /// Invariant: Duplicate elements are rejected and the table remains unchanged.
    #[test]
    fn duplicate_insert_rejected() {
        let mut t = table();
        assert!(t.insert("dup".to_string()));
        assert!(!t.insert("dup".to_string()));
        assert_eq!(t.len(), 1);
    }

    /// Invariant: Borrowed lookup works (store `String`, query with `&str`).
    #[test]
    fn borrowed_lookup_with_str() {
        let mut t = table();
        t.insert("hello".to_string());
        assert!(t.contains("hello"));
        assert!(!t.contains("world"));
    }

    /// Invariant: After `remove`, the element is absent and the owned value is
    /// handed back; reinserting it succeeds.
    #[test]
    fn remove_then_reinsert() {
        let mut t = table();
        t.insert("k".to_string());
        assert_eq!(t.remove("k").as_deref(), Some("k"));
        assert!(!t.contains("k"));
        assert_eq!(t.remove("k"), None);
        assert!(t.insert("k".to_string()));
        assert!(t.contains("k"));
    }

    /// Invariant: `pop` drains every element exactly once, then reports empty.
    #[test]
    fn pop_drains_each_element_once() {
        let mut t = table();
        for k in ["a", "b", "c"] {
            t.insert(k.to_string());
        }
        let mut seen = BTreeSet::new();
        while let Some(e) = t.pop() {
            assert!(seen.insert(e), "pop yielded a duplicate");
        }
        assert_eq!(seen.len(), 3);
        assert_eq!(t.len(), 0);
        assert!(t.pop().is_none());
    }

    /// Invariant: Iteration yields each live element exactly once, also after
    /// removals left holes in the slot storage.
    #[test]
    fn iteration_skips_removed_slots() {
        let mut t = table();
        for k in ["k1", "k2", "k3", "k4"] {
            t.insert(k.to_string());
        }
        t.remove("k2");
        let seen: BTreeSet<String> = t.iter().cloned().collect();
        let expected: BTreeSet<String> =
            ["k1", "k3", "k4"].iter().map(|s| s.to_string()).collect();
        assert_eq!(seen, expected);
        let owned: BTreeSet<String> = t.into_iter().collect();
        assert_eq!(owned, expected);
    }

    /// Invariant: `clear` empties both the slots and the index.
    #[test]
    fn clear_resets_index() {
        let mut t = table();
        t.insert("a".to_string());
        t.clear();
        assert_eq!(t.len(), 0);
        assert!(!t.contains("a"));
        assert!(t.insert("a".to_string()));
    }

    /// Invariant: Lookups work under heavy hash collisions; equality resolves
    /// to the correct element.
    #[test]
    fn collision_handling_with_const_hash() {
        #[derive(Clone, Debug, PartialEq, Eq)]
        struct Colliding(u32);
        impl Hash for Colliding {
            fn hash<H: Hasher>(&self, state: &mut H) {
                state.write_u8(0);
            }
        }

        let mut t: SlotTable<Colliding> = SlotTable::with_capacity(0);
        for i in 0..32 {
            assert!(t.insert(Colliding(i)));
        }
        assert!(!t.insert(Colliding(7)));
        assert_eq!(t.remove(&Colliding(7)), Some(Colliding(7)));
        for i in 0..32 {
            assert_eq!(t.contains(&Colliding(i)), i != 7);
        }
    }

    /// Invariant: The live-key list mirrors the slots through interleaved
    /// inserts, removals and pops; every entry's position points back at
    /// its own key.
    #[test]
    fn live_list_tracks_slots() {
        let mut t: SlotTable<u32> = SlotTable::with_capacity(0);
        let check = |t: &SlotTable<u32>| {
            assert_eq!(t.live.len(), t.slots.len());
            for (i, &k) in t.live.iter().enumerate() {
                assert_eq!(t.slots.get(k).map(|e| e.pos), Some(i));
            }
        };
        for i in 0..64 {
            t.insert(i);
        }
        for i in (0..64).step_by(3) {
            assert_eq!(t.remove(&i), Some(i));
            check(&t);
        }
        let mut popped = 0;
        while let Some(e) = t.pop() {
            assert!(!t.contains(&e));
            popped += 1;
            check(&t);
            if popped % 5 == 0 {
                t.insert(1_000 + popped);
                check(&t);
            }
        }
        assert_eq!(t.len(), 0);
        assert!(t.live.is_empty());
    }

    /// Invariant: Draining a large table with `pop` after most of it was
    /// removed stays linear; each pop touches only the live-key list.
    #[test]
    fn pop_after_mass_removal() {
        let mut t: SlotTable<u32> = SlotTable::with_capacity(0);
        for i in 0..100_000 {
            t.insert(i);
        }
        for i in 0..99_000 {
            t.remove(&i);
        }
        let mut seen = BTreeSet::new();
        while let Some(e) = t.pop() {
            assert!(e >= 99_000);
            assert!(seen.insert(e));
        }
        assert_eq!(seen.len(), 1_000);
    }

    /// Invariant: A cloned table is independent of the original.
    #[test]
    fn clone_is_independent() {
        let mut t = table();
        t.insert("a".to_string());
        let mut c = t.clone();
        c.insert("b".to_string());
        c.remove("a");
        assert!(t.contains("a"));
        assert!(!t.contains("b"));
        assert_eq!(c.len(), 1);
        t.reserve(16);
        assert!(t.contains("a"));
    }
}
