//! lockset: a generic hash set in two variants, a single-threaded
//! `UnsafeSet` and a thread-safe `SafeSet` that wraps one behind a
//! reader/writer lock.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: expose the full set algebra (union, intersection, difference,
//!   symmetric difference, subset tests, Cartesian product, power set,
//!   iteration, serialization) safely to concurrent callers, including
//!   operations that must lock two sets at once.
//! - Layers:
//!   - SlotTable<T>: structural storage; elements live in a generational
//!     slot map indexed by a raw hash table of precomputed hashes.
//!   - UnsafeSet<T>: set semantics and algebra over SlotTable. No locking;
//!     all mutation through `&mut self`.
//!   - SafeSet<T>: one UnsafeSet behind one `RwLock`. Every operation takes
//!     the lock in the mode it needs, delegates, and wraps set-valued
//!     results into new SafeSets with their own locks.
//!   - SetIterator<T>: streaming traversal of a SafeSet by a producer
//!     thread holding the read lock, with an explicit cancellation token.
//!
//! Constraints
//! - Element identity is `T: Eq + Hash`; there is no pluggable hasher.
//! - The inner UnsafeSet of a SafeSet is never reachable by callers and is
//!   never touched without the lock held in the right mode.
//! - Two-operand operations lock both sets in one global order (lowest
//!   lock address first), never receiver-then-argument blindly, so calls
//!   naming the same pair in opposite roles cannot deadlock.
//! - Lock acquisition is infallible: a poisoned lock is recovered.
//!
//! Notes and non-goals
//! - No persistence, replication or custom hashing strategies.
//! - Iteration order is unspecified everywhere, serialized output included.
//! - A streaming iterator that is neither drained, stopped nor dropped keeps
//!   its read lock and starves writers; that is the caller's responsibility.
//! - Elements stored in a set must not change their `Eq`/`Hash` while
//!   inside it. For `SafeSet<SafeSet<T>>` (power sets) this means the inner
//!   sets must not be mutated while they are members.
//!
//! Features
//! - `serde` (default): `Serialize`/`Deserialize` for both variants and
//!   `OrderedPair`, plus JSON `marshal`/`unmarshal` and [`SetError`].

#[cfg(feature = "serde")]
mod error;
mod iter;
mod pair;
mod safe_set;
mod set;
mod set_proptest;
mod table;
pub mod unsafe_set;

// Public surface
#[cfg(feature = "serde")]
pub use error::SetError;
pub use iter::{CancellationToken, IteratorState, SetIterator};
pub use pair::OrderedPair;
pub use safe_set::SafeSet;
pub use set::Set;
pub use unsafe_set::UnsafeSet;
