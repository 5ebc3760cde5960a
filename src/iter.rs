//! Streaming traversal of a [`SafeSet`](crate::SafeSet).
//!
//! A producer thread takes a read lock on the set and hands cloned elements
//! to the consumer. The hand-off is bounded by a credit gate: the producer
//! may only send an element for which it holds a credit, and parks on the
//! gate otherwise. Every call to `next` grants one credit; a buffered
//! iterator starts with `capacity` extra credits.
//!
//! The read lock is held for the whole traversal. After its last element the
//! producer keeps the guard and parks until the consumer has seen the end of
//! the stream, stopped, or dropped the iterator, so writers to the same set
//! wait for the consumer and not only for the producer.
//!
//! State machine, as seen from the producer:
//! `Created -> Active (lock held, emitting) -> {Exhausted | Cancelled}`.
//! Both terminal states release the read lock exactly once, when the guard
//! goes out of scope on thread exit. Cancelling, from any thread, unparks a
//! waiting producer.

use crate::safe_set::read_lock;
use crate::unsafe_set::UnsafeSet;
use core::hash::Hash;
use crossbeam_utils::sync::{Parker, Unparker};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, JoinHandle};

#[derive(Debug)]
struct GateState {
    credits: usize,
    cancelled: bool,
    // Consumer saw the end of the stream.
    released: bool,
}

#[derive(Debug)]
struct Gate {
    state: Mutex<GateState>,
    producer: Unparker,
}

impl Gate {
    fn lock(&self) -> MutexGuard<'_, GateState> {
        // Plain flags and a counter; always consistent.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, f: impl FnOnce(&mut GateState)) {
        f(&mut self.lock());
        self.producer.unpark();
    }

    /// Takes one credit, parking until one is granted. `false` once cancelled.
    fn acquire(&self, parker: &Parker) -> bool {
        loop {
            {
                let mut state = self.lock();
                if state.cancelled {
                    return false;
                }
                if state.credits > 0 {
                    state.credits -= 1;
                    return true;
                }
            }
            parker.park();
        }
    }

    /// Parks until the consumer is done with the stream.
    fn wait_released(&self, parker: &Parker) {
        loop {
            {
                let state = self.lock();
                if state.cancelled || state.released {
                    return;
                }
            }
            parker.park();
        }
    }
}

/// Stop signal shared between a [`SetIterator`] and its producer.
///
/// Cancelling wakes the producer wherever it waits; it drops its read lock
/// and exits without the consumer having to call `next` again.
#[derive(Clone, Debug)]
pub struct CancellationToken(Arc<Gate>);

impl CancellationToken {
    pub fn cancel(&self) {
        self.0.update(|state| state.cancelled = true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.lock().cancelled
    }

    fn grant(&self) {
        self.0.update(|state| state.credits += 1);
    }

    fn release(&self) {
        self.0.update(|state| state.released = true);
    }
}

/// Consumer-side view of a streaming traversal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum IteratorState {
    /// More elements may follow.
    Active,
    /// Every element was delivered.
    Exhausted,
    /// Stopped before the end.
    Cancelled,
}

/// Single-pass, cancellable traversal of the live contents of a set.
///
/// Dropping the iterator stops it. An iterator that is kept alive but
/// neither drained nor stopped keeps its read lock and starves writers.
/// Writing to the same set from the consuming thread while the iterator is
/// active deadlocks.
pub struct SetIterator<T> {
    rx: Option<Receiver<T>>,
    token: CancellationToken,
    producer: Option<JoinHandle<()>>,
    state: IteratorState,
}

impl<T> SetIterator<T> {
    pub(crate) fn spawn(source: Arc<RwLock<UnsafeSet<T>>>, capacity: usize) -> Self
    where
        T: Eq + Hash + Clone + Send + Sync + 'static,
    {
        let (tx, rx) = mpsc::channel();
        let parker = Parker::new();
        let token = CancellationToken(Arc::new(Gate {
            state: Mutex::new(GateState {
                credits: capacity,
                cancelled: false,
                released: false,
            }),
            producer: parker.unparker().clone(),
        }));
        let gate = Arc::clone(&token.0);
        let producer = thread::spawn(move || produce(&source, tx, &gate, &parker));
        Self {
            rx: Some(rx),
            token,
            producer: Some(producer),
            state: IteratorState::Active,
        }
    }

    pub fn state(&self) -> IteratorState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state != IteratorState::Active
    }

    /// A handle on the stop signal, for stopping the stream from another
    /// thread.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Stops the traversal. The producer exits and releases its read lock
    /// shortly after; use [`stop_and_wait`](Self::stop_and_wait) to block
    /// until it has. No-op once the iterator is done.
    pub fn stop(&mut self) {
        if self.state != IteratorState::Active {
            return;
        }
        self.token.cancel();
        self.rx = None;
        self.state = IteratorState::Cancelled;
    }

    /// Stops the traversal and joins the producer; on return the read lock
    /// has been released.
    pub fn stop_and_wait(mut self) {
        self.stop();
        self.join();
    }

    fn join(&mut self) {
        if let Some(producer) = self.producer.take() {
            if producer.join().is_err() {
                log::warn!("set iterator producer panicked");
            }
        }
    }
}

impl<T> Iterator for SetIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.token.is_cancelled() {
            self.stop();
        }
        let rx = self.rx.as_ref()?;
        self.token.grant();
        match rx.recv() {
            Ok(elem) => Some(elem),
            Err(_) => {
                self.rx = None;
                self.state = if self.token.is_cancelled() {
                    IteratorState::Cancelled
                } else {
                    IteratorState::Exhausted
                };
                // On return the read lock is gone.
                self.token.release();
                self.join();
                None
            }
        }
    }
}

impl<T> Drop for SetIterator<T> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn produce<T>(source: &RwLock<UnsafeSet<T>>, tx: Sender<T>, gate: &Gate, parker: &Parker)
where
    T: Eq + Hash + Clone,
{
    let set = read_lock(source);
    log::trace!("set iterator started over {} elements", set.len());
    let mut sent = 0usize;
    for elem in set.iter() {
        if !gate.acquire(parker) || tx.send(elem.clone()).is_err() {
            log::trace!("set iterator cancelled after {sent} elements");
            return;
        }
        sent += 1;
    }
    // Closing the channel lets the consumer drain what is left; the guard
    // stays until it has.
    drop(tx);
    gate.wait_released(parker);
    log::trace!("set iterator exhausted after {sent} elements");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn spawn_over(n: i32, capacity: usize) -> (Arc<RwLock<UnsafeSet<i32>>>, SetIterator<i32>) {
        let source = Arc::new(RwLock::new((0..n).collect::<UnsafeSet<_>>()));
        let it = SetIterator::spawn(Arc::clone(&source), capacity);
        (source, it)
    }

    /// Invariant: The producer never runs more than `capacity` elements
    /// ahead of the consumer's requests.
    #[test]
    fn credits_bound_the_buffer() {
        let (_source, mut it) = spawn_over(100, 4);
        assert!(it.next().is_some());
        thread::sleep(Duration::from_millis(50));
        let state = it.token.0.lock();
        assert_eq!(state.credits, 0);
        drop(state);
        // One delivered plus at most `capacity` buffered.
        let buffered = it.rx.as_ref().map(|rx| rx.try_iter().count()).unwrap_or(0);
        assert_eq!(buffered, 4);
    }

    /// Invariant: The producer keeps the read lock after its last send and
    /// lets go once the consumer has seen the end.
    #[test]
    fn lock_held_until_consumer_sees_end() {
        let (source, mut it) = spawn_over(3, 8);
        assert!(it.next().is_some());
        thread::sleep(Duration::from_millis(50));
        assert!(source.try_write().is_err());
        assert_eq!(it.by_ref().count(), 2);
        assert_eq!(it.state(), IteratorState::Exhausted);
        assert!(source.try_write().is_ok());
    }

    /// Invariant: Cancelling through the token wakes a parked producer.
    #[test]
    fn cancel_wakes_parked_producer() {
        let (source, mut it) = spawn_over(10, 0);
        assert!(it.next().is_some());
        it.cancellation_token().cancel();
        let producer = it.producer.take();
        if let Some(producer) = producer {
            producer.join().unwrap();
        }
        assert!(source.try_write().is_ok());
        assert_eq!(it.next(), None);
        assert_eq!(it.state(), IteratorState::Cancelled);
    }
}
