//! Re-entrant lock holding one cache's state and its initialized flag
//!
//! A size computation for TOTAL re-enters the same cache for TEXTS and
//! FILES while already holding the lock, so the lock must be re-entrant.
//! State access goes through short `read`/`write` closures; the closures
//! must not call back into the same cache.

use crate::cache::storage::codec;
use crate::error::Result;
use bincode::Options;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::cell::RefCell;

struct Guarded<S> {
    state: S,
    initialized: bool,
}

/// Held re-entrant lock; other threads block until it is dropped
pub struct CacheGuard<'a, S> {
    _guard: ReentrantMutexGuard<'a, RefCell<Guarded<S>>>,
}

/// One cache's state behind a re-entrant mutex
pub struct CacheLock<S> {
    inner: ReentrantMutex<RefCell<Guarded<S>>>,
}

impl<S: Default> Default for CacheLock<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> CacheLock<S> {
    pub fn new(state: S) -> Self {
        Self {
            inner: ReentrantMutex::new(RefCell::new(Guarded {
                state,
                initialized: false,
            })),
        }
    }

    /// Keep the lock across a multi-step check/compute/store sequence
    pub fn hold(&self) -> CacheGuard<'_, S> {
        CacheGuard {
            _guard: self.inner.lock(),
        }
    }

    pub fn read<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        let guard = self.inner.lock();
        let cell = guard.borrow();
        f(&cell.state)
    }

    pub fn write<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let guard = self.inner.lock();
        let mut cell = guard.borrow_mut();
        f(&mut cell.state)
    }

    /// Non-blocking: a lock held by another thread reads as not initialized
    pub fn is_initialized(&self) -> bool {
        match self.inner.try_lock() {
            Some(guard) => guard.try_borrow().map(|cell| cell.initialized).unwrap_or(false),
            None => false,
        }
    }

    pub fn set_initialized(&self, initialized: bool) {
        let guard = self.inner.lock();
        guard.borrow_mut().initialized = initialized;
    }
}

impl<S: Default> CacheLock<S> {
    /// Replace the state with an empty one; an emptied cache is no longer
    /// initialized
    pub fn reset(&self) {
        let guard = self.inner.lock();
        let mut cell = guard.borrow_mut();
        cell.state = S::default();
        cell.initialized = false;
    }
}

impl<S: Serialize> CacheLock<S> {
    pub fn export_state(&self) -> Result<Vec<u8>> {
        Ok(self.read(|state| codec().serialize(state))?)
    }
}

impl<S: DeserializeOwned> CacheLock<S> {
    /// Decode first, then swap in, so a bad payload leaves the state untouched
    pub fn import_state(&self, data: &[u8]) -> Result<()> {
        let decoded: S = codec().deserialize(data)?;
        self.write(|state| *state = decoded);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::sync::mpsc;
    use std::thread;

    #[test]
    fn test_hold_is_reentrant() {
        let lock: CacheLock<HashMap<u32, u32>> = CacheLock::default();
        let _outer = lock.hold();
        let _inner = lock.hold();
        lock.write(|map| map.insert(1, 10));
        assert_eq!(lock.read(|map| map.get(&1).copied()), Some(10));
    }

    #[test]
    fn test_initialized_flag_round_trip() {
        let lock: CacheLock<Vec<u8>> = CacheLock::default();
        assert!(!lock.is_initialized());
        lock.set_initialized(true);
        assert!(lock.is_initialized());
        lock.set_initialized(false);
        assert!(!lock.is_initialized());
    }

    #[test]
    fn test_reset_clears_initialized() {
        let lock: CacheLock<Vec<u8>> = CacheLock::default();
        lock.write(|state| state.push(1));
        lock.set_initialized(true);

        lock.reset();

        assert!(!lock.is_initialized());
        assert!(lock.read(|state| state.is_empty()));
    }

    #[test]
    fn test_initialized_reads_false_while_other_thread_holds_lock() {
        let lock: Arc<CacheLock<Vec<u8>>> = Arc::new(CacheLock::default());
        lock.set_initialized(true);

        let (locked_tx, locked_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();
        let worker_lock = Arc::clone(&lock);
        let worker = thread::spawn(move || {
            let _guard = worker_lock.hold();
            locked_tx.send(()).unwrap();
            release_rx.recv().unwrap();
        });

        locked_rx.recv().unwrap();
        assert!(!lock.is_initialized());
        release_tx.send(()).unwrap();
        worker.join().unwrap();
        assert!(lock.is_initialized());
    }

    #[test]
    fn test_export_import_state() {
        let source: CacheLock<HashMap<String, u64>> = CacheLock::default();
        source.write(|map| map.insert("picture.jpg".to_string(), 7));
        let bytes = source.export_state().unwrap();

        let target: CacheLock<HashMap<String, u64>> = CacheLock::default();
        target.import_state(&bytes).unwrap();
        assert_eq!(target.read(|map| map.get("picture.jpg").copied()), Some(7));
    }

    #[test]
    fn test_import_garbage_leaves_state_untouched() {
        let target: CacheLock<HashMap<String, u64>> = CacheLock::default();
        target.write(|map| map.insert("kept".to_string(), 1));
        assert!(target.import_state(&[0xff, 0xff, 0xff, 0xff, 0xff]).is_err());
        assert_eq!(target.read(|map| map.len()), 1);
    }
}
