//! Wholesale-replaced value with lock-free reads.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;

/// Holds the current version of an immutable value.
///
/// Writers build the next version completely and publish it with [`store`];
/// readers get an `Arc` to whichever version was current at the time of the
/// call and never observe a partially built one.
///
/// [`store`]: Snapshot::store
pub struct Snapshot<T> {
    current: ArcSwap<T>,
}

impl<T> Snapshot<T> {
    pub fn new(initial: T) -> Self {
        Self {
            current: ArcSwap::from_pointee(initial),
        }
    }

    /// Returns the current version.
    pub fn load(&self) -> Arc<T> {
        self.current.load_full()
    }

    /// Publishes a new version.
    pub fn store(&self, next: T) {
        self.current.store(Arc::new(next));
    }
}

impl<T: Default> Default for Snapshot<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Snapshot").field(&self.load()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::thread;

    #[test]
    fn test_store_and_load() {
        let snap = Snapshot::new(1u32);
        let old = snap.load();
        snap.store(2);
        assert_eq!(*old, 1);
        assert_eq!(*snap.load(), 2);
    }

    #[test]
    fn test_readers_see_whole_versions() {
        // Every version is a pair whose halves must match.
        let snap = Arc::new(Snapshot::new((0u64, 0u64)));
        let writer = {
            let snap = Arc::clone(&snap);
            thread::spawn(move || {
                for i in 1..=2000 {
                    snap.store((i, i));
                }
            })
        };
        let reader = {
            let snap = Arc::clone(&snap);
            thread::spawn(move || {
                for _ in 0..2000 {
                    let v = snap.load();
                    assert_eq!(v.0, v.1);
                }
            })
        };
        writer.join().unwrap();
        reader.join().unwrap();
        assert_eq!(*snap.load(), (2000, 2000));
    }
}
