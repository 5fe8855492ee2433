use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::registry::KeyHandle;

/// Open handles known to refer to the watched key.
///
/// One mutex guards the whole set. It is never held across a call into the
/// registry or another lock.
#[derive(Debug, Default)]
pub struct HandleTracker {
    handles: Mutex<FxHashSet<KeyHandle>>,
}

impl HandleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn track(&self, handle: KeyHandle) {
        self.handles.lock().insert(handle);
    }

    /// Returns whether the handle was tracked.
    pub fn untrack(&self, handle: KeyHandle) -> bool {
        self.handles.lock().remove(&handle)
    }

    pub fn is_tracked(&self, handle: KeyHandle) -> bool {
        self.handles.lock().contains(&handle)
    }

    pub fn len(&self) -> usize {
        self.handles.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_untrack() {
        let t = HandleTracker::new();
        let h = KeyHandle(0x104);
        assert!(!t.is_tracked(h));
        t.track(h);
        t.track(h);
        assert!(t.is_tracked(h));
        assert_eq!(t.len(), 1);
        assert!(t.untrack(h));
        assert!(!t.untrack(h));
        assert!(!t.is_tracked(h));
        assert!(t.is_empty());
    }

    #[test]
    fn concurrent_track_untrack_leaves_nothing_behind() {
        let t = HandleTracker::new();
        std::thread::scope(|s| {
            for thread in 0..8isize {
                let t = &t;
                s.spawn(move || {
                    for i in 0..500isize {
                        let h = KeyHandle(thread * 10_000 + i);
                        t.track(h);
                        assert!(t.is_tracked(h));
                        assert!(t.untrack(h));
                    }
                });
            }
        });
        assert!(t.is_empty());
    }
}
