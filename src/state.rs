use std::sync::atomic::{AtomicBool, Ordering};

use crate::original::OriginalValue;
use crate::tracker::HandleTracker;

/// State shared between the lifecycle controller and the hooks.
///
/// Only the controller writes the flag and the original value; any number of
/// host threads read them from inside the hooks.
#[derive(Debug, Default)]
pub struct OverrideState {
    force_left: AtomicBool,
    pub original: OriginalValue,
    pub tracker: HandleTracker,
}

impl OverrideState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn force_left(&self) -> bool {
        self.force_left.load(Ordering::Acquire)
    }

    pub fn set_force_left(&self, on: bool) {
        self.force_left.store(on, Ordering::Release);
    }
}
