//! First-of-many failure detection used to keep retry warnings bounded.

use std::sync::atomic::{AtomicBool, Ordering};

/// Shared "a failure burst is in progress" flag.
///
/// The first caller to fail during a burst engages the flag and is the
/// only one that logs; the first caller to succeed releases it.
#[derive(Debug, Default)]
pub struct HoldFlag(AtomicBool);

impl HoldFlag {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Engage the flag. Returns `true` only for the caller that flipped it.
    pub fn engage(&self) -> bool {
        !self.0.swap(true, Ordering::AcqRel)
    }

    pub fn release(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_engaged(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
