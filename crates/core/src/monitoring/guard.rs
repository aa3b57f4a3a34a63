//! Mutual exclusion between monitoring cycles and manual fixes.

use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Single-holder guard shared by the scheduler and manual fix requests.
///
/// Acquisition never waits: a caller that finds the guard held skips its
/// tick or reports busy.
#[derive(Debug, Clone, Default)]
pub struct CycleGuard {
    inner: Arc<Mutex<()>>,
}

impl CycleGuard {
    /// Creates a new, free guard.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the guard if free. The permit releases on drop.
    #[must_use]
    pub fn try_acquire(&self) -> Option<OwnedMutexGuard<()>> {
        Arc::clone(&self.inner).try_lock_owned().ok()
    }

    /// True while a holder exists.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.inner.try_lock().is_err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_holder() {
        let guard = CycleGuard::new();
        let clone = guard.clone();

        let permit = guard.try_acquire();
        assert!(permit.is_some());
        assert!(clone.is_busy());
        assert!(clone.try_acquire().is_none());

        drop(permit);
        assert!(!guard.is_busy());
        assert!(clone.try_acquire().is_some());
    }
}
