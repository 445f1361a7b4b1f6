//! Animation frame scheduling with cancellable handles.

/// Identifies one requested frame. Handles increase monotonically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FrameHandle(pub u64);

/// Tracks the single outstanding frame request.
///
/// Only the most recently requested handle may run; anything else is stale.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    last: u64,
    pending: Option<FrameHandle>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a fresh handle, superseding any pending one.
    pub fn request(&mut self) -> FrameHandle {
        self.last += 1;
        let handle = FrameHandle(self.last);
        self.pending = Some(handle);
        handle
    }

    /// Consume `handle` if it is the pending one.
    pub fn take(&mut self, handle: FrameHandle) -> bool {
        if self.pending == Some(handle) {
            self.pending = None;
            true
        } else {
            false
        }
    }

    /// Cancel the pending handle, returning it.
    pub fn cancel(&mut self) -> Option<FrameHandle> {
        self.pending.take()
    }

    pub fn pending(&self) -> Option<FrameHandle> {
        self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_monotonic() {
        let mut frames = FrameScheduler::new();
        let a = frames.request();
        let b = frames.request();
        let c = frames.request();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_only_pending_handle_runs() {
        let mut frames = FrameScheduler::new();
        let stale = frames.request();
        let current = frames.request();
        assert!(!frames.take(stale));
        assert!(frames.take(current));
        // A handle runs at most once.
        assert!(!frames.take(current));
    }

    #[test]
    fn test_cancelled_handle_is_ignored() {
        let mut frames = FrameScheduler::new();
        let handle = frames.request();
        assert_eq!(frames.cancel(), Some(handle));
        assert!(!frames.take(handle));
        assert_eq!(frames.pending(), None);
    }

    #[test]
    fn test_handles_keep_increasing_after_cancel() {
        let mut frames = FrameScheduler::new();
        let first = frames.request();
        frames.cancel();
        let second = frames.request();
        assert!(second > first);
    }
}
