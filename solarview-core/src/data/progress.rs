//! Progress reporting and cancellation for a running sync.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Progress callback for a year sync.
///
/// Called synchronously after every day fetch with a percentage in 0..=100.
pub trait SyncProgress {
    fn on_progress(&self, percent: u8);
}

impl<F> SyncProgress for F
where
    F: Fn(u8),
{
    fn on_progress(&self, percent: u8) {
        self(percent)
    }
}

/// Cooperative cancellation flag shared between a sync and its caller.
///
/// Cloning shares the flag. The engine checks it before every day and month
/// request.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// `round(100 * done / total)`, rounding halves up. An empty range is done.
pub fn percent(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let done = done.min(total) as u64;
    let total = total as u64;
    ((200 * done + total) / (2 * total)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn percent_rounds_to_nearest() {
        assert_eq!(percent(0, 3), 0);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(3, 3), 100);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(0, 0), 100);
    }

    #[test]
    fn closures_are_progress_sinks() {
        let seen = RefCell::new(Vec::new());
        let sink = |p: u8| seen.borrow_mut().push(p);
        sink.on_progress(10);
        sink.on_progress(20);
        assert_eq!(*seen.borrow(), vec![10, 20]);
    }

    #[test]
    fn cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let handle = token.clone();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
    }
}
