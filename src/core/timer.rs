//! Cooperative recurring timers driven by the scheduling tick.
//!
//! A timer never runs on its own: the owner advances it with the frame delta
//! and acts on the number of fires returned. Cancellation goes through a
//! shared [`CancelFlag`] that is checked at every advance, so a stopped timer
//! produces no further fires and leaves nothing half-done.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared cancellation flag for a timer or loop.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// A fresh, uncancelled flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// True once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Fires every `interval` seconds of accumulated tick time.
#[derive(Debug, Clone)]
pub struct RecurringTimer {
    interval: f32,
    elapsed: f32,
    cancel: CancelFlag,
}

impl RecurringTimer {
    /// Create a timer. Non-positive intervals are clamped to one millisecond.
    pub fn new(interval: f32) -> Self {
        Self {
            interval: interval.max(0.001),
            elapsed: 0.0,
            cancel: CancelFlag::new(),
        }
    }

    /// Handle that can stop this timer from elsewhere.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Stop the timer.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True if the timer was stopped.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Configured interval in seconds.
    pub const fn interval(&self) -> f32 {
        self.interval
    }

    /// Restart the current interval from zero.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    /// Advance by `delta` seconds and return how many times the timer fired.
    ///
    /// Runs in constant time for any delta; the count saturates at
    /// `u32::MAX`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn advance(&mut self, delta: f32) -> u32 {
        if self.is_cancelled() {
            return 0;
        }
        if delta.is_finite() {
            self.elapsed += delta.max(0.0);
        }
        if self.elapsed < self.interval {
            return 0;
        }
        let rest = self.elapsed % self.interval;
        let fires = ((self.elapsed - rest) / self.interval).round();
        self.elapsed = rest;
        fires as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_on_interval() {
        let mut timer = RecurringTimer::new(1.0);
        assert_eq!(timer.advance(0.5), 0);
        assert_eq!(timer.advance(0.5), 1);
        assert_eq!(timer.advance(2.25), 2);
        assert_eq!(timer.advance(0.75), 1);
    }

    #[test]
    fn test_cancel_stops_fires() {
        let mut timer = RecurringTimer::new(1.0);
        let flag = timer.cancel_flag();
        assert_eq!(timer.advance(0.9), 0);
        flag.cancel();
        assert!(timer.is_cancelled());
        assert_eq!(timer.advance(5.0), 0);
    }

    #[test]
    fn test_huge_delta_returns_promptly() {
        let mut timer = RecurringTimer::new(1.0);
        assert_eq!(timer.advance(1.0e9), 1_000_000_000);
        assert_eq!(timer.advance(0.5), 0);
        assert_eq!(timer.advance(0.5), 1);
    }

    #[test]
    fn test_fire_count_saturates() {
        let mut timer = RecurringTimer::new(0.001);
        assert_eq!(timer.advance(f32::MAX), u32::MAX);
        assert_eq!(timer.advance(f32::INFINITY), 0);
    }

    #[test]
    fn test_small_steps_match_accumulated_time() {
        let mut timer = RecurringTimer::new(0.25);
        let fires: u32 = (0..40).map(|_| timer.advance(0.125)).sum();
        assert_eq!(fires, 20);
    }

    #[test]
    fn test_reset_restarts_interval() {
        let mut timer = RecurringTimer::new(1.0);
        timer.advance(0.9);
        timer.reset();
        assert_eq!(timer.advance(0.5), 0);
        assert_eq!(timer.advance(0.5), 1);
    }
}
