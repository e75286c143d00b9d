//! Timer-based coalescing: a pending value with a deadline.
//!
//! Every `push` replaces the pending value and moves the deadline to
//! `now + window`; `poll` hands the value out once the deadline has passed
//! with no further input. Time is a host-supplied millisecond timestamp.

#[derive(Debug)]
pub struct Debouncer<T> {
    window: f64,
    deadline: Option<f64>,
    pending: Option<T>,
}

impl<T> Debouncer<T> {
    pub fn new(window_ms: f64) -> Self {
        Self {
            window: window_ms.max(0.0),
            deadline: None,
            pending: None,
        }
    }

    pub fn push(&mut self, now: f64, value: T) {
        self.pending = Some(value);
        self.deadline = Some(now + self.window);
    }

    /// Take the pending value if its quiet period has elapsed.
    pub fn poll(&mut self, now: f64) -> Option<T> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                self.pending.take()
            }
            _ => None,
        }
    }

    /// Take the pending value immediately, regardless of the deadline.
    pub fn flush(&mut self) -> Option<T> {
        self.deadline = None;
        self.pending.take()
    }

    /// Drop the pending value. Returns whether one was dropped.
    pub fn cancel(&mut self) -> bool {
        self.deadline = None;
        self.pending.take().is_some()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<f64> {
        self.deadline
    }

    pub fn window(&self) -> f64 {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_quiet_period() {
        let mut d = Debouncer::new(500.0);
        d.push(0.0, 1);
        assert_eq!(d.poll(499.0), None);
        assert_eq!(d.poll(500.0), Some(1));
        assert_eq!(d.poll(2000.0), None);
    }

    #[test]
    fn new_input_resets_deadline_and_replaces_value() {
        let mut d = Debouncer::new(500.0);
        d.push(0.0, "a");
        d.push(300.0, "b");
        d.push(600.0, "c");
        assert_eq!(d.poll(900.0), None);
        assert_eq!(d.deadline(), Some(1100.0));
        assert_eq!(d.poll(1100.0), Some("c"));
        assert!(!d.is_pending());
    }

    #[test]
    fn cancel_drops_pending() {
        let mut d = Debouncer::new(100.0);
        d.push(0.0, ());
        assert!(d.cancel());
        assert!(!d.cancel());
        assert_eq!(d.poll(1000.0), None);
    }

    #[test]
    fn flush_ignores_deadline() {
        let mut d = Debouncer::new(100.0);
        d.push(0.0, 7);
        assert_eq!(d.flush(), Some(7));
        assert_eq!(d.deadline(), None);
    }
}
