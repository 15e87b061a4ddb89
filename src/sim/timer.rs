//! Cooperative wall-clock interval timers
//!
//! The simulation is single-threaded, so "timers" are deadlines polled by the
//! frame loop rather than callbacks scheduled with the host. Stopping a timer
//! clears its deadline, so nothing can fire after teardown.

/// A recurring deadline measured in milliseconds of wall-clock time
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalTimer {
    period_ms: f64,
    first_delay_ms: f64,
    next_due_ms: Option<f64>,
}

impl IntervalTimer {
    /// Timer whose first firing is one period after start
    pub fn new(period_ms: f64) -> Self {
        Self::with_first_delay(period_ms, period_ms)
    }

    /// Timer whose first firing is `first_delay_ms` after start
    pub fn with_first_delay(period_ms: f64, first_delay_ms: f64) -> Self {
        Self {
            period_ms,
            first_delay_ms,
            next_due_ms: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.next_due_ms.is_some()
    }

    pub fn period_ms(&self) -> f64 {
        self.period_ms
    }

    /// Arm the timer. Returns false (and keeps the existing deadline) if it
    /// was already running.
    pub fn start(&mut self, now_ms: f64) -> bool {
        if self.next_due_ms.is_some() {
            return false;
        }
        self.next_due_ms = Some(now_ms + self.first_delay_ms);
        true
    }

    /// Disarm the timer. Returns whether it was running.
    pub fn stop(&mut self) -> bool {
        self.next_due_ms.take().is_some()
    }

    /// Fire at most once if the deadline has passed.
    ///
    /// A timer that fell more than a full period behind (tab in background)
    /// skips the missed firings instead of bursting.
    pub fn poll(&mut self, now_ms: f64) -> bool {
        let Some(due) = self.next_due_ms else {
            return false;
        };
        if now_ms < due {
            return false;
        }
        let mut next = due + self.period_ms;
        if next <= now_ms {
            next = now_ms + self.period_ms;
        }
        self.next_due_ms = Some(next);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_on_schedule() {
        let mut timer = IntervalTimer::with_first_delay(2000.0, 1000.0);
        assert!(!timer.poll(5000.0)); // not started
        assert!(timer.start(0.0));
        assert!(!timer.poll(999.0));
        assert!(timer.poll(1000.0));
        assert!(!timer.poll(2500.0));
        assert!(timer.poll(3000.0));
        assert!(timer.poll(5000.0));
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut timer = IntervalTimer::new(100.0);
        assert!(timer.start(0.0));
        assert!(!timer.start(50.0));
        // Deadline from the first start is kept
        assert!(timer.poll(100.0));
    }

    #[test]
    fn test_stop_twice() {
        let mut timer = IntervalTimer::new(100.0);
        timer.start(0.0);
        assert!(timer.stop());
        assert!(!timer.stop());
        assert!(!timer.is_running());
        assert!(!timer.poll(1_000.0));
    }

    #[test]
    fn test_skips_missed_periods() {
        let mut timer = IntervalTimer::new(100.0);
        timer.start(0.0);
        assert!(timer.poll(1050.0));
        // One firing only; next deadline is a full period out
        assert!(!timer.poll(1100.0));
        assert!(timer.poll(1150.0));
    }
}
