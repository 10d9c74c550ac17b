//! Per-replication bookkeeping for indicator measures.

use crate::measure::Measure;
use relia_types::SimTime;

/// Follows one observed quantity through a replication.
///
/// The tracker is fed the observed value at `t = 0`, after every transition
/// firing and at every sampling instant, in non-decreasing time order. The
/// value is piecewise constant between observations.
#[derive(Debug, Clone)]
pub struct MeasureTracker {
    last_time: SimTime,
    last_value: f64,
    /// Whether the condition (value != 0) currently holds.
    holding: bool,
    sojourn: f64,
    occurrences: u64,
    had_value: bool,
}

impl MeasureTracker {
    /// Start tracking with the value observed at `t = 0`.
    pub fn new(initial: f64) -> Self {
        let holding = initial != 0.0;
        Self {
            last_time: SimTime::ZERO,
            last_value: initial,
            holding,
            sojourn: 0.0,
            occurrences: u64::from(holding),
            had_value: holding,
        }
    }

    /// Record the value observed at `now`.
    pub fn observe(&mut self, now: SimTime, value: f64) {
        debug_assert!(now >= self.last_time, "observation in the past");

        if self.holding {
            self.sojourn += now.saturating_sub(self.last_time).as_f64();
        }
        let holds = value != 0.0;
        if holds && !self.holding {
            self.occurrences += 1;
        }
        self.had_value |= holds;
        self.holding = holds;
        self.last_value = value;
        self.last_time = now;
    }

    /// Current value of a measure.
    pub fn measure(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Value => self.last_value,
            Measure::SojournTime => self.sojourn,
            Measure::NbOccurrences => self.occurrences as f64,
            Measure::HadValue => {
                if self.had_value {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(x: f64) -> SimTime {
        SimTime::new(x)
    }

    #[test]
    fn test_sojourn_accumulates_while_holding() {
        let mut tracker = MeasureTracker::new(0.0);
        tracker.observe(t(2.0), 1.0);
        tracker.observe(t(5.0), 0.0);
        tracker.observe(t(6.0), 1.0);
        tracker.observe(t(10.0), 1.0);

        assert_eq!(tracker.measure(Measure::SojournTime), 7.0);
        assert_eq!(tracker.measure(Measure::NbOccurrences), 2.0);
        assert_eq!(tracker.measure(Measure::HadValue), 1.0);
        assert_eq!(tracker.measure(Measure::Value), 1.0);
    }

    #[test]
    fn test_initially_true_counts_once() {
        let mut tracker = MeasureTracker::new(1.0);
        assert_eq!(tracker.measure(Measure::NbOccurrences), 1.0);
        tracker.observe(t(1.0), 1.0);
        assert_eq!(tracker.measure(Measure::NbOccurrences), 1.0);
        assert_eq!(tracker.measure(Measure::SojournTime), 1.0);
    }

    #[test]
    fn test_had_value_is_monotone() {
        let mut tracker = MeasureTracker::new(0.0);
        assert_eq!(tracker.measure(Measure::HadValue), 0.0);
        tracker.observe(t(1.0), 3.0);
        tracker.observe(t(2.0), 0.0);
        assert_eq!(tracker.measure(Measure::HadValue), 1.0);
        assert_eq!(tracker.measure(Measure::Value), 0.0);
    }
}
