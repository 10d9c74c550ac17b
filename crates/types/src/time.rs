//! Simulated time.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Sub};

/// A point (or span) on the simulated time axis.
///
/// Simulated time is unit-less: the study decides whether it counts hours,
/// days or cycles. Values are totally ordered with [`f64::total_cmp`] so they
/// can key ordered collections; `NaN` never enters the engine because every
/// occurrence law validates its parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimTime(f64);

impl SimTime {
    /// The origin of every replication.
    pub const ZERO: Self = SimTime(0.0);

    /// A time that is never reached.
    pub const NEVER: Self = SimTime(f64::INFINITY);

    /// Create a time from a raw value.
    pub fn new(value: f64) -> Self {
        SimTime(value)
    }

    /// Raw value.
    pub fn as_f64(self) -> f64 {
        self.0
    }

    /// Whether this time is finite.
    pub fn is_finite(self) -> bool {
        self.0.is_finite()
    }

    /// Span between `earlier` and `self`, clamped at zero.
    pub fn saturating_sub(self, earlier: SimTime) -> SimTime {
        SimTime((self.0 - earlier.0).max(0.0))
    }

    /// The later of two times.
    pub fn max(self, other: SimTime) -> SimTime {
        if self >= other {
            self
        } else {
            other
        }
    }

    /// The earlier of two times.
    pub fn min(self, other: SimTime) -> SimTime {
        if self <= other {
            self
        } else {
            other
        }
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Add for SimTime {
    type Output = SimTime;

    fn add(self, rhs: SimTime) -> SimTime {
        SimTime(self.0 + rhs.0)
    }
}

impl Sub for SimTime {
    type Output = SimTime;

    fn sub(self, rhs: SimTime) -> SimTime {
        SimTime(self.0 - rhs.0)
    }
}

impl From<f64> for SimTime {
    fn from(value: f64) -> Self {
        SimTime(value)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_infinite() {
            write!(f, "never")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        let a = SimTime::new(1.0);
        let b = SimTime::new(2.5);
        assert!(a < b);
        assert!(b < SimTime::NEVER);
        assert_eq!(a.max(b), b);
        assert_eq!(a.min(b), a);
        assert_eq!(a + b, SimTime::new(3.5));
    }

    #[test]
    fn test_saturating_sub() {
        let a = SimTime::new(1.0);
        let b = SimTime::new(2.5);
        assert_eq!(b.saturating_sub(a), SimTime::new(1.5));
        assert_eq!(a.saturating_sub(b), SimTime::ZERO);
    }

    #[test]
    fn test_display_never() {
        assert_eq!(SimTime::NEVER.to_string(), "never");
        assert_eq!(SimTime::new(5.0).to_string(), "5");
    }
}
