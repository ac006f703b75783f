//! Simulation time model.
//!
//! Time is an integer count of milliseconds since simulation start.  Scenario
//! files configure times in seconds; conversion truncates toward zero so that
//! `0.0015 s` becomes `1 ms`.  Integer time keeps comparisons exact.

use std::fmt;

use crate::{CoreError, CoreResult};

// ── SimTime ───────────────────────────────────────────────────────────────────

/// Absolute simulation time in whole milliseconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub i64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    #[inline]
    pub fn from_millis(ms: i64) -> Self {
        SimTime(ms)
    }

    /// Convert seconds to whole milliseconds, truncating toward zero.
    pub fn from_secs_truncated(secs: f64) -> CoreResult<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return Err(CoreError::InvalidTime(secs));
        }
        Ok(SimTime((secs * 1000.0) as i64))
    }

    #[inline]
    pub fn millis(self) -> i64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1000.0
    }
}

impl std::ops::Add<i64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: i64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// Fixed-cycle simulation clock.
///
/// The host scheduler advances it once per step; every component reads the
/// same `now()` during a step.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Milliseconds per simulation step.  Default: 100.
    pub cycle_time_ms: i64,
    current: SimTime,
}

impl SimClock {
    pub fn new(cycle_time_ms: i64) -> Self {
        Self { cycle_time_ms, current: SimTime::ZERO }
    }

    #[inline]
    pub fn now(&self) -> SimTime {
        self.current
    }

    /// Advance the clock by one cycle.
    #[inline]
    pub fn advance(&mut self) {
        self.current = self.current + self.cycle_time_ms;
    }

    /// Cycle length in seconds, as used by kinematic propagation.
    #[inline]
    pub fn cycle_secs(&self) -> f64 {
        self.cycle_time_ms as f64 / 1000.0
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(100)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (cycle {}ms)", self.current, self.cycle_time_ms)
    }
}
