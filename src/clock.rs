//! Wall-clock minutes and wrap-aware activity spans.
//!
//! Activity times are stored in the ontology as `HH:MM` literals. A
//! [`DayMinute`] is a minute offset into one day; a [`DaySpan`] is a
//! half-open `[start, stop)` interval that may wrap past midnight.

use std::fmt;

use crate::error::{MetricError, MetricResult};

/// Minutes in one day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A wall-clock time as minutes since midnight, always in `0..1440`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct DayMinute(u32);

impl DayMinute {
    pub const MIDNIGHT: DayMinute = DayMinute(0);

    /// Parse an `HH:MM` literal. Hours must be below 24, minutes below 60.
    pub fn parse(value: &str) -> MetricResult<Self> {
        let bad = || MetricError::BadTime {
            value: value.to_string(),
        };
        let (h, m) = value.trim().split_once(':').ok_or_else(bad)?;
        let hours: u32 = h.parse().map_err(|_| bad())?;
        let minutes: u32 = m.parse().map_err(|_| bad())?;
        if hours >= 24 || minutes >= 60 {
            return Err(bad());
        }
        Ok(Self(hours * 60 + minutes))
    }

    /// Minutes since midnight.
    pub fn minute(self) -> u32 {
        self.0
    }

    /// Add a duration in minutes, wrapping past midnight.
    pub fn wrapping_add(self, minutes: u32) -> Self {
        Self((self.0 + minutes) % MINUTES_PER_DAY)
    }
}

impl fmt::Display for DayMinute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// Parse an `HH:MM` duration literal into total minutes (`"23:59"` → 1439).
pub fn parse_duration(value: &str) -> MetricResult<u32> {
    DayMinute::parse(value).map(DayMinute::minute)
}

/// A half-open activity interval `[start, stop)` over one day.
///
/// When the duration carries the interval past midnight, the span wraps:
/// `start = 22:00, duration = 04:00` is active for minutes `>= 1320` and
/// minutes `< 120`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySpan {
    start: DayMinute,
    duration: u32,
}

impl DaySpan {
    pub fn new(start: DayMinute, duration_minutes: u32) -> Self {
        Self {
            start,
            duration: duration_minutes.min(MINUTES_PER_DAY),
        }
    }

    pub fn start(&self) -> DayMinute {
        self.start
    }

    /// Stop time, normalized modulo one day.
    pub fn stop(&self) -> DayMinute {
        self.start.wrapping_add(self.duration)
    }

    /// Whether the given minute offset falls within the span, wrap-aware.
    pub fn contains(&self, minute: u32) -> bool {
        if self.duration == 0 {
            return false;
        }
        if self.duration >= MINUTES_PER_DAY {
            return true;
        }
        let start = self.start.minute();
        let stop = self.stop().minute();
        if start < stop {
            minute >= start && minute < stop
        } else {
            minute >= start || minute < stop
        }
    }
}
