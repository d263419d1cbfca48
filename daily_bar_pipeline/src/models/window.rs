//! Date spans and the fetch windows the planner cuts them into.

use std::fmt;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// An inclusive `[start, end]` range of calendar dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateSpan {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateSpan {
    /// Creates a span, rejecting `start > end` instead of swapping the bounds.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidInput(format!(
                "date span start {start} is after end {end}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Builds a span from two dates in either order.
    pub(crate) fn from_ordered(a: NaiveDate, b: NaiveDate) -> Self {
        Self {
            start: a.min(b),
            end: a.max(b),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of calendar days in the span, both ends included.
    pub fn days(&self) -> u64 {
        (self.end - self.start).num_days() as u64 + 1
    }
}

impl fmt::Display for DateSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.start, self.end)
    }
}

/// One planned vendor call: a contiguous date range plus the number of rows
/// it is expected to return (`days × symbols`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub expected_rows: u64,
}

impl Window {
    /// Number of calendar days covered, both ends included.
    pub fn days(&self) -> u64 {
        self.as_span().days()
    }

    /// The first day after this window, if it is representable.
    pub fn next_start(&self) -> Option<NaiveDate> {
        self.end.checked_add_days(Days::new(1))
    }

    pub fn as_span(&self) -> DateSpan {
        DateSpan {
            start: self.start,
            end: self.end,
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.as_span(), f)
    }
}
