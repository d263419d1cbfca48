//! The persisted per-symbol output structure.

use std::collections::BTreeMap;

use chrono::NaiveDate;

/// One date's entry in a [`TimeSeriesRecord`].
///
/// Values are already rendered to text in the vendor's formatting profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DailyEntry {
    /// A closed trading day: every field is knowable.
    Full {
        buy_price: String,
        high: String,
        low: String,
        sell_price: String,
        volume: String,
    },
    /// The most recent day: only the opening price may be exposed.
    OpenOnly { buy_price: String },
}

impl DailyEntry {
    pub fn buy_price(&self) -> &str {
        match self {
            DailyEntry::Full { buy_price, .. } | DailyEntry::OpenOnly { buy_price } => buy_price,
        }
    }

    pub fn is_open_only(&self) -> bool {
        matches!(self, DailyEntry::OpenOnly { .. })
    }
}

/// A symbol's normalized daily series, keyed by date.
///
/// Invariant: the entry for `last_refreshed` (the greatest key) is
/// [`DailyEntry::OpenOnly`]; every earlier entry is [`DailyEntry::Full`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesRecord {
    pub symbol: String,
    pub last_refreshed: NaiveDate,
    pub entries: BTreeMap<NaiveDate, DailyEntry>,
}

impl TimeSeriesRecord {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
