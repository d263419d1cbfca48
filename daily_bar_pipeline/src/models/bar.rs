//! Canonical in-memory representation of one trading day's observation.
//!
//! This struct is the standard output of every [`DataProvider`](crate::providers::DataProvider)
//! implementation and the row type of the tabular intermediate file.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single daily bar for one symbol.
///
/// Field order matches the columns of the intermediate CSV:
/// `symbol, date, open, high, low, close, pre_close, change, pct_change, volume, amount`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Exchange-qualified ticker, e.g. `600519.SH`.
    pub symbol: String,

    /// Trading day (exchange calendar date, no time component).
    pub date: NaiveDate,

    /// Opening price.
    pub open: f64,

    /// Highest price of the day.
    pub high: f64,

    /// Lowest price of the day.
    pub low: f64,

    /// Closing price.
    pub close: f64,

    /// Previous close. Not all vendors supply this.
    pub pre_close: Option<f64>,

    /// Absolute change against the previous close. Not all vendors supply this.
    pub change: Option<f64>,

    /// Percentage change against the previous close. Not all vendors supply this.
    pub pct_change: Option<f64>,

    /// Volume in the vendor's native unit (shares, or lots for Tushare).
    pub volume: f64,

    /// Turnover amount. Not all vendors supply this.
    pub amount: Option<f64>,
}

impl Bar {
    /// Builds a bar with only the mandatory OHLCV fields set.
    pub fn ohlcv(
        symbol: impl Into<String>,
        date: NaiveDate,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            date,
            open,
            high,
            low,
            close,
            pre_close: None,
            change: None,
            pct_change: None,
            volume,
            amount: None,
        }
    }

    /// Returns `true` when every price is finite and the volume is a finite,
    /// non-negative number.
    pub fn is_well_formed(&self) -> bool {
        [self.open, self.high, self.low, self.close]
            .iter()
            .all(|v| v.is_finite())
            && self.volume.is_finite()
            && self.volume >= 0.0
    }
}
