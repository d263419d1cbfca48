//! Point-in-time normalization.
//!
//! A trading agent that reads the dataset on day `T` must not see anything
//! that is only known after the close of `T`. For every symbol the most
//! recent date is therefore reduced to its opening price; all earlier dates
//! carry the full bar. This holds per symbol, so a suspended stock whose
//! last row is older than everyone else's loses that row's close too.

use std::collections::{BTreeMap, btree_map::Entry};

use tracing::debug;

use crate::{
    models::{
        batch::Dataset,
        series::{DailyEntry, TimeSeriesRecord},
    },
    providers::tushare::SHARES_PER_LOT,
};

/// How prices are rendered to text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceFormat {
    /// Exactly this many fractional digits (`123.4500`).
    Fixed(usize),
    /// Shortest text that parses back to the same value, with at least one
    /// fractional digit (`12.3`, `10.0`).
    Shortest,
}

impl PriceFormat {
    pub fn render(&self, value: f64) -> String {
        match self {
            PriceFormat::Fixed(digits) => format!("{value:.digits$}"),
            PriceFormat::Shortest => {
                let text = value.to_string();
                if value.is_finite() && !text.contains('.') {
                    format!("{text}.0")
                } else {
                    text
                }
            }
        }
    }
}

/// Vendor-specific output formatting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VendorProfile {
    pub price_format: PriceFormat,
    /// Factor applied to the vendor's volume before truncation to an integer.
    pub volume_multiplier: f64,
}

impl VendorProfile {
    /// Tushare quotes volume in lots of 100 shares.
    pub fn tushare() -> Self {
        Self {
            price_format: PriceFormat::Shortest,
            volume_multiplier: SHARES_PER_LOT,
        }
    }

    pub fn alpha_vantage() -> Self {
        Self {
            price_format: PriceFormat::Fixed(4),
            volume_multiplier: 1.0,
        }
    }

    /// Volume in shares, truncated toward zero.
    pub fn render_volume(&self, volume: f64) -> String {
        format!("{}", (volume * self.volume_multiplier).trunc() as i64)
    }
}

/// Builds one [`TimeSeriesRecord`] per symbol, keyed by symbol.
pub fn normalize(dataset: &Dataset, profile: &VendorProfile) -> BTreeMap<String, TimeSeriesRecord> {
    let mut records: BTreeMap<String, TimeSeriesRecord> = BTreeMap::new();

    for bar in dataset.bars() {
        let entry = DailyEntry::Full {
            buy_price: profile.price_format.render(bar.open),
            high: profile.price_format.render(bar.high),
            low: profile.price_format.render(bar.low),
            sell_price: profile.price_format.render(bar.close),
            volume: profile.render_volume(bar.volume),
        };
        match records.entry(bar.symbol.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(TimeSeriesRecord {
                    symbol: bar.symbol.clone(),
                    last_refreshed: bar.date,
                    entries: BTreeMap::from([(bar.date, entry)]),
                });
            }
            Entry::Occupied(mut slot) => {
                let record = slot.get_mut();
                record.last_refreshed = record.last_refreshed.max(bar.date);
                record.entries.insert(bar.date, entry);
            }
        }
    }

    for record in records.values_mut() {
        if let Some(latest) = record.entries.get_mut(&record.last_refreshed) {
            *latest = DailyEntry::OpenOnly {
                buy_price: latest.buy_price().to_string(),
            };
        }
    }

    debug!(symbols = records.len(), "normalized dataset");
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::models::bar::Bar;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn latest_date_keeps_only_the_open() {
        let dataset = Dataset::from_bars(vec![
            Bar::ohlcv("600519.SH", d(6), 1500.0, 1520.5, 1490.0, 1510.25, 3120.0),
            Bar::ohlcv("600519.SH", d(7), 1511.0, 1530.0, 1500.0, 1525.0, 2800.0),
            Bar::ohlcv("600519.SH", d(8), 1526.5, 1540.0, 1520.0, 1535.0, 2900.0),
        ]);

        let records = normalize(&dataset, &VendorProfile::tushare());
        let record = &records["600519.SH"];

        assert_eq!(record.last_refreshed, d(8));
        assert_eq!(
            record.entries[&d(8)],
            DailyEntry::OpenOnly {
                buy_price: "1526.5".into()
            }
        );
        assert_eq!(
            record.entries[&d(6)],
            DailyEntry::Full {
                buy_price: "1500.0".into(),
                high: "1520.5".into(),
                low: "1490.0".into(),
                sell_price: "1510.25".into(),
                volume: "312000".into(),
            }
        );
        assert!(!record.entries[&d(7)].is_open_only());
    }

    #[test]
    fn latest_date_is_per_symbol() {
        let dataset = Dataset::from_bars(vec![
            Bar::ohlcv("000001.SZ", d(6), 10.0, 10.0, 10.0, 10.0, 1.0),
            Bar::ohlcv("000001.SZ", d(7), 11.0, 11.0, 11.0, 11.0, 1.0),
            Bar::ohlcv("600519.SH", d(6), 20.0, 20.0, 20.0, 20.0, 1.0),
        ]);

        let records = normalize(&dataset, &VendorProfile::tushare());

        assert!(records["000001.SZ"].entries[&d(7)].is_open_only());
        assert!(!records["000001.SZ"].entries[&d(6)].is_open_only());
        // the suspended symbol's only row is withheld as well
        assert_eq!(records["600519.SH"].len(), 1);
        assert!(records["600519.SH"].entries[&d(6)].is_open_only());
    }

    #[test]
    fn empty_dataset_gives_no_records() {
        assert!(normalize(&Dataset::default(), &VendorProfile::alpha_vantage()).is_empty());
    }

    #[test]
    fn price_formats() {
        assert_eq!(PriceFormat::Shortest.render(12.3), "12.3");
        assert_eq!(PriceFormat::Shortest.render(10.0), "10.0");
        assert_eq!(PriceFormat::Shortest.render(0.1 + 0.2), "0.30000000000000004");
        assert_eq!(PriceFormat::Fixed(4).render(12.3), "12.3000");
        assert_eq!(PriceFormat::Fixed(4).render(189.98769), "189.9877");
    }

    #[test]
    fn volume_is_truncated_after_scaling() {
        assert_eq!(VendorProfile::tushare().render_volume(1234.567), "123456");
        assert_eq!(VendorProfile::alpha_vantage().render_volume(98765.9), "98765");
        assert_eq!(VendorProfile::tushare().render_volume(0.0), "0");
    }
}
