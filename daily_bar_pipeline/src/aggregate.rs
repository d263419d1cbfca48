//! Concatenates per-window batches into one ordered dataset.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::models::{
    bar::Bar,
    batch::{Dataset, RawBatch},
};

/// Merges the batches of a run into a [`Dataset`] sorted by `(date, symbol)`.
///
/// Windows never overlap, so duplicates only appear when a vendor repeats a
/// row; the later copy wins. Empty batches contribute nothing.
pub fn aggregate(batches: Vec<RawBatch>) -> Dataset {
    let batch_count = batches.len();
    let dataset = aggregate_bars(batches.into_iter().flat_map(|b| b.bars));
    if dataset.is_empty() {
        warn!(batches = batch_count, "no rows in any batch");
    } else {
        debug!(batches = batch_count, rows = dataset.len(), "aggregated batches");
    }
    dataset
}

pub(crate) fn aggregate_bars(bars: impl IntoIterator<Item = Bar>) -> Dataset {
    let mut by_key: BTreeMap<(NaiveDate, String), Bar> = BTreeMap::new();
    let mut replaced = 0usize;
    for bar in bars {
        if by_key.insert((bar.date, bar.symbol.clone()), bar).is_some() {
            replaced += 1;
        }
    }
    if replaced > 0 {
        debug!(replaced, "dropped duplicate (symbol, date) rows");
    }
    Dataset::from_sorted_unique(by_key.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::window::Window;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn window(start: u32, end: u32) -> Window {
        Window {
            start: d(start),
            end: d(end),
            expected_rows: 0,
        }
    }

    fn bar(symbol: &str, day: u32, close: f64) -> Bar {
        Bar::ohlcv(symbol, d(day), close, close, close, close, 100.0)
    }

    #[test]
    fn orders_by_date_then_symbol() {
        let batches = vec![
            RawBatch::new(
                window(6, 7),
                vec![bar("601318.SH", 7, 1.0), bar("600519.SH", 6, 2.0), bar("601318.SH", 6, 3.0)],
            ),
            RawBatch::new(window(8, 9), vec![bar("600519.SH", 8, 4.0), bar("000001.SZ", 8, 5.0)]),
        ];

        let dataset = aggregate(batches);
        let keys: Vec<_> = dataset
            .bars()
            .iter()
            .map(|b| (b.date, b.symbol.as_str()))
            .collect();

        assert_eq!(
            keys,
            vec![
                (d(6), "600519.SH"),
                (d(6), "601318.SH"),
                (d(7), "601318.SH"),
                (d(8), "000001.SZ"),
                (d(8), "600519.SH"),
            ]
        );
    }

    #[test]
    fn later_duplicate_wins() {
        let dataset = Dataset::from_bars(vec![bar("600519.SH", 6, 1.0), bar("600519.SH", 6, 9.0)]);
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.bars()[0].close, 9.0);
    }

    #[test]
    fn empty_batches_give_empty_dataset() {
        let dataset = aggregate(vec![
            RawBatch::new(window(6, 7), vec![]),
            RawBatch::new(window(8, 9), vec![]),
        ]);
        assert!(dataset.is_empty());
        assert!(aggregate(vec![]).is_empty());
    }
}
