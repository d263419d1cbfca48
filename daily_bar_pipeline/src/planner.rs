//! Splits a date span into vendor-sized fetch windows.
//!
//! A vendor that caps each response at `max_rows_per_call` rows returns at
//! most `symbols × days` rows for a window, so a window may span
//! `max(1, max_rows_per_call / symbols)` days. Windows are cut greedily from
//! the start of the span; the last one absorbs the remainder.

use chrono::Days;

use crate::{
    errors::Error,
    models::window::{DateSpan, Window},
};

/// Days one window may cover for the given basket size and row ceiling.
pub fn days_per_window(symbol_count: usize, max_rows_per_call: u64) -> Result<u64, Error> {
    if symbol_count == 0 {
        return Err(Error::InvalidInput("symbol basket is empty".to_string()));
    }
    if max_rows_per_call == 0 {
        return Err(Error::InvalidInput(
            "max_rows_per_call must be positive".to_string(),
        ));
    }
    Ok((max_rows_per_call / symbol_count as u64).max(1))
}

/// Plans the ordered, non-overlapping windows that exactly cover `span`.
pub fn plan(
    span: DateSpan,
    symbol_count: usize,
    max_rows_per_call: u64,
) -> Result<Vec<Window>, Error> {
    let step = days_per_window(symbol_count, max_rows_per_call)?;
    let capacity = span.days().div_ceil(step) as usize;
    let mut windows = Vec::with_capacity(capacity);

    let mut start = span.start();
    loop {
        let end = start
            .checked_add_days(Days::new(step - 1))
            .map_or(span.end(), |d| d.min(span.end()));
        let window = Window {
            start,
            end,
            expected_rows: 0,
        };
        windows.push(Window {
            expected_rows: window.days() * symbol_count as u64,
            ..window
        });

        match window.next_start() {
            Some(next) if end < span.end() => start = next,
            _ => break,
        }
    }
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn five_days_two_symbols_ceiling_four() {
        let span = DateSpan::new(d(2025, 1, 6), d(2025, 1, 10)).unwrap();
        let windows = plan(span, 2, 4).unwrap();
        let bounds: Vec<_> = windows.iter().map(|w| (w.start, w.end)).collect();
        assert_eq!(
            bounds,
            vec![
                (d(2025, 1, 6), d(2025, 1, 7)),
                (d(2025, 1, 8), d(2025, 1, 9)),
                (d(2025, 1, 10), d(2025, 1, 10)),
            ]
        );
        assert_eq!(
            windows.iter().map(|w| w.expected_rows).collect::<Vec<_>>(),
            vec![4, 4, 2]
        );
    }

    #[test]
    fn fifty_symbols_default_ceiling() {
        assert_eq!(days_per_window(50, 6000).unwrap(), 120);
        let span = DateSpan::new(d(2025, 1, 1), d(2025, 12, 31)).unwrap();
        let windows = plan(span, 50, 6000).unwrap();
        assert_eq!(windows.len(), 4);
        assert_eq!(windows[0].end, d(2025, 4, 30));
        assert_eq!(windows[3].start, d(2025, 12, 27));
    }

    #[test]
    fn ceiling_below_basket_size_still_moves_one_day() {
        assert_eq!(days_per_window(300, 100).unwrap(), 1);
    }

    #[test]
    fn unbounded_ceiling_is_one_window() {
        let span = DateSpan::new(d(2025, 1, 1), d(2025, 10, 16)).unwrap();
        let windows = plan(span, 50, u64::MAX).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!((windows[0].start, windows[0].end), (span.start(), span.end()));
        assert_eq!(windows[0].expected_rows, span.days() * 50);
    }

    #[test]
    fn single_day_span() {
        let span = DateSpan::new(d(2025, 3, 3), d(2025, 3, 3)).unwrap();
        let windows = plan(span, 10, 6000).unwrap();
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].days(), 1);
    }

    #[test]
    fn rejects_empty_basket_and_zero_ceiling() {
        let span = DateSpan::new(d(2025, 3, 3), d(2025, 3, 4)).unwrap();
        assert!(matches!(plan(span, 0, 6000), Err(Error::InvalidInput(_))));
        assert!(matches!(plan(span, 5, 0), Err(Error::InvalidInput(_))));
    }

    proptest! {
        #[test]
        fn windows_cover_span_exactly(
            start_offset in 0u64..3000,
            len in 0u64..800,
            symbols in 1usize..400,
            ceiling in 1u64..20_000,
        ) {
            let start = d(2015, 1, 1) + Days::new(start_offset);
            let end = start + Days::new(len);
            let span = DateSpan::new(start, end).unwrap();
            let windows = plan(span, symbols, ceiling).unwrap();
            let step = days_per_window(symbols, ceiling).unwrap();

            prop_assert!(step >= 1);
            prop_assert_eq!(windows.first().unwrap().start, start);
            prop_assert_eq!(windows.last().unwrap().end, end);
            for w in &windows {
                prop_assert!(w.start <= w.end);
                prop_assert!(w.days() <= step);
            }
            for pair in windows.windows(2) {
                prop_assert_eq!(pair[0].end + Days::new(1), pair[1].start);
                prop_assert_eq!(pair[0].days(), step);
            }
            let covered: u64 = windows.iter().map(|w| w.days()).sum();
            prop_assert_eq!(covered, span.days());
        }
    }
}
