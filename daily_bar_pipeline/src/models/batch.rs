//! Per-window vendor results and the aggregated dataset.

use crate::models::{bar::Bar, window::Window};

/// The bars one vendor call returned for one window, in vendor order.
///
/// An empty or short batch is not a failure.
#[derive(Debug, Clone, PartialEq)]
pub struct RawBatch {
    pub window: Window,
    pub bars: Vec<Bar>,
}

impl RawBatch {
    pub fn new(window: Window, bars: Vec<Bar>) -> Self {
        Self { window, bars }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}

/// All bars of a run, unique per `(symbol, date)` and sorted by
/// `(date, symbol)`. Only [`aggregate`](crate::aggregate::aggregate) and
/// [`Dataset::from_bars`] construct it, so the ordering always holds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    bars: Vec<Bar>,
}

impl Dataset {
    /// Sorts and deduplicates arbitrary bars. Later duplicates replace
    /// earlier ones.
    pub fn from_bars(bars: impl IntoIterator<Item = Bar>) -> Self {
        crate::aggregate::aggregate_bars(bars)
    }

    pub(crate) fn from_sorted_unique(bars: Vec<Bar>) -> Self {
        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }
}
