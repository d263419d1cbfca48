use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{asset::AssetClass, window::Window};

/// Vendor-agnostic parameters for one daily-bars request.
///
/// This is the standard input of every
/// [`DataProvider`](crate::providers::DataProvider) implementation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BarsRequestParams {
    /// Symbols to request (e.g. `["600519.SH", "601318.SH"]`).
    pub symbols: Vec<String>,

    /// First trading day to include.
    pub start: NaiveDate,

    /// Last trading day to include (inclusive).
    pub end: NaiveDate,

    /// Routes the request to the equity or index endpoint.
    #[serde(default)]
    pub asset_class: AssetClass,
}

impl BarsRequestParams {
    /// Parameters for one planned equity window.
    pub fn for_window(window: &Window, symbols: &[String]) -> Self {
        Self {
            symbols: symbols.to_vec(),
            start: window.start,
            end: window.end,
            asset_class: AssetClass::Equity,
        }
    }
}
