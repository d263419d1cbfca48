use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    models::bar::Bar,
    providers::{ApiSnafu, InternalSnafu, ProviderError, RateLimitedSnafu},
};

/// Section holding the daily series in a `TIME_SERIES_DAILY` document.
pub const SERIES_KEY: &str = "Time Series (Daily)";

#[derive(Deserialize, Debug)]
pub struct MetaData {
    #[serde(rename = "2. Symbol")]
    pub symbol: String,
    #[serde(rename = "3. Last Refreshed", default)]
    pub last_refreshed: Option<String>,
}

/// One day's values, all strings on the wire.
#[derive(Deserialize, Debug)]
pub struct DailyValues {
    #[serde(rename = "1. open")]
    pub open: String,
    #[serde(rename = "2. high")]
    pub high: String,
    #[serde(rename = "3. low")]
    pub low: String,
    #[serde(rename = "4. close")]
    pub close: String,
    #[serde(rename = "5. volume")]
    pub volume: String,
}

#[derive(Deserialize, Debug)]
pub struct DailySeriesResponse {
    #[serde(rename = "Meta Data")]
    pub meta: MetaData,
    #[serde(rename = "Time Series (Daily)")]
    pub series: IndexMap<String, DailyValues>,
}

/// Rejects the in-band error documents Alpha Vantage answers with a 200.
pub fn check_notice(doc: &Value) -> Result<(), ProviderError> {
    for key in ["Note", "Information"] {
        if let Some(text) = doc.get(key) {
            return RateLimitedSnafu {
                message: text.as_str().unwrap_or_default().to_string(),
            }
            .fail();
        }
    }
    if let Some(text) = doc.get("Error Message") {
        return ApiSnafu {
            message: text.as_str().unwrap_or_default().to_string(),
        }
        .fail();
    }
    Ok(())
}

fn parse_number(raw: &str, field: &str, date: &str) -> Result<f64, ProviderError> {
    raw.trim().parse::<f64>().map_err(|e| {
        InternalSnafu {
            message: format!("bad {field} {raw:?} on {date}: {e}"),
        }
        .build()
    })
}

impl DailySeriesResponse {
    pub fn from_value(doc: Value) -> Result<Self, ProviderError> {
        check_notice(&doc)?;
        serde_json::from_value(doc).map_err(|e| {
            InternalSnafu {
                message: format!("unexpected TIME_SERIES_DAILY document: {e}"),
            }
            .build()
        })
    }

    /// Decodes the series into bars for `meta.symbol`, in document order.
    ///
    /// Days with a partial entry (no high/low/close) are not representable
    /// here and fail the whole document.
    pub fn to_bars(&self) -> Result<Vec<Bar>, ProviderError> {
        self.series
            .iter()
            .map(|(date, v)| {
                let day = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|e| {
                    InternalSnafu {
                        message: format!("bad date key {date:?}: {e}"),
                    }
                    .build()
                })?;
                Ok(Bar::ohlcv(
                    self.meta.symbol.clone(),
                    day,
                    parse_number(&v.open, "open", date)?,
                    parse_number(&v.high, "high", date)?,
                    parse_number(&v.low, "low", date)?,
                    parse_number(&v.close, "close", date)?,
                    parse_number(&v.volume, "volume", date)?,
                ))
            })
            .collect()
    }
}
