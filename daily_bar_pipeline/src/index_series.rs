//! The index's own daily series as a `TIME_SERIES_DAILY`-shaped document.
//!
//! Unlike the constituent dataset this is a reference series: every day keeps
//! its full bar, newest first, prices with four decimals and volume in the
//! vendor's unit.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::{Map, Value, json, ser::PrettyFormatter};
use tracing::info;

use crate::{
    client::RetryingClient,
    errors::Error,
    models::{
        asset::AssetClass, basket::index_label, batch::Dataset, request_params::BarsRequestParams,
        window::DateSpan,
    },
    normalize::PriceFormat,
};

const INFORMATION: &str = "Daily Prices (open, high, low, close) and Volumes";
const PRICE_FORMAT: PriceFormat = PriceFormat::Fixed(4);

/// File name of the index series, e.g. `index_daily_sse_50.json`.
pub fn file_name(index_code: &str) -> String {
    format!("index_daily_{}.json", index_label(index_code))
}

/// Fetches the index's bars over `span` in one retried call.
pub async fn fetch(
    client: &RetryingClient,
    index_code: &str,
    span: DateSpan,
) -> Result<Dataset, Error> {
    let params = BarsRequestParams {
        symbols: vec![index_code.to_string()],
        start: span.start(),
        end: span.end(),
        asset_class: AssetClass::Index,
    };
    let label = format!("index_daily {index_code} {span}");
    let bars = client.request(&label, &params).await?;
    Ok(Dataset::from_bars(bars))
}

/// Builds the document, or `None` when there are no bars.
pub fn to_document(dataset: &Dataset, index_code: &str, time_zone: &str) -> Option<Value> {
    let last = dataset.bars().last()?;

    let mut series = Map::new();
    for bar in dataset.bars().iter().rev() {
        series.insert(
            bar.date.to_string(),
            json!({
                "1. open": PRICE_FORMAT.render(bar.open),
                "2. high": PRICE_FORMAT.render(bar.high),
                "3. low": PRICE_FORMAT.render(bar.low),
                "4. close": PRICE_FORMAT.render(bar.close),
                "5. volume": (bar.volume.trunc() as i64).to_string(),
            }),
        );
    }

    Some(json!({
        "Meta Data": {
            "1. Information": INFORMATION,
            "2. Symbol": index_code,
            "3. Last Refreshed": last.date.to_string(),
            "4. Output Size": "Compact",
            "5. Time Zone": time_zone,
        },
        "Time Series (Daily)": Value::Object(series),
    }))
}

/// Writes the document with four-space indentation into `dir`.
pub fn write_document(dir: &Path, index_code: &str, doc: &Value) -> Result<PathBuf, Error> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name(index_code));
    let mut out = BufWriter::new(File::create(&path)?);
    let mut ser = serde_json::Serializer::with_formatter(&mut out, PrettyFormatter::with_indent(b"    "));
    doc.serialize(&mut ser)?;
    out.flush()?;
    info!(path = %path.display(), "index series written");
    Ok(path)
}
