//! The intermediate CSV: every aggregated bar, one row each, in dataset
//! order. Volume stays in vendor units.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use snafu::ResultExt;
use tracing::info;

use crate::{
    errors::Error,
    io::sink::{CsvSnafu, DataSink, IoSnafu, SinkError},
    models::{bar::Bar, basket::index_label, batch::Dataset},
};

/// File name of the intermediate CSV for an index, e.g.
/// `daily_prices_sse_50.csv`.
pub fn csv_file_name(index_code: &str) -> String {
    format!("daily_prices_{}.csv", index_label(index_code))
}

/// Writes a [`Dataset`] to a single CSV file.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DataSink for CsvSink {
    type Output = PathBuf;

    async fn write(&self, data: &Dataset) -> Result<PathBuf, SinkError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).context(IoSnafu)?;
        }
        let mut wtr = csv::Writer::from_path(&self.path).context(CsvSnafu)?;
        for bar in data.bars() {
            wtr.serialize(bar).context(CsvSnafu)?;
        }
        wtr.flush().context(IoSnafu)?;

        info!(path = %self.path.display(), rows = data.len(), "CSV written");
        Ok(self.path.clone())
    }
}

/// Reads an intermediate CSV back into a dataset.
pub fn read_dataset(path: impl AsRef<Path>) -> Result<Dataset, Error> {
    let mut rdr = csv::Reader::from_path(path.as_ref())?;
    let bars = rdr
        .deserialize::<Bar>()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Dataset::from_bars(bars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dataset() -> Dataset {
        let day = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let mut full = Bar::ohlcv("600519.SH", day, 1500.0, 1520.5, 1490.0, 1510.25, 31.2);
        full.pre_close = Some(1498.0);
        full.change = Some(12.25);
        full.pct_change = Some(0.8178);
        full.amount = Some(4712.5);
        Dataset::from_bars(vec![
            full,
            Bar::ohlcv("000001.SZ", day, 10.0, 10.2, 9.9, 10.1, 800.0),
        ])
    }

    #[test]
    fn file_name_uses_index_label() {
        assert_eq!(csv_file_name("000016.SH"), "daily_prices_sse_50.csv");
        assert_eq!(csv_file_name("000300.SH"), "daily_prices_000300_SH.csv");
    }

    #[tokio::test]
    async fn writes_header_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let sink = CsvSink::new(dir.path().join("data").join("daily_prices_sse_50.csv"));

        let path = sink.write(&dataset()).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "symbol,date,open,high,low,close,pre_close,change,pct_change,volume,amount"
        );
        assert_eq!(
            lines.next().unwrap(),
            "000001.SZ,2025-01-06,10.0,10.2,9.9,10.1,,,,800.0,"
        );

        assert_eq!(read_dataset(&path).unwrap(), dataset());
    }
}
