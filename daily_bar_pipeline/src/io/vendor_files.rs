//! Raw per-symbol vendor documents on disk (`daily_prices_<SYMBOL>.json`).
//!
//! The Alpha Vantage download step stores each response untouched; the merge
//! step loads them back as bars so they go through the same normalization as
//! every other source.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    errors::Error,
    models::bar::Bar,
    providers::alpha_vantage::response::DailySeriesResponse,
};

const PREFIX: &str = "daily_prices_";
const EXTENSION: &str = "json";

/// Bars loaded from one vendor file.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorSeries {
    pub symbol: String,
    pub path: PathBuf,
    pub bars: Vec<Bar>,
}

#[derive(Debug, Clone)]
pub struct VendorFileStore {
    dir: PathBuf,
}

impl VendorFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{PREFIX}{symbol}.{EXTENSION}"))
    }

    /// Stores a vendor document pretty-printed, replacing any earlier copy.
    pub fn save(&self, symbol: &str, doc: &Value) -> Result<PathBuf, Error> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(symbol);
        fs::write(&path, serde_json::to_string_pretty(doc)?)?;
        debug!(symbol, path = %path.display(), "vendor document saved");
        Ok(path)
    }

    /// Loads every `daily_prices_*.json` file in name order.
    ///
    /// Files that are not a usable daily series (quota notices, truncated
    /// downloads) are skipped with a warning. A missing directory yields
    /// nothing.
    pub fn load_all(&self) -> Result<Vec<VendorSeries>, Error> {
        if !self.dir.is_dir() {
            warn!(dir = %self.dir.display(), "vendor directory not found");
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| is_vendor_file(p))
            .collect();
        paths.sort();

        let mut loaded = Vec::with_capacity(paths.len());
        for path in paths {
            let doc: Value = match serde_json::from_slice(&fs::read(&path)?) {
                Ok(doc) => doc,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "not valid JSON, skipped");
                    continue;
                }
            };
            let series = DailySeriesResponse::from_value(doc).and_then(|resp| {
                let bars = resp.to_bars()?;
                Ok((resp.meta.symbol, bars))
            });
            match series {
                Ok((symbol, bars)) => loaded.push(VendorSeries { symbol, path, bars }),
                Err(e) => warn!(path = %path.display(), error = %e, "unusable vendor file, skipped"),
            }
        }
        Ok(loaded)
    }
}

fn is_vendor_file(path: &Path) -> bool {
    let name_ok = path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(PREFIX));
    name_ok && path.extension().is_some_and(|e| e == EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(symbol: &str) -> Value {
        json!({
            "Meta Data": {"2. Symbol": symbol, "3. Last Refreshed": "2025-10-17"},
            "Time Series (Daily)": {
                "2025-10-17": {"1. open": "10.0000", "2. high": "11.0000", "3. low": "9.0000", "4. close": "10.5000", "5. volume": "1000"}
            }
        })
    }

    #[test]
    fn saves_and_loads_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = VendorFileStore::new(dir.path().join("A_stock_data"));

        store.save("601318.SHH", &document("601318.SHH")).unwrap();
        store.save("600519.SHH", &document("600519.SHH")).unwrap();
        fs::write(store.dir().join("notes.json"), "{}").unwrap();

        let loaded = store.load_all().unwrap();
        let symbols: Vec<_> = loaded.iter().map(|s| s.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["600519.SHH", "601318.SHH"]);
        assert_eq!(loaded[0].bars[0].close, 10.5);
        assert_eq!(
            loaded[0].path.file_name().unwrap(),
            "daily_prices_600519.SHH.json"
        );
    }

    #[test]
    fn notice_documents_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let store = VendorFileStore::new(dir.path());
        store
            .save("600036.SHH", &json!({"Information": "rate limit reached"}))
            .unwrap();
        store.save("600519.SHH", &document("600519.SHH")).unwrap();

        let loaded = store.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].symbol, "600519.SHH");
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = VendorFileStore::new(dir.path().join("absent"));
        assert!(store.load_all().unwrap().is_empty());
    }
}
