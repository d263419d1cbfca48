//! Writes normalized series as JSON Lines, one symbol per line.

use std::{
    collections::HashSet,
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::{
    errors::Error,
    models::series::{DailyEntry, TimeSeriesRecord},
    providers::alpha_vantage::response::SERIES_KEY,
};

pub const INFORMATION: &str = "Daily Prices (buy price, high, low, sell price) and Volumes";
pub const UNKNOWN_NAME: &str = "Unknown";

/// Rewrites a vendor-internal exchange suffix (`.SHH`) to the exchange's own
/// (`.SH`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuffixRewrite {
    pub from: String,
    pub to: String,
}

impl SuffixRewrite {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    fn apply(&self, symbol: &str) -> Option<String> {
        symbol
            .strip_suffix(self.from.as_str())
            .map(|stem| format!("{stem}{}", self.to))
    }
}

/// Key layout of the written lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderStyle {
    /// `"Symbol"`, `"LastRefreshed"`, `"buy price"`, ...
    #[default]
    Plain,
    /// Vendor-native numbered keys: `"2. Symbol"`, `"1. buy price"`, ...
    Numbered,
}

struct Keys {
    information: &'static str,
    symbol: &'static str,
    name: &'static str,
    last_refreshed: &'static str,
    output_size: &'static str,
    time_zone: &'static str,
    buy_price: &'static str,
    high: &'static str,
    low: &'static str,
    sell_price: &'static str,
    volume: &'static str,
}

impl HeaderStyle {
    fn keys(self) -> Keys {
        match self {
            HeaderStyle::Plain => Keys {
                information: "Information",
                symbol: "Symbol",
                name: "Name",
                last_refreshed: "LastRefreshed",
                output_size: "OutputSize",
                time_zone: "TimeZone",
                buy_price: "buy price",
                high: "high",
                low: "low",
                sell_price: "sell price",
                volume: "volume",
            },
            HeaderStyle::Numbered => Keys {
                information: "1. Information",
                symbol: "2. Symbol",
                name: "2.1. Name",
                last_refreshed: "3. Last Refreshed",
                output_size: "4. Output Size",
                time_zone: "5. Time Zone",
                buy_price: "1. buy price",
                high: "2. high",
                low: "3. low",
                sell_price: "4. sell price",
                volume: "5. volume",
            },
        }
    }
}

/// A record queued for the merged file, with the header fields that are not
/// part of the series itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeEntry {
    pub record: TimeSeriesRecord,
    pub name: Option<String>,
    pub output_size: String,
}

impl MergeEntry {
    pub fn new(record: TimeSeriesRecord, name: Option<String>) -> Self {
        Self {
            record,
            name,
            output_size: "Full".to_string(),
        }
    }

    pub fn with_output_size(mut self, label: impl Into<String>) -> Self {
        self.output_size = label.into();
        self
    }
}

/// What a merge run wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub path: PathBuf,
    pub written: usize,
    pub skipped_not_allowed: usize,
    pub skipped_duplicate: usize,
}

#[derive(Debug, Clone)]
pub struct Merger {
    allow_list: Option<HashSet<String>>,
    rewrites: Vec<SuffixRewrite>,
    style: HeaderStyle,
    time_zone: String,
}

impl Default for Merger {
    fn default() -> Self {
        Self {
            allow_list: None,
            rewrites: vec![SuffixRewrite::new(".SHH", ".SH")],
            style: HeaderStyle::default(),
            time_zone: "Asia/Shanghai".to_string(),
        }
    }
}

impl Merger {
    pub fn new(rewrites: Vec<SuffixRewrite>, style: HeaderStyle, time_zone: impl Into<String>) -> Self {
        Self {
            allow_list: None,
            rewrites,
            style,
            time_zone: time_zone.into(),
        }
    }

    /// Restricts output to these symbols. Entries go through the same suffix
    /// rewrites as the records, so `600519.SHH` and `600519.SH` are the same
    /// member.
    pub fn with_allow_list<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = symbols
            .into_iter()
            .map(|s| self.normalize_symbol(s.as_ref().trim()))
            .collect();
        self.allow_list = Some(allowed);
        self
    }

    pub fn with_style(mut self, style: HeaderStyle) -> Self {
        self.style = style;
        self
    }

    /// Applies the first matching suffix rewrite.
    pub fn normalize_symbol(&self, symbol: &str) -> String {
        self.rewrites
            .iter()
            .find_map(|r| r.apply(symbol))
            .unwrap_or_else(|| symbol.to_string())
    }

    fn is_allowed(&self, symbol: &str) -> bool {
        self.allow_list
            .as_ref()
            .is_none_or(|allowed| allowed.contains(symbol))
    }

    /// Renders one entry as a JSON object. The symbol in the header is the
    /// rewritten one.
    pub fn render(&self, entry: &MergeEntry) -> Value {
        let keys = self.style.keys();
        let record = &entry.record;

        let mut meta = Map::new();
        meta.insert(keys.information.into(), INFORMATION.into());
        meta.insert(
            keys.symbol.into(),
            self.normalize_symbol(&record.symbol).into(),
        );
        meta.insert(
            keys.name.into(),
            entry.name.as_deref().unwrap_or(UNKNOWN_NAME).into(),
        );
        meta.insert(
            keys.last_refreshed.into(),
            record.last_refreshed.to_string().into(),
        );
        meta.insert(keys.output_size.into(), entry.output_size.clone().into());
        meta.insert(keys.time_zone.into(), self.time_zone.clone().into());

        let mut series = Map::new();
        for (date, daily) in &record.entries {
            let mut fields = Map::new();
            match daily {
                DailyEntry::Full {
                    buy_price,
                    high,
                    low,
                    sell_price,
                    volume,
                } => {
                    fields.insert(keys.buy_price.into(), buy_price.clone().into());
                    fields.insert(keys.high.into(), high.clone().into());
                    fields.insert(keys.low.into(), low.clone().into());
                    fields.insert(keys.sell_price.into(), sell_price.clone().into());
                    fields.insert(keys.volume.into(), volume.clone().into());
                }
                DailyEntry::OpenOnly { buy_price } => {
                    fields.insert(keys.buy_price.into(), buy_price.clone().into());
                }
            }
            series.insert(date.to_string(), Value::Object(fields));
        }

        let mut line = Map::new();
        line.insert("Meta Data".into(), Value::Object(meta));
        line.insert(SERIES_KEY.into(), Value::Object(series));
        Value::Object(line)
    }

    /// Rewrites `path` from scratch with one line per admitted entry.
    ///
    /// Entries are written in input order. A symbol seen twice (after suffix
    /// rewriting) keeps its first entry.
    pub fn write(
        &self,
        path: impl AsRef<Path>,
        entries: impl IntoIterator<Item = MergeEntry>,
    ) -> Result<MergeReport, Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let mut out = BufWriter::new(File::create(path)?);
        let mut report = MergeReport {
            path: path.to_path_buf(),
            ..MergeReport::default()
        };
        let mut seen = HashSet::new();

        for entry in entries {
            let symbol = self.normalize_symbol(&entry.record.symbol);
            if !self.is_allowed(&symbol) {
                debug!(%symbol, "not on the allow-list, skipped");
                report.skipped_not_allowed += 1;
                continue;
            }
            if !seen.insert(symbol.clone()) {
                warn!(%symbol, "symbol already merged from an earlier source, skipped");
                report.skipped_duplicate += 1;
                continue;
            }
            serde_json::to_writer(&mut out, &self.render(&entry))?;
            out.write_all(b"\n")?;
            report.written += 1;
        }
        out.flush()?;

        info!(
            path = %path.display(),
            written = report.written,
            skipped = report.skipped_not_allowed + report.skipped_duplicate,
            "merged dataset written"
        );
        Ok(report)
    }
}
