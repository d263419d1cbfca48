//! Pipeline configuration: one TOML file, loaded once and passed explicitly.
//!
//! Every field has a default, so an empty file (or no file) describes the
//! standard run: SSE 50 constituents from Tushare since 2025-01-01, written
//! under `data/`. Credentials never live here; they come from the
//! environment (see [`crate::providers::tushare::TOKEN_VAR`] and
//! [`crate::providers::alpha_vantage::API_KEY_VAR`]).
//!
//! Entrypoints:
//! - Parse + validate from a TOML string: [`load_config_str`]
//! - Parse + validate from a file path: [`load_config_path`]

use std::{path::Path, path::PathBuf, time::Duration};

use chrono::{Datelike, Days, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::{
    errors::Error,
    merge::{HeaderStyle, Merger, SuffixRewrite},
    models::window::DateSpan,
    providers::{alpha_vantage::OutputSize, registry::VendorId, tushare::MAX_ROWS_PER_CALL},
    retry::RetryPolicy,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct PipelineConfig {
    /// Vendor used for constituents and daily bars.
    pub vendor: VendorId,
    /// Index whose constituents form the basket (`000016.SH` is the SSE 50).
    pub index_code: String,
    /// First day fetched.
    pub start_date: NaiveDate,
    /// Last day fetched; today in `time_zone` when absent.
    pub end_date: Option<NaiveDate>,
    /// IANA zone of the exchange calendar, also written into dataset headers.
    pub time_zone: String,
    /// Directory receiving every output file.
    pub output_dir: PathBuf,
    /// Constituent CSV used when the vendor returns no members.
    pub fallback_basket_csv: Option<PathBuf>,
    /// Explicit basket. When non-empty, the constituent lookup is skipped.
    pub symbols: Vec<String>,
    /// Row ceiling of one vendor response.
    pub max_rows_per_call: u64,
    pub retry: RetryCfg,
    pub merge: MergeCfg,
    pub alpha_vantage: AlphaVantageCfg,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            vendor: VendorId::default(),
            index_code: "000016.SH".to_string(),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
            end_date: None,
            time_zone: "Asia/Shanghai".to_string(),
            output_dir: PathBuf::from("data"),
            fallback_basket_csv: None,
            symbols: Vec::new(),
            max_rows_per_call: MAX_ROWS_PER_CALL,
            retry: RetryCfg::default(),
            merge: MergeCfg::default(),
            alpha_vantage: AlphaVantageCfg::default(),
        }
    }
}

/// Retry budget, backoff unit and pacing of vendor calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct RetryCfg {
    pub max_attempts: u32,
    /// Backoff unit; attempt `n` is followed by `n × base_delay_secs`.
    pub base_delay_secs: f64,
    pub request_timeout_secs: u64,
    /// Minimum gap between two successive window calls.
    pub inter_call_delay_secs: f64,
}

impl Default for RetryCfg {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_secs: 5.0,
            request_timeout_secs: 120,
            inter_call_delay_secs: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct MergeCfg {
    /// File name of the merged dataset, relative to `output_dir`.
    pub output_file: PathBuf,
    /// When present, only these symbols are written.
    pub allow_list: Option<Vec<String>>,
    pub suffix_rewrites: Vec<SuffixRewrite>,
    pub header_style: HeaderStyle,
    /// Directory of already-downloaded Alpha Vantage files to merge in.
    pub extra_vendor_dir: Option<PathBuf>,
    /// Constituent CSV used only for display names.
    pub name_csv: Option<PathBuf>,
}

impl Default for MergeCfg {
    fn default() -> Self {
        Self {
            output_file: PathBuf::from("merged.jsonl"),
            allow_list: None,
            suffix_rewrites: vec![SuffixRewrite::new(".SHH", ".SH")],
            header_style: HeaderStyle::default(),
            extra_vendor_dir: None,
            name_csv: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct AlphaVantageCfg {
    pub output_size: OutputSize,
    /// Free-tier keys allow 5.
    pub calls_per_minute: u32,
    /// Where raw `daily_prices_<SYMBOL>.json` responses are stored.
    pub raw_dir: PathBuf,
    /// Symbols to download, in the vendor's notation (`600519.SHH`).
    pub symbols: Vec<String>,
}

impl Default for AlphaVantageCfg {
    fn default() -> Self {
        Self {
            output_size: OutputSize::default(),
            calls_per_minute: 5,
            raw_dir: PathBuf::from("A_stock_data"),
            symbols: Vec::new(),
        }
    }
}

/// Parses and validates a configuration from TOML text.
pub fn load_config_str(toml_str: &str) -> Result<PipelineConfig, Error> {
    let config: PipelineConfig =
        toml::from_str(toml_str).map_err(|e| Error::Config(e.to_string()))?;
    config.validate()?;
    Ok(config)
}

/// Reads, parses and validates a configuration file.
pub fn load_config_path(path: impl AsRef<Path>) -> Result<PipelineConfig, Error> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
    load_config_str(&text)
}

/// The previous calendar month relative to `today`, the lookup period for
/// index constituents.
pub fn previous_month(today: NaiveDate) -> DateSpan {
    let first_of_this = today.with_day(1).unwrap_or(today);
    let last_of_prev = first_of_this
        .checked_sub_days(Days::new(1))
        .unwrap_or(first_of_this);
    let first_of_prev = last_of_prev.with_day(1).unwrap_or(last_of_prev);
    DateSpan::from_ordered(first_of_prev, last_of_prev)
}

impl PipelineConfig {
    /// Checks every value that would otherwise fail late in a run.
    pub fn validate(&self) -> Result<(), Error> {
        let invalid = |msg: String| Err(Error::InvalidInput(msg));

        if self.index_code.trim().is_empty() && self.symbols.is_empty() {
            return invalid("either index_code or symbols must be set".into());
        }
        if self.max_rows_per_call == 0 {
            return invalid("max_rows_per_call must be positive".into());
        }
        if self.retry.max_attempts == 0 {
            return invalid("retry.max_attempts must be at least 1".into());
        }
        for (name, secs) in [
            ("retry.base_delay_secs", self.retry.base_delay_secs),
            ("retry.inter_call_delay_secs", self.retry.inter_call_delay_secs),
        ] {
            if !secs.is_finite() || secs < 0.0 {
                return invalid(format!("{name} must be a non-negative number, got {secs}"));
            }
        }
        if self.retry.request_timeout_secs == 0 {
            return invalid("retry.request_timeout_secs must be positive".into());
        }
        if self.alpha_vantage.calls_per_minute == 0 {
            return invalid("alpha_vantage.calls_per_minute must be positive".into());
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return invalid(format!(
                    "end_date {end} is before start_date {}",
                    self.start_date
                ));
            }
        }
        self.tz()?;
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz, Error> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|e| Error::InvalidInput(format!("time_zone {:?}: {e}", self.time_zone)))
    }

    /// Today's date on the exchange calendar.
    pub fn today(&self) -> Result<NaiveDate, Error> {
        Ok(Utc::now().with_timezone(&self.tz()?).date_naive())
    }

    /// The fetch span: `start_date` through `end_date` (or today).
    pub fn span(&self) -> Result<DateSpan, Error> {
        let end = match self.end_date {
            Some(end) => end,
            None => self.today()?,
        };
        DateSpan::new(self.start_date, end)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_attempts,
            seconds(self.retry.base_delay_secs),
        )
    }

    pub fn inter_call_delay(&self) -> Duration {
        seconds(self.retry.inter_call_delay_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.retry.request_timeout_secs)
    }

    pub fn merged_path(&self) -> PathBuf {
        self.output_dir.join(&self.merge.output_file)
    }

    /// A merger configured from the `[merge]` table.
    pub fn merger(&self) -> Merger {
        let merger = Merger::new(
            self.merge.suffix_rewrites.clone(),
            self.merge.header_style,
            self.time_zone.clone(),
        );
        match &self.merge.allow_list {
            Some(allowed) => merger.with_allow_list(allowed),
            None => merger,
        }
    }
}

fn seconds(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs).unwrap_or_default()
}
