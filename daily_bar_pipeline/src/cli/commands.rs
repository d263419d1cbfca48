use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::providers::registry::VendorId;

#[derive(Parser)]
#[command(author, version, about = "Daily bar acquisition and dataset builder")]
pub struct Cli {
    /// Path to the pipeline config file (TOML). Built-in defaults apply when omitted.
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides shared by the commands that hit a vendor.
#[derive(Args, Debug, Clone, Default)]
pub struct SpanArgs {
    /// First day to fetch (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// Last day to fetch (YYYY-MM-DD); defaults to today on the exchange calendar
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Directory for every output file
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the basket's daily bars, write the CSV and the merged dataset
    Fetch {
        #[command(flatten)]
        span: SpanArgs,

        /// Vendor to fetch from (tushare, alpha_vantage)
        #[arg(long)]
        vendor: Option<VendorId>,

        /// Comma-separated basket; skips the constituent lookup (e.g. "600519.SH,601318.SH")
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,
    },

    /// Rebuild the merged dataset from an existing intermediate CSV
    Merge {
        /// Intermediate CSV; defaults to daily_prices_<index>.csv in the output directory
        #[arg(long, value_name = "FILE")]
        csv: Option<PathBuf>,

        /// Directory of downloaded Alpha Vantage files to merge in
        #[arg(long, value_name = "DIR")]
        extra_vendor_dir: Option<PathBuf>,

        /// Directory for the merged file
        #[arg(long, value_name = "DIR")]
        output_dir: Option<PathBuf>,
    },

    /// Fetch the index's own daily series as JSON
    FetchIndex {
        #[command(flatten)]
        span: SpanArgs,
    },

    /// Download raw Alpha Vantage TIME_SERIES_DAILY documents per symbol
    FetchAlphaVantage {
        /// Comma-separated symbols in Alpha Vantage notation (e.g. "600519.SHH")
        #[arg(long, value_delimiter = ',')]
        symbols: Vec<String>,

        /// Directory receiving daily_prices_<SYMBOL>.json
        #[arg(long, value_name = "DIR")]
        raw_dir: Option<PathBuf>,
    },
}
