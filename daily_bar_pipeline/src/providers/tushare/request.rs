use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Serialize;

/// Body of a Tushare Pro call.
#[derive(Debug, Serialize)]
pub struct TushareRequest<'a> {
    pub api_name: &'a str,
    pub token: &'a str,
    pub params: IndexMap<&'static str, String>,
    /// Comma-separated column list; empty selects the endpoint defaults.
    pub fields: &'a str,
}

/// Tushare dates are `YYYYMMDD` strings.
pub fn vendor_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}
