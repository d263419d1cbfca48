//! Tushare Pro (`api.tushare.pro`) provider.
//!
//! Tushare is a JSON-over-POST API: every call names an `api_name`, carries
//! the token and a flat parameter map, and answers with a `fields` + `items`
//! table. The `daily` endpoint is capped at 6000 rows per call, which is what
//! the window planner sizes against.

pub mod provider;
pub mod request;
pub mod response;

pub use provider::TushareProvider;

/// Environment variable holding the Tushare token.
pub const TOKEN_VAR: &str = "TUSHARE_TOKEN";

/// Rows the `daily` endpoint returns at most per call.
pub const MAX_ROWS_PER_CALL: u64 = 6000;

/// Tushare reports volume in lots (手) of 100 shares.
pub const SHARES_PER_LOT: f64 = 100.0;
