use serde::{Deserialize, Serialize};

/// What kind of instrument a request targets. Vendors route the two kinds to
/// different endpoints (Tushare: `daily` vs `index_daily`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetClass {
    #[default]
    Equity,
    Index,
}
