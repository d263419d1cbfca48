//! Alpha Vantage `TIME_SERIES_DAILY` provider.
//!
//! Alpha Vantage serves one symbol per call and signals quota exhaustion
//! inside a 200 response (`Note` / `Information` keys), so both are mapped to
//! [`ProviderError::RateLimited`](crate::providers::ProviderError::RateLimited).
//! Shanghai listings use the vendor-internal `.SHH` suffix.

pub mod provider;
pub mod response;

use serde::{Deserialize, Serialize};

pub use provider::AlphaVantageProvider;

/// Environment variable holding the Alpha Vantage API key.
pub const API_KEY_VAR: &str = "ALPHAVANTAGE_API_KEY";

/// How much history one call returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputSize {
    /// The latest 100 trading days.
    #[default]
    Compact,
    /// The full history.
    Full,
}

impl OutputSize {
    /// Query-string value.
    pub fn as_param(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }

    /// Label used in dataset headers.
    pub fn label(&self) -> &'static str {
        match self {
            OutputSize::Compact => "Compact",
            OutputSize::Full => "Full",
        }
    }
}
