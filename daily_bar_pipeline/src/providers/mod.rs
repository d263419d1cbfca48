//! Provider abstraction for daily market data vendors.
//!
//! This module defines the [`DataProvider`] trait, the unified interface for
//! fetching daily bars from any vendor (Tushare, Alpha Vantage, ...). Each
//! concrete provider handles its own wire format and maps vendor failures
//! onto [`ProviderError`].
//!
//! The trait is async and object safe, so the runtime can pick a vendor from
//! configuration through [`registry::build_provider`].
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use daily_bar_pipeline::models::{bar::Bar, request_params::BarsRequestParams};
//! use daily_bar_pipeline::providers::{DataProvider, ProviderError};
//!
//! struct MyProvider;
//!
//! #[async_trait]
//! impl DataProvider for MyProvider {
//!     async fn fetch_bars(&self, _params: &BarsRequestParams) -> Result<Vec<Bar>, ProviderError> {
//!         Ok(vec![])
//!     }
//! }
//! ```

pub mod alpha_vantage;
pub mod registry;
pub mod tushare;

use async_trait::async_trait;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

use crate::models::{bar::Bar, request_params::BarsRequestParams, window::DateSpan};

/// Trait for fetching daily bars from a market data vendor.
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Fetches the daily bars for every requested symbol inside
    /// `[params.start, params.end]`.
    ///
    /// An empty result is not an error: the vendor may legitimately have no
    /// rows for a window (holidays, suspensions).
    async fn fetch_bars(&self, params: &BarsRequestParams) -> Result<Vec<Bar>, ProviderError>;

    /// Lists the constituents of `index_code` over `span`.
    ///
    /// Vendors without a membership endpoint return an empty list, which
    /// sends the caller to its fallback basket.
    async fn fetch_constituents(
        &self,
        _index_code: &str,
        _span: DateSpan,
    ) -> Result<Vec<String>, ProviderError> {
        Ok(Vec::new())
    }
}

/// Errors that can occur during the creation of a provider instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing credential: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within a `DataProvider` implementation.
///
/// Every variant is retried by the retrying client; the distinction only
/// matters for diagnostics (see [`ProviderError::is_network`]).
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The provider's API returned a specific error message (e.g., invalid token).
    #[snafu(display("API error: {message}"))]
    Api {
        message: String,
        backtrace: Backtrace,
    },

    /// The vendor refused the call because a quota was hit.
    #[snafu(display("Rate limited: {message}"))]
    RateLimited {
        message: String,
        backtrace: Backtrace,
    },

    /// The request parameters were invalid for this specific provider.
    #[snafu(display("Invalid parameters for provider: {message}"))]
    Validation {
        message: String,
        backtrace: Backtrace,
    },

    /// The payload did not have the shape the provider expects.
    #[snafu(display("Internal provider error: {message}"))]
    Internal {
        message: String,
        backtrace: Backtrace,
    },
}

impl ProviderError {
    /// Whether the failure looks like a network fault (timeout, refused or
    /// reset connection) rather than an application-level error. Vendors that
    /// wrap their own timeouts in an API message are recognised by text.
    pub fn is_network(&self) -> bool {
        match self {
            ProviderError::Reqwest { source, .. } => {
                source.is_timeout() || source.is_connect() || source.is_request()
            }
            ProviderError::Api { message, .. } => {
                let lower = message.to_lowercase();
                lower.contains("timeout") || lower.contains("timed out")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use snafu::OptionExt;

    use crate::models::asset::AssetClass;

    struct TushareLike;
    struct AlphaVantageLike;

    #[async_trait]
    impl DataProvider for TushareLike {
        async fn fetch_bars(&self, params: &BarsRequestParams) -> Result<Vec<Bar>, ProviderError> {
            let symbol = params.symbols.first().context(ValidationSnafu {
                message: "no symbols",
            })?;
            Ok(vec![Bar::ohlcv(symbol.clone(), params.start, 1.0, 1.0, 1.0, 1.0, 0.0)])
        }

        async fn fetch_constituents(
            &self,
            _index_code: &str,
            _span: DateSpan,
        ) -> Result<Vec<String>, ProviderError> {
            Ok(vec!["600519.SH".to_string()])
        }
    }

    #[async_trait]
    impl DataProvider for AlphaVantageLike {
        async fn fetch_bars(&self, _params: &BarsRequestParams) -> Result<Vec<Bar>, ProviderError> {
            Ok(vec![])
        }
    }

    fn get_provider(name: &str) -> Box<dyn DataProvider> {
        if name == "tushare" {
            Box::new(TushareLike)
        } else {
            Box::new(AlphaVantageLike)
        }
    }

    #[tokio::test]
    async fn constituents_default_to_empty() {
        let day = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let span = DateSpan::new(day, day).unwrap();

        let with_membership = get_provider("tushare");
        assert_eq!(
            with_membership.fetch_constituents("000016.SH", span).await.unwrap(),
            vec!["600519.SH"]
        );

        let without = get_provider("alpha_vantage");
        assert!(without.fetch_constituents("000016.SH", span).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dynamic_dispatch_fetches_bars() {
        let day = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let params = BarsRequestParams {
            symbols: vec!["600519.SH".into()],
            start: day,
            end: day,
            asset_class: AssetClass::Equity,
        };
        let bars = get_provider("tushare").fetch_bars(&params).await.unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].symbol, "600519.SH");
    }

    #[test]
    fn api_timeout_text_counts_as_network() {
        let err = ApiSnafu {
            message: "Read timed out. (read timeout=120)",
        }
        .build();
        assert!(err.is_network());

        let err = ApiSnafu {
            message: "token invalid",
        }
        .build();
        assert!(!err.is_network());
        assert_eq!(err.to_string(), "API error: token invalid");
    }
}
