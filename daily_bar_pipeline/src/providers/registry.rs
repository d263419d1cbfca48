//! Closed set of supported vendors.

use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    config::PipelineConfig,
    normalize::VendorProfile,
    providers::{
        DataProvider, ProviderInitError, alpha_vantage::AlphaVantageProvider,
        tushare::TushareProvider,
    },
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorId {
    #[default]
    Tushare,
    AlphaVantage,
}

impl VendorId {
    pub const ALL: [VendorId; 2] = [VendorId::Tushare, VendorId::AlphaVantage];

    pub fn as_str(&self) -> &'static str {
        match self {
            VendorId::Tushare => "tushare",
            VendorId::AlphaVantage => "alpha_vantage",
        }
    }

    /// Row ceiling the planner sizes windows against. Tushare caps each
    /// response at `configured` rows; Alpha Vantage answers a symbol's whole
    /// series whatever the dates, so the span is never split for it.
    pub fn max_rows_per_call(&self, configured: u64) -> u64 {
        match self {
            VendorId::Tushare => configured,
            VendorId::AlphaVantage => u64::MAX,
        }
    }

    /// How this vendor's numbers are rendered in the merged dataset.
    pub fn profile(&self) -> VendorProfile {
        match self {
            VendorId::Tushare => VendorProfile::tushare(),
            VendorId::AlphaVantage => VendorProfile::alpha_vantage(),
        }
    }
}

impl fmt::Display for VendorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VendorId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        VendorId::ALL
            .into_iter()
            .find(|v| v.as_str() == wanted)
            .ok_or_else(|| {
                let known: Vec<_> = VendorId::ALL.iter().map(VendorId::as_str).collect();
                format!("unknown vendor {s:?} (expected one of {})", known.join(", "))
            })
    }
}

/// Constructs the provider for `id`, reading its credential from the
/// environment.
pub fn build_provider(
    id: VendorId,
    config: &PipelineConfig,
) -> Result<Box<dyn DataProvider>, ProviderInitError> {
    let timeout = Duration::from_secs(config.retry.request_timeout_secs);
    Ok(match id {
        VendorId::Tushare => Box::new(TushareProvider::new(timeout)?),
        VendorId::AlphaVantage => Box::new(AlphaVantageProvider::new(
            timeout,
            config.alpha_vantage.output_size,
            config.alpha_vantage.calls_per_minute,
        )?),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn parses_known_names() {
        assert_eq!("tushare".parse::<VendorId>().unwrap(), VendorId::Tushare);
        assert_eq!(
            "Alpha-Vantage".parse::<VendorId>().unwrap(),
            VendorId::AlphaVantage
        );
        let err = "yahoo".parse::<VendorId>().unwrap_err();
        assert!(err.contains("tushare, alpha_vantage"));
    }

    #[test]
    fn only_tushare_is_row_capped() {
        assert_eq!(VendorId::Tushare.max_rows_per_call(6000), 6000);
        assert_eq!(VendorId::AlphaVantage.max_rows_per_call(6000), u64::MAX);
    }

    #[test]
    fn display_round_trips() {
        for id in VendorId::ALL {
            assert_eq!(id.to_string().parse::<VendorId>().unwrap(), id);
        }
    }

    #[test]
    #[serial]
    fn missing_credential_fails_construction() {
        unsafe { std::env::remove_var("TUSHARE_TOKEN") };
        let err = build_provider(VendorId::Tushare, &PipelineConfig::default())
            .err()
            .unwrap();
        assert!(matches!(err, ProviderInitError::MissingEnvVar { .. }));
        assert!(err.to_string().contains("TUSHARE_TOKEN"));
    }

    #[test]
    #[serial]
    fn builds_with_credential() {
        unsafe { std::env::set_var("ALPHAVANTAGE_API_KEY", "demo") };
        let built = build_provider(VendorId::AlphaVantage, &PipelineConfig::default());
        unsafe { std::env::remove_var("ALPHAVANTAGE_API_KEY") };
        assert!(built.is_ok());
    }
}
