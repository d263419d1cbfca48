use std::{num::NonZeroU32, time::Duration};

use async_trait::async_trait;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use shared_utils::env::get_env_var;
use snafu::ResultExt;
use tracing::debug;

use crate::{
    models::{bar::Bar, request_params::BarsRequestParams},
    providers::{
        ApiSnafu, ClientBuildSnafu, DataProvider, MissingEnvVarSnafu, ProviderError,
        ProviderInitError, ReqwestSnafu,
        alpha_vantage::{
            API_KEY_VAR, OutputSize,
            response::{DailySeriesResponse, check_notice},
        },
    },
};

const BASE_URL: &str = "https://www.alphavantage.co/query";

pub struct AlphaVantageProvider {
    client: Client,
    api_key: SecretString,
    base_url: String,
    output_size: OutputSize,
    limiter: DefaultDirectRateLimiter,
}

impl AlphaVantageProvider {
    /// Creates a new Alpha Vantage provider.
    ///
    /// Reads the key from `ALPHAVANTAGE_API_KEY`. Calls are paced to
    /// `calls_per_minute` (the free tier allows 5).
    pub fn new(
        timeout: Duration,
        output_size: OutputSize,
        calls_per_minute: u32,
    ) -> Result<Self, ProviderInitError> {
        let api_key = get_env_var(API_KEY_VAR).context(MissingEnvVarSnafu)?;
        Self::with_key(SecretString::from(api_key), timeout, output_size, calls_per_minute)
    }

    pub fn with_key(
        api_key: SecretString,
        timeout: Duration,
        output_size: OutputSize,
        calls_per_minute: u32,
    ) -> Result<Self, ProviderInitError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context(ClientBuildSnafu)?;
        let per_minute = NonZeroU32::new(calls_per_minute).unwrap_or(nonzero!(5u32));

        Ok(Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
            output_size,
            limiter: RateLimiter::direct(Quota::per_minute(per_minute)),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Downloads the raw `TIME_SERIES_DAILY` document for one symbol.
    ///
    /// In-band quota and error notices are turned into errors, so a returned
    /// document is always a real series.
    pub async fn fetch_raw(&self, symbol: &str) -> Result<Value, ProviderError> {
        self.limiter.until_ready().await;
        debug!(symbol, "alpha vantage request");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("function", "TIME_SERIES_DAILY"),
                ("symbol", symbol),
                ("outputsize", self.output_size.as_param()),
                ("apikey", self.api_key.expose_secret()),
            ])
            .send()
            .await
            .context(ReqwestSnafu)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown API error".to_string());
            return ApiSnafu {
                message: format!("HTTP {status}: {text}"),
            }
            .fail();
        }

        let doc = response.json::<Value>().await.context(ReqwestSnafu)?;
        check_notice(&doc)?;
        Ok(doc)
    }
}

#[async_trait]
impl DataProvider for AlphaVantageProvider {
    async fn fetch_bars(&self, params: &BarsRequestParams) -> Result<Vec<Bar>, ProviderError> {
        let mut bars = Vec::new();
        for symbol in &params.symbols {
            let doc = self.fetch_raw(symbol).await?;
            let series = DailySeriesResponse::from_value(doc)?;
            bars.extend(
                series
                    .to_bars()?
                    .into_iter()
                    .filter(|b| params.start <= b.date && b.date <= params.end),
            );
        }
        Ok(bars)
    }
}
