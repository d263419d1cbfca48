use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use shared_utils::env::get_env_var;
use snafu::ResultExt;
use tracing::{debug, warn};

use crate::{
    models::{asset::AssetClass, bar::Bar, request_params::BarsRequestParams, window::DateSpan},
    providers::{
        ApiSnafu, ClientBuildSnafu, DataProvider, MissingEnvVarSnafu, ProviderError,
        ProviderInitError, ReqwestSnafu, ValidationSnafu,
        tushare::{
            TOKEN_VAR,
            request::{TushareRequest, vendor_date},
            response::{TushareResponse, TushareTable},
        },
    },
};

const BASE_URL: &str = "http://api.tushare.pro";

pub struct TushareProvider {
    client: Client,
    token: SecretString,
    base_url: String,
}

impl TushareProvider {
    /// Creates a new Tushare provider.
    ///
    /// Reads the token from the `TUSHARE_TOKEN` environment variable. Every
    /// HTTP call is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, ProviderInitError> {
        let token = get_env_var(TOKEN_VAR).context(MissingEnvVarSnafu)?;
        Self::with_token(SecretString::from(token), timeout)
    }

    pub fn with_token(token: SecretString, timeout: Duration) -> Result<Self, ProviderInitError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context(ClientBuildSnafu)?;

        Ok(Self {
            client,
            token,
            base_url: BASE_URL.to_string(),
        })
    }

    /// Points the provider at another endpoint (proxies, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn query(
        &self,
        api_name: &str,
        params: IndexMap<&'static str, String>,
    ) -> Result<TushareTable, ProviderError> {
        let body = TushareRequest {
            api_name,
            token: self.token.expose_secret(),
            params,
            fields: "",
        };

        debug!(api_name, params = ?body.params, "tushare request");
        let response = self
            .client
            .post(&self.base_url)
            .json(&body)
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

        let table = response
            .json::<TushareResponse>()
            .await
            .context(ReqwestSnafu)?
            .into_table()?;

        if table.has_more {
            warn!(
                api_name,
                rows = table.items.len(),
                "tushare truncated the result; the row ceiling is set too high"
            );
        }
        Ok(table)
    }
}

#[async_trait]
impl DataProvider for TushareProvider {
    async fn fetch_bars(&self, params: &BarsRequestParams) -> Result<Vec<Bar>, ProviderError> {
        if params.symbols.is_empty() {
            return ValidationSnafu {
                message: "at least one ts_code is required",
            }
            .fail();
        }

        let api_name = match params.asset_class {
            AssetClass::Equity => "daily",
            AssetClass::Index => "index_daily",
        };

        let mut query = IndexMap::new();
        query.insert("ts_code", params.symbols.join(","));
        query.insert("start_date", vendor_date(params.start));
        query.insert("end_date", vendor_date(params.end));

        self.query(api_name, query).await?.to_bars()
    }

    async fn fetch_constituents(
        &self,
        index_code: &str,
        span: DateSpan,
    ) -> Result<Vec<String>, ProviderError> {
        let mut query = IndexMap::new();
        query.insert("index_code", index_code.to_string());
        query.insert("start_date", vendor_date(span.start()));
        query.insert("end_date", vendor_date(span.end()));

        self.query("index_weight", query).await?.strings("con_code")
    }
}
