//! Issues one vendor request per window, strictly one after another.
//!
//! Each request goes through [`retry_with_backoff`]; an exhausted budget
//! becomes [`Error::Vendor`] and aborts the run. Between successful windows
//! the client waits `inter_call_delay` to stay within the vendor's global
//! rate limit; there is no wait after the last window.

use std::{sync::Arc, time::Duration};

use tracing::info;

use crate::{
    errors::Error,
    models::{
        bar::Bar,
        batch::RawBatch,
        request_params::BarsRequestParams,
        window::{DateSpan, Window},
    },
    providers::DataProvider,
    retry::{Pause, RetryPolicy, TokioPause, retry_with_backoff},
};

pub struct RetryingClient {
    provider: Box<dyn DataProvider>,
    policy: RetryPolicy,
    pause: Arc<dyn Pause>,
    inter_call_delay: Duration,
}

impl RetryingClient {
    pub fn new(provider: Box<dyn DataProvider>, policy: RetryPolicy) -> Self {
        Self {
            provider,
            policy,
            pause: Arc::new(TokioPause),
            inter_call_delay: Duration::from_secs(1),
        }
    }

    /// Replaces the timer used for backoff and inter-call delays.
    pub fn with_pause(mut self, pause: Arc<dyn Pause>) -> Self {
        self.pause = pause;
        self
    }

    pub fn with_inter_call_delay(mut self, delay: Duration) -> Self {
        self.inter_call_delay = delay;
        self
    }

    /// Fetches one window for the whole basket.
    pub async fn fetch(&self, window: &Window, symbols: &[String]) -> Result<RawBatch, Error> {
        let params = BarsRequestParams::for_window(window, symbols);
        let bars = self.request(&window.to_string(), &params).await?;
        Ok(RawBatch::new(*window, bars))
    }

    /// Fetches every window in order. The first window whose retry budget
    /// runs out aborts the whole sequence; nothing fetched so far is
    /// returned.
    pub async fn fetch_all(
        &self,
        windows: &[Window],
        symbols: &[String],
    ) -> Result<Vec<RawBatch>, Error> {
        let total = windows.len();
        let mut batches = Vec::with_capacity(total);

        for (i, window) in windows.iter().enumerate() {
            info!(
                batch = i + 1,
                total,
                start = %window.start,
                end = %window.end,
                "fetching batch"
            );
            let batch = self.fetch(window, symbols).await?;
            if batch.is_empty() {
                info!(batch = i + 1, "batch returned no rows");
            } else {
                info!(batch = i + 1, rows = batch.bars.len(), "batch fetched");
            }
            batches.push(batch);

            if i + 1 < total {
                self.pause.pause(self.inter_call_delay).await;
            }
        }
        Ok(batches)
    }

    /// Resolves an index's constituents over `span`. An empty answer is
    /// returned as-is; the caller owns the fallback.
    pub async fn fetch_constituents(
        &self,
        index_code: &str,
        span: DateSpan,
    ) -> Result<Vec<String>, Error> {
        let label = format!("index_weight {index_code} {span}");
        retry_with_backoff(&self.policy, self.pause.as_ref(), &label, |_| {
            self.provider.fetch_constituents(index_code, span)
        })
        .await
        .map_err(|e| Error::Vendor {
            context: label.clone(),
            attempts: e.attempts,
            source: e.last_error,
        })
    }

    /// Runs an arbitrary bars request under the retry policy.
    pub async fn request(&self, label: &str, params: &BarsRequestParams) -> Result<Vec<Bar>, Error> {
        retry_with_backoff(&self.policy, self.pause.as_ref(), label, |_| {
            self.provider.fetch_bars(params)
        })
        .await
        .map_err(|e| Error::Vendor {
            context: label.to_string(),
            attempts: e.attempts,
            source: e.last_error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    use crate::{
        planner::plan,
        providers::{ApiSnafu, ProviderError},
        retry::RecordingPause,
    };

    /// Fails the first `failures` calls, then answers one bar per symbol.
    struct Scripted {
        failures: Mutex<u32>,
    }

    impl Scripted {
        fn new(failures: u32) -> Self {
            Self {
                failures: Mutex::new(failures),
            }
        }
    }

    #[async_trait]
    impl DataProvider for Scripted {
        async fn fetch_bars(&self, params: &BarsRequestParams) -> Result<Vec<Bar>, ProviderError> {
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return ApiSnafu {
                    message: "Read timed out",
                }
                .fail();
            }
            Ok(params
                .symbols
                .iter()
                .map(|s| Bar::ohlcv(s.clone(), params.start, 1.0, 1.0, 1.0, 1.0, 1.0))
                .collect())
        }
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    fn symbols() -> Vec<String> {
        vec!["600519.SH".to_string(), "601318.SH".to_string()]
    }

    fn windows() -> Vec<Window> {
        plan(DateSpan::new(d(6), d(10)).unwrap(), 2, 4).unwrap()
    }

    #[tokio::test]
    async fn inter_call_delay_skipped_after_last_window() {
        let pause = Arc::new(RecordingPause::new());
        let client = RetryingClient::new(
            Box::new(Scripted::new(0)),
            RetryPolicy::new(3, Duration::from_secs(5)),
        )
        .with_pause(pause.clone())
        .with_inter_call_delay(Duration::from_secs(1));

        let batches = client.fetch_all(&windows(), &symbols()).await.unwrap();

        assert_eq!(batches.len(), 3);
        assert_eq!(pause.delays(), vec![Duration::from_secs(1); 2]);
    }

    #[tokio::test]
    async fn backoff_precedes_inter_call_delay() {
        let pause = Arc::new(RecordingPause::new());
        let client = RetryingClient::new(
            Box::new(Scripted::new(2)),
            RetryPolicy::new(3, Duration::from_secs(5)),
        )
        .with_pause(pause.clone());

        client.fetch_all(&windows(), &symbols()).await.unwrap();

        assert_eq!(
            pause.delays(),
            vec![
                Duration::from_secs(5),
                Duration::from_secs(10),
                Duration::from_secs(1),
                Duration::from_secs(1),
            ]
        );
    }

    #[tokio::test]
    async fn exhausted_window_aborts_the_run() {
        let pause = Arc::new(RecordingPause::new());
        let provider = Scripted::new(u32::MAX);
        let client = RetryingClient::new(
            Box::new(provider),
            RetryPolicy::new(3, Duration::from_millis(10)),
        )
        .with_pause(pause.clone());

        let err = client
            .fetch_all(&windows(), &symbols())
            .await
            .unwrap_err();

        match err {
            Error::Vendor {
                context,
                attempts,
                source,
            } => {
                assert_eq!(context, "[2025-01-06, 2025-01-07]");
                assert_eq!(attempts, 3);
                assert_eq!(source.to_string(), "API error: Read timed out");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            pause.delays(),
            vec![Duration::from_millis(10), Duration::from_millis(20)]
        );
    }
}
