use thiserror::Error;

use crate::{
    io::sink::SinkError,
    providers::{ProviderError, ProviderInitError},
};

/// The unified error type for the `daily_bar_pipeline` crate.
#[derive(Debug, Error)]
pub enum Error {
    /// The caller supplied something unusable (reversed span, empty basket,
    /// non-positive ceiling, bad configuration value). Never retried.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A vendor call kept failing until the retry budget ran out. The
    /// vendor's own error text is kept verbatim in `source`.
    #[error("Vendor request {context} failed after {attempts} attempt(s): {source}")]
    Vendor {
        context: String,
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    /// A provider could not be constructed (missing credential, HTTP client).
    #[error("Provider initialization failed: {0}")]
    ProviderInit(#[from] ProviderInitError),

    /// The configuration file could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A dataset sink failed.
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// A generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Reading or writing the tabular intermediate failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Encoding or decoding a JSON document failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
