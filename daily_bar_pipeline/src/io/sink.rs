use async_trait::async_trait;
use snafu::{Backtrace, Snafu};

use crate::models::batch::Dataset;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum SinkError {
    /// Encoding a row failed or the CSV writer could not flush.
    #[snafu(display("Failed to write CSV: {source}"))]
    Csv {
        source: csv::Error,
        backtrace: Backtrace,
    },

    /// The destination could not be created or written.
    #[snafu(display("I/O error: {source}"))]
    Io {
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

#[async_trait]
pub trait DataSink {
    /// The type of output returned after a successful write operation.
    ///
    /// A file sink returns the path it wrote; a database sink might return
    /// the number of rows inserted.
    type Output;

    /// Writes the whole dataset to the destination, replacing what was there.
    async fn write(&self, data: &Dataset) -> Result<Self::Output, SinkError>;
}
