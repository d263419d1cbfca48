pub mod aggregate;
#[cfg(feature = "cli")]
pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod index_series;
pub mod io;
pub mod merge;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod planner;
pub mod providers;
pub mod retry;

pub use config::{PipelineConfig, load_config_path, load_config_str};
pub use errors::Error;
pub use pipeline::{Pipeline, RunReport};
