use std::path::Path;

use crate::{
    config::{PipelineConfig, load_config_path},
    errors::Error,
};

use super::commands::SpanArgs;

/// Loads the config file, or the defaults when no file is given.
pub fn load_config(path: Option<&Path>) -> Result<PipelineConfig, Error> {
    match path {
        Some(path) => load_config_path(path),
        None => {
            let config = PipelineConfig::default();
            config.validate()?;
            Ok(config)
        }
    }
}

impl SpanArgs {
    /// Writes the command-line overrides into `config`.
    pub fn apply(&self, config: &mut PipelineConfig) {
        if let Some(start) = self.start {
            config.start_date = start;
        }
        if let Some(end) = self.end {
            config.end_date = Some(end);
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
    }
}

/// Replaces a list setting when the command line supplied one.
pub fn override_list(target: &mut Vec<String>, values: &[String]) {
    let values: Vec<String> = values
        .iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect();
    if !values.is_empty() {
        *target = values;
    }
}
