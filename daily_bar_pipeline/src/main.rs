use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use daily_bar_pipeline::{
    Pipeline,
    cli::{
        commands::{Cli, Commands},
        params::{load_config, override_list},
    },
    pipeline::{download_vendor_files, merge_from_csv},
    providers::alpha_vantage::AlphaVantageProvider,
    retry::TokioPause,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Commands::Fetch {
            span,
            vendor,
            symbols,
        } => {
            span.apply(&mut config);
            if let Some(vendor) = vendor {
                config.vendor = vendor;
            }
            override_list(&mut config.symbols, &symbols);
            config.validate()?;

            let pipeline = Pipeline::from_config(&config)?;
            let report = pipeline.run().await?;
            if report.is_empty() {
                info!("no data, nothing written");
                return Ok(());
            }
            if let Some(path) = &report.csv_path {
                println!("{}", path.display());
            }
            if let Some(merge) = &report.merge {
                println!("{}", merge.path.display());
            }
        }

        Commands::Merge {
            csv,
            extra_vendor_dir,
            output_dir,
        } => {
            if let Some(dir) = output_dir {
                config.output_dir = dir;
            }
            if extra_vendor_dir.is_some() {
                config.merge.extra_vendor_dir = extra_vendor_dir;
            }
            let report = merge_from_csv(&config, csv)?;
            println!("{}", report.path.display());
        }

        Commands::FetchIndex { span } => {
            span.apply(&mut config);
            config.validate()?;

            let pipeline = Pipeline::from_config(&config)?;
            match pipeline.export_index_series().await? {
                Some(path) => println!("{}", path.display()),
                None => info!(index = %config.index_code, "no index data, nothing written"),
            }
        }

        Commands::FetchAlphaVantage { symbols, raw_dir } => {
            override_list(&mut config.alpha_vantage.symbols, &symbols);
            if let Some(dir) = raw_dir {
                config.alpha_vantage.raw_dir = dir;
            }

            let provider = AlphaVantageProvider::new(
                config.request_timeout(),
                config.alpha_vantage.output_size,
                config.alpha_vantage.calls_per_minute,
            )?;
            let report = download_vendor_files(&config, &provider, Arc::new(TokioPause)).await?;
            for path in &report.saved {
                println!("{}", path.display());
            }
            if !report.failed.is_empty() {
                warn!(symbols = ?report.failed, "some downloads failed");
                if report.saved.is_empty() {
                    bail!("every Alpha Vantage download failed");
                }
            }
        }
    }

    Ok(())
}
