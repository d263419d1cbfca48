//! End-to-end runs: basket → plan → fetch → aggregate → CSV → normalize →
//! merge, plus the two side exports (index series, raw Alpha Vantage files).
//!
//! Every step takes the [`PipelineConfig`] explicitly; nothing here reads
//! process-wide state except the clock for "today".

use std::{path::PathBuf, sync::Arc};

use tracing::{error, info, warn};

use crate::{
    aggregate::aggregate,
    client::RetryingClient,
    config::{PipelineConfig, previous_month},
    errors::Error,
    index_series,
    io::{CsvSink, DataSink, VendorFileStore, csv_file_name},
    merge::{MergeEntry, MergeReport},
    models::{basket::Basket, batch::Dataset},
    normalize::{VendorProfile, normalize},
    planner,
    providers::{alpha_vantage::AlphaVantageProvider, registry::build_provider},
    retry::{Pause, retry_with_backoff},
};

/// What a full run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub basket_size: usize,
    pub windows: usize,
    pub rows: usize,
    /// `None` when the vendor had no rows for the span.
    pub csv_path: Option<PathBuf>,
    pub merge: Option<MergeReport>,
}

impl RunReport {
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }
}

pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
    client: RetryingClient,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig, client: RetryingClient) -> Self {
        Self { config, client }
    }

    /// Builds the configured vendor's provider and wraps it in a retrying
    /// client with the configured policy and pacing.
    pub fn from_config(config: &'a PipelineConfig) -> Result<Self, Error> {
        let provider = build_provider(config.vendor, config)?;
        let client = RetryingClient::new(provider, config.retry_policy())
            .with_inter_call_delay(config.inter_call_delay());
        Ok(Self::new(config, client))
    }

    /// Resolves the basket: explicit symbols, else the vendor's constituents
    /// for the month before `today`, else the fallback CSV.
    pub async fn resolve_basket(&self, today: chrono::NaiveDate) -> Result<Basket, Error> {
        let config = self.config;
        let names = load_names(config)?;

        if !config.symbols.is_empty() {
            let basket = Basket::from_symbols(&config.symbols);
            info!(symbols = basket.len(), "using configured basket");
            return Ok(with_names(basket, names.as_ref()));
        }

        let span = previous_month(today);
        info!(index = %config.index_code, %span, "looking up index constituents");
        let members = self
            .client
            .fetch_constituents(&config.index_code, span)
            .await?;
        let basket = Basket::from_symbols(members);
        if !basket.is_empty() {
            info!(symbols = basket.len(), "constituents resolved");
            return Ok(with_names(basket, names.as_ref()));
        }

        warn!(index = %config.index_code, "vendor returned no constituents");
        match &config.fallback_basket_csv {
            Some(path) => {
                let basket = Basket::from_csv_path(path)?;
                if basket.is_empty() {
                    return Err(Error::InvalidInput(format!(
                        "fallback basket {} has no constituents",
                        path.display()
                    )));
                }
                info!(path = %path.display(), symbols = basket.len(), "using fallback basket");
                Ok(basket)
            }
            None => Err(Error::InvalidInput(format!(
                "no constituents for {} and no fallback_basket_csv configured",
                config.index_code
            ))),
        }
    }

    /// Runs the whole acquisition. An unrecoverable vendor failure aborts
    /// before anything is written; an empty result writes nothing and is not
    /// an error.
    pub async fn run(&self) -> Result<RunReport, Error> {
        let config = self.config;
        let span = config.span()?;
        let basket = self.resolve_basket(config.today()?).await?;
        let symbols = basket.symbols();

        let ceiling = config.vendor.max_rows_per_call(config.max_rows_per_call);
        let windows = planner::plan(span, symbols.len(), ceiling)?;
        info!(
            %span,
            symbols = symbols.len(),
            windows = windows.len(),
            "fetch plan ready"
        );

        let batches = self.client.fetch_all(&windows, &symbols).await?;
        let dataset = aggregate(batches);

        let mut report = RunReport {
            basket_size: symbols.len(),
            windows: windows.len(),
            rows: dataset.len(),
            ..RunReport::default()
        };
        if dataset.is_empty() {
            warn!(%span, "no data for the requested span, nothing written");
            return Ok(report);
        }

        let sink = CsvSink::new(config.output_dir.join(csv_file_name(&config.index_code)));
        report.csv_path = Some(sink.write(&dataset).await?);
        report.merge = Some(merge_dataset(config, &dataset, &basket)?);
        Ok(report)
    }

    /// Fetches the index's own series and writes it as JSON. Returns `None`
    /// when the vendor had no rows.
    pub async fn export_index_series(&self) -> Result<Option<PathBuf>, Error> {
        let config = self.config;
        let span = config.span()?;
        let dataset = index_series::fetch(&self.client, &config.index_code, span).await?;

        match index_series::to_document(&dataset, &config.index_code, &config.time_zone) {
            Some(doc) => Ok(Some(index_series::write_document(
                &config.output_dir,
                &config.index_code,
                &doc,
            )?)),
            None => {
                warn!(index = %config.index_code, %span, "no index data");
                Ok(None)
            }
        }
    }
}

/// Normalizes `dataset` with the configured vendor's profile, adds the
/// records of the extra vendor directory (if any) and rewrites the merged
/// file. Display names come from `names`.
pub fn merge_dataset(
    config: &PipelineConfig,
    dataset: &Dataset,
    names: &Basket,
) -> Result<MergeReport, Error> {
    let merger = config.merger();
    let names = names.names();
    let name_of = |symbol: &str| names.get(&merger.normalize_symbol(symbol)).cloned();

    let mut entries: Vec<MergeEntry> = normalize(dataset, &config.vendor.profile())
        .into_values()
        .map(|record| {
            let name = name_of(&record.symbol);
            MergeEntry::new(record, name)
        })
        .collect();

    if let Some(dir) = &config.merge.extra_vendor_dir {
        let loaded = VendorFileStore::new(dir).load_all()?;
        info!(dir = %dir.display(), files = loaded.len(), "merging vendor files");
        let extra = Dataset::from_bars(loaded.into_iter().flat_map(|s| s.bars));
        let size = config.alpha_vantage.output_size.label();
        entries.extend(
            normalize(&extra, &VendorProfile::alpha_vantage())
                .into_values()
                .map(|record| {
                    let name = name_of(&record.symbol);
                    MergeEntry::new(record, name).with_output_size(size)
                }),
        );
    }

    merger.write(config.merged_path(), entries)
}

/// Re-merges an existing intermediate CSV without touching the vendor.
pub fn merge_from_csv(config: &PipelineConfig, csv_path: Option<PathBuf>) -> Result<MergeReport, Error> {
    let path = csv_path.unwrap_or_else(|| config.output_dir.join(csv_file_name(&config.index_code)));
    let dataset = crate::io::read_dataset(&path)?;
    info!(path = %path.display(), rows = dataset.len(), "loaded intermediate CSV");
    let names = load_names(config)?.unwrap_or_default();
    merge_dataset(config, &dataset, &names)
}

/// Outcome of an Alpha Vantage download run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadReport {
    pub saved: Vec<PathBuf>,
    pub failed: Vec<String>,
}

/// Downloads every configured Alpha Vantage symbol into the raw directory.
///
/// A symbol whose retries run out is logged and skipped; the others are
/// still downloaded.
pub async fn download_vendor_files(
    config: &PipelineConfig,
    provider: &AlphaVantageProvider,
    pause: Arc<dyn Pause>,
) -> Result<DownloadReport, Error> {
    if config.alpha_vantage.symbols.is_empty() {
        return Err(Error::InvalidInput(
            "alpha_vantage.symbols is empty".to_string(),
        ));
    }
    let store = VendorFileStore::new(&config.alpha_vantage.raw_dir);
    let policy = config.retry_policy();
    let mut report = DownloadReport::default();

    for symbol in &config.alpha_vantage.symbols {
        let label = format!("TIME_SERIES_DAILY {symbol}");
        match retry_with_backoff(&policy, pause.as_ref(), &label, |_| provider.fetch_raw(symbol)).await {
            Ok(doc) => report.saved.push(store.save(symbol, &doc)?),
            Err(e) => {
                error!(symbol, attempts = e.attempts, error = %e.last_error, "download failed");
                report.failed.push(symbol.clone());
            }
        }
    }
    info!(
        saved = report.saved.len(),
        failed = report.failed.len(),
        dir = %store.dir().display(),
        "vendor files downloaded"
    );
    Ok(report)
}

fn load_names(config: &PipelineConfig) -> Result<Option<Basket>, Error> {
    let source = config
        .merge
        .name_csv
        .as_ref()
        .or(config.fallback_basket_csv.as_ref());
    match source {
        Some(path) if path.is_file() => Ok(Some(Basket::from_csv_path(path)?)),
        Some(path) => {
            warn!(path = %path.display(), "name CSV not found, names will be Unknown");
            Ok(None)
        }
        None => Ok(None),
    }
}

fn with_names(basket: Basket, names: Option<&Basket>) -> Basket {
    match names {
        Some(names) => basket.with_names_from(names),
        None => basket,
    }
}
