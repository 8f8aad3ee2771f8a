pub mod config;
pub mod data;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod report;
pub mod visualization;
pub mod walk_forward;

pub use config::Config;
pub use data::{PriceProvider, YahooProvider, cache_path, load_cached, load_prices};
pub use error::{Result, SignalError};
pub use evaluation::{
    ClassificationMetrics, MetricsBundle, PnlSketch, classification_report, evaluate,
    read_metrics, signal_pnl, write_metrics,
};
pub use features::{FEATURE_NAMES, FeatureRow, FeatureTable, RowMeta, build_features};
pub use report::build_pdf_report;
pub use visualization::{plot_momentum, plot_oos_probability, plot_price_with_ma};
pub use walk_forward::{
    Fold, FoldReport, OosPredictions, WalkForwardResult, WalkForwardSettings,
    expanding_window_folds, walk_forward_predict,
};

use std::path::PathBuf;

use eqsignal::core::io::OutputDir;
use log::info;

/// Artifacts and headline numbers of one run
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub symbol: String,
    pub n_prices: usize,
    pub n_rows: usize,
    pub folds: Vec<FoldReport>,
    pub metrics: MetricsBundle,
    pub metrics_path: PathBuf,
    pub figures: Vec<PathBuf>,
    pub report_path: Option<PathBuf>,
}

/// Run the full pipeline: load, featurize, walk forward, score, render.
///
/// `provider` is only consulted when the config is not offline.
pub fn run(config: &Config, provider: &dyn PriceProvider) -> Result<RunSummary> {
    let start = config.start_date()?;
    let end = config.end_date()?;
    let data_dir = PathBuf::from(&config.data_dir);

    info!("Loading {} prices from {} to {}", config.symbol, start, end);
    let prices = if config.offline {
        load_cached(&config.symbol, start, end, &data_dir)?
    } else {
        load_prices(provider, &config.symbol, start, end, &data_dir)?
    };
    info!("Loaded {} business days", prices.len());

    let table = build_features(&prices)?;
    info!("Feature table: {} rows x {} features", table.len(), FEATURE_NAMES.len());

    let result = walk_forward_predict(&table, &config.walk_forward_settings())?;
    info!(
        "Walk-forward: {} folds, {} scored rows",
        result.folds.len(),
        result.predictions.n_scored()
    );

    let metrics = evaluate(&table, &result.predictions)?;

    let reports = OutputDir::create(&config.reports_dir)?;
    let metrics_path = write_metrics(&reports, &metrics)?;
    info!("Saved metrics to {}", metrics_path.display());

    let mut figures = Vec::new();
    let mut report_path = None;
    if !config.no_report {
        figures.push(plot_price_with_ma(&reports, &config.symbol, &table)?);
        figures.push(plot_momentum(&reports, &config.symbol, &table)?);
        figures.push(plot_oos_probability(&reports, &table, &result.predictions)?);

        let pdf = build_pdf_report(&reports, &config.symbol, &FEATURE_NAMES, &metrics, &figures)?;
        info!("Saved report to {}", pdf.display());
        report_path = Some(pdf);
    }

    Ok(RunSummary {
        symbol: config.symbol.clone(),
        n_prices: prices.len(),
        n_rows: table.len(),
        folds: result.folds,
        metrics,
        metrics_path,
        figures,
        report_path,
    })
}
