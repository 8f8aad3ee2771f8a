use anyhow::Result;
use clap::Parser;
use signal_poc::*;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    println!("eqsignal - equity signal research\n");

    let cli = Config::parse();
    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => cli,
    };
    config.validate()?;

    let provider = YahooProvider::new()?;
    let summary = run(&config, &provider)?;

    let cls = &summary.metrics.classification;
    let pnl = &summary.metrics.pnl_sketch;
    let fmt = |v: Option<f64>| v.map_or("n/a".to_string(), |v| format!("{:.4}", v));

    println!("\n{}", "=".repeat(60));
    println!("Run summary: {}", summary.symbol);
    println!("{}", "=".repeat(60));
    println!("Business days loaded:   {}", summary.n_prices);
    println!("Feature rows:           {}", summary.n_rows);
    println!("Features:               {}", FEATURE_NAMES.join(", "));
    for fold in &summary.folds {
        println!(
            "  Fold {}: train {:>5} rows, test {:>4} rows, accuracy {:.3}",
            fold.fold,
            fold.train.len(),
            fold.test.len(),
            fold.accuracy
        );
    }
    println!("Out-of-sample rows:     {}", cls.n_oos);
    println!("Accuracy:               {:.4}", cls.accuracy);
    println!("Precision (class 1):    {:.4}", cls.precision_pos);
    println!("Recall (class 1):       {:.4}", cls.recall_pos);
    println!("ROC AUC:                {}", fmt(cls.roc_auc));
    println!("Strategy cum. return:   {:.4}", pnl.strat_cum_return);
    println!("Hit rate when long:     {}", fmt(pnl.hit_rate_when_long));
    println!("Spearman IC:            {}", fmt(pnl.spearman_ic_signal_vs_fwd));
    println!();
    println!("Saved metrics -> {}", summary.metrics_path.display());
    if !summary.figures.is_empty() {
        let figures: Vec<String> = summary.figures.iter().map(|p| p.display().to_string()).collect();
        println!("Figures -> {}", figures.join(" | "));
    }
    if let Some(report) = &summary.report_path {
        println!("Report -> {}", report.display());
    }

    Ok(())
}
