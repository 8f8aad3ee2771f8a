use chrono::{Datelike, Days, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use signal_poc::*;
use tempfile::TempDir;

/// Provider serving a fixed set of observations
struct StubProvider(Vec<(NaiveDate, f64)>);

impl PriceProvider for StubProvider {
    fn daily_closes(&self, _: &str, _: NaiveDate, _: NaiveDate) -> Result<Vec<(NaiveDate, f64)>> {
        Ok(self.0.clone())
    }
}

fn business_days(n: usize) -> Vec<NaiveDate> {
    let mut dates = Vec::with_capacity(n);
    let mut day = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap();
    while dates.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            dates.push(day);
        }
        day = day.checked_add_days(Days::new(1)).unwrap();
    }
    dates
}

fn random_walk(n: usize, seed: u64) -> Vec<(NaiveDate, f64)> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut price = 100.0_f64;
    business_days(n)
        .into_iter()
        .map(|d| {
            price *= 1.0 + rng.gen_range(-0.02..0.02_f64);
            (d, price)
        })
        .collect()
}

fn test_config(dir: &TempDir) -> Config {
    Config {
        symbol: "TEST".to_string(),
        start: "2019-01-01".to_string(),
        end: Some("2023-01-01".to_string()),
        data_dir: dir.path().join("data/raw").display().to_string(),
        reports_dir: dir.path().join("reports").display().to_string(),
        no_report: true,
        ..Config::default()
    }
}

#[test]
fn test_empty_provider_aborts_before_features() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    let err = run(&config, &StubProvider(vec![])).unwrap_err();
    assert!(matches!(err, SignalError::DataUnavailable { ref symbol, .. } if symbol == "TEST"));
    assert!(!dir.path().join("reports").exists());
}

#[test]
fn test_full_pipeline_writes_metrics_and_cache() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let n = 600;

    let summary = run(&config, &StubProvider(random_walk(n, 7))).unwrap();

    let rows = n - features::MIN_PRICES + 1;
    assert_eq!(summary.n_prices, n);
    assert_eq!(summary.n_rows, rows);
    assert_eq!(summary.folds.len(), 5);

    let test_size = rows / 6;
    assert_eq!(summary.metrics.classification.n_oos, 5 * test_size);
    assert!((0.0..=1.0).contains(&summary.metrics.classification.accuracy));

    let cache = cache_path(std::path::Path::new(&config.data_dir), "TEST");
    assert!(cache.exists());

    assert!(summary.metrics_path.ends_with("reports/metrics.json"));
    assert_eq!(read_metrics(&summary.metrics_path).unwrap(), summary.metrics);
    assert!(summary.figures.is_empty());
    assert!(summary.report_path.is_none());
}

#[test]
fn test_full_pipeline_renders_figures_and_report() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.no_report = false;

    let summary = run(&config, &StubProvider(random_walk(400, 5))).unwrap();

    let reports = dir.path().join("reports");
    let expected = [
        reports.join(visualization::price_figure_name("TEST")),
        reports.join(visualization::momentum_figure_name("TEST")),
        reports.join(visualization::PROBABILITY_FIGURE),
    ];
    assert_eq!(summary.figures, expected);
    for figure in &expected {
        let bytes = std::fs::read(figure).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"), "{} is not a PNG", figure.display());
    }

    let pdf = summary.report_path.unwrap();
    assert_eq!(pdf, reports.join("TEST_report.pdf"));
    let bytes = std::fs::read(&pdf).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert!(bytes.len() < 4 * 1024 * 1024, "report is {} bytes", bytes.len());
}

#[test]
fn test_offline_run_matches_online_run() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);

    let online = run(&config, &StubProvider(random_walk(400, 11))).unwrap();

    config.offline = true;
    let offline = run(&config, &StubProvider(vec![])).unwrap();

    assert_eq!(online.n_prices, offline.n_prices);
    assert_eq!(online.metrics, offline.metrics);
}

#[test]
fn test_purge_gap_keeps_scored_rows() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.purge_gap = 5;

    let summary = run(&config, &StubProvider(random_walk(500, 3))).unwrap();
    for fold in &summary.folds {
        assert_eq!(fold.test.start - fold.train.end, 5);
    }
}

#[test]
fn test_constant_series_has_single_class() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let flat: Vec<_> = business_days(200).into_iter().map(|d| (d, 42.0)).collect();

    let err = run(&config, &StubProvider(flat)).unwrap_err();
    assert!(matches!(err, SignalError::DegenerateLabel { fold: 1, class: 0 }));
}

#[test]
fn test_monotonic_series_has_single_class() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);
    let rising: Vec<_> = business_days(300)
        .into_iter()
        .enumerate()
        .map(|(i, d)| (d, 100.0 + i as f64))
        .collect();

    let err = run(&config, &StubProvider(rising)).unwrap_err();
    assert!(matches!(err, SignalError::DegenerateLabel { fold: 1, class: 1 }));
}

#[test]
fn test_too_few_rows_for_splits() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(&dir);
    config.splits = 10;

    // 60 prices leave 6 rows, fewer than the 11 blocks needed
    let err = run(&config, &StubProvider(random_walk(60, 1))).unwrap_err();
    assert!(matches!(err, SignalError::TooFewRows { rows: 6, splits: 10 }));
}

#[test]
fn test_insufficient_history() {
    let dir = TempDir::new().unwrap();
    let config = test_config(&dir);

    let err = run(&config, &StubProvider(random_walk(40, 1))).unwrap_err();
    assert!(matches!(err, SignalError::InsufficientHistory { rows: 40, .. }));
}

/// Table whose label is the sign of `mom_5`, with a margin around zero
fn separable_table(n: usize, seed: u64) -> FeatureTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let dates = business_days(n);

    let mut rows = Vec::with_capacity(n);
    let mut labels = Vec::with_capacity(n);
    let mut meta = Vec::with_capacity(n);

    for date in dates {
        let up = rng.gen_range(0.0..1.0_f64) < 0.5;
        let magnitude: f64 = rng.gen_range(1.0..2.0);
        let mom_5 = if up { magnitude } else { -magnitude };
        let mut noise = || rng.gen_range(-0.1..0.1_f64);

        rows.push(FeatureRow {
            mom_5,
            mom_20: noise(),
            vol_10: 0.01 + noise().abs(),
            ma_10: 100.0 + noise(),
            ma_50: 100.0 + noise(),
            ma_cross: 0.0,
            rsi_14: 50.0 + noise(),
        });
        labels.push(up);
        meta.push(RowMeta {
            date,
            close: 100.0,
            ret_1d: 0.0,
            fwd_5d_ret: if up { 0.01 } else { -0.01 },
        });
    }

    FeatureTable::from_parts(rows, labels, meta).unwrap()
}

#[test]
fn test_separable_labels_are_learned() {
    let table = separable_table(300, 42);
    let settings = WalkForwardSettings {
        n_splits: 4,
        ..WalkForwardSettings::default()
    };

    let result = walk_forward_predict(&table, &settings).unwrap();
    for fold in result.folds.iter().skip(1) {
        assert_eq!(fold.accuracy, 1.0, "fold {}", fold.fold);
    }

    let metrics = evaluate(&table, &result.predictions).unwrap();
    assert!(metrics.classification.accuracy > 0.95);
    assert!(metrics.classification.roc_auc.unwrap() > 0.95);
    assert!(metrics.pnl_sketch.hit_rate_when_long.unwrap() > 0.95);
}

#[test]
fn test_each_scored_row_written_once() {
    let table = separable_table(250, 5);
    let settings = WalkForwardSettings::default();

    let result = walk_forward_predict(&table, &settings).unwrap();
    let test_size = 250 / 6;
    let first_block = 250 - 5 * test_size;

    let mut hits = vec![0u32; table.len()];
    for fold in &result.folds {
        for row in fold.test.clone() {
            hits[row] += 1;
        }
    }
    assert!(hits[..first_block].iter().all(|&h| h == 0));
    assert!(hits[first_block..].iter().all(|&h| h == 1));

    let preds = &result.predictions;
    assert!(preds.classes()[..first_block].iter().all(Option::is_none));
    assert!(preds.probabilities()[first_block..].iter().all(Option::is_some));
    assert_eq!(preds.n_scored(), 250 - first_block);
}

#[test]
fn test_feature_builder_is_deterministic() {
    let raw = random_walk(300, 9);
    let dates: Vec<_> = raw.iter().map(|(d, _)| *d).collect();
    let closes: Vec<_> = raw.iter().map(|(_, c)| *c).collect();
    let series = eqsignal::core::io::PriceSeries::new(dates, closes).unwrap();

    let a = build_features(&series).unwrap();
    let b = build_features(&series).unwrap();
    assert_eq!(a, b);
    assert!(a.dates().zip(a.meta()).all(|(d, m)| d == m.date));
}
