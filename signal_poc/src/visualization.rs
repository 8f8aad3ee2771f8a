//! PNG figures for the report.

use std::ops::Range;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use eqsignal::core::io::OutputDir;
use indicators::moving_average;
use plotters::prelude::*;

use crate::error::{Result, SignalError};
use crate::features::{FeatureTable, MA_FAST, MA_SLOW};
use crate::walk_forward::OosPredictions;

pub const FIGURE_SIZE: (u32, u32) = (1500, 750);

const NAVY_DARK: RGBColor = RGBColor(0x1f, 0x3b, 0x73);
const NAVY_MEDIUM: RGBColor = RGBColor(0x2d, 0x5a, 0xa6);
const NAVY_LIGHT: RGBColor = RGBColor(0x6c, 0x8e, 0xbf);
const BAR_UP: RGBColor = RGBColor(0x2e, 0x8b, 0x57);
const BAR_DOWN: RGBColor = RGBColor(0xc0, 0x39, 0x2b);

type DrawResult = std::result::Result<(), Box<dyn std::error::Error>>;

/// File-system safe form of a ticker
pub fn file_stem(symbol: &str) -> String {
    symbol.replace('^', "_")
}

pub fn price_figure_name(symbol: &str) -> String {
    format!("{}_price_ma.png", file_stem(symbol))
}

pub fn momentum_figure_name(symbol: &str) -> String {
    format!("{}_momentum.png", file_stem(symbol))
}

pub const PROBABILITY_FIGURE: &str = "oos_proba.png";

/// Min/max of the finite values, padded by 5% so flat series stay drawable
fn value_range<I: IntoIterator<Item = f64>>(values: I) -> Range<f64> {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    if !lo.is_finite() {
        return 0.0..1.0;
    }
    let pad = if hi > lo { (hi - lo) * 0.05 } else { lo.abs().max(1.0) * 0.05 };
    (lo - pad)..(hi + pad)
}

fn date_label(dates: &[NaiveDate], i: usize) -> String {
    dates
        .get(i)
        .map(|d| d.format("%Y-%m").to_string())
        .unwrap_or_default()
}

fn plot_err(e: Box<dyn std::error::Error>) -> SignalError {
    SignalError::Plot(e.to_string())
}

/// Close with its fast and slow moving averages.
pub fn plot_price_with_ma(dir: &OutputDir, symbol: &str, table: &FeatureTable) -> Result<PathBuf> {
    let path = dir.join(price_figure_name(symbol));
    draw_price_with_ma(&path, symbol, table).map_err(plot_err)?;
    Ok(path)
}

fn draw_price_with_ma(path: &Path, symbol: &str, table: &FeatureTable) -> DrawResult {
    let dates: Vec<NaiveDate> = table.dates().collect();
    let close: Vec<f64> = table.meta().iter().map(|m| m.close).collect();
    let fast = moving_average(&close, MA_FAST);
    let slow = moving_average(&close, MA_SLOW);
    let n = close.len();

    let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} - Price with Moving Averages", symbol), ("sans-serif", 30).into_font())
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0usize..n.max(1), value_range(close.iter().copied()))?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("Price")
        .x_labels(10)
        .x_label_formatter(&|i| date_label(&dates, *i))
        .label_style(("sans-serif", 14))
        .draw()?;

    let series: [(&[f64], RGBColor, String); 3] = [
        (&close, NAVY_DARK, format!("{} Close Price", symbol)),
        (&fast, NAVY_MEDIUM, format!("{}-day Moving Average", MA_FAST)),
        (&slow, NAVY_LIGHT, format!("{}-day Moving Average", MA_SLOW)),
    ];

    for (values, color, label) in series {
        chart
            .draw_series(LineSeries::new(
                values
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| v.is_finite())
                    .map(|(i, v)| (i, *v)),
                color.stroke_width(2),
            ))?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }

    chart
        .configure_series_labels()
        .label_font(("sans-serif", 14))
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// 5-day momentum as bars, green when positive.
pub fn plot_momentum(dir: &OutputDir, symbol: &str, table: &FeatureTable) -> Result<PathBuf> {
    let path = dir.join(momentum_figure_name(symbol));
    draw_momentum(&path, symbol, table).map_err(plot_err)?;
    Ok(path)
}

fn draw_momentum(path: &Path, symbol: &str, table: &FeatureTable) -> DrawResult {
    let dates: Vec<NaiveDate> = table.dates().collect();
    let momentum: Vec<f64> = table.rows().iter().map(|r| r.mom_5).collect();
    let n = momentum.len();
    let y_range = value_range(momentum.iter().copied().chain(std::iter::once(0.0)));

    let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} - 5-day Momentum", symbol), ("sans-serif", 30).into_font())
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0usize..n.max(1), y_range)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc("Date")
        .y_desc("Momentum")
        .x_labels(10)
        .x_label_formatter(&|i| date_label(&dates, *i))
        .y_label_formatter(&|v| format!("{:.0}%", v * 100.0))
        .label_style(("sans-serif", 14))
        .draw()?;

    chart.draw_series(momentum.iter().enumerate().map(|(i, &v)| {
        let color = if v > 0.0 { BAR_UP } else { BAR_DOWN };
        Rectangle::new([(i, 0.0), (i + 1, v)], color.filled())
    }))?;

    root.present()?;
    Ok(())
}

/// Out-of-sample probability of an up move over time.
pub fn plot_oos_probability(dir: &OutputDir, table: &FeatureTable, predictions: &OosPredictions) -> Result<PathBuf> {
    let path = dir.join(PROBABILITY_FIGURE);
    draw_oos_probability(&path, table, predictions).map_err(plot_err)?;
    Ok(path)
}

fn draw_oos_probability(path: &Path, table: &FeatureTable, predictions: &OosPredictions) -> DrawResult {
    let dates: Vec<NaiveDate> = table.dates().collect();
    let n = dates.len();

    let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Out-of-sample predicted probability (class=1)", ("sans-serif", 30).into_font())
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0usize..n.max(1), 0.0f64..1.0f64)?;

    chart
        .configure_mesh()
        .x_desc("Date")
        .y_desc("P(up)")
        .x_labels(10)
        .x_label_formatter(&|i| date_label(&dates, *i))
        .label_style(("sans-serif", 14))
        .draw()?;

    chart.draw_series(LineSeries::new(
        [(0usize, 0.5), (n.max(1), 0.5)],
        BLACK.mix(0.3).stroke_width(1),
    ))?;

    chart.draw_series(LineSeries::new(
        predictions
            .probabilities()
            .iter()
            .enumerate()
            .filter_map(|(i, p)| p.map(|p| (i, p))),
        NAVY_MEDIUM.stroke_width(2),
    ))?;

    root.present()?;
    Ok(())
}
