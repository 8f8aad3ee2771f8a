//! A4 PDF summary of a run.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use chrono::Local;
use eqsignal::core::io::OutputDir;
use log::{debug, warn};
use printpdf::image_crate::{self, imageops::FilterType, DynamicImage, ImageFormat};
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Line, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Point, Rect, Rgb,
};

use crate::error::{Result, SignalError};
use crate::evaluation::MetricsBundle;
use crate::visualization::file_stem;

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
const FIGURE_WIDTH: f32 = 140.0;
/// Figures wider than this are downsampled before embedding
const EMBED_WIDTH_PX: u32 = 700;
const ROW_HEIGHT: f32 = 6.5;
/// Points to millimetres
const PT: f32 = 0.3528;

fn pdf_err<E: std::fmt::Debug>(e: E) -> SignalError {
    SignalError::Pdf(format!("{:?}", e))
}

fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color::Rgb(Rgb::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, None))
}

/// Format a fraction as a percentage, `n/a` when undefined
pub fn fmt_pct(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}%", decimals, v * 100.0),
        _ => "n/a".to_string(),
    }
}

pub fn fmt_num(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.2}", v),
        _ => "n/a".to_string(),
    }
}

/// Greedy word wrap to at most `width` characters per line
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        if !line.is_empty() && line.len() + 1 + word.len() > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(word);
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// Top-down layout cursor over the pages of a document
struct PageWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Distance of the cursor from the bottom edge
    y: f32,
}

impl PageWriter {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?;
        let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    /// Start a new page unless `height` millimetres still fit
    fn reserve(&mut self, height: f32) {
        if self.y - height >= MARGIN {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn space(&mut self, height: f32) {
        self.y -= height;
    }

    fn text_at(&self, text: &str, size: f32, x: f32, y: f32, bold: bool, color: Color) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer.set_fill_color(color);
        self.layer.use_text(text, size, Mm(x), Mm(y), font);
    }

    fn filled_rect(&self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        self.layer.set_fill_color(color);
        self.layer.add_rect(Rect::new(Mm(x), Mm(y), Mm(x + w), Mm(y + h)));
    }

    fn hline(&self, x0: f32, x1: f32, y: f32, color: Color) {
        self.vector(&[(x0, y), (x1, y)], color);
    }

    fn vector(&self, points: &[(f32, f32)], color: Color) {
        self.layer.set_outline_color(color);
        self.layer.set_outline_thickness(0.5);
        self.layer.add_line(Line {
            points: points
                .iter()
                .map(|&(x, y)| (Point::new(Mm(x), Mm(y)), false))
                .collect(),
            is_closed: false,
        });
    }

    fn banner(&mut self, left: &str, right: &str) {
        let height = 12.0;
        self.reserve(height);
        let bottom = self.y - height;
        self.filled_rect(MARGIN, bottom, CONTENT_WIDTH, height, rgb(0xe6, 0xe6, 0xe6));

        let baseline = bottom + 4.5;
        self.text_at(left, 12.0, MARGIN + 3.0, baseline, true, rgb(0, 0, 0));
        let right_width = right.len() as f32 * 10.0 * PT * 0.5;
        let right_x = MARGIN + CONTENT_WIDTH - 3.0 - right_width;
        self.text_at(right, 10.0, right_x, baseline, false, rgb(0, 0, 0));
        self.y = bottom - 6.0;
    }

    fn section(&mut self, title: &str) {
        self.reserve(10.0);
        self.y -= 13.0 * PT;
        self.text_at(title, 13.0, MARGIN, self.y, true, rgb(0x1f, 0x3b, 0x73));
        self.y -= 4.0;
    }

    fn paragraph(&mut self, text: &str, size: f32) {
        let line_height = size * PT * 1.35;
        let chars = (CONTENT_WIDTH / (size * PT * 0.5)) as usize;
        for line in wrap(text, chars) {
            self.reserve(line_height);
            self.y -= line_height;
            self.text_at(&line, size, MARGIN, self.y, false, rgb(0x20, 0x20, 0x20));
        }
        self.y -= 2.0;
    }

    /// Two-column table with a shaded header row and a grid
    fn table(&mut self, rows: &[[String; 2]]) {
        let col = CONTENT_WIDTH / 2.0;
        self.reserve(ROW_HEIGHT * rows.len() as f32);
        let top = self.y;
        let grid = rgb(0x80, 0x80, 0x80);

        for (i, row) in rows.iter().enumerate() {
            let bottom = top - ROW_HEIGHT * (i + 1) as f32;
            if i == 0 {
                self.filled_rect(MARGIN, bottom, CONTENT_WIDTH, ROW_HEIGHT, rgb(0xd3, 0xd3, 0xd3));
            }
            for (j, cell) in row.iter().enumerate() {
                let text_width = cell.len() as f32 * 9.0 * PT * 0.5;
                let x = MARGIN + col * j as f32 + (col - text_width).max(0.0) / 2.0;
                self.text_at(cell, 9.0, x, bottom + 2.0, i == 0, rgb(0, 0, 0));
            }
        }

        let bottom = top - ROW_HEIGHT * rows.len() as f32;
        for i in 0..=rows.len() {
            self.hline(MARGIN, MARGIN + CONTENT_WIDTH, top - ROW_HEIGHT * i as f32, grid.clone());
        }
        for j in 0..=2 {
            let x = MARGIN + col * j as f32;
            self.vector(&[(x, top), (x, bottom)], grid.clone());
        }
        self.y = bottom - 4.0;
    }

    /// Embed a PNG scaled to the figure width; missing files are skipped
    fn figure(&mut self, path: &Path) -> Result<()> {
        if !path.exists() {
            warn!("figure {} not found, skipping", path.display());
            return Ok(());
        }

        let reader = BufReader::new(File::open(path)?);
        let mut decoded = image_crate::load(reader, ImageFormat::Png).map_err(pdf_err)?;
        if decoded.width() > EMBED_WIDTH_PX {
            decoded = decoded.resize(EMBED_WIDTH_PX, u32::MAX, FilterType::Triangle);
        }
        debug!(
            "embedding {} at {}x{} px",
            path.display(),
            decoded.width(),
            decoded.height()
        );
        let image = Image::from_dynamic_image(&DynamicImage::ImageRgb8(decoded.to_rgb8()));

        let px_width = image.image.width.0.max(1) as f32;
        let px_height = image.image.height.0 as f32;
        let dpi = px_width * 25.4 / FIGURE_WIDTH;
        let height = px_height * 25.4 / dpi;

        self.reserve(height + 4.0);
        self.y -= height;
        image.add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN + (CONTENT_WIDTH - FIGURE_WIDTH) / 2.0)),
                translate_y: Some(Mm(self.y)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        self.y -= 4.0;
        Ok(())
    }

    fn footer(&mut self, text: &str) {
        self.reserve(10.0);
        self.y -= 4.0;
        self.hline(MARGIN, MARGIN + CONTENT_WIDTH, self.y, rgb(0x80, 0x80, 0x80));
        self.y -= 5.0;
        let width = text.len() as f32 * 8.0 * PT * 0.5;
        let x = MARGIN + (CONTENT_WIDTH - width).max(0.0) / 2.0;
        self.text_at(text, 8.0, x, self.y, false, rgb(0x80, 0x80, 0x80));
    }

    fn save(self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.doc.save(&mut writer).map_err(pdf_err)
    }
}

/// Render `<SYMBOL>_report.pdf` into `dir`.
///
/// `figures` are expected in the order price, momentum, probability; any
/// that do not exist are left out.
pub fn build_pdf_report(
    dir: &OutputDir,
    symbol: &str,
    features: &[&str],
    metrics: &MetricsBundle,
    figures: &[PathBuf],
) -> Result<PathBuf> {
    let path = dir.join(format!("{}_report.pdf", file_stem(symbol)));
    let generated = Local::now().format("%Y-%m-%d %H:%M").to_string();
    let pnl = &metrics.pnl_sketch;
    let cls = &metrics.classification;

    let mut pdf = PageWriter::new(&format!("{} Report", symbol))?;

    pdf.banner(
        &format!("Equity Signal Report - {}", symbol),
        &format!("Generated on {}", generated),
    );

    pdf.section("Features Used");
    let feature_list = if features.is_empty() { "N/A".to_string() } else { features.join(", ") };
    pdf.paragraph(&feature_list, 9.0);
    pdf.space(2.0);

    pdf.section("Market Overview");
    pdf.table(&[
        ["Metric".to_string(), "Value".to_string()],
        ["Cumulative Strategy Return".to_string(), fmt_pct(Some(pnl.strat_cum_return), 2)],
        ["Hit Rate (when Long)".to_string(), fmt_pct(pnl.hit_rate_when_long, 2)],
        ["IC (Signal vs Fwd Return)".to_string(), fmt_num(pnl.spearman_ic_signal_vs_fwd)],
        ["Long Signals".to_string(), pnl.n_long.to_string()],
    ]);

    pdf.section("Price and Momentum Analysis");
    pdf.paragraph(
        &format!(
            "The first two figures show the price trend of {} with its short-term and long-term \
             moving averages, followed by 5-day momentum. Green bars mark periods of upward \
             short-term pressure; red bars mark cooling phases or pullbacks. Together they show \
             acceleration or exhaustion before any model-driven signal is considered.",
            symbol
        ),
        9.0,
    );
    for figure in figures.iter().take(2) {
        pdf.figure(figure)?;
    }

    pdf.section("Model Accuracy and Confidence");
    pdf.table(&[
        ["Metric".to_string(), "Value".to_string()],
        ["Out-of-sample Rows".to_string(), cls.n_oos.to_string()],
        ["Overall Accuracy".to_string(), fmt_pct(Some(cls.accuracy), 2)],
        ["Precision (Positive)".to_string(), fmt_pct(Some(cls.precision_pos), 2)],
        ["Recall (Positive)".to_string(), fmt_pct(Some(cls.recall_pos), 2)],
        ["ROC AUC".to_string(), fmt_num(cls.roc_auc)],
    ]);
    pdf.paragraph(
        &format!(
            "The model reaches an overall out-of-sample accuracy of about {}, with {} precision \
             when predicting upward moves (ROC AUC = {}).",
            fmt_pct(Some(cls.accuracy), 0),
            fmt_pct(Some(cls.precision_pos), 0),
            fmt_num(cls.roc_auc)
        ),
        9.0,
    );

    if let Some(figure) = figures.get(2) {
        pdf.figure(figure)?;
    }

    pdf.footer(&format!("Generated automatically by eqsignal - {}", generated));
    pdf.save(&path)?;
    debug!("wrote {}", path.display());

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::{ClassificationMetrics, PnlSketch};
    use tempfile::tempdir;

    fn bundle() -> MetricsBundle {
        MetricsBundle {
            classification: ClassificationMetrics {
                n_oos: 120,
                accuracy: 0.55,
                precision_pos: 0.6,
                recall_pos: 0.4,
                roc_auc: None,
            },
            pnl_sketch: PnlSketch {
                strat_cum_return: 0.123,
                hit_rate_when_long: None,
                spearman_ic_signal_vs_fwd: Some(0.05),
                n_long: 0,
            },
        }
    }

    #[test]
    fn test_formatting() {
        assert_eq!(fmt_pct(Some(0.12345), 2), "12.35%");
        assert_eq!(fmt_pct(Some(0.5), 0), "50%");
        assert_eq!(fmt_pct(None, 2), "n/a");
        assert_eq!(fmt_num(Some(0.456)), "0.46");
        assert_eq!(fmt_num(Some(f64::NAN)), "n/a");
    }

    #[test]
    fn test_wrap() {
        let lines = wrap("aaa bbb ccc ddd", 7);
        assert_eq!(lines, vec!["aaa bbb", "ccc ddd"]);
        assert!(wrap("", 10).is_empty());
    }

    #[test]
    fn test_report_without_figures() {
        let dir = tempdir().unwrap();
        let out = OutputDir::create(dir.path()).unwrap();
        let missing = vec![dir.path().join("nope.png")];

        let path = build_pdf_report(&out, "^GSPC", &["mom_5", "rsi_14"], &bundle(), &missing).unwrap();
        assert_eq!(path, dir.path().join("_GSPC_report.pdf"));

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
