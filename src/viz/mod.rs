//! Chart rendering for upload reports
//!
//! Charts are rendered from the dataset already in memory and returned as
//! base64-encoded SVG documents. Rendering is best-effort: a failure here
//! must never fail the upload that requested it.

use crate::data::LABEL_COLUMN;
use crate::error::{FraudError, Result};
use crate::pipeline::report::ModelMetrics;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;
use std::fmt::Write as _;

/// Column holding the transaction amount, when present
const AMOUNT_COLUMN: &str = "Amount";

/// Renders the charts attached to an upload report
pub trait ChartRenderer: Send + Sync {
    fn render_all(
        &self,
        df: &DataFrame,
        class_distribution: &HashMap<String, usize>,
        metrics: &ModelMetrics,
    ) -> Result<HashMap<String, String>>;
}

/// Hand-built SVG charts, base64-encoded
#[derive(Debug, Clone)]
pub struct SvgChartRenderer {
    /// Rows sampled from the frame before histogram binning
    pub sample_cap: usize,
    pub seed: u64,
}

impl Default for SvgChartRenderer {
    fn default() -> Self {
        Self {
            sample_cap: 50_000,
            seed: 42,
        }
    }
}

impl ChartRenderer for SvgChartRenderer {
    fn render_all(
        &self,
        df: &DataFrame,
        class_distribution: &HashMap<String, usize>,
        metrics: &ModelMetrics,
    ) -> Result<HashMap<String, String>> {
        let mut graphs = HashMap::new();

        let genuine = class_distribution.get("0").copied().unwrap_or(0);
        let fraud = class_distribution.get("1").copied().unwrap_or(0);
        graphs.insert(
            "class_distribution".to_string(),
            encode(self.class_distribution_chart(genuine, fraud)?),
        );
        graphs.insert(
            "amount_distribution".to_string(),
            encode(self.amount_histogram(df)?),
        );
        graphs.insert(
            "metrics_chart".to_string(),
            encode(self.metrics_chart(metrics)?),
        );

        Ok(graphs)
    }
}

fn encode(svg: String) -> String {
    BASE64.encode(svg.as_bytes())
}

impl SvgChartRenderer {
    /// Two-slice donut of genuine vs fraudulent transaction counts
    fn class_distribution_chart(&self, genuine: usize, fraud: usize) -> Result<String> {
        let total = genuine + fraud;
        if total == 0 {
            return Err(FraudError::DataError(
                "cannot chart an empty class distribution".to_string(),
            ));
        }

        let fraud_frac = fraud as f64 / total as f64;
        let (cx, cy, r) = (200.0, 200.0, 130.0);

        let mut svg = svg_open(400, 400, "Transaction Class Distribution");
        if fraud == 0 || genuine == 0 {
            let color = if fraud > 0 { "#e74c3c" } else { "#2ecc71" };
            let _ = write!(
                svg,
                r#"<circle cx="{cx}" cy="{cy}" r="{r}" fill="{color}"/>"#
            );
        } else {
            // Fraud slice starts at 12 o'clock and sweeps clockwise
            let angle = fraud_frac * std::f64::consts::TAU;
            let (x, y) = (cx + r * angle.sin(), cy - r * angle.cos());
            let large_arc = i32::from(fraud_frac > 0.5);
            let _ = write!(
                svg,
                r##"<circle cx="{cx}" cy="{cy}" r="{r}" fill="#2ecc71"/><path d="M {cx} {cy} L {cx} {top} A {r} {r} 0 {large_arc} 1 {x:.3} {y:.3} Z" fill="#e74c3c"/>"##,
                top = cy - r,
            );
        }
        let _ = write!(
            svg,
            r#"<text x="200" y="380" text-anchor="middle" font-size="14">Genuine: {genuine}  Fraudulent: {fraud} ({:.3}%)</text>"#,
            fraud_frac * 100.0
        );
        svg.push_str("</svg>");
        Ok(svg)
    }

    /// Histogram of transaction amounts with the fraud subset overlaid
    fn amount_histogram(&self, df: &DataFrame) -> Result<String> {
        let amounts = self.column_values(df, AMOUNT_COLUMN)?;
        if amounts.is_empty() {
            return Err(FraudError::DataError(
                "no amount values to chart".to_string(),
            ));
        }
        let fraud_amounts = self.fraud_amounts(df).unwrap_or_default();

        let max = amounts.iter().cloned().fold(f64::MIN, f64::max);
        let min = amounts.iter().cloned().fold(f64::MAX, f64::min);
        let span = (max - min).max(f64::EPSILON);

        const BINS: usize = 50;
        let bin_of = |v: f64| (((v - min) / span * BINS as f64) as usize).min(BINS - 1);
        let mut all_bins = [0usize; BINS];
        let mut fraud_bins = [0usize; BINS];
        for &v in &amounts {
            all_bins[bin_of(v)] += 1;
        }
        for &v in &fraud_amounts {
            fraud_bins[bin_of(v)] += 1;
        }

        let tallest = *all_bins.iter().max().unwrap_or(&1) as f64;
        let (width, height, pad) = (600.0, 300.0, 30.0);
        let bar_w = (width - 2.0 * pad) / BINS as f64;

        let mut svg = svg_open(600, 300, "Transaction Amount Distribution");
        for (i, (&all, &frd)) in all_bins.iter().zip(fraud_bins.iter()).enumerate() {
            let x = pad + i as f64 * bar_w;
            let h = (all as f64 / tallest) * (height - 2.0 * pad);
            let _ = write!(
                svg,
                r##"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="#3498db" opacity="0.7"/>"##,
                y = height - pad - h,
                w = bar_w.max(1.0),
            );
            if frd > 0 {
                let fh = (frd as f64 / tallest) * (height - 2.0 * pad);
                let _ = write!(
                    svg,
                    r##"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{fh:.2}" fill="#e74c3c" opacity="0.8"/>"##,
                    y = height - pad - fh,
                    w = bar_w.max(1.0),
                );
            }
        }
        svg.push_str("</svg>");
        Ok(svg)
    }

    /// Bar chart of the six headline metrics
    fn metrics_chart(&self, metrics: &ModelMetrics) -> Result<String> {
        let bars = [
            ("Accuracy", metrics.accuracy),
            ("Precision", metrics.precision),
            ("Recall", metrics.recall),
            ("F1", metrics.f1_score),
            ("ROC-AUC", metrics.roc_auc),
            ("PR-AUC", metrics.pr_auc),
        ];

        let (width, height, pad) = (600.0, 300.0, 40.0);
        let slot = (width - 2.0 * pad) / bars.len() as f64;

        let mut svg = svg_open(600, 300, "Model Performance Metrics");
        for (i, (label, value)) in bars.iter().enumerate() {
            let value = value.clamp(0.0, 1.0);
            let x = pad + i as f64 * slot + slot * 0.15;
            let h = value * (height - 2.0 * pad);
            let _ = write!(
                svg,
                r##"<rect x="{x:.2}" y="{y:.2}" width="{w:.2}" height="{h:.2}" fill="#9b59b6"/><text x="{tx:.2}" y="{ty}" text-anchor="middle" font-size="11">{label}</text><text x="{tx:.2}" y="{vy:.2}" text-anchor="middle" font-size="10">{value:.3}</text>"##,
                y = height - pad - h,
                w = slot * 0.7,
                tx = x + slot * 0.35,
                ty = height - pad + 15.0,
                vy = height - pad - h - 5.0,
            );
        }
        svg.push_str("</svg>");
        Ok(svg)
    }

    /// Read a numeric column, sampling down to the configured cap
    fn column_values(&self, df: &DataFrame, name: &str) -> Result<Vec<f64>> {
        let column = df
            .column(name)
            .map_err(|_| FraudError::DataError(format!("column '{name}' not found")))?;
        let casted = column
            .cast(&DataType::Float64)
            .map_err(|e| FraudError::DataError(e.to_string()))?;
        let mut values: Vec<f64> = casted
            .f64()
            .map_err(|e| FraudError::DataError(e.to_string()))?
            .into_iter()
            .flatten()
            .collect();

        if values.len() > self.sample_cap {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
            values.shuffle(&mut rng);
            values.truncate(self.sample_cap);
        }
        Ok(values)
    }

    fn fraud_amounts(&self, df: &DataFrame) -> Result<Vec<f64>> {
        let labels = df
            .column(LABEL_COLUMN)
            .map_err(|_| FraudError::DataError(format!("column '{LABEL_COLUMN}' not found")))?
            .cast(&DataType::Float64)
            .map_err(|e| FraudError::DataError(e.to_string()))?;
        let amounts = df
            .column(AMOUNT_COLUMN)
            .map_err(|_| FraudError::DataError(format!("column '{AMOUNT_COLUMN}' not found")))?
            .cast(&DataType::Float64)
            .map_err(|e| FraudError::DataError(e.to_string()))?;

        let labels = labels
            .f64()
            .map_err(|e| FraudError::DataError(e.to_string()))?;
        let amounts = amounts
            .f64()
            .map_err(|e| FraudError::DataError(e.to_string()))?;

        Ok(labels
            .into_iter()
            .zip(amounts)
            .filter(|(l, _)| l.map_or(false, |l| l.round() as i64 == 1))
            .filter_map(|(_, a)| a)
            .collect())
    }
}

fn svg_open(width: u32, height: u32, title: &str) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}"><rect width="100%" height="100%" fill="white"/><text x="{mid}" y="20" text-anchor="middle" font-size="16" font-weight="bold">{title}</text>"#,
        mid = width / 2
    )
}
