//! Volatility Module
//! Per-product performance standard deviation, the overview metrics and the
//! distribution (histogram + KDE) built from them.

use crate::data::{sort_values, PerformancePanel};
use rayon::prelude::*;
use serde::Serialize;
use statrs::distribution::{Continuous, Normal};
use statrs::statistics::Statistics;
use std::collections::HashMap;

/// Number of points on the KDE curve.
pub const KDE_GRID_SIZE: usize = 200;

/// Score spread of one product over the selected weeks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductVolatility {
    pub product_id: String,
    pub std: f64,
}

/// Headline numbers of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    /// Mean of the per-product standard deviations; `None` when no product qualifies.
    pub mean_volatility: Option<f64>,
    pub product_count: usize,
    pub week_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.lower + self.upper) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Histogram of per-product volatility with a KDE overlay in count units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VolatilityDistribution {
    pub bins: Vec<HistogramBin>,
    pub kde: Vec<(f64, f64)>,
    pub product_count: usize,
}

impl VolatilityDistribution {
    pub fn max_count(&self) -> usize {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }
}

/// Sample standard deviation (ddof = 1) of each eligible product's scores.
///
/// Unscored rows are ignored; products with fewer than two scores are dropped.
pub fn volatility(panel: &PerformancePanel) -> Vec<ProductVolatility> {
    let mut scores: HashMap<&str, Vec<f64>> = HashMap::new();
    for record in panel.eligible_records() {
        let entry = scores.entry(record.product_id.as_str()).or_default();
        if let Some(score) = record.score() {
            entry.push(score);
        }
    }

    let mut product_ids: Vec<String> = scores.keys().map(|p| p.to_string()).collect();
    sort_values(&mut product_ids);

    product_ids
        .par_iter()
        .filter_map(|product_id| {
            let values = scores.get(product_id.as_str())?;
            if values.len() < 2 {
                return None;
            }
            let std = values.iter().std_dev();
            std.is_finite().then(|| ProductVolatility {
                product_id: product_id.clone(),
                std,
            })
        })
        .collect()
}

/// Section ①. `None` when no product is eligible.
pub fn overview(panel: &PerformancePanel, week_count: usize) -> Option<Overview> {
    if panel.eligible_products().is_empty() {
        return None;
    }

    let values = volatility(panel);
    let mean_volatility = if values.is_empty() {
        None
    } else {
        Some(values.iter().map(|v| v.std).mean())
    };

    Some(Overview {
        mean_volatility,
        product_count: values.len(),
        week_count,
    })
}

/// Section ③. `None` when no product is eligible.
pub fn distribution(panel: &PerformancePanel, bins: usize) -> Option<VolatilityDistribution> {
    if panel.eligible_products().is_empty() {
        return None;
    }

    let values: Vec<f64> = volatility(panel).into_iter().map(|v| v.std).collect();
    let bins = histogram(&values, bins);
    let bin_width = bins.first().map(HistogramBin::width).unwrap_or(0.0);
    let kde = kde_curve(&values, bin_width);

    Some(VolatilityDistribution {
        bins,
        kde,
        product_count: values.len(),
    })
}

/// Equal-width histogram over `[min, max]`; the last bin is closed.
///
/// A zero-width range is widened to `[v - 0.5, v + 0.5]`.
pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let mut lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let mut hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }

    let width = (hi - lo) / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - lo) / width).floor() as usize).min(bins - 1);
        counts[idx] += 1;
    }

    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| HistogramBin {
            lower: lo + i as f64 * width,
            upper: if i + 1 == bins {
                hi
            } else {
                lo + (i + 1) as f64 * width
            },
            count,
        })
        .collect()
}

/// Gaussian KDE with Scott's bandwidth, evaluated over the data range and
/// scaled to histogram counts (`density * n * bin_width`).
///
/// Empty when fewer than two values or no spread.
pub fn kde_curve(values: &[f64], bin_width: f64) -> Vec<(f64, f64)> {
    let n = values.len();
    if n < 2 {
        return Vec::new();
    }

    let sigma = values.iter().std_dev();
    if sigma.is_nan() || sigma <= 0.0 {
        return Vec::new();
    }

    let bandwidth = sigma * (n as f64).powf(-0.2);
    let Ok(kernel) = Normal::new(0.0, bandwidth) else {
        return Vec::new();
    };

    let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let step = (hi - lo) / (KDE_GRID_SIZE - 1) as f64;
    let scale = bin_width;

    (0..KDE_GRID_SIZE)
        .map(|i| {
            let x = lo + i as f64 * step;
            let density = values.iter().map(|&v| kernel.pdf(x - v)).sum::<f64>() / n as f64;
            (x, density * n as f64 * scale)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PanelRecord;

    fn panel(rows: &[(&str, &str, &str)]) -> PerformancePanel {
        PerformancePanel::new(
            rows.iter()
                .map(|(p, d, l)| PanelRecord::new(p, d, Some(l)))
                .collect(),
        )
    }

    #[test]
    fn test_volatility_sample_std() {
        let panel = panel(&[
            ("a", "1", "low"),
            ("a", "2", "high"),
            ("a", "3", "middle"),
            ("b", "1", "top"),
            ("b", "2", "top"),
            ("c", "1", "non"),
            ("c", "2", "non"),
        ]);

        let v = volatility(&panel);
        assert_eq!(v.len(), 2);
        assert_eq!(v[0].product_id, "a");
        assert!((v[0].std - 1.0).abs() < 1e-12);
        assert_eq!(v[1].std, 0.0);
    }

    #[test]
    fn test_single_observation_is_dropped() {
        let panel = panel(&[("a", "1", "low"), ("a", "2", "weird"), ("b", "1", "top")]);
        assert!(volatility(&panel).is_empty());

        let overview = overview(&panel, 2).unwrap();
        assert_eq!(overview.product_count, 0);
        assert_eq!(overview.mean_volatility, None);
        assert_eq!(overview.week_count, 2);
    }

    #[test]
    fn test_overview_requires_eligible_products() {
        let panel = panel(&[("a", "1", "non"), ("a", "2", "non")]);
        assert!(overview(&panel, 2).is_none());
        assert!(distribution(&panel, 20).is_none());
    }

    #[test]
    fn test_overview_mean() {
        let panel = panel(&[
            ("a", "1", "non"),
            ("a", "2", "middle"),
            ("b", "1", "low"),
            ("b", "2", "low"),
        ]);
        let overview = overview(&panel, 2).unwrap();
        assert_eq!(overview.product_count, 2);
        let expected = (2f64.sqrt() + 0.0) / 2.0;
        assert!((overview.mean_volatility.unwrap() - expected).abs() < 1e-12);
    }

    #[test]
    fn test_histogram_edges_and_counts() {
        let bins = histogram(&[0.0, 0.5, 1.0, 1.0], 2);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].lower, 0.0);
        assert_eq!(bins[1].upper, 1.0);
        assert_eq!(bins[0].count, 1);
        assert_eq!(bins[1].count, 3);
    }

    #[test]
    fn test_histogram_degenerate_range() {
        let bins = histogram(&[0.7, 0.7], 4);
        assert_eq!(bins.len(), 4);
        assert!((bins[0].lower - 0.2).abs() < 1e-12);
        assert!((bins[3].upper - 1.2).abs() < 1e-12);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
    }

    #[test]
    fn test_kde_scaled_to_counts() {
        let values = [0.0, 0.5, 0.5, 1.0, 1.5];
        let bins = histogram(&values, 5);
        let kde = kde_curve(&values, bins[0].width());
        assert_eq!(kde.len(), KDE_GRID_SIZE);
        assert_eq!(kde[0].0, 0.0);
        assert!((kde[KDE_GRID_SIZE - 1].0 - 1.5).abs() < 1e-12);
        assert!(kde.iter().all(|(_, y)| *y > 0.0));

        assert!(kde_curve(&[1.0], 0.1).is_empty());
        assert!(kde_curve(&[1.0, 1.0], 0.1).is_empty());
    }
}
