//! Report export
//! Writes every dashboard section to an output folder: chart PNGs, CSV tables,
//! a JSON summary and optionally a PPTX deck.

use crate::charts::{
    delta_title, trend_title, RenderError, StaticChartRenderer, COMPOSITION_TITLE,
    DISTRIBUTION_TITLE,
};
use crate::data::PerformanceLevel;
use crate::ppt::{ChartSlide, PptError, PptGenerator};
use crate::stats::{Composition, Dashboard, DeltaCounts, Overview, Period};
use polars::prelude::*;
use rayon::prelude::*;
use serde::Serialize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const PPTX_FILE_NAME: &str = "dashboard.pptx";

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Failed to write CSV table: {0}")]
    Table(#[from] PolarsError),
    #[error("Failed to write summary: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Ppt(#[from] PptError),
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub output_dir: PathBuf,
    pub width: u32,
    pub height: u32,
    pub pptx: bool,
}

/// Contents of `summary.json`.
#[derive(Debug, Serialize)]
pub struct ReportSummary<'a> {
    pub file: &'a str,
    pub start_week: Option<&'a str>,
    pub end_week: Option<&'a str>,
    pub week_count: usize,
    pub overview: Option<&'a Overview>,
    pub eligible_total: Option<usize>,
    pub avg_products_per_week: Option<f64>,
    pub product: Option<&'a str>,
    pub delta_counts: Option<DeltaCounts>,
    pub period_count: Option<usize>,
}

impl<'a> ReportSummary<'a> {
    pub fn from_dashboard(dashboard: &'a Dashboard) -> Self {
        Self {
            file: &dashboard.file_name,
            start_week: dashboard.range.first(),
            end_week: dashboard.range.last(),
            week_count: dashboard.range.len(),
            overview: dashboard.overview.as_ref(),
            eligible_total: dashboard.composition.as_ref().map(|c| c.eligible_total),
            avg_products_per_week: dashboard
                .composition
                .as_ref()
                .map(|c| c.avg_products_per_week),
            product: dashboard.selected_product(),
            delta_counts: dashboard.product.as_ref().map(|p| p.deltas.counts),
            period_count: dashboard.product.as_ref().map(|p| p.periods.len()),
        }
    }
}

/// Which chart a rendered image belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartKind {
    Composition,
    Volatility,
    Delta,
    Trend,
}

impl ChartKind {
    fn file_name(self) -> &'static str {
        match self {
            ChartKind::Composition => "composition.png",
            ChartKind::Volatility => "volatility.png",
            ChartKind::Delta => "delta.png",
            ChartKind::Trend => "trend.png",
        }
    }

    fn title(self, dashboard: &Dashboard) -> String {
        let product = dashboard.selected_product().unwrap_or_default();
        match self {
            ChartKind::Composition => COMPOSITION_TITLE.to_string(),
            ChartKind::Volatility => DISTRIBUTION_TITLE.to_string(),
            ChartKind::Delta => delta_title(product),
            ChartKind::Trend => trend_title(product),
        }
    }

    /// Charts that have data; empty sections are skipped.
    fn available(dashboard: &Dashboard) -> Vec<ChartKind> {
        let mut kinds = Vec::new();
        if dashboard.composition.is_some() {
            kinds.push(ChartKind::Composition);
        }
        if dashboard.distribution.is_some() {
            kinds.push(ChartKind::Volatility);
        }
        if let Some(view) = &dashboard.product {
            if !view.deltas.points.is_empty() {
                kinds.push(ChartKind::Delta);
            }
            if !view.trend.points.is_empty() {
                kinds.push(ChartKind::Trend);
            }
        }
        kinds
    }

    fn render(self, dashboard: &Dashboard, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        let empty = || RenderError::Draw(format!("no data for {}", self.file_name()));
        match self {
            ChartKind::Composition => {
                let composition = dashboard.composition.as_ref().ok_or_else(empty)?;
                StaticChartRenderer::render_composition(composition, width, height)
            }
            ChartKind::Volatility => {
                let distribution = dashboard.distribution.as_ref().ok_or_else(empty)?;
                StaticChartRenderer::render_distribution(distribution, width, height)
            }
            ChartKind::Delta => {
                let view = dashboard.product.as_ref().ok_or_else(empty)?;
                StaticChartRenderer::render_deltas(&view.product_id, &view.deltas, width, height)
            }
            ChartKind::Trend => {
                let view = dashboard.product.as_ref().ok_or_else(empty)?;
                StaticChartRenderer::render_trend(&view.product_id, &view.trend, width, height)
            }
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ReportError + '_ {
    move |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Write the dashboard to `options.output_dir` and return the written paths.
pub fn export_report(
    dashboard: &Dashboard,
    options: &ReportOptions,
) -> Result<Vec<PathBuf>, ReportError> {
    let out = &options.output_dir;
    fs::create_dir_all(out).map_err(io_error(out))?;

    let kinds = ChartKind::available(dashboard);
    let rendered: Vec<(ChartKind, Vec<u8>)> = kinds
        .par_iter()
        .map(|&kind| {
            kind.render(dashboard, options.width, options.height)
                .map(|png| (kind, png))
        })
        .collect::<Result<_, _>>()?;
    debug!(charts = rendered.len(), "Charts rendered");

    let mut written = Vec::new();
    for (kind, png) in &rendered {
        let path = out.join(kind.file_name());
        fs::write(&path, png).map_err(io_error(&path))?;
        written.push(path);
    }

    if let Some(view) = &dashboard.product {
        let path = out.join("periods.csv");
        write_csv(&mut periods_frame(&view.periods)?, &path)?;
        written.push(path);
    }

    if let Some(composition) = &dashboard.composition {
        let path = out.join("composition.csv");
        write_csv(&mut composition_frame(composition)?, &path)?;
        written.push(path);
    }

    let summary_path = out.join("summary.json");
    let summary = serde_json::to_string_pretty(&ReportSummary::from_dashboard(dashboard))?;
    fs::write(&summary_path, summary).map_err(io_error(&summary_path))?;
    written.push(summary_path);

    if options.pptx {
        if rendered.is_empty() {
            warn!("No charts to put in the presentation; skipping {}", PPTX_FILE_NAME);
        } else {
            let slides: Vec<ChartSlide> = rendered
                .into_iter()
                .map(|(kind, png)| ChartSlide {
                    title: kind.title(dashboard),
                    png,
                })
                .collect();
            let path = out.join(PPTX_FILE_NAME);
            let subtitle = match (dashboard.range.first(), dashboard.range.last()) {
                (Some(start), Some(end)) => format!("{} ({} to {})", dashboard.file_name, start, end),
                _ => dashboard.file_name.clone(),
            };
            PptGenerator::generate(&slides, &path, "Product Performance Volatility Dashboard", &subtitle)?;
            written.push(path);
        }
    }

    info!(
        dir = %out.display(),
        files = written.len(),
        "Report exported"
    );
    Ok(written)
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), ReportError> {
    let mut file = File::create(path).map_err(io_error(path))?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

/// Section ⑤ as a table.
pub fn periods_frame(periods: &[Period]) -> PolarsResult<DataFrame> {
    let labels: Vec<Option<String>> = periods.iter().map(|p| p.label.clone()).collect();
    let starts: Vec<String> = periods.iter().map(|p| p.start_date.clone()).collect();
    let ends: Vec<String> = periods.iter().map(|p| p.end_date.clone()).collect();
    let durations: Vec<u64> = periods.iter().map(|p| p.duration as u64).collect();

    DataFrame::new(vec![
        Column::new("performance_label".into(), labels),
        Column::new("start_date".into(), starts),
        Column::new("end_date".into(), ends),
        Column::new("duration".into(), durations),
    ])
}

/// Section ② as a table: one row per week, one share column per level.
pub fn composition_frame(composition: &Composition) -> PolarsResult<DataFrame> {
    let mut columns = vec![Column::new("week".into(), composition.weeks.clone())];
    for level in PerformanceLevel::ALL {
        columns.push(Column::new(
            level.label().into(),
            composition.shares[level.index()].clone(),
        ));
    }
    DataFrame::new(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(label: Option<&str>, start: &str, end: &str, duration: usize) -> Period {
        Period {
            label: label.map(str::to_string),
            start_date: start.to_string(),
            end_date: end.to_string(),
            duration,
        }
    }

    #[test]
    fn test_periods_frame() {
        let df = periods_frame(&[
            period(Some("low"), "w1", "w2", 2),
            period(None, "w3", "w3", 1),
        ])
        .unwrap();

        assert_eq!(df.shape(), (2, 4));
        assert_eq!(
            df.get_column_names_str(),
            vec!["performance_label", "start_date", "end_date", "duration"]
        );
        assert_eq!(df.column("performance_label").unwrap().null_count(), 1);
    }

    #[test]
    fn test_composition_frame() {
        let composition = Composition {
            weeks: vec!["w1".to_string(), "w2".to_string()],
            shares: [
                vec![0.5, 0.0],
                vec![0.5, 1.0],
                vec![0.0, 0.0],
                vec![0.0, 0.0],
                vec![0.0, 0.0],
            ],
            eligible_total: 2,
            avg_products_per_week: 1.5,
        };

        let df = composition_frame(&composition).unwrap();
        assert_eq!(df.shape(), (2, 6));
        assert_eq!(
            df.get_column_names_str(),
            vec!["week", "non", "low", "middle", "high", "top"]
        );
    }
}
