//! Static Chart Renderer
//! Draws the dashboard charts with plotters into PNG bytes for export.
//!
//! Every chart uses a categorical week axis: category `i` sits at x = i and
//! its label is drawn rotated under the axis.

use crate::charts::{
    category_label, delta_title, level_color, trend_title, COMPOSITION_TITLE, DISTRIBUTION_TITLE,
    DOWN_COLOR, FLAT_COLOR, HISTOGRAM_COLOR, TREND_COLOR, UP_COLOR,
};
use crate::data::PerformanceLevel;
use crate::stats::product::level_tick;
use crate::stats::{Composition, DeltaSeries, Direction, TrendSeries, VolatilityDistribution};
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::error::Error;
use std::io::Cursor;
use thiserror::Error;

type DrawResult = Result<(), Box<dyn Error>>;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Chart drawing failed: {0}")]
    Draw(String),
    #[error("Image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("Pixel buffer does not match {0}x{1}")]
    Buffer(u32, u32),
}

fn color(c: (u8, u8, u8)) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

fn rotated_label_style() -> TextStyle<'static> {
    ("sans-serif", 13)
        .into_font()
        .transform(FontTransform::Rotate90)
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center))
}

/// Renders dashboard charts to PNG.
pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Draw into an RGB buffer and encode it as PNG.
    fn render_png<F>(width: u32, height: u32, draw: F) -> Result<Vec<u8>, RenderError>
    where
        F: FnOnce(&DrawingArea<BitMapBackend<'_>, Shift>) -> DrawResult,
    {
        let mut buffer = vec![255u8; (width * height * 3) as usize];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| RenderError::Draw(e.to_string()))?;
            draw(&root).map_err(|e| RenderError::Draw(e.to_string()))?;
            root.present()
                .map_err(|e| RenderError::Draw(e.to_string()))?;
        }

        let img = RgbImage::from_raw(width, height, buffer)
            .ok_or(RenderError::Buffer(width, height))?;
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
        Ok(bytes)
    }

    /// Section ②: stacked area chart of level shares.
    pub fn render_composition(
        composition: &Composition,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        Self::render_png(width, height, |root| {
            let weeks = &composition.weeks;
            let n = weeks.len();
            let cumulative = composition.cumulative();
            let x_max = n.saturating_sub(1).max(1) as f64;
            let y_max = cumulative[PerformanceLevel::Top.index()]
                .iter()
                .copied()
                .fold(1.0f64, f64::max)
                * 1.05;

            let mut chart = ChartBuilder::on(root)
                .caption(COMPOSITION_TITLE, ("sans-serif", 22))
                .margin(15)
                .x_label_area_size(110)
                .y_label_area_size(60)
                .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

            chart
                .configure_mesh()
                .x_labels(n.max(2))
                .x_label_formatter(&|x| category_label(weeks, *x))
                .x_label_style(rotated_label_style())
                .x_desc("Date (Week)")
                .y_desc("Proportion of Eligible Products")
                .draw()?;

            // Top of the stack first; each lower band paints over the one above.
            for level in PerformanceLevel::ALL.iter().rev() {
                let c = color(level_color(*level));
                let points: Vec<(f64, f64)> = cumulative[level.index()]
                    .iter()
                    .enumerate()
                    .map(|(i, &y)| (i as f64, y))
                    .collect();

                chart
                    .draw_series(AreaSeries::new(points, 0.0, c.filled()).border_style(c))?
                    .label(level.label())
                    .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 14, y + 5)], c.filled()));
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(WHITE.mix(0.8))
                .border_style(BLACK)
                .draw()?;
            Ok(())
        })
    }

    /// Section ③: histogram with KDE curve.
    pub fn render_distribution(
        distribution: &VolatilityDistribution,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        Self::render_png(width, height, |root| {
            let (x_min, x_max) = match (distribution.bins.first(), distribution.bins.last()) {
                (Some(first), Some(last)) => (first.lower, last.upper),
                _ => (0.0, 1.0),
            };
            let kde_max = distribution
                .kde
                .iter()
                .map(|&(_, y)| y)
                .fold(0.0f64, f64::max);
            let y_max = (distribution.max_count() as f64).max(kde_max).max(1.0) * 1.1;
            let fill = color(HISTOGRAM_COLOR);

            let mut chart = ChartBuilder::on(root)
                .caption(DISTRIBUTION_TITLE, ("sans-serif", 20))
                .margin(15)
                .x_label_area_size(45)
                .y_label_area_size(60)
                .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

            chart
                .configure_mesh()
                .x_desc("Performance Std (Volatility)")
                .y_desc("Number of Products")
                .draw()?;

            chart.draw_series(distribution.bins.iter().map(|bin| {
                Rectangle::new(
                    [(bin.lower, 0.0), (bin.upper, bin.count as f64)],
                    fill.mix(0.7).filled(),
                )
            }))?;
            chart.draw_series(distribution.bins.iter().map(|bin| {
                Rectangle::new(
                    [(bin.lower, 0.0), (bin.upper, bin.count as f64)],
                    WHITE.stroke_width(1),
                )
            }))?;

            if !distribution.kde.is_empty() {
                chart.draw_series(LineSeries::new(
                    distribution.kde.iter().copied(),
                    fill.stroke_width(2),
                ))?;
            }
            Ok(())
        })
    }

    /// Section ④: delta bars, green up, red down, gray flat.
    pub fn render_deltas(
        product_id: &str,
        deltas: &DeltaSeries,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        Self::render_png(width, height, |root| {
            let dates: Vec<String> = deltas.points.iter().map(|p| p.date.clone()).collect();
            let n = dates.len().max(1);
            let lowest = deltas.points.iter().map(|p| p.delta).fold(0.0f64, f64::min);
            let highest = deltas.points.iter().map(|p| p.delta).fold(0.0f64, f64::max);

            let mut chart = ChartBuilder::on(root)
                .caption(delta_title(product_id), ("sans-serif", 20))
                .margin(15)
                .x_label_area_size(110)
                .y_label_area_size(60)
                .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), (lowest - 0.5)..(highest + 0.5))?;

            chart
                .configure_mesh()
                .x_labels(n + 1)
                .x_label_formatter(&|x| category_label(&dates, *x))
                .x_label_style(rotated_label_style())
                .x_desc("Date (Week)")
                .y_desc("Δ Performance (level change)")
                .draw()?;

            chart.draw_series(deltas.points.iter().enumerate().map(|(i, point)| {
                let c = match point.direction {
                    Direction::Up => color(UP_COLOR),
                    Direction::Down => color(DOWN_COLOR),
                    Direction::Flat => color(FLAT_COLOR),
                };
                let x = i as f64;
                Rectangle::new([(x - 0.4, 0.0), (x + 0.4, point.delta)], c.filled())
            }))?;

            chart.draw_series(std::iter::once(PathElement::new(
                vec![(-0.5, 0.0), (n as f64 - 0.5, 0.0)],
                BLACK.mix(0.5),
            )))?;
            Ok(())
        })
    }

    /// Section ⑥: level trend line with markers and level-named ticks.
    pub fn render_trend(
        product_id: &str,
        trend: &TrendSeries,
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        Self::render_png(width, height, |root| {
            let dates: Vec<String> = trend.points.iter().map(|p| p.date.clone()).collect();
            let n = dates.len().max(1);
            let line = color(TREND_COLOR);

            let mut chart = ChartBuilder::on(root)
                .caption(trend_title(product_id), ("sans-serif", 20))
                .margin(15)
                .x_label_area_size(110)
                .y_label_area_size(70)
                .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), -0.5f64..4.5f64)?;

            chart
                .configure_mesh()
                .x_labels(n + 1)
                .x_label_formatter(&|x| category_label(&dates, *x))
                .x_label_style(rotated_label_style())
                .y_labels(PerformanceLevel::ALL.len() + 1)
                .y_label_formatter(&|y| level_tick(*y))
                .x_desc("Date (Week)")
                .y_desc("Performance Level")
                .draw()?;

            for segment in trend.segments() {
                chart.draw_series(LineSeries::new(
                    segment.into_iter().map(|(i, score)| (i as f64, score)),
                    line.stroke_width(2),
                ))?;
            }

            chart.draw_series(trend.points.iter().enumerate().filter_map(|(i, p)| {
                p.score
                    .map(|score| Circle::new((i as f64, score), 5, line.filled()))
            }))?;
            Ok(())
        })
    }
}
