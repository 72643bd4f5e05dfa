//! Chart Plotter Module
//! Creates interactive visualizations using egui_plot.

use crate::charts::{
    category_label, level_color, COMPOSITION_TITLE, DISTRIBUTION_TITLE, DOWN_COLOR, FLAT_COLOR,
    HISTOGRAM_COLOR, TREND_COLOR, UP_COLOR,
};
use crate::data::PerformanceLevel;
use crate::stats::product::level_tick;
use crate::stats::{Composition, Direction, Overview, Period, ProductView, VolatilityDistribution};
use egui::{Color32, RichText, Stroke};
use egui_plot::{
    Bar, BarChart, GridMark, HLine, Legend, Line, Plot, PlotPoints, Points, Polygon,
};

const PLOT_HEIGHT: f32 = 320.0;

fn rgb(color: (u8, u8, u8)) -> Color32 {
    Color32::from_rgb(color.0, color.1, color.2)
}

/// One grid mark per category so every week gets a tick.
fn category_marks(count: usize) -> Vec<GridMark> {
    (0..count)
        .map(|i| GridMark {
            value: i as f64,
            step_size: 1.0,
        })
        .collect()
}

/// Draws the dashboard sections with egui / egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Section ①: three metric cards.
    pub fn draw_overview(ui: &mut egui::Ui, overview: &Overview) {
        let mean = overview
            .mean_volatility
            .map(|v| format!("{:.2}", v))
            .unwrap_or_else(|| "-".to_string());
        let cards = [
            ("Mean Volatility (Std)", mean),
            ("Products Included", overview.product_count.to_string()),
            ("Weeks in Range", format!("{} weeks", overview.week_count)),
        ];

        ui.columns(3, |columns| {
            for (column, (title, value)) in columns.iter_mut().zip(cards) {
                egui::Frame::none()
                    .fill(column.visuals().widgets.noninteractive.bg_fill)
                    .rounding(8.0)
                    .inner_margin(12.0)
                    .show(column, |ui| {
                        ui.label(RichText::new(title).size(12.0).color(Color32::GRAY));
                        ui.label(RichText::new(value).size(26.0).strong());
                    });
            }
        });
    }

    /// Section ②: stacked area of level shares per week.
    pub fn draw_composition(ui: &mut egui::Ui, composition: &Composition) {
        let weeks = composition.weeks.clone();
        let n = weeks.len();
        let cumulative = composition.cumulative();

        ui.label(RichText::new(COMPOSITION_TITLE).size(14.0).strong());
        Plot::new("composition_plot")
            .height(PLOT_HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .include_y(0.0)
            .include_y(1.0)
            .x_axis_label("Date (Week)")
            .y_axis_label("Proportion of Eligible Products")
            .x_grid_spacer(move |_input| category_marks(n))
            .x_axis_formatter(move |mark, _range| category_label(&weeks, mark.value))
            .show(ui, |plot_ui| {
                let mut lower = vec![0.0; n];
                for level in PerformanceLevel::ALL {
                    let upper = &cumulative[level.index()];
                    let color = rgb(level_color(level));

                    for polygon in Self::band_polygons(&lower, upper) {
                        plot_ui.polygon(
                            Polygon::new(PlotPoints::from(polygon))
                                .fill_color(color.gamma_multiply(0.85))
                                .stroke(Stroke::new(1.0, color))
                                .name(level.label()),
                        );
                    }
                    lower.clone_from(upper);
                }
            });
    }

    /// Convex quads between consecutive weeks, so each band fills correctly.
    fn band_polygons(lower: &[f64], upper: &[f64]) -> Vec<Vec<[f64; 2]>> {
        match lower.len() {
            0 => Vec::new(),
            1 => vec![vec![
                [-0.4, lower[0]],
                [0.4, lower[0]],
                [0.4, upper[0]],
                [-0.4, upper[0]],
            ]],
            n => (0..n - 1)
                .map(|i| {
                    let (x0, x1) = (i as f64, (i + 1) as f64);
                    vec![
                        [x0, lower[i]],
                        [x1, lower[i + 1]],
                        [x1, upper[i + 1]],
                        [x0, upper[i]],
                    ]
                })
                .collect(),
        }
    }

    /// Section ③: histogram of per-product volatility with KDE overlay.
    pub fn draw_distribution(ui: &mut egui::Ui, distribution: &VolatilityDistribution) {
        let color = rgb(HISTOGRAM_COLOR);

        ui.label(RichText::new(DISTRIBUTION_TITLE).size(14.0).strong());
        Plot::new("distribution_plot")
            .height(PLOT_HEIGHT * 0.8)
            .allow_scroll(false)
            .include_y(0.0)
            .x_axis_label("Performance Std (Volatility)")
            .y_axis_label("Number of Products")
            .show(ui, |plot_ui| {
                let bars: Vec<Bar> = distribution
                    .bins
                    .iter()
                    .map(|bin| {
                        Bar::new(bin.center(), bin.count as f64)
                            .width(bin.width())
                            .fill(color.gamma_multiply(0.7))
                            .stroke(Stroke::new(1.0, color))
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).name("Products"));

                if !distribution.kde.is_empty() {
                    let points: PlotPoints =
                        distribution.kde.iter().map(|&(x, y)| [x, y]).collect();
                    plot_ui.line(Line::new(points).color(color).width(2.0).name("KDE"));
                }
            });
    }

    /// Section ④: week-over-week delta bars.
    pub fn draw_deltas(ui: &mut egui::Ui, view: &ProductView) {
        let dates: Vec<String> = view.deltas.points.iter().map(|p| p.date.clone()).collect();
        let n = dates.len();

        ui.label(
            RichText::new(crate::charts::delta_title(&view.product_id))
                .size(14.0)
                .strong(),
        );
        Plot::new("delta_plot")
            .height(PLOT_HEIGHT * 0.8)
            .allow_scroll(false)
            .include_y(-1.0)
            .include_y(1.0)
            .x_axis_label("Date (Week)")
            .y_axis_label("Δ Performance (level change)")
            .x_grid_spacer(move |_input| category_marks(n))
            .x_axis_formatter(move |mark, _range| category_label(&dates, mark.value))
            .show(ui, |plot_ui| {
                let bars: Vec<Bar> = view
                    .deltas
                    .points
                    .iter()
                    .enumerate()
                    .map(|(i, point)| {
                        let color = match point.direction {
                            Direction::Up => rgb(UP_COLOR),
                            Direction::Down => rgb(DOWN_COLOR),
                            Direction::Flat => rgb(FLAT_COLOR),
                        };
                        Bar::new(i as f64, point.delta)
                            .width(0.8)
                            .fill(color)
                            .name(&point.date)
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars));
                plot_ui.hline(
                    HLine::new(0.0)
                        .color(Color32::BLACK.gamma_multiply(0.5))
                        .width(1.0),
                );
            });
    }

    /// Section ⑤: stage table.
    pub fn draw_periods_table(ui: &mut egui::Ui, product_id: &str, periods: &[Period]) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new(ui.make_persistent_id(format!("periods_{}", product_id)))
                    .striped(true)
                    .min_col_width(90.0)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        for header in ["performance_label", "start_date", "end_date", "duration"] {
                            ui.label(RichText::new(header).strong().size(12.0));
                        }
                        ui.end_row();

                        for period in periods {
                            let label = period.label.as_deref().unwrap_or("-");
                            let color = PerformanceLevel::from_label(label)
                                .map(|level| rgb(level_color(level)))
                                .unwrap_or_else(|| ui.visuals().text_color());
                            ui.label(RichText::new(label).size(12.0).color(color));
                            ui.label(RichText::new(&period.start_date).size(12.0));
                            ui.label(RichText::new(&period.end_date).size(12.0));
                            ui.label(RichText::new(period.duration.to_string()).size(12.0));
                            ui.end_row();
                        }
                    });
            });
    }

    /// Section ⑥: performance level trend line.
    pub fn draw_trend(ui: &mut egui::Ui, view: &ProductView) {
        let dates: Vec<String> = view.trend.points.iter().map(|p| p.date.clone()).collect();
        let n = dates.len();
        let color = rgb(TREND_COLOR);

        ui.label(
            RichText::new(crate::charts::trend_title(&view.product_id))
                .size(14.0)
                .strong(),
        );
        Plot::new("trend_plot")
            .height(PLOT_HEIGHT * 0.8)
            .allow_scroll(false)
            .include_y(-0.5)
            .include_y(4.5)
            .x_axis_label("Date (Week)")
            .y_axis_label("Performance Level")
            .x_grid_spacer(move |_input| category_marks(n))
            .x_axis_formatter(move |mark, _range| category_label(&dates, mark.value))
            .y_grid_spacer(|_input| category_marks(PerformanceLevel::ALL.len()))
            .y_axis_formatter(|mark, _range| level_tick(mark.value))
            .show(ui, |plot_ui| {
                for segment in view.trend.segments() {
                    let points: PlotPoints =
                        segment.iter().map(|&(i, score)| [i as f64, score]).collect();
                    plot_ui.line(Line::new(points).color(color).width(2.0));
                }

                let markers: PlotPoints = view
                    .trend
                    .points
                    .iter()
                    .enumerate()
                    .filter_map(|(i, p)| p.score.map(|score| [i as f64, score]))
                    .collect();
                plot_ui.points(Points::new(markers).radius(4.0).color(color));
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_polygons() {
        assert!(ChartPlotter::band_polygons(&[], &[]).is_empty());

        let single = ChartPlotter::band_polygons(&[0.0], &[0.5]);
        assert_eq!(single.len(), 1);
        assert_eq!(single[0][2], [0.4, 0.5]);

        let quads = ChartPlotter::band_polygons(&[0.0, 0.1, 0.2], &[0.5, 0.6, 0.7]);
        assert_eq!(quads.len(), 2);
        assert_eq!(quads[1][0], [1.0, 0.1]);
        assert_eq!(quads[1][2], [2.0, 0.7]);
    }
}
