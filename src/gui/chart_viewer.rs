//! Dashboard Viewer Widget
//! Central scrollable panel showing sections ①–⑥ for the current snapshot.

use crate::charts::ChartPlotter;
use crate::data::WeekRange;
use crate::stats::Dashboard;
use egui::{Color32, ComboBox, RichText, ScrollArea};

const SECTION_SPACING: f32 = 18.0;
const NO_ELIGIBLE: &str =
    "No product in the selected weeks reached low/middle/high/top at least once.";
const ELIGIBLE_NOTE: &str =
    "Only products with at least one low/middle/high/top label in the selected weeks are counted.";

/// Page subtitle: current file and the selected week span.
fn range_caption(file_name: &str, range: &WeekRange) -> String {
    match (range.first(), range.last()) {
        (Some(start), Some(end)) => format!(
            "File: {}  ·  Weeks: {} → {} ({} weeks)",
            file_name,
            start,
            end,
            range.len()
        ),
        _ => format!("File: {}  ·  No weeks selected", file_name),
    }
}

fn distribution_caption(product_count: usize) -> String {
    format!("{} products included in the distribution.", product_count)
}

/// Actions triggered from the viewer.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewerAction {
    None,
    ProductChanged(String),
}

#[derive(Default)]
pub struct DashboardViewer {
    pub dashboard: Option<Dashboard>,
}

impl DashboardViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.dashboard = None;
    }

    pub fn set_dashboard(&mut self, dashboard: Dashboard) {
        self.dashboard = Some(dashboard);
    }

    pub fn show(&self, ui: &mut egui::Ui) -> ViewerAction {
        let Some(dashboard) = &self.dashboard else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return ViewerAction::None;
        };

        let mut action = ViewerAction::None;

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.label(
                    RichText::new("📊 Product Performance Volatility Dashboard")
                        .size(22.0)
                        .strong(),
                );
                ui.label(
                    RichText::new(range_caption(&dashboard.file_name, &dashboard.range))
                        .size(12.0)
                        .color(Color32::GRAY),
                );
                ui.add_space(SECTION_SPACING);

                Self::section_header(ui, "① Overview (filtered)");
                match &dashboard.overview {
                    Some(overview) => {
                        ChartPlotter::draw_overview(ui, overview);
                        Self::caption(ui, ELIGIBLE_NOTE);
                    }
                    None => Self::warning(ui, NO_ELIGIBLE),
                }
                ui.add_space(SECTION_SPACING);

                Self::section_header(ui, "② Performance Structure Over Time (including non)");
                match &dashboard.composition {
                    Some(composition) => {
                        ChartPlotter::draw_composition(ui, composition);
                        Self::caption(
                            ui,
                            &format!(
                                "Denominator: {} eligible products · average {:.1} products per week",
                                composition.eligible_total, composition.avg_products_per_week
                            ),
                        );
                    }
                    None => Self::warning(ui, NO_ELIGIBLE),
                }
                ui.add_space(SECTION_SPACING);

                Self::section_header(ui, "③ Volatility Distribution (filtered)");
                match &dashboard.distribution {
                    Some(distribution) => {
                        ChartPlotter::draw_distribution(ui, distribution);
                        Self::caption(ui, &distribution_caption(distribution.product_count));
                    }
                    None => Self::warning(ui, NO_ELIGIBLE),
                }
                ui.add_space(SECTION_SPACING);

                Self::section_header(ui, "④ Week-over-Week Change (Δ) for One Product");
                if dashboard.products.is_empty() {
                    Self::warning(ui, "No products in the selected weeks.");
                    return;
                }

                ui.horizontal(|ui| {
                    ui.label("Product:");
                    let selected = dashboard.selected_product().unwrap_or_default().to_string();
                    ComboBox::from_id_salt("product_select")
                        .width(180.0)
                        .selected_text(&selected)
                        .show_ui(ui, |ui| {
                            for product in &dashboard.products {
                                if ui.selectable_label(*product == selected, product).clicked()
                                    && *product != selected
                                {
                                    action = ViewerAction::ProductChanged(product.clone());
                                }
                            }
                        });
                });
                ui.add_space(8.0);

                let Some(view) = &dashboard.product else {
                    return;
                };

                ChartPlotter::draw_deltas(ui, view);
                let counts = view.deltas.counts;
                Self::caption(
                    ui,
                    &format!(
                        "Changes: up {} times, down {} times, flat {} times.",
                        counts.up, counts.down, counts.flat
                    ),
                );
                ui.add_space(SECTION_SPACING);

                Self::section_header(ui, "⑤ Performance Stages");
                ChartPlotter::draw_periods_table(ui, &view.product_id, &view.periods);
                ui.add_space(SECTION_SPACING);

                Self::section_header(ui, "⑥ Performance Trend for One Product");
                ChartPlotter::draw_trend(ui, view);
                ui.add_space(SECTION_SPACING);
            });

        action
    }

    fn section_header(ui: &mut egui::Ui, title: &str) {
        ui.label(RichText::new(title).size(17.0).strong());
        ui.separator();
        ui.add_space(6.0);
    }

    fn warning(ui: &mut egui::Ui, text: &str) {
        egui::Frame::none()
            .fill(Color32::from_rgba_unmultiplied(255, 193, 7, 40))
            .rounding(5.0)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.label(
                    RichText::new(format!("⚠ {}", text))
                        .size(13.0)
                        .color(Color32::from_rgb(255, 193, 7)),
                );
            });
    }

    fn caption(ui: &mut egui::Ui, text: &str) {
        ui.label(RichText::new(text).size(11.0).color(Color32::GRAY));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_caption_shows_span() {
        let range = WeekRange::new(vec!["2024-01-01".into(), "2024-01-08".into(), "2024-01-15".into()]);
        assert_eq!(
            range_caption("panel_TH_toys.csv", &range),
            "File: panel_TH_toys.csv  ·  Weeks: 2024-01-01 → 2024-01-15 (3 weeks)"
        );
    }

    #[test]
    fn test_range_caption_empty_range() {
        let caption = range_caption("panel_TH_toys.csv", &WeekRange::default());
        assert_eq!(caption, "File: panel_TH_toys.csv  ·  No weeks selected");
    }

    #[test]
    fn test_distribution_caption() {
        assert_eq!(distribution_caption(7), "7 products included in the distribution.");
    }
}
