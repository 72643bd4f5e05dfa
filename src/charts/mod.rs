//! Charts module - interactive and static chart rendering

mod plotter;
mod renderer;

pub use plotter::ChartPlotter;
pub use renderer::{RenderError, StaticChartRenderer};

use crate::data::PerformanceLevel;

pub const COMPOSITION_TITLE: &str = "Performance Composition Over Time (Including non)";
pub const DISTRIBUTION_TITLE: &str =
    "Distribution of Performance Volatility (Filtered by Eligible Products)";

pub fn delta_title(product_id: &str) -> String {
    format!("WoW Change vs Previous Period - Product {}", product_id)
}

pub fn trend_title(product_id: &str) -> String {
    format!("Performance Changes Over Time - Product {}", product_id)
}

/// tab10 colours for non/low/middle/high/top.
pub const LEVEL_COLORS: [(u8, u8, u8); 5] = [
    (31, 119, 180),  // Blue
    (255, 127, 14),  // Orange
    (44, 160, 44),   // Green
    (214, 39, 40),   // Red
    (148, 103, 189), // Purple
];

pub const UP_COLOR: (u8, u8, u8) = (44, 160, 44);
pub const DOWN_COLOR: (u8, u8, u8) = (214, 39, 40);
pub const FLAT_COLOR: (u8, u8, u8) = (127, 127, 127);
pub const HISTOGRAM_COLOR: (u8, u8, u8) = (135, 206, 235); // Sky blue
pub const TREND_COLOR: (u8, u8, u8) = (70, 130, 180); // Steel blue

pub fn level_color(level: PerformanceLevel) -> (u8, u8, u8) {
    LEVEL_COLORS[level.index()]
}

/// Label of a categorical axis position; empty between categories.
pub fn category_label(labels: &[String], value: f64) -> String {
    let idx = value.round();
    if (value - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_label() {
        let labels = vec!["w1".to_string(), "w2".to_string()];
        assert_eq!(category_label(&labels, 1.0), "w2");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, 2.0), "");
        assert_eq!(category_label(&labels, -1.0), "");
    }
}
