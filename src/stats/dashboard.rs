//! Dashboard snapshot: every section computed for one file, week range and product.

use crate::data::{PerformancePanel, WeekRange};
use crate::stats::composition::{composition, Composition};
use crate::stats::product::{deltas, periods, trend, DeltaSeries, Period, TrendSeries};
use crate::stats::volatility::{distribution, overview, Overview, VolatilityDistribution};
use tracing::{debug, warn};

/// Sections ④–⑥ for the selected product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductView {
    pub product_id: String,
    pub deltas: DeltaSeries,
    pub periods: Vec<Period>,
    pub trend: TrendSeries,
}

/// All six sections. Sections ①–③ are `None` when no product in the range
/// ever reached an active level.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub file_name: String,
    pub range: WeekRange,
    pub overview: Option<Overview>,
    pub composition: Option<Composition>,
    pub distribution: Option<VolatilityDistribution>,
    /// Products selectable for sections ④–⑥.
    pub products: Vec<String>,
    pub product: Option<ProductView>,
}

impl Dashboard {
    /// Build every section from the unfiltered panel.
    ///
    /// `product` falls back to the first product of the range when absent or
    /// not present in the range.
    pub fn build(
        file_name: &str,
        panel: &PerformancePanel,
        range: WeekRange,
        product: Option<&str>,
        histogram_bins: usize,
    ) -> Self {
        let filtered = panel.filter_range(&range);

        let overview = overview(&filtered, range.len());
        let composition = composition(&filtered, &range);
        let distribution = distribution(&filtered, histogram_bins);
        if overview.is_none() {
            warn!(
                file = file_name,
                weeks = range.len(),
                "No product reached low/middle/high/top in the selected weeks"
            );
        }

        let products = filtered.products();
        let selected = product
            .filter(|p| products.iter().any(|candidate| candidate == *p))
            .or_else(|| products.first().map(String::as_str))
            .map(str::to_string);

        let product = selected.map(|product_id| {
            let history = filtered.product_history(&product_id, &range);
            ProductView {
                deltas: deltas(&history),
                periods: periods(&history),
                trend: trend(&history),
                product_id,
            }
        });

        debug!(
            file = file_name,
            rows = filtered.len(),
            products = products.len(),
            "Dashboard built"
        );

        Self {
            file_name: file_name.to_string(),
            range,
            overview,
            composition,
            distribution,
            products,
            product,
        }
    }

    pub fn selected_product(&self) -> Option<&str> {
        self.product.as_ref().map(|p| p.product_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PanelRecord;

    fn panel() -> PerformancePanel {
        PerformancePanel::new(vec![
            PanelRecord::new("a", "w1", Some("low")),
            PanelRecord::new("a", "w2", Some("top")),
            PanelRecord::new("a", "w3", Some("top")),
            PanelRecord::new("b", "w1", Some("non")),
            PanelRecord::new("b", "w3", Some("non")),
        ])
    }

    #[test]
    fn test_build_full_range() {
        let panel = panel();
        let range = WeekRange::new(panel.dates());
        let dash = Dashboard::build("f.csv", &panel, range, Some("a"), 20);

        let overview = dash.overview.as_ref().unwrap();
        assert_eq!(overview.product_count, 1);
        assert_eq!(overview.week_count, 3);
        assert_eq!(dash.composition.as_ref().unwrap().eligible_total, 1);
        assert_eq!(dash.products, vec!["a", "b"]);

        let view = dash.product.as_ref().unwrap();
        assert_eq!(view.deltas.points.len(), 2);
        assert_eq!(view.periods.len(), 2);
        assert_eq!(view.trend.points.len(), 3);
    }

    #[test]
    fn test_range_without_active_products() {
        let panel = panel();
        let range = WeekRange::new(vec!["w9".to_string()]);
        let dash = Dashboard::build("f.csv", &panel, range, None, 20);
        assert!(dash.overview.is_none());
        assert!(dash.composition.is_none());
        assert!(dash.distribution.is_none());
        assert!(dash.products.is_empty());
        assert!(dash.product.is_none());
    }

    #[test]
    fn test_unknown_product_falls_back_to_first() {
        let panel = panel();
        let range = WeekRange::new(panel.dates());
        let dash = Dashboard::build("f.csv", &panel, range, Some("zzz"), 20);
        assert_eq!(dash.selected_product(), Some("a"));
    }
}
