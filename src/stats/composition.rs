//! Composition Module
//! Weekly share of each performance level among a fixed pool of eligible products.

use crate::data::{PerformanceLevel, PerformancePanel, WeekRange};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Stacked-area model for section ②.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Composition {
    pub weeks: Vec<String>,
    /// `shares[level.index()][week]`: distinct eligible products with that
    /// label that week, divided by `eligible_total`.
    pub shares: [Vec<f64>; 5],
    /// Fixed denominator: eligible products over the whole range.
    pub eligible_total: usize,
    /// Mean distinct eligible products per week, over weeks that have rows.
    pub avg_products_per_week: f64,
}

impl Composition {
    pub fn share(&self, level: PerformanceLevel, week: usize) -> f64 {
        self.shares[level.index()].get(week).copied().unwrap_or(0.0)
    }

    /// Running totals bottom-up in level order, one vector per level.
    pub fn cumulative(&self) -> [Vec<f64>; 5] {
        let mut running = vec![0.0; self.weeks.len()];
        PerformanceLevel::ALL.map(|level| {
            for (total, share) in running.iter_mut().zip(&self.shares[level.index()]) {
                *total += share;
            }
            running.clone()
        })
    }
}

/// Section ②. `None` when no product is eligible.
pub fn composition(panel: &PerformancePanel, range: &WeekRange) -> Option<Composition> {
    let eligible_total = panel.eligible_products().len();
    if eligible_total == 0 {
        return None;
    }

    let mut by_level: HashMap<(&str, PerformanceLevel), HashSet<&str>> = HashMap::new();
    let mut by_week: HashMap<&str, HashSet<&str>> = HashMap::new();

    for record in panel.eligible_records() {
        by_week
            .entry(record.date_value.as_str())
            .or_default()
            .insert(record.product_id.as_str());

        if let Some(level) = record.level() {
            by_level
                .entry((record.date_value.as_str(), level))
                .or_default()
                .insert(record.product_id.as_str());
        }
    }

    let shares = PerformanceLevel::ALL.map(|level| {
        range
            .weeks()
            .iter()
            .map(|week| {
                by_level
                    .get(&(week.as_str(), level))
                    .map(|products| products.len() as f64 / eligible_total as f64)
                    .unwrap_or(0.0)
            })
            .collect::<Vec<f64>>()
    });

    let avg_products_per_week = if by_week.is_empty() {
        0.0
    } else {
        by_week.values().map(|p| p.len()).sum::<usize>() as f64 / by_week.len() as f64
    };

    Some(Composition {
        weeks: range.weeks().to_vec(),
        shares,
        eligible_total,
        avg_products_per_week,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::PanelRecord;

    fn panel() -> PerformancePanel {
        PerformancePanel::new(vec![
            PanelRecord::new("a", "w1", Some("low")),
            PanelRecord::new("a", "w2", Some("non")),
            PanelRecord::new("b", "w1", Some("top")),
            PanelRecord::new("b", "w2", Some("top")),
            PanelRecord::new("c", "w1", Some("non")),
            PanelRecord::new("d", "w2", Some("high")),
        ])
    }

    #[test]
    fn test_fixed_denominator_shares() {
        let panel = panel();
        let range = WeekRange::new(vec!["w1".into(), "w2".into(), "w3".into()]);
        let comp = composition(&panel, &range).unwrap();

        assert_eq!(comp.eligible_total, 3);
        assert!((comp.share(PerformanceLevel::Low, 0) - 1.0 / 3.0).abs() < 1e-12);
        assert!((comp.share(PerformanceLevel::Top, 1) - 1.0 / 3.0).abs() < 1e-12);
        assert!((comp.share(PerformanceLevel::Non, 1) - 1.0 / 3.0).abs() < 1e-12);
        // c is never active, so its non rows are not counted.
        assert_eq!(comp.share(PerformanceLevel::Non, 0), 0.0);
        // A week without rows is all zeros.
        assert!(PerformanceLevel::ALL.iter().all(|l| comp.share(*l, 2) == 0.0));
    }

    #[test]
    fn test_average_products_per_week_skips_empty_weeks() {
        let panel = panel();
        let range = WeekRange::new(vec!["w1".into(), "w2".into(), "w3".into()]);
        let comp = composition(&panel, &range).unwrap();
        // w1: a, b; w2: a, b, d
        assert!((comp.avg_products_per_week - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_cumulative_tops_out_at_weekly_coverage() {
        let panel = panel();
        let range = WeekRange::new(vec!["w1".into(), "w2".into()]);
        let comp = composition(&panel, &range).unwrap();
        let cumulative = comp.cumulative();
        assert!((cumulative[4][1] - 1.0).abs() < 1e-12);
        assert!((cumulative[4][0] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_no_eligible_products() {
        let panel = PerformancePanel::new(vec![PanelRecord::new("a", "w1", Some("non"))]);
        let range = WeekRange::new(vec!["w1".into()]);
        assert!(composition(&panel, &range).is_none());
    }

    #[test]
    fn test_duplicate_week_rows_count_product_once() {
        let panel = PerformancePanel::new(vec![
            PanelRecord::new("10", "1", Some("top")),
            PanelRecord::new("10", "2", Some("low")),
            PanelRecord::new("10", "2", Some("low")),
            PanelRecord::new("10", "2", Some("high")),
            PanelRecord::new("11", "2", Some("low")),
        ]);
        let range = WeekRange::new(vec!["1".into(), "2".into()]);
        let comp = composition(&panel, &range).unwrap();

        assert_eq!(comp.eligible_total, 2);
        // Two low rows for product 10 in week 2 still count once.
        assert!((comp.share(PerformanceLevel::Low, 1) - 1.0).abs() < 1e-12);
        assert!((comp.share(PerformanceLevel::High, 1) - 0.5).abs() < 1e-12);
        assert!((comp.share(PerformanceLevel::Top, 0) - 0.5).abs() < 1e-12);
        // 1: {10}; 2: {10, 11}
        assert!((comp.avg_products_per_week - 1.5).abs() < 1e-12);
    }
}
