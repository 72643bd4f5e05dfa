//! Single-product sections: week-over-week deltas, stage periods and the trend line.

use crate::data::{PanelRecord, PerformanceLevel};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Up,
    Down,
    Flat,
}

impl Direction {
    pub fn of(delta: f64) -> Self {
        if delta > 0.0 {
            Direction::Up
        } else if delta < 0.0 {
            Direction::Down
        } else {
            Direction::Flat
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaPoint {
    pub date: String,
    pub delta: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeltaCounts {
    pub up: usize,
    pub down: usize,
    pub flat: usize,
}

/// Section ④ model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeltaSeries {
    pub points: Vec<DeltaPoint>,
    pub counts: DeltaCounts,
}

/// One run of identical labels (section ⑤).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Period {
    pub label: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub duration: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub score: Option<f64>,
    pub label: Option<String>,
}

/// Section ⑥ model.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrendSeries {
    pub points: Vec<TrendPoint>,
}

impl TrendSeries {
    /// Runs of consecutive scored points, as `(index, score)` pairs. Unscored
    /// points split the line.
    pub fn segments(&self) -> Vec<Vec<(usize, f64)>> {
        let mut segments = Vec::new();
        let mut current: Vec<(usize, f64)> = Vec::new();

        for (i, point) in self.points.iter().enumerate() {
            match point.score {
                Some(score) => current.push((i, score)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

/// Differences between consecutive rows of a week-ordered history.
///
/// The first row has no predecessor, and a difference with a missing score on
/// either side is dropped.
pub fn deltas(history: &[&PanelRecord]) -> DeltaSeries {
    let points: Vec<DeltaPoint> = history
        .windows(2)
        .filter_map(|pair| {
            let delta = pair[1].score()? - pair[0].score()?;
            Some(DeltaPoint {
                date: pair[1].date_value.clone(),
                delta,
                direction: Direction::of(delta),
            })
        })
        .collect();

    let mut counts = DeltaCounts::default();
    for point in &points {
        match point.direction {
            Direction::Up => counts.up += 1,
            Direction::Down => counts.down += 1,
            Direction::Flat => counts.flat += 1,
        }
    }

    DeltaSeries { points, counts }
}

/// Run-length segmentation by raw label. Missing labels never continue a run.
pub fn periods(history: &[&PanelRecord]) -> Vec<Period> {
    let mut periods: Vec<Period> = Vec::new();

    for record in history {
        let continues = match (periods.last(), &record.label) {
            (Some(last), Some(label)) => last.label.as_ref() == Some(label),
            _ => false,
        };

        if continues {
            if let Some(last) = periods.last_mut() {
                last.end_date = record.date_value.clone();
                last.duration += 1;
            }
        } else {
            periods.push(Period {
                label: record.label.clone(),
                start_date: record.date_value.clone(),
                end_date: record.date_value.clone(),
                duration: 1,
            });
        }
    }

    periods
}

pub fn trend(history: &[&PanelRecord]) -> TrendSeries {
    TrendSeries {
        points: history
            .iter()
            .map(|r| TrendPoint {
                date: r.date_value.clone(),
                score: r.score(),
                label: r.label.clone(),
            })
            .collect(),
    }
}

/// Y-axis tick label for the trend chart.
pub fn level_tick(value: f64) -> String {
    if (value - value.round()).abs() > 1e-6 {
        return String::new();
    }
    PerformanceLevel::from_score(value.round())
        .map(|level| level.label().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn history(labels: &[Option<&str>]) -> Vec<PanelRecord> {
        labels
            .iter()
            .enumerate()
            .map(|(i, label)| PanelRecord::new("p", &format!("w{}", i + 1), *label))
            .collect()
    }

    #[test]
    fn test_deltas_and_counts() {
        let rows = history(&[Some("low"), Some("high"), Some("high"), Some("non")]);
        let refs: Vec<&PanelRecord> = rows.iter().collect();
        let series = deltas(&refs);

        let values: Vec<f64> = series.points.iter().map(|p| p.delta).collect();
        assert_eq!(values, vec![2.0, 0.0, -3.0]);
        assert_eq!(series.points[0].date, "w2");
        assert_eq!(
            series.counts,
            DeltaCounts {
                up: 1,
                down: 1,
                flat: 1
            }
        );
    }

    #[test]
    fn test_deltas_skip_missing_scores() {
        let rows = history(&[Some("low"), Some("??"), Some("top"), Some("top")]);
        let refs: Vec<&PanelRecord> = rows.iter().collect();
        let series = deltas(&refs);
        assert_eq!(series.points.len(), 1);
        assert_eq!(series.points[0].date, "w4");
        assert_eq!(series.points[0].direction, Direction::Flat);
    }

    #[test]
    fn test_periods_run_length() {
        let rows = history(&[Some("low"), Some("low"), Some("top"), Some("low")]);
        let refs: Vec<&PanelRecord> = rows.iter().collect();
        let periods = periods(&refs);

        assert_eq!(periods.len(), 3);
        assert_eq!(periods[0].label.as_deref(), Some("low"));
        assert_eq!(periods[0].start_date, "w1");
        assert_eq!(periods[0].end_date, "w2");
        assert_eq!(periods[0].duration, 2);
        assert_eq!(periods[2].start_date, "w4");
        assert_eq!(periods[2].duration, 1);
    }

    #[test]
    fn test_missing_labels_never_merge() {
        let rows = history(&[None, None, Some("top")]);
        let refs: Vec<&PanelRecord> = rows.iter().collect();
        assert_eq!(periods(&refs).len(), 3);
        assert!(periods(&[]).is_empty());
    }

    #[test]
    fn test_trend_segments_break_on_gaps() {
        let rows = history(&[Some("low"), None, Some("top"), Some("middle")]);
        let refs: Vec<&PanelRecord> = rows.iter().collect();
        let series = trend(&refs);

        assert_eq!(series.points.len(), 4);
        assert_eq!(series.segments(), vec![vec![(0, 1.0)], vec![(2, 4.0), (3, 2.0)]]);
    }

    #[test]
    fn test_level_ticks() {
        assert_eq!(level_tick(0.0), "non");
        assert_eq!(level_tick(4.0), "top");
        assert_eq!(level_tick(1.5), "");
        assert_eq!(level_tick(-1.0), "");
    }

    #[test]
    fn test_duplicate_week_rows_stay_separate() {
        use crate::data::{PerformancePanel, WeekRange};

        let panel = PerformancePanel::new(vec![
            PanelRecord::new("10", "2", Some("low")),
            PanelRecord::new("11", "1", Some("middle")),
            PanelRecord::new("10", "1", Some("top")),
            PanelRecord::new("10", "2", Some("high")),
        ]);
        let range = WeekRange::new(vec!["1".into(), "2".into()]);
        let history = panel.product_history("10", &range);

        let labels: Vec<Option<&str>> = history.iter().map(|r| r.label.as_deref()).collect();
        assert_eq!(labels, vec![Some("top"), Some("low"), Some("high")]);

        let series = deltas(&history);
        let points: Vec<(&str, f64)> = series
            .points
            .iter()
            .map(|p| (p.date.as_str(), p.delta))
            .collect();
        assert_eq!(points, vec![("2", -3.0), ("2", 2.0)]);
        assert_eq!(
            series.counts,
            DeltaCounts {
                up: 1,
                down: 1,
                flat: 0
            }
        );

        let periods = periods(&history);
        assert_eq!(periods.len(), 3);
        assert!(periods.iter().all(|p| p.duration == 1));
        assert_eq!(periods[1].start_date, "2");
        assert_eq!(periods[2].label.as_deref(), Some("high"));

        assert_eq!(trend(&history).points.len(), 3);
    }
}
