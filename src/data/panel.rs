//! Panel Processor Module
//! Performance label mapping, week ordering and range filtering.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RangeError {
    #[error("Unknown week: {0}")]
    UnknownWeek(String),
    #[error("Panel has no weeks")]
    NoWeeks,
}

/// Ordinal performance level attached to a product each week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum PerformanceLevel {
    Non,
    Low,
    Middle,
    High,
    Top,
}

impl PerformanceLevel {
    /// All levels in score order.
    pub const ALL: [PerformanceLevel; 5] = [
        PerformanceLevel::Non,
        PerformanceLevel::Low,
        PerformanceLevel::Middle,
        PerformanceLevel::High,
        PerformanceLevel::Top,
    ];

    /// Parse a raw label. Matching is exact.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "non" => Some(PerformanceLevel::Non),
            "low" => Some(PerformanceLevel::Low),
            "middle" => Some(PerformanceLevel::Middle),
            "high" => Some(PerformanceLevel::High),
            "top" => Some(PerformanceLevel::Top),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PerformanceLevel::Non => "non",
            PerformanceLevel::Low => "low",
            PerformanceLevel::Middle => "middle",
            PerformanceLevel::High => "high",
            PerformanceLevel::Top => "top",
        }
    }

    pub fn score(self) -> f64 {
        self as u8 as f64
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// Level for an integral score in `0..=4`.
    pub fn from_score(score: f64) -> Option<Self> {
        if score.fract() != 0.0 || score < 0.0 {
            return None;
        }
        Self::ALL.get(score as usize).copied()
    }

    /// Anything above `non` counts as an observed performance.
    pub fn is_active(self) -> bool {
        self != PerformanceLevel::Non
    }
}

/// One row of a panel file.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelRecord {
    pub product_id: String,
    pub date_value: String,
    pub label: Option<String>,
}

impl PanelRecord {
    pub fn new(product_id: &str, date_value: &str, label: Option<&str>) -> Self {
        Self {
            product_id: product_id.to_string(),
            date_value: date_value.to_string(),
            label: label.map(str::to_string),
        }
    }

    pub fn level(&self) -> Option<PerformanceLevel> {
        self.label.as_deref().and_then(PerformanceLevel::from_label)
    }

    /// Numeric score, absent for missing or unmapped labels.
    pub fn score(&self) -> Option<f64> {
        self.level().map(PerformanceLevel::score)
    }
}

/// Sort values numerically when all of them are numbers, lexicographically otherwise.
pub fn sort_values(values: &mut [String]) {
    let numeric: Option<Vec<f64>> = values.iter().map(|v| v.parse::<f64>().ok()).collect();

    if numeric.is_some() {
        values.sort_by(|a, b| {
            let a = a.parse::<f64>().unwrap_or(f64::NAN);
            let b = b.parse::<f64>().unwrap_or(f64::NAN);
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        });
    } else {
        values.sort();
    }
}

fn sorted_unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let unique: HashSet<&str> = values.collect();
    let mut values: Vec<String> = unique.into_iter().map(str::to_string).collect();
    sort_values(&mut values);
    values
}

/// Inclusive, ordered slice of the panel's weeks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeekRange {
    weeks: Vec<String>,
    positions: HashMap<String, usize>,
}

impl WeekRange {
    pub fn new(weeks: Vec<String>) -> Self {
        let positions = weeks
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i))
            .collect();
        Self { weeks, positions }
    }

    /// Weeks from `start` through `end` of the sorted week list.
    ///
    /// A start after the end gives an empty range.
    pub fn select(dates: &[String], start: &str, end: &str) -> Result<Self, RangeError> {
        let start_idx = dates
            .iter()
            .position(|d| d == start)
            .ok_or_else(|| RangeError::UnknownWeek(start.to_string()))?;
        let end_idx = dates
            .iter()
            .position(|d| d == end)
            .ok_or_else(|| RangeError::UnknownWeek(end.to_string()))?;

        if start_idx > end_idx {
            return Ok(Self::default());
        }
        Ok(Self::new(dates[start_idx..=end_idx].to_vec()))
    }

    /// Range covering every week, or an optional start/end override.
    pub fn from_bounds(
        dates: &[String],
        start: Option<&str>,
        end: Option<&str>,
    ) -> Result<Self, RangeError> {
        let first = dates.first().ok_or(RangeError::NoWeeks)?;
        let last = dates.last().ok_or(RangeError::NoWeeks)?;
        Self::select(dates, start.unwrap_or(first), end.unwrap_or(last))
    }

    pub fn weeks(&self) -> &[String] {
        &self.weeks
    }

    pub fn len(&self) -> usize {
        self.weeks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weeks.is_empty()
    }

    pub fn position(&self, week: &str) -> Option<usize> {
        self.positions.get(week).copied()
    }

    pub fn contains(&self, week: &str) -> bool {
        self.positions.contains_key(week)
    }

    pub fn first(&self) -> Option<&str> {
        self.weeks.first().map(String::as_str)
    }

    pub fn last(&self) -> Option<&str> {
        self.weeks.last().map(String::as_str)
    }
}

/// All rows of one panel file.
#[derive(Debug, Clone, Default)]
pub struct PerformancePanel {
    records: Vec<PanelRecord>,
}

impl PerformancePanel {
    pub fn new(records: Vec<PanelRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[PanelRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted unique weeks.
    pub fn dates(&self) -> Vec<String> {
        sorted_unique(self.records.iter().map(|r| r.date_value.as_str()))
    }

    /// Sorted unique product ids.
    pub fn products(&self) -> Vec<String> {
        sorted_unique(self.records.iter().map(|r| r.product_id.as_str()))
    }

    /// Rows whose week falls inside `range`.
    pub fn filter_range(&self, range: &WeekRange) -> PerformancePanel {
        let records = self
            .records
            .iter()
            .filter(|r| range.contains(&r.date_value))
            .cloned()
            .collect();
        PerformancePanel { records }
    }

    /// Products with at least one active (non-`non`) label.
    pub fn eligible_products(&self) -> HashSet<&str> {
        self.records
            .iter()
            .filter(|r| r.level().is_some_and(PerformanceLevel::is_active))
            .map(|r| r.product_id.as_str())
            .collect()
    }

    /// Rows of the eligible products only.
    pub fn eligible_records(&self) -> Vec<&PanelRecord> {
        let eligible = self.eligible_products();
        self.records
            .iter()
            .filter(|r| eligible.contains(r.product_id.as_str()))
            .collect()
    }

    /// One product's rows, stably ordered by week position in `range`.
    pub fn product_history(&self, product_id: &str, range: &WeekRange) -> Vec<&PanelRecord> {
        let mut history: Vec<&PanelRecord> = self
            .records
            .iter()
            .filter(|r| r.product_id == product_id)
            .collect();
        history.sort_by_key(|r| range.position(&r.date_value).unwrap_or(usize::MAX));
        history
    }
}
