//! Data module - panel loading and week filtering

mod loader;
mod panel;

pub use loader::{DataLoader, LoaderError, DATE_COLUMN, LABEL_COLUMN, PRODUCT_COLUMN};
pub use panel::{
    sort_values, PanelRecord, PerformanceLevel, PerformancePanel, RangeError, WeekRange,
};
