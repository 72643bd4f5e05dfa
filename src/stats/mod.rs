//! Stats module - section aggregations

pub mod composition;
pub mod dashboard;
pub mod product;
pub mod volatility;

pub use composition::Composition;
pub use dashboard::{Dashboard, ProductView};
pub use product::{DeltaCounts, DeltaSeries, Direction, Period, TrendSeries};
pub use volatility::{HistogramBin, Overview, ProductVolatility, VolatilityDistribution};
