//! Product Performance Volatility Dashboard
//!
//! Loads weekly per-product performance panels, filters them by week range
//! and renders six descriptive sections, either interactively (egui) or as
//! a static report (plotters).

pub mod charts;
pub mod cli;
pub mod config;
pub mod data;
pub mod gui;
pub mod ppt;
pub mod report;
pub mod stats;
