//! Volatility Dashboard - Product Performance Volatility Explorer
//!
//! Opens the interactive dashboard by default; `report` renders the same
//! sections to files without a window.

use anyhow::{anyhow, bail, Context, Result};
use eframe::egui;
use std::path::Path;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use volatility_dashboard::cli::{Cli, Commands};
use volatility_dashboard::config::{DashboardConfig, CONFIG_FILE_NAME};
use volatility_dashboard::data::{DataLoader, WeekRange};
use volatility_dashboard::gui::DashboardApp;
use volatility_dashboard::report::{export_report, ReportOptions};
use volatility_dashboard::stats::Dashboard;

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // No logging needed to write the default config
    if let Some(Commands::InitConfig) = cli.command {
        return handle_init_config();
    }

    init_logging(&cli);
    info!("Volatility Dashboard v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", cli);

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load(path)?,
        None => DashboardConfig::load_default()?.unwrap_or_default(),
    };
    config.merge_with_args(&cli);

    match cli.command.clone() {
        None | Some(Commands::Gui) => run_gui(config),
        Some(Commands::Files) => list_files(&config),
        Some(Commands::Report {
            file,
            start,
            end,
            product,
            ..
        }) => run_report(
            &config,
            &file,
            start.as_deref(),
            end.as_deref(),
            product.as_deref(),
        ),
        Some(Commands::InitConfig) => handle_init_config(),
    }
}

/// Initialize logging; RUST_LOG wins over the verbosity flag.
fn init_logging(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_level()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Write a default dashboard.toml, never overwriting an existing one.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        bail!(
            "{} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
    }

    std::fs::write(path, DashboardConfig::default_toml())
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

fn run_gui(config: DashboardConfig) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("Product Performance Volatility Dashboard"),
        ..Default::default()
    };

    eframe::run_native(
        "Volatility Dashboard",
        options,
        Box::new(|cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
    .map_err(|e| anyhow!("Dashboard window failed: {}", e))
}

fn list_files(config: &DashboardConfig) -> Result<()> {
    let files = DataLoader::list_panel_files(
        &config.data.folder,
        &config.data.file_prefix,
        &config.data.file_suffix,
    )?;

    if files.is_empty() {
        println!(
            "No {}*{} files in {}",
            config.data.file_prefix,
            config.data.file_suffix,
            config.data.folder.display()
        );
    }
    for file in files {
        println!("{}", file);
    }
    Ok(())
}

fn run_report(
    config: &DashboardConfig,
    file: &str,
    start: Option<&str>,
    end: Option<&str>,
    product: Option<&str>,
) -> Result<()> {
    let mut loader = DataLoader::new(config.data.folder.clone());
    let panel = loader
        .get_or_load(file)
        .with_context(|| format!("Failed to load panel file {}", file))?;

    let range = WeekRange::from_bounds(&panel.dates(), start, end)
        .with_context(|| format!("Invalid week range for {}", file))?;

    let dashboard = Dashboard::build(file, panel, range, product, config.charts.histogram_bins);

    if let Some(requested) = product {
        if !dashboard.products.iter().any(|p| p == requested) {
            bail!(
                "Product {} has no rows in the selected weeks of {}",
                requested,
                file
            );
        }
    }

    let options = ReportOptions {
        output_dir: config.report.output_dir.clone(),
        width: config.charts.export_width,
        height: config.charts.export_height,
        pptx: config.report.pptx,
    };
    let written = export_report(&dashboard, &options).context("Failed to export report")?;

    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}
