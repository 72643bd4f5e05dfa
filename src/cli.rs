//! Command-line interface argument parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Product Performance Volatility Dashboard
///
/// Explore how product performance levels fluctuate week over week.
///
/// Examples:
///   volatility_dashboard
///   volatility_dashboard --data-dir ./panels files
///   volatility_dashboard report --file panel_TH_toys.csv --start 2024-01-01 --pptx
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to configuration file
    ///
    /// If not specified, looks for dashboard.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Folder containing the panel CSV files
    #[arg(long, value_name = "DIR", env = "DASHBOARD_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Open the interactive dashboard (default)
    Gui,
    /// List the panel files found in the data folder
    Files,
    /// Render every dashboard section to files without opening a window
    Report {
        /// Panel file name inside the data folder
        #[arg(short, long, value_name = "NAME")]
        file: String,

        /// First week of the range (defaults to the earliest week)
        #[arg(long, value_name = "WEEK")]
        start: Option<String>,

        /// Last week of the range (defaults to the latest week)
        #[arg(long, value_name = "WEEK")]
        end: Option<String>,

        /// Product to chart in the per-product sections
        #[arg(short, long, value_name = "ID")]
        product: Option<String>,

        /// Output directory for the rendered report
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Also assemble the charts into a PPTX deck
        #[arg(long)]
        pptx: bool,
    },
    /// Write a default dashboard.toml to the current directory
    InitConfig,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Log level implied by the flags.
    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "info"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_means_gui() {
        let cli = Cli::try_parse_from(["volatility_dashboard"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level(), "info");
    }

    #[test]
    fn test_report_arguments() {
        let cli = Cli::try_parse_from([
            "volatility_dashboard",
            "-v",
            "report",
            "--file",
            "panel_TH_toys.csv",
            "--start",
            "2024-01-01",
            "--product",
            "A1",
            "--pptx",
        ])
        .unwrap();

        assert_eq!(cli.log_level(), "debug");
        match cli.command {
            Some(Commands::Report {
                file,
                start,
                end,
                product,
                output,
                pptx,
            }) => {
                assert_eq!(file, "panel_TH_toys.csv");
                assert_eq!(start.as_deref(), Some("2024-01-01"));
                assert!(end.is_none());
                assert_eq!(product.as_deref(), Some("A1"));
                assert!(output.is_none());
                assert!(pptx);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
