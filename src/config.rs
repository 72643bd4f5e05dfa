//! Configuration file handling.
//!
//! Settings live in `dashboard.toml`; every field has a default so a partial
//! file (or no file at all) is valid. CLI flags are merged on top.

use crate::cli::{Cli, Commands};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "dashboard.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Data source settings.
    #[serde(default)]
    pub data: DataConfig,

    /// Chart settings.
    #[serde(default)]
    pub charts: ChartConfig,

    /// Report export settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// Where panel files are found.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Folder scanned for panel files.
    #[serde(default = "default_folder")]
    pub folder: PathBuf,

    /// Panel file names must start with this prefix.
    #[serde(default = "default_file_prefix")]
    pub file_prefix: String,

    /// Panel file names must end with this suffix.
    #[serde(default = "default_file_suffix")]
    pub file_suffix: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            folder: default_folder(),
            file_prefix: default_file_prefix(),
            file_suffix: default_file_suffix(),
        }
    }
}

fn default_folder() -> PathBuf {
    PathBuf::from("data")
}

fn default_file_prefix() -> String {
    "panel_TH_".to_string()
}

fn default_file_suffix() -> String {
    ".csv".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartConfig {
    /// Number of bins in the volatility histogram.
    #[serde(default = "default_histogram_bins")]
    pub histogram_bins: usize,

    /// Width in pixels of exported chart images.
    #[serde(default = "default_export_width")]
    pub export_width: u32,

    /// Height in pixels of exported chart images.
    #[serde(default = "default_export_height")]
    pub export_height: u32,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            histogram_bins: default_histogram_bins(),
            export_width: default_export_width(),
            export_height: default_export_height(),
        }
    }
}

fn default_histogram_bins() -> usize {
    20
}

fn default_export_width() -> u32 {
    1400
}

fn default_export_height() -> u32 {
    700
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Directory reports are written into.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Assemble a PPTX deck next to the images.
    #[serde(default)]
    pub pptx: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            pptx: false,
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("dashboard_report")
}

impl DashboardConfig {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: DashboardConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE_NAME);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge CLI arguments into this configuration.
    ///
    /// Only values the user actually passed override the file.
    pub fn merge_with_args(&mut self, cli: &Cli) {
        if let Some(ref dir) = cli.data_dir {
            self.data.folder = dir.clone();
        }

        if let Some(Commands::Report { output, pptx, .. }) = &cli.command {
            if let Some(output) = output {
                self.report.output_dir = output.clone();
            }
            if *pptx {
                self.report.pptx = true;
            }
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = DashboardConfig::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = DashboardConfig::default();
        assert_eq!(config.data.file_prefix, "panel_TH_");
        assert_eq!(config.data.file_suffix, ".csv");
        assert_eq!(config.charts.histogram_bins, 20);
        assert!(!config.report.pptx);
    }

    #[test]
    fn test_parse_partial_config() {
        let toml_content = r#"
[data]
folder = "/srv/panels"

[charts]
histogram_bins = 12
"#;

        let config: DashboardConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.data.folder, PathBuf::from("/srv/panels"));
        assert_eq!(config.data.file_prefix, "panel_TH_");
        assert_eq!(config.charts.histogram_bins, 12);
        assert_eq!(config.charts.export_width, 1400);
        assert_eq!(config.report.output_dir, PathBuf::from("dashboard_report"));
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = DashboardConfig::default_toml();
        assert!(toml_str.contains("[data]"));
        assert!(toml_str.contains("[charts]"));
        assert!(toml_str.contains("[report]"));
    }

    #[test]
    fn test_cli_overrides_only_given_values() {
        let cli = Cli::try_parse_from([
            "volatility_dashboard",
            "--data-dir",
            "/tmp/panels",
            "report",
            "--file",
            "panel_TH_a.csv",
            "--pptx",
        ])
        .unwrap();

        let mut config = DashboardConfig::default();
        config.report.output_dir = PathBuf::from("keep_me");
        config.merge_with_args(&cli);

        assert_eq!(config.data.folder, PathBuf::from("/tmp/panels"));
        assert_eq!(config.report.output_dir, PathBuf::from("keep_me"));
        assert!(config.report.pptx);
    }
}
