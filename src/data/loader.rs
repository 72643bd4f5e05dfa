//! Panel Loader Module
//! Lists panel files and loads them into memory using Polars.

use crate::data::panel::{PanelRecord, PerformancePanel};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const PRODUCT_COLUMN: &str = "product_id";
pub const DATE_COLUMN: &str = "date_value";
pub const LABEL_COLUMN: &str = "performance_label";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to read data folder {path}: {source}")]
    Folder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Missing required column: {0}")]
    MissingColumn(String),
}

/// Loads panel files and keeps every loaded panel cached by file name.
pub struct DataLoader {
    folder: PathBuf,
    cache: HashMap<String, PerformancePanel>,
}

impl DataLoader {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            cache: HashMap::new(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Point the loader at another folder. Cached panels belong to the old
    /// folder and are dropped.
    pub fn set_folder(&mut self, folder: impl Into<PathBuf>) {
        self.folder = folder.into();
        self.cache.clear();
    }

    /// File names in `folder` matching prefix and suffix, sorted.
    pub fn list_panel_files(
        folder: &Path,
        prefix: &str,
        suffix: &str,
    ) -> Result<Vec<String>, LoaderError> {
        let entries = std::fs::read_dir(folder).map_err(|source| LoaderError::Folder {
            path: folder.to_path_buf(),
            source,
        })?;

        let mut files: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
            .filter(|name| name.starts_with(prefix) && name.ends_with(suffix))
            .collect();
        files.sort();

        debug!(folder = %folder.display(), count = files.len(), "Listed panel files");
        Ok(files)
    }

    /// Read one panel CSV.
    ///
    /// Every column is read as text; rows without a product or week are skipped.
    pub fn load_panel(path: &Path) -> Result<PerformancePanel, LoaderError> {
        let df = LazyCsvReader::new(path)
            .with_infer_schema_length(Some(0))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        let panel = Self::panel_from_dataframe(&df)?;
        info!(
            path = %path.display(),
            rows = df.height(),
            kept = panel.len(),
            "Loaded panel file"
        );
        Ok(panel)
    }

    /// Extract the three panel columns from a DataFrame.
    pub fn panel_from_dataframe(df: &DataFrame) -> Result<PerformancePanel, LoaderError> {
        let products = Self::text_column(df, PRODUCT_COLUMN)?;
        let dates = Self::text_column(df, DATE_COLUMN)?;
        let labels = Self::text_column(df, LABEL_COLUMN)?;

        let records = products
            .into_iter()
            .zip(dates)
            .zip(labels)
            .filter_map(|((product, date), label)| {
                Some(PanelRecord {
                    product_id: product?,
                    date_value: date?,
                    label,
                })
            })
            .collect();

        Ok(PerformancePanel::new(records))
    }

    /// Column values as written; only empty cells become `None`.
    fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, LoaderError> {
        let column = df
            .column(name)
            .map_err(|_| LoaderError::MissingColumn(name.to_string()))?;
        let text = column.cast(&DataType::String)?;
        let ca = text.str()?;

        Ok(ca
            .into_iter()
            .map(|v| v.filter(|s| !s.is_empty()).map(str::to_string))
            .collect())
    }

    /// Cached panel for `file_name`, loading it on first use.
    pub fn get_or_load(&mut self, file_name: &str) -> Result<&PerformancePanel, LoaderError> {
        if !self.cache.contains_key(file_name) {
            let panel = Self::load_panel(&self.folder.join(file_name))?;
            self.cache.insert(file_name.to_string(), panel);
        } else {
            debug!(file = file_name, "Panel cache hit");
        }
        Ok(&self.cache[file_name])
    }

    /// Cached panel without loading.
    pub fn cached(&self, file_name: &str) -> Option<&PerformancePanel> {
        self.cache.get(file_name)
    }

    /// Store a panel loaded elsewhere (background thread).
    pub fn insert(&mut self, file_name: &str, panel: PerformancePanel) {
        self.cache.insert(file_name.to_string(), panel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const CSV: &str = "\
product_id,date_value,performance_label,sales
A1,2024-01-01,low,10
A1,2024-01-08,top,12
B2,2024-01-01,,3
,2024-01-01,high,1
";

    #[test]
    fn test_list_panel_files_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["panel_TH_b.csv", "panel_TH_a.csv", "other.csv", "panel_TH_c.txt"] {
            fs::write(dir.path().join(name), CSV).unwrap();
        }

        let files = DataLoader::list_panel_files(dir.path(), "panel_TH_", ".csv").unwrap();
        assert_eq!(files, vec!["panel_TH_a.csv", "panel_TH_b.csv"]);
    }

    #[test]
    fn test_list_missing_folder() {
        let result = DataLoader::list_panel_files(Path::new("/no/such/folder"), "p", ".csv");
        assert!(matches!(result, Err(LoaderError::Folder { .. })));
    }

    #[test]
    fn test_load_panel_reads_text_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel_TH_a.csv");
        fs::write(&path, CSV).unwrap();

        let panel = DataLoader::load_panel(&path).unwrap();
        assert_eq!(panel.len(), 3);
        assert_eq!(panel.records()[0], PanelRecord::new("A1", "2024-01-01", Some("low")));
        assert_eq!(panel.records()[2].label, None);
    }

    #[test]
    fn test_labels_are_not_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel_TH_ws.csv");
        fs::write(
            &path,
            "product_id,date_value,performance_label\nA1,1,low\nA1,2, low\nA1,3,top \n",
        )
        .unwrap();

        let panel = DataLoader::load_panel(&path).unwrap();
        let labels: Vec<Option<&str>> = panel.records().iter().map(|r| r.label.as_deref()).collect();
        assert_eq!(labels, vec![Some("low"), Some(" low"), Some("top ")]);
        assert_eq!(panel.records()[0].score(), Some(1.0));
        assert_eq!(panel.records()[1].score(), None);
        assert_eq!(panel.records()[2].score(), None);
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel_TH_bad.csv");
        fs::write(&path, "product_id,date_value\nA,1\n").unwrap();

        let result = DataLoader::load_panel(&path);
        assert!(matches!(result, Err(LoaderError::MissingColumn(c)) if c == LABEL_COLUMN));
    }

    #[test]
    fn test_get_or_load_caches() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel_TH_a.csv");
        fs::write(&path, CSV).unwrap();

        let mut loader = DataLoader::new(dir.path());
        assert!(loader.cached("panel_TH_a.csv").is_none());
        assert_eq!(loader.get_or_load("panel_TH_a.csv").unwrap().len(), 3);

        // Removing the file proves the second call is served from cache.
        fs::remove_file(&path).unwrap();
        assert_eq!(loader.get_or_load("panel_TH_a.csv").unwrap().len(), 3);

        loader.set_folder(dir.path());
        assert!(loader.cached("panel_TH_a.csv").is_none());
    }
}
