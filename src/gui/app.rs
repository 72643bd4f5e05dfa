//! Volatility Dashboard Main Application
//! Main window with control panel and dashboard viewer.

use crate::config::DashboardConfig;
use crate::data::{DataLoader, PerformancePanel, WeekRange};
use crate::gui::{ControlPanel, ControlPanelAction, DashboardViewer, ViewerAction};
use crate::report::{export_report, ReportOptions};
use crate::stats::Dashboard;
use egui::SidePanel;
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use tracing::{debug, error, info, warn};

/// CSV loading result from background thread
enum LoadResult {
    Complete {
        file_name: String,
        panel: PerformancePanel,
    },
    Error {
        file_name: String,
        message: String,
    },
}

/// Main application window.
pub struct DashboardApp {
    config: DashboardConfig,
    loader: DataLoader,
    control_panel: ControlPanel,
    viewer: DashboardViewer,
    selected_product: Option<String>,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl DashboardApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: DashboardConfig) -> Self {
        Self::with_config(config)
    }

    fn with_config(config: DashboardConfig) -> Self {
        let folder = config.data.folder.clone();
        let mut app = Self {
            loader: DataLoader::new(folder.clone()),
            control_panel: ControlPanel::new(folder),
            viewer: DashboardViewer::new(),
            selected_product: None,
            load_rx: None,
            is_loading: false,
            config,
        };
        app.refresh_files();
        app
    }

    /// Pick a folder with the system dialog.
    fn handle_browse_folder(&mut self) {
        if let Some(folder) = rfd::FileDialog::new()
            .set_directory(self.loader.folder())
            .pick_folder()
        {
            self.control_panel.set_folder(folder);
            self.handle_folder_changed();
        }
    }

    fn handle_folder_changed(&mut self) {
        let folder = self.control_panel.settings.folder.clone();
        info!(folder = %folder.display(), "Data folder changed");
        self.cancel_load();
        self.loader.set_folder(folder);
        self.refresh_files();
    }

    /// Drop the pending load; its sender fails silently once the receiver is gone.
    fn cancel_load(&mut self) {
        if self.load_rx.take().is_some() {
            debug!("Abandoned in-flight panel load");
        }
        self.is_loading = false;
        self.control_panel.busy = false;
    }

    /// Re-scan the data folder and load the selected file.
    fn refresh_files(&mut self) {
        let files = match DataLoader::list_panel_files(
            self.loader.folder(),
            &self.config.data.file_prefix,
            &self.config.data.file_suffix,
        ) {
            Ok(files) => files,
            Err(e) => {
                warn!("{}", e);
                self.control_panel.set_status(format!("Error: {}", e));
                Vec::new()
            }
        };

        if files.is_empty() {
            self.viewer.clear();
            self.control_panel.clear_weeks();
            self.control_panel.export_enabled = false;
        }
        self.control_panel.update_files(files);
        self.load_selected_file();
    }

    /// Load the selected file, from cache when possible, otherwise on a
    /// background thread.
    fn load_selected_file(&mut self) {
        let Some(file_name) = self.control_panel.settings.file.clone() else {
            return;
        };

        if self.loader.cached(&file_name).is_some() {
            debug!(file = %file_name, "Panel cache hit");
            self.on_panel_ready(&file_name);
            return;
        }

        self.viewer.clear();
        self.control_panel.export_enabled = false;
        self.control_panel.busy = true;
        self.control_panel
            .set_status(format!("Loading {}...", file_name));
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let path = self.loader.folder().join(&file_name);

        thread::spawn(move || {
            let result = match DataLoader::load_panel(&path) {
                Ok(panel) => LoadResult::Complete { file_name, panel },
                Err(e) => LoadResult::Error {
                    file_name,
                    message: e.to_string(),
                },
            };
            let _ = tx.send(result);
        });
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Ok(result) = rx.try_recv() {
                should_keep_receiver = false;
                self.is_loading = false;
                self.control_panel.busy = false;

                match result {
                    LoadResult::Complete { file_name, panel } => {
                        let rows = panel.len();
                        self.loader.insert(&file_name, panel);
                        // The user may have switched files while this one loaded.
                        if self.control_panel.settings.file.as_deref() == Some(file_name.as_str())
                        {
                            self.control_panel
                                .set_status(format!("Loaded {} rows from {}", rows, file_name));
                            self.on_panel_ready(&file_name);
                        } else {
                            self.load_selected_file();
                        }
                    }
                    LoadResult::Error { file_name, message } => {
                        error!(file = %file_name, "{}", message);
                        self.control_panel.set_status(format!("Error: {}", message));
                    }
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    /// New panel selected: reset the week range to all weeks and rebuild.
    fn on_panel_ready(&mut self, file_name: &str) {
        let weeks = self
            .loader
            .cached(file_name)
            .map(PerformancePanel::dates)
            .unwrap_or_default();
        self.control_panel.update_weeks(weeks);
        self.rebuild();
    }

    /// Recompute every section for the current file, range and product.
    fn rebuild(&mut self) {
        let settings = &self.control_panel.settings;
        let Some(file_name) = settings.file.as_deref() else {
            return;
        };
        let Some(panel) = self.loader.cached(file_name) else {
            return;
        };

        let range = match WeekRange::from_bounds(
            &self.control_panel.weeks,
            settings.start_week.as_deref(),
            settings.end_week.as_deref(),
        ) {
            Ok(range) => range,
            Err(e) => {
                let message = format!("Error: {}", e);
                self.viewer.clear();
                self.control_panel.export_enabled = false;
                self.control_panel.set_status(message);
                return;
            }
        };

        let dashboard = Dashboard::build(
            file_name,
            panel,
            range,
            self.selected_product.as_deref(),
            self.config.charts.histogram_bins,
        );
        self.selected_product = dashboard.selected_product().map(str::to_string);
        self.viewer.set_dashboard(dashboard);
        self.control_panel.export_enabled = true;
    }

    /// Export the current dashboard and open the output folder.
    fn handle_export(&mut self) {
        let Some(dashboard) = &self.viewer.dashboard else {
            self.control_panel.set_status("Nothing to export");
            return;
        };

        let options = ReportOptions {
            output_dir: self.config.report.output_dir.clone(),
            width: self.config.charts.export_width,
            height: self.config.charts.export_height,
            pptx: self.config.report.pptx,
        };

        match export_report(dashboard, &options) {
            Ok(paths) => {
                self.control_panel.set_status(format!(
                    "Exported {} files to {}",
                    paths.len(),
                    options.output_dir.display()
                ));
                if let Err(e) = open::that(&options.output_dir) {
                    warn!("Could not open {}: {}", options.output_dir.display(), e);
                }
            }
            Err(e) => {
                error!("Export failed: {}", e);
                self.control_panel.set_status(format!("Error: {}", e));
            }
        }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::BrowseFolder => self.handle_browse_folder(),
                        ControlPanelAction::FolderChanged => self.handle_folder_changed(),
                        ControlPanelAction::FileChanged => self.load_selected_file(),
                        ControlPanelAction::RangeChanged => self.rebuild(),
                        ControlPanelAction::Export => self.handle_export(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboard
        egui::CentralPanel::default().show(ctx, |ui| {
            if let ViewerAction::ProductChanged(product) = self.viewer.show(ui) {
                self.selected_product = Some(product);
                self.rebuild();
            }
        });
    }
}
