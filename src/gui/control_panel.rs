//! Control Panel Widget
//! Left side panel: data folder, panel file, week range and export.

use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// Selections made in the side panel.
#[derive(Default, Clone)]
pub struct UserSettings {
    pub folder: PathBuf,
    pub file: Option<String>,
    pub start_week: Option<String>,
    pub end_week: Option<String>,
}

pub struct ControlPanel {
    pub settings: UserSettings,
    pub files: Vec<String>,
    pub weeks: Vec<String>,
    pub status: String,
    pub busy: bool,
    pub export_enabled: bool,
    folder_text: String,
}

impl Default for ControlPanel {
    fn default() -> Self {
        Self {
            settings: UserSettings::default(),
            files: Vec::new(),
            weeks: Vec::new(),
            status: "Ready".to_string(),
            busy: false,
            export_enabled: false,
            folder_text: String::new(),
        }
    }
}

impl ControlPanel {
    pub fn new(folder: PathBuf) -> Self {
        Self {
            folder_text: folder.display().to_string(),
            settings: UserSettings {
                folder,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn set_folder(&mut self, folder: PathBuf) {
        self.folder_text = folder.display().to_string();
        self.settings.folder = folder;
    }

    /// Replace the file list. Keeps the current file when still present.
    pub fn update_files(&mut self, files: Vec<String>) {
        let keep = self
            .settings
            .file
            .as_ref()
            .is_some_and(|f| files.contains(f));
        if !keep {
            self.settings.file = files.first().cloned();
        }
        self.files = files;
    }

    /// Replace the week list and reset the range to all weeks.
    pub fn update_weeks(&mut self, weeks: Vec<String>) {
        self.settings.start_week = weeks.first().cloned();
        self.settings.end_week = weeks.last().cloned();
        self.weeks = weeks;
    }

    pub fn clear_weeks(&mut self) {
        self.weeks.clear();
        self.settings.start_week = None;
        self.settings.end_week = None;
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📈 Volatility Dashboard")
                    .size(20.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Product Performance")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source =====
        ui.label(RichText::new("📁 Data Folder").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let response = ui.add(
                        egui::TextEdit::singleline(&mut self.folder_text).desired_width(180.0),
                    );
                    if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                        self.settings.folder = PathBuf::from(self.folder_text.trim());
                        action = ControlPanelAction::FolderChanged;
                    }
                    if ui.button("📂 Browse").clicked() {
                        action = ControlPanelAction::BrowseFolder;
                    }
                });
            });

        ui.add_space(10.0);

        let label_width = 80.0;
        let combo_width = 190.0;

        ui.horizontal(|ui| {
            ui.add_sized([label_width, 20.0], egui::Label::new("Panel File:"));
            let selected = self.settings.file.clone().unwrap_or_else(|| "-".to_string());
            ComboBox::from_id_salt("panel_file")
                .width(combo_width)
                .selected_text(selected)
                .show_ui(ui, |ui| {
                    for file in &self.files {
                        let is_selected = self.settings.file.as_deref() == Some(file.as_str());
                        if ui.selectable_label(is_selected, file).clicked() && !is_selected {
                            self.settings.file = Some(file.clone());
                            action = ControlPanelAction::FileChanged;
                        }
                    }
                });
        });

        if self.files.is_empty() {
            ui.label(
                RichText::new("No panel files found in this folder")
                    .size(11.0)
                    .color(Color32::from_rgb(255, 193, 7)),
            );
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Week Range =====
        ui.label(RichText::new("🗓 Week Range").size(14.0).strong());
        ui.add_space(8.0);

        for (label, id, slot) in [
            ("Start Week:", "start_week", &mut self.settings.start_week),
            ("End Week:", "end_week", &mut self.settings.end_week),
        ] {
            ui.horizontal(|ui| {
                ui.add_sized([label_width, 20.0], egui::Label::new(label));
                let selected = slot.clone().unwrap_or_else(|| "-".to_string());
                ComboBox::from_id_salt(id)
                    .width(combo_width)
                    .selected_text(selected)
                    .show_ui(ui, |ui| {
                        for week in &self.weeks {
                            let is_selected = slot.as_deref() == Some(week.as_str());
                            if ui.selectable_label(is_selected, week).clicked() && !is_selected {
                                *slot = Some(week.clone());
                                action = ControlPanelAction::RangeChanged;
                            }
                        }
                    });
            });
            ui.add_space(5.0);
        }

        ui.add_space(10.0);
        ui.separator();
        ui.add_space(10.0);

        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled && !self.busy, |ui| {
                let button = egui::Button::new(RichText::new("📄 Export Report").size(14.0))
                    .min_size(egui::vec2(170.0, 30.0));
                if ui.add(button).clicked() {
                    action = ControlPanelAction::Export;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status =====
        ui.horizontal(|ui| {
            if self.busy {
                ui.spinner();
            }
            let status_color = if self.status.starts_with("Error") {
                Color32::from_rgb(220, 53, 69)
            } else if self.status.starts_with("Exported") || self.status.starts_with("Loaded") {
                Color32::from_rgb(40, 167, 69)
            } else {
                Color32::GRAY
            };
            ui.label(RichText::new(&self.status).size(11.0).color(status_color));
        });

        action
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseFolder,
    FolderChanged,
    FileChanged,
    RangeChanged,
    Export,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_files_keeps_current_selection() {
        let mut panel = ControlPanel::new(PathBuf::from("data"));
        panel.update_files(vec!["panel_TH_a.csv".to_string(), "panel_TH_b.csv".to_string()]);
        assert_eq!(panel.settings.file.as_deref(), Some("panel_TH_a.csv"));

        panel.settings.file = Some("panel_TH_b.csv".to_string());
        panel.update_files(vec!["panel_TH_b.csv".to_string(), "panel_TH_c.csv".to_string()]);
        assert_eq!(panel.settings.file.as_deref(), Some("panel_TH_b.csv"));

        panel.update_files(Vec::new());
        assert!(panel.settings.file.is_none());
    }

    #[test]
    fn test_update_weeks_resets_range() {
        let mut panel = ControlPanel::new(PathBuf::from("data"));
        panel.update_weeks(vec!["1".to_string(), "2".to_string(), "3".to_string()]);
        assert_eq!(panel.settings.start_week.as_deref(), Some("1"));
        assert_eq!(panel.settings.end_week.as_deref(), Some("3"));

        panel.clear_weeks();
        assert!(panel.weeks.is_empty());
        assert!(panel.settings.start_week.is_none());
    }
}
