//! Control Panel Widget
//! Left side panel with the upload, reload and export controls.

use egui::{Color32, RichText};
use std::path::PathBuf;

/// Left side control panel with file selection and status.
pub struct ControlPanel {
    pub upload_path: Option<PathBuf>,
    pub default_path: PathBuf,
    pub progress: f32,
    pub status: String,
    pub export_enabled: bool,
    pub busy: bool,
}

impl ControlPanel {
    pub fn new(default_path: PathBuf) -> Self {
        Self {
            upload_path: None,
            default_path,
            progress: 0.0,
            status: "Ready".to_string(),
            export_enabled: false,
            busy: false,
        }
    }

    /// Update progress and status message
    pub fn set_progress(&mut self, progress: f32, status: &str) {
        self.progress = progress;
        self.status = status.to_string();
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📊 NotifyAnalytics")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
            ui.label(
                RichText::new("Upload Notification Data and have them visualised")
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);
        ui.label(
            RichText::new("Notification Data from The NotificationLog App as a CSV File")
                .size(11.0)
                .color(Color32::GRAY),
        );
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let (path_text, color) = match &self.upload_path {
                        Some(path) => (
                            path.file_name()
                                .map(|n| n.to_string_lossy().to_string())
                                .unwrap_or_else(|| path.display().to_string()),
                            Color32::WHITE,
                        ),
                        None => (
                            format!("Default: {}", self.default_path.display()),
                            Color32::GRAY,
                        ),
                    };
                    ui.label(RichText::new(path_text).size(12.0).color(color));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui
                            .add_enabled(!self.busy, egui::Button::new("📂 Browse"))
                            .clicked()
                        {
                            action = ControlPanelAction::BrowseFile;
                        }
                    });
                });
            });

        ui.add_space(8.0);
        if ui
            .add_enabled(
                !self.busy,
                egui::Button::new("↺ Reload default data")
                    .min_size(egui::vec2(ui.available_width(), 26.0)),
            )
            .clicked()
        {
            action = ControlPanelAction::ReloadDefault;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export Section =====
        ui.label(RichText::new("💾 Export").size(14.0).strong());
        ui.add_space(5.0);
        if ui
            .add_enabled(
                self.export_enabled && !self.busy,
                egui::Button::new("Export charts and summary")
                    .min_size(egui::vec2(ui.available_width(), 30.0)),
            )
            .clicked()
        {
            action = ControlPanelAction::Export;
        }

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Progress Section =====
        ui.label(RichText::new("📊 Progress").size(14.0).strong());
        ui.add_space(5.0);

        ui.add(
            egui::ProgressBar::new(self.progress / 100.0)
                .show_percentage()
                .animate(self.busy),
        );

        ui.add_space(5.0);

        let status_color = if self.status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if self.status.starts_with("Loaded") || self.status.starts_with("Exported") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        };
        ui.label(RichText::new(&self.status).size(11.0).color(status_color));

        action
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPanelAction {
    None,
    BrowseFile,
    ReloadDefault,
    Export,
}
