//! NotifyAnalytics Main Application
//! Main window with control panel and dashboard view.

use crate::config::AppConfig;
use crate::data::DataSource;
use crate::gui::{ControlPanel, ControlPanelAction, DashboardView};
use crate::pipeline::{AnalysisOutcome, AnalysisPipeline};
use crate::report::ReportExporter;
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use tracing::{error, info};

/// Loading result from background thread
enum LoadResult {
    Progress(f32, String),
    Complete(Box<AnalysisOutcome>),
    Error(String),
}

/// Next pending message, if any. A worker that hung up without sending a
/// final result is reported as an error.
fn next_load_result(rx: &Receiver<LoadResult>) -> Option<LoadResult> {
    match rx.try_recv() {
        Ok(result) => Some(result),
        Err(TryRecvError::Empty) => None,
        Err(TryRecvError::Disconnected) => Some(LoadResult::Error(
            "loading stopped without a result".to_string(),
        )),
    }
}

/// Main application window.
pub struct NotifyAnalyticsApp {
    config: AppConfig,
    control_panel: ControlPanel,
    dashboard: DashboardView,

    // Async loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl NotifyAnalyticsApp {
    /// Build the window and start loading `initial` (or the configured
    /// default data file).
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: AppConfig,
        initial: Option<PathBuf>,
    ) -> Self {
        let mut app = Self {
            control_panel: ControlPanel::new(config.default_data_path.clone()),
            dashboard: DashboardView::new(),
            config,
            load_rx: None,
            is_loading: false,
        };

        match initial {
            Some(path) => app.load_path(path),
            None => app.load_default(),
        }
        app
    }

    fn load_default(&mut self) {
        self.control_panel.upload_path = None;
        let source = DataSource::Default(self.config.default_data_path.clone());
        self.start_loading(source);
    }

    fn load_path(&mut self, path: PathBuf) {
        match DataSource::from_path(&path) {
            Ok(source) => {
                self.control_panel.upload_path = Some(path);
                self.start_loading(source);
            }
            Err(e) => {
                error!(error = %e, "could not read upload");
                self.control_panel.set_progress(0.0, &format!("Error: {}", e));
            }
        }
    }

    /// Handle file selection
    fn handle_browse_file(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Notification Logs", &["csv", "xlsx", "xls", "ods"])
            .add_filter("All Files", &["*"])
            .pick_file()
        {
            self.load_path(path);
        }
    }

    /// Run the pipeline in a background thread
    fn start_loading(&mut self, source: DataSource) {
        if self.is_loading {
            return;
        }

        self.dashboard.clear();
        self.control_panel.export_enabled = false;
        self.control_panel
            .set_progress(0.0, &format!("Loading {}...", source.name()));
        self.is_loading = true;
        self.control_panel.busy = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let config = self.config.clone();

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress(
                20.0,
                "Reading and cleaning notification data...".to_string(),
            ));

            let message = match AnalysisPipeline::run(&source, &config) {
                Ok(outcome) => LoadResult::Complete(Box::new(outcome)),
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(message);
        });
    }

    /// Check for loading results
    fn check_load_results(&mut self) {
        let rx = self.load_rx.take();
        if let Some(rx) = rx {
            let mut should_keep_receiver = true;

            while let Some(result) = next_load_result(&rx) {
                match result {
                    LoadResult::Progress(progress, status) => {
                        self.control_panel.set_progress(progress, &status);
                    }
                    LoadResult::Complete(outcome) => {
                        let status = outcome.status_line();
                        self.dashboard.set_summary(outcome.summary);
                        self.control_panel.set_progress(100.0, &status);
                        self.control_panel.export_enabled = true;
                        self.finish_loading();
                        should_keep_receiver = false;
                    }
                    LoadResult::Error(e) => {
                        error!(error = %e, "load failed");
                        self.control_panel
                            .set_progress(0.0, &format!("Error: {}", e));
                        self.finish_loading();
                        should_keep_receiver = false;
                    }
                }
                if !should_keep_receiver {
                    break;
                }
            }

            if should_keep_receiver {
                self.load_rx = Some(rx);
            }
        }
    }

    fn finish_loading(&mut self) {
        self.is_loading = false;
        self.control_panel.busy = false;
    }

    /// Export charts and summary into a chosen folder
    fn handle_export(&mut self) {
        let Some(summary) = &self.dashboard.summary else {
            self.control_panel.set_progress(0.0, "No data to export");
            return;
        };

        let Some(dir) = rfd::FileDialog::new().pick_folder() else {
            return;
        };

        self.control_panel.set_progress(10.0, "Rendering charts...");
        match ReportExporter::export(
            summary,
            &dir,
            self.config.export_width,
            self.config.export_height,
        ) {
            Ok(report) => {
                self.control_panel.set_progress(
                    100.0,
                    &format!(
                        "Exported {} files to {}",
                        report.written.len(),
                        dir.display()
                    ),
                );
                if let Err(e) = open::that(&dir) {
                    info!(error = %e, "could not open export folder");
                }
            }
            Err(e) => {
                error!(error = %e, "export failed");
                self.control_panel
                    .set_progress(0.0, &format!("Error: {}", e));
            }
        }
    }
}

impl eframe::App for NotifyAnalyticsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(280.0)
            .max_width(340.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    match self.control_panel.show(ui) {
                        ControlPanelAction::BrowseFile => self.handle_browse_file(),
                        ControlPanelAction::ReloadDefault => self.load_default(),
                        ControlPanelAction::Export => self.handle_export(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Dashboard
        egui::CentralPanel::default().show(ctx, |ui| {
            self.dashboard.show(ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::Sender;

    #[test]
    fn pending_channel_yields_nothing() {
        let (_tx, rx): (Sender<LoadResult>, _) = channel();
        assert!(next_load_result(&rx).is_none());
    }

    #[test]
    fn messages_are_delivered_in_order() {
        let (tx, rx) = channel();
        tx.send(LoadResult::Progress(20.0, "Reading".to_string())).unwrap();
        tx.send(LoadResult::Error("bad file".to_string())).unwrap();

        assert!(matches!(next_load_result(&rx), Some(LoadResult::Progress(p, _)) if p == 20.0));
        assert!(matches!(next_load_result(&rx), Some(LoadResult::Error(e)) if e == "bad file"));
    }

    #[test]
    fn worker_that_dies_silently_becomes_an_error() {
        let (tx, rx) = channel::<LoadResult>();
        let worker = thread::spawn(move || {
            let _tx = tx;
            panic!("worker failed");
        });
        assert!(worker.join().is_err());

        match next_load_result(&rx) {
            Some(LoadResult::Error(e)) => assert!(e.contains("without a result")),
            _ => panic!("expected an error for a disconnected worker"),
        }
    }
}
