//! Dashboard View Widget
//! Right side scrollable panel with the metric cards, charts and tables.
//!
//! Layout:
//! 1. Row A: notifications analysed, applications analysed, collection period
//! 2. Row B: top app, peak hour, most frequent title
//! 3. Top apps bar chart | connection type pie
//! 4. Local vs push pie | top engaging apps | high priority table
//! 5. Hourly distribution
//! 6. Sample notifications table

use crate::charts::{ChartPlotter, CONNECTION_PALETTE, LOCAL_PALETTE};
use crate::stats::{DashboardSummary, StatsCalculator};
use egui::{Color32, RichText, ScrollArea};

const SECTION_SPACING: f32 = 15.0;
const CHART_HEIGHT: f32 = 280.0;
const PIE_DIAMETER: f32 = 220.0;
const METRIC_COLOR: Color32 = Color32::from_rgb(100, 149, 237);
const DELTA_COLOR: Color32 = Color32::from_rgb(40, 167, 69);

const LOCAL_TEXT: &str = "Local Notifications are directly triggered by the mobile app, locally \
(ie: not coming from a remote server but coming from your own device).";
const PUSH_TEXT: &str = "Push Notifications come from a remote server and is pushed/sent directly \
to a user's device in real-time.";
const PRIORITY_TEXT: &str = "Identifying the mobile applications responsible for sending the \
highest volume of high priority notifications i.e Notifications with priority of +1 and +2.";

/// Scrollable dashboard for one loaded summary.
#[derive(Default)]
pub struct DashboardView {
    pub summary: Option<DashboardSummary>,
}

impl DashboardView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.summary = None;
    }

    pub fn set_summary(&mut self, summary: DashboardSummary) {
        self.summary = Some(summary);
    }

    pub fn show(&self, ui: &mut egui::Ui) {
        let Some(summary) = &self.summary else {
            ui.centered_and_justified(|ui| {
                ui.label(RichText::new("No Data").size(20.0));
            });
            return;
        };

        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading(RichText::new("NotifyAnalytics").size(26.0).strong());
                ui.add_space(SECTION_SPACING);

                Self::draw_metric_rows(ui, summary);
                ui.add_space(SECTION_SPACING);
                ui.separator();

                Self::draw_chart_row(ui, summary);
                ui.add_space(SECTION_SPACING);
                ui.separator();

                Self::draw_behaviour_row(ui, summary);
                ui.add_space(SECTION_SPACING);
                ui.separator();

                ui.label(RichText::new("Notifications by Hour of Day").size(15.0).strong());
                ChartPlotter::draw_hourly_chart(ui, &summary.hourly_counts, CHART_HEIGHT);
                ui.add_space(SECTION_SPACING);
                ui.separator();

                ui.label(RichText::new("Sample Dataset Notifications").size(15.0).strong());
                ui.add_space(5.0);
                Self::draw_sample_table(ui, summary);
            });
    }

    fn draw_metric_rows(ui: &mut egui::Ui, summary: &DashboardSummary) {
        let na = || "n/a".to_string();

        ui.columns(3, |cols| {
            Self::metric(
                &mut cols[0],
                "Notifications Analysed",
                &summary.total_notifications.to_string(),
                None,
            );
            Self::metric(
                &mut cols[1],
                "Number of Applications Analysed",
                &summary.distinct_apps.to_string(),
                None,
            );
            match &summary.collection_span {
                Some(span) => Self::metric(
                    &mut cols[2],
                    "Data Collection Period",
                    &span.label(),
                    Some(&format!(
                        "{} Hours of Notification Data Collected",
                        span.total_hours
                    )),
                ),
                None => Self::metric(&mut cols[2], "Data Collection Period", &na(), None),
            }
        });

        ui.add_space(SECTION_SPACING);

        ui.columns(3, |cols| {
            match &summary.top_app {
                Some(app) => Self::metric(
                    &mut cols[0],
                    "App with most Notifications",
                    &app.label,
                    Some(&format!("{} Notifications Sent", app.count)),
                ),
                None => Self::metric(&mut cols[0], "App with most Notifications", &na(), None),
            }
            Self::metric(
                &mut cols[1],
                "Hour of Day Notifications Peaked",
                &summary.peak_hour.as_ref().map(|p| p.label()).unwrap_or_else(na),
                None,
            );
            Self::metric(
                &mut cols[2],
                "Most Frequent Notification Title",
                &summary.most_frequent_title.clone().unwrap_or_else(na),
                None,
            );
        });
    }

    fn draw_chart_row(ui: &mut egui::Ui, summary: &DashboardSummary) {
        ui.columns(2, |cols| {
            cols[0].label(
                RichText::new(format!(
                    "Top {} Mobile Apps by Notifications Sent",
                    summary.top_apps.len()
                ))
                .size(15.0)
                .strong(),
            );
            ChartPlotter::draw_bar_chart(
                &mut cols[0],
                "top_apps_chart",
                &summary.top_apps,
                "Mobile Applications",
                "Number of Notifications Sent",
                CHART_HEIGHT,
            );

            cols[1].label(
                RichText::new("Notification Distribution by Internet Connection Type")
                    .size(15.0)
                    .strong(),
            );
            let shares = StatsCalculator::shares_from_counts(&summary.connection_types);
            ChartPlotter::draw_pie_chart(&mut cols[1], &shares, &CONNECTION_PALETTE, PIE_DIAMETER);
        });
    }

    fn draw_behaviour_row(ui: &mut egui::Ui, summary: &DashboardSummary) {
        ui.columns(3, |cols| {
            let ui = &mut cols[0];
            ui.label(
                RichText::new("Local Notifications vs Push Notifications")
                    .size(15.0)
                    .strong(),
            );
            ui.label(RichText::new("Local Notifications").size(13.0).strong());
            ui.label(LOCAL_TEXT);
            ui.label(RichText::new("Push Notifications").size(13.0).strong());
            ui.label(PUSH_TEXT);
            ui.add_space(8.0);
            ChartPlotter::draw_pie_chart(ui, &summary.local_only_share, &LOCAL_PALETTE, PIE_DIAMETER);

            let ui = &mut cols[1];
            ui.label(
                RichText::new(format!(
                    "Top {} Apps that Triggered User's Action",
                    summary.top_engaging_apps.len()
                ))
                .size(15.0)
                .strong(),
            );
            for (i, app) in summary.top_engaging_apps.iter().enumerate() {
                Self::metric(
                    ui,
                    &format!("{:02}", i + 1),
                    &app.app_name,
                    Some(&format!("{:.2} Average User Actions Taken", app.mean_actions)),
                );
            }

            let ui = &mut cols[2];
            ui.label(
                RichText::new("Applications with highest volume of High Priority Data")
                    .size(15.0)
                    .strong(),
            );
            ui.label(PRIORITY_TEXT);
            ui.add_space(5.0);
            Self::draw_priority_table(ui, summary);
        });
    }

    /// Single metric card: caption, big value, optional green delta line.
    fn metric(ui: &mut egui::Ui, caption: &str, value: &str, delta: Option<&str>) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(8.0)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(caption).size(12.0).color(Color32::GRAY));
                ui.label(RichText::new(value).size(22.0).strong().color(METRIC_COLOR));
                if let Some(delta) = delta {
                    ui.label(RichText::new(format!("↑ {}", delta)).size(12.0).color(DELTA_COLOR));
                }
            });
        ui.add_space(4.0);
    }

    fn draw_priority_table(ui: &mut egui::Ui, summary: &DashboardSummary) {
        egui::Grid::new("high_priority_table")
            .striped(true)
            .min_col_width(50.0)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label(RichText::new("appName").strong().size(11.0));
                ui.label(RichText::new("priority").strong().size(11.0));
                ui.label(RichText::new("count").strong().size(11.0));
                ui.end_row();

                for row in &summary.high_priority {
                    ui.label(RichText::new(&row.app_name).size(11.0));
                    ui.label(RichText::new(row.priority.to_string()).size(11.0));
                    ui.label(RichText::new(row.count.to_string()).size(11.0));
                    ui.end_row();
                }
            });
    }

    fn draw_sample_table(ui: &mut egui::Ui, summary: &DashboardSummary) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                egui::Grid::new("sample_table")
                    .striped(true)
                    .min_col_width(60.0)
                    .spacing([12.0, 4.0])
                    .show(ui, |ui| {
                        for header in ["appName", "postTime", "title", "priority"] {
                            ui.label(RichText::new(header).strong().size(11.0));
                        }
                        ui.end_row();

                        for row in &summary.sample {
                            ui.label(
                                RichText::new(row.app_name.as_deref().unwrap_or("-")).size(11.0),
                            );
                            ui.label(
                                RichText::new(row.post_time.format("%Y-%m-%d %H:%M:%S").to_string())
                                    .size(11.0),
                            );
                            ui.label(RichText::new(row.title.as_deref().unwrap_or("-")).size(11.0));
                            ui.label(
                                RichText::new(
                                    row.priority
                                        .map(|p| p.to_string())
                                        .unwrap_or_else(|| "-".to_string()),
                                )
                                .size(11.0),
                            );
                            ui.end_row();
                        }
                    });
            });
    }
}
