//! Report Export Module
//! Writes the dashboard charts as PNG files plus a JSON summary, and formats
//! the summary as plain text for headless runs.

use crate::charts::{RenderError, StaticChartRenderer};
use crate::stats::DashboardSummary;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to serialize summary: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to render {chart}: {source}")]
    Render {
        chart: String,
        #[source]
        source: RenderError,
    },
}

/// Files written by one export.
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    pub written: Vec<PathBuf>,
    /// Charts left out because there was nothing to draw.
    pub skipped: Vec<String>,
}

pub struct ReportExporter;

impl ReportExporter {
    /// Export every chart and the summary into `dir`, creating it if needed.
    pub fn export(
        summary: &DashboardSummary,
        dir: &Path,
        width: u32,
        height: u32,
    ) -> Result<ExportReport, ExportError> {
        fs::create_dir_all(dir).map_err(|source| ExportError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut report = ExportReport::default();

        let charts: [(&str, Result<Vec<u8>, RenderError>); 4] = [
            (
                "top_apps.png",
                StaticChartRenderer::render_bar_chart(
                    "Top Mobile Apps by Notifications Sent",
                    "Mobile Applications",
                    "Number of Notifications Sent",
                    &summary.top_apps,
                    width,
                    height,
                ),
            ),
            (
                "connection_types.png",
                StaticChartRenderer::render_connection_chart(
                    &summary.connection_types,
                    width,
                    height,
                ),
            ),
            (
                "local_vs_push.png",
                StaticChartRenderer::render_local_only_chart(
                    &summary.local_only_share,
                    width,
                    height,
                ),
            ),
            (
                "hourly_distribution.png",
                StaticChartRenderer::render_hourly_chart(&summary.hourly_counts, width, height),
            ),
        ];

        for (file_name, rendered) in charts {
            match rendered {
                Ok(png) => {
                    let path = dir.join(file_name);
                    Self::write(&path, &png)?;
                    report.written.push(path);
                }
                Err(RenderError::NoData(_)) => {
                    warn!(chart = file_name, "nothing to draw, chart skipped");
                    report.skipped.push(file_name.to_string());
                }
                Err(source) => {
                    return Err(ExportError::Render {
                        chart: file_name.to_string(),
                        source,
                    })
                }
            }
        }

        let path = dir.join(SUMMARY_FILE);
        Self::write(&path, serde_json::to_string_pretty(summary)?.as_bytes())?;
        report.written.push(path);

        info!(
            dir = %dir.display(),
            files = report.written.len(),
            skipped = report.skipped.len(),
            "report exported"
        );
        Ok(report)
    }

    fn write(path: &Path, bytes: &[u8]) -> Result<(), ExportError> {
        fs::write(path, bytes).map_err(|source| ExportError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Plain-text rendering of the dashboard for the terminal.
    pub fn format_text(summary: &DashboardSummary) -> String {
        let mut out = String::new();
        let na = || "n/a".to_string();

        let _ = writeln!(out, "NotifyAnalytics");
        let _ = writeln!(out, "===============");
        let _ = writeln!(out, "Notifications Analysed:          {}", summary.total_notifications);
        let _ = writeln!(out, "Number of Applications Analysed: {}", summary.distinct_apps);
        match &summary.collection_span {
            Some(span) => {
                let _ = writeln!(
                    out,
                    "Data Collection Period:          {} ({} Hours of Notification Data Collected)",
                    span.label(),
                    span.total_hours
                );
            }
            None => {
                let _ = writeln!(out, "Data Collection Period:          {}", na());
            }
        }
        let _ = writeln!(
            out,
            "App with most Notifications:     {}",
            summary
                .top_app
                .as_ref()
                .map(|a| format!("{} ({} Notifications Sent)", a.label, a.count))
                .unwrap_or_else(na)
        );
        let _ = writeln!(
            out,
            "Hour of Day Notifications Peaked: {}",
            summary.peak_hour.as_ref().map(|p| p.label()).unwrap_or_else(na)
        );
        let _ = writeln!(
            out,
            "Most Frequent Notification Title: {}",
            summary.most_frequent_title.clone().unwrap_or_else(na)
        );

        let _ = writeln!(out, "\nTop Mobile Apps by Notifications Sent");
        for (i, app) in summary.top_apps.iter().enumerate() {
            let _ = writeln!(out, "  {:>2}. {:<40} {}", i + 1, app.label, app.count);
        }

        let _ = writeln!(out, "\nNotification Distribution by Internet Connection Type");
        for c in &summary.connection_types {
            let _ = writeln!(out, "  {:<20} {}", c.label, c.count);
        }

        let _ = writeln!(out, "\nLocal Notifications vs Push Notifications");
        for p in &summary.local_only_share {
            let kind = if p.label == "true" { "Local" } else { "Push" };
            let _ = writeln!(out, "  {:<6} {:>5.1}%", kind, p.share * 100.0);
        }

        let _ = writeln!(out, "\nTop Apps that Triggered User's Action");
        for (i, app) in summary.top_engaging_apps.iter().enumerate() {
            let _ = writeln!(
                out,
                "  {:02}  {:<40} {:.2} Average User Actions Taken",
                i + 1,
                app.app_name,
                app.mean_actions
            );
        }

        let _ = writeln!(out, "\nApplications with highest volume of High Priority Data");
        for p in &summary.high_priority {
            let _ = writeln!(out, "  {:<40} priority {:>2}  {}", p.app_name, p.priority, p.count);
        }

        let _ = writeln!(out, "\nSample Dataset Notifications");
        for row in &summary.sample {
            let _ = writeln!(
                out,
                "  {:<30} {}  {:<40} {}",
                row.app_name.as_deref().unwrap_or("-"),
                row.post_time.format("%Y-%m-%d %H:%M:%S"),
                row.title.as_deref().unwrap_or("-"),
                row.priority.map(|p| p.to_string()).unwrap_or_else(|| "-".to_string())
            );
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::SummaryOptions;

    #[test]
    fn empty_summary_exports_json_and_skips_charts() {
        let dir = tempfile::tempdir().unwrap();
        let summary = DashboardSummary::compute(&[], &SummaryOptions::default());

        let report = ReportExporter::export(&summary, dir.path(), 400, 300).unwrap();
        assert_eq!(report.skipped.len(), 4);
        assert_eq!(report.written, vec![dir.path().join(SUMMARY_FILE)]);

        let json = fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["total_notifications"], 0);
        assert!(value["collection_span"].is_null());
    }

    #[test]
    fn text_report_lists_metrics() {
        let summary = DashboardSummary::compute(&[], &SummaryOptions::default());
        let text = ReportExporter::format_text(&summary);
        assert!(text.contains("Notifications Analysed:          0"));
        assert!(text.contains("Data Collection Period:          n/a"));
    }
}
