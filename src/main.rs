//! NotifyAnalytics - Notification Log Analytics Dashboard
//!
//! Loads a notification log exported by the NotificationLog app, cleans it and
//! shows the aggregated dashboard in a window, or prints it in headless mode.

mod charts;
mod config;
mod data;
mod gui;
mod pipeline;
mod report;
mod stats;

use anyhow::{anyhow, Result};
use clap::Parser;
use config::AppConfig;
use data::DataSource;
use eframe::egui;
use gui::NotifyAnalyticsApp;
use pipeline::AnalysisPipeline;
use report::ReportExporter;
use std::io;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "notify_analytics", version, about = "Notification log analytics dashboard")]
struct Cli {
    /// Notification log to load instead of the configured default (CSV or spreadsheet)
    #[arg(long, value_name = "FILE")]
    data: Option<PathBuf>,

    /// JSON config file (defaults to ./notify_analytics.json when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the dashboard to stdout instead of opening a window
    #[arg(long)]
    headless: bool,

    /// Write charts and summary.json into this directory (headless only)
    #[arg(long, value_name = "DIR", requires = "headless")]
    export: Option<PathBuf>,

    /// Seed for the sample table
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if cli.seed.is_some() {
        config.sample_seed = cli.seed;
    }

    if cli.headless {
        run_headless(&cli, &config)
    } else {
        run_window(cli.data, config)
    }
}

fn run_headless(cli: &Cli, config: &AppConfig) -> Result<()> {
    let source = match &cli.data {
        Some(path) => DataSource::from_path(path)?,
        None => DataSource::Default(config.default_data_path.clone()),
    };

    let outcome = AnalysisPipeline::run(&source, config)?;
    info!("{}", outcome.status_line());
    print!("{}", ReportExporter::format_text(&outcome.summary));

    if let Some(dir) = &cli.export {
        let report =
            ReportExporter::export(&outcome.summary, dir, config.export_width, config.export_height)?;
        for path in &report.written {
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}

fn run_window(data: Option<PathBuf>, config: AppConfig) -> Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("NotifyAnalytics"),
        ..Default::default()
    };

    eframe::run_native(
        "NotifyAnalytics",
        options,
        Box::new(move |cc| Ok(Box::new(NotifyAnalyticsApp::new(cc, config, data)))),
    )
    .map_err(|e| anyhow!("window error: {e}"))
}
