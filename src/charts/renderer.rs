//! Static Chart Renderer
//! Draws the dashboard charts to PNG bytes with plotters.
//!
//! Charts:
//! - Top applications by notifications sent (bar)
//! - Notifications by hour of day (bar)
//! - Connection type distribution (pie)
//! - Local vs push notifications (pie)

use crate::stats::{CategoryCount, Proportion, StatsCalculator};
use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::coord::ranged1d::SegmentValue;
use plotters::element::Pie;
use plotters::prelude::*;
use std::io::Cursor;
use thiserror::Error;

const NAVY: RGBColor = RGBColor(0, 0, 128);

/// Slice colours for connection types (gold, tomato, royal blue, ...).
const CONNECTION_COLORS: [RGBColor; 6] = [
    RGBColor(255, 215, 0),
    RGBColor(255, 99, 71),
    RGBColor(65, 105, 225),
    RGBColor(0, 100, 0),
    RGBColor(128, 0, 0),
    RGBColor(96, 125, 139),
];

/// Largest width or height accepted for a static chart.
const MAX_DIMENSION: u32 = 16_384;

/// Slice colours for local vs push (turquoise, plum).
const LOCAL_COLORS: [RGBColor; 2] = [RGBColor(64, 224, 208), RGBColor(221, 160, 221)];

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Nothing to draw for '{0}'")]
    NoData(String),
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("PNG encoding failed: {0}")]
    Encode(String),
    #[error("Chart size {width}x{height} is not drawable (each side must be 1-{max})", max = MAX_DIMENSION)]
    Size { width: u32, height: u32 },
}

fn draw_err<E: std::fmt::Display>(e: E) -> RenderError {
    RenderError::Draw(e.to_string())
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Vertical bar chart of labelled counts.
    pub fn render_bar_chart(
        title: &str,
        x_desc: &str,
        y_desc: &str,
        bars: &[CategoryCount],
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        if bars.is_empty() {
            return Err(RenderError::NoData(title.to_string()));
        }

        let mut buffer = Self::pixel_buffer(width, height)?;
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();
            let max = bars.iter().map(|b| b.count).max().unwrap_or(0) as u32;
            let y_top = (max + max / 10).max(1);

            let mut chart = ChartBuilder::on(&root)
                .caption(title, ("sans-serif", 26))
                .margin(15)
                .x_label_area_size(110)
                .y_label_area_size(60)
                .build_cartesian_2d((0u32..bars.len() as u32).into_segmented(), 0u32..y_top)
                .map_err(draw_err)?;

            let label_for = |v: &SegmentValue<u32>| match v {
                SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
                _ => String::new(),
            };

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(bars.len())
                .x_label_formatter(&label_for)
                .x_label_style(
                    ("sans-serif", 13)
                        .into_font()
                        .transform(FontTransform::Rotate90),
                )
                .x_desc(x_desc)
                .y_desc(y_desc)
                .draw()
                .map_err(draw_err)?;

            chart
                .draw_series(
                    Histogram::vertical(&chart)
                        .style(NAVY.filled())
                        .margin(8)
                        .data(bars.iter().enumerate().map(|(i, b)| (i as u32, b.count as u32))),
                )
                .map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }

        Self::encode_png(buffer, width, height)
    }

    /// Bar chart of notifications for each hour 0-23.
    pub fn render_hourly_chart(
        hourly_counts: &[usize],
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let bars: Vec<CategoryCount> = hourly_counts
            .iter()
            .enumerate()
            .map(|(hour, count)| CategoryCount {
                label: format!("{:02}", hour),
                count: *count,
            })
            .collect();

        if bars.iter().all(|b| b.count == 0) {
            return Err(RenderError::NoData("Notifications by Hour".to_string()));
        }

        Self::render_bar_chart(
            "Notifications by Hour of Day",
            "Hour of Day",
            "Number of Notifications",
            &bars,
            width,
            height,
        )
    }

    /// Pie chart with percentage labels.
    pub fn render_pie_chart(
        title: &str,
        slices: &[Proportion],
        colors: &[RGBColor],
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        if slices.is_empty() || colors.is_empty() {
            return Err(RenderError::NoData(title.to_string()));
        }

        let sizes: Vec<f64> = slices.iter().map(|s| s.share * 100.0).collect();
        let labels: Vec<String> = slices.iter().map(|s| s.label.clone()).collect();
        let slice_colors: Vec<RGBColor> = (0..slices.len())
            .map(|i| colors[i % colors.len()])
            .collect();

        let mut buffer = Self::pixel_buffer(width, height)?;
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_err)?;

            let root = root
                .titled(title, ("sans-serif", 26))
                .map_err(draw_err)?;
            let (w, h) = root.dim_in_pixel();
            let center = ((w / 2) as i32, (h / 2) as i32);
            let radius = (w.min(h) as f64) * 0.35;

            let mut pie = Pie::new(&center, &radius, &sizes, &slice_colors, &labels);
            pie.start_angle(90.0);
            pie.label_style(("sans-serif", 18).into_font().color(&BLACK));
            pie.percentages(("sans-serif", 16).into_font().color(&BLACK));
            root.draw(&pie).map_err(draw_err)?;

            root.present().map_err(draw_err)?;
        }

        Self::encode_png(buffer, width, height)
    }

    /// Connection type pie. Counts are turned into shares first.
    pub fn render_connection_chart(
        counts: &[CategoryCount],
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        let slices = StatsCalculator::shares_from_counts(counts);
        if slices.is_empty() {
            return Err(RenderError::NoData("Connection Types".to_string()));
        }

        Self::render_pie_chart(
            "Notification Distribution by Internet Connection Type",
            &slices,
            &CONNECTION_COLORS,
            width,
            height,
        )
    }

    pub fn render_local_only_chart(
        shares: &[Proportion],
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError> {
        Self::render_pie_chart(
            "Local Notifications vs Push Notifications",
            shares,
            &LOCAL_COLORS,
            width,
            height,
        )
    }

    /// Zeroed RGB buffer for a `width` x `height` bitmap.
    fn pixel_buffer(width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        let size_err = || RenderError::Size { width, height };
        if width == 0 || height == 0 || width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(size_err());
        }

        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|pixels| pixels.checked_mul(3))
            .ok_or_else(size_err)?;
        Ok(vec![0u8; len])
    }

    fn encode_png(buffer: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
        let img = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| RenderError::Encode("buffer size mismatch".to_string()))?;

        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| RenderError::Encode(e.to_string()))?;
        Ok(bytes)
    }
}
