//! Chart Plotter Module
//! Creates interactive visualizations using egui_plot and the egui painter.

use crate::stats::{CategoryCount, Proportion};
use egui::{Color32, RichText, Sense, Shape, Stroke};
use egui_plot::{Bar, BarChart, Plot};
use std::f32::consts::TAU;

pub const BAR_COLOR: Color32 = Color32::from_rgb(0, 0, 128); // Navy

/// Connection type slices
pub const CONNECTION_PALETTE: [Color32; 6] = [
    Color32::from_rgb(255, 215, 0),  // Gold
    Color32::from_rgb(255, 99, 71),  // Tomato
    Color32::from_rgb(65, 105, 225), // Royal blue
    Color32::from_rgb(0, 100, 0),    // Dark green
    Color32::from_rgb(128, 0, 0),    // Maroon
    Color32::from_rgb(96, 125, 139), // Blue grey
];

/// Local vs push slices
pub const LOCAL_PALETTE: [Color32; 2] = [
    Color32::from_rgb(64, 224, 208),  // Turquoise
    Color32::from_rgb(221, 160, 221), // Plum
];

/// Angular step used when tessellating pie slices.
const PIE_STEP: f32 = TAU / 180.0;

/// Draws the dashboard charts inside egui.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Bar chart with one labelled bar per category.
    pub fn draw_bar_chart(
        ui: &mut egui::Ui,
        id: &str,
        bars: &[CategoryCount],
        x_label: &str,
        y_label: &str,
        height: f32,
    ) {
        if bars.is_empty() {
            ui.label(RichText::new("No Data").color(Color32::GRAY));
            return;
        }

        let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();
        let chart_bars: Vec<Bar> = bars
            .iter()
            .enumerate()
            .map(|(i, b)| {
                Bar::new(i as f64, b.count as f64)
                    .name(&b.label)
                    .width(0.7)
                    .fill(BAR_COLOR)
            })
            .collect();

        Plot::new(id.to_string())
            .height(height)
            .allow_zoom(false)
            .allow_drag(false)
            .allow_scroll(false)
            .x_axis_label(x_label)
            .y_axis_label(y_label)
            .include_y(0.0)
            .x_axis_formatter(move |mark, _range| {
                let idx = mark.value.round();
                if (mark.value - idx).abs() < 1e-6 && idx >= 0.0 {
                    labels.get(idx as usize).cloned().unwrap_or_default()
                } else {
                    String::new()
                }
            })
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new(chart_bars).color(BAR_COLOR));
            });
    }

    /// Notifications per hour of day.
    pub fn draw_hourly_chart(ui: &mut egui::Ui, hourly_counts: &[usize], height: f32) {
        let bars: Vec<CategoryCount> = hourly_counts
            .iter()
            .enumerate()
            .map(|(hour, count)| CategoryCount {
                label: format!("{:02}", hour),
                count: *count,
            })
            .collect();
        Self::draw_bar_chart(
            ui,
            "hourly_chart",
            &bars,
            "Hour of Day",
            "Notifications",
            height,
        );
    }

    /// Pie chart with a legend of label and percentage underneath.
    pub fn draw_pie_chart(
        ui: &mut egui::Ui,
        slices: &[Proportion],
        palette: &[Color32],
        diameter: f32,
    ) {
        if slices.is_empty() || palette.is_empty() {
            ui.label(RichText::new("No Data").color(Color32::GRAY));
            return;
        }

        let (rect, _) = ui.allocate_exact_size(egui::vec2(diameter, diameter), Sense::hover());
        let painter = ui.painter_at(rect);
        let center = rect.center();
        let radius = diameter / 2.0 - 4.0;

        // Start at 12 o'clock, clockwise
        let mut start = -TAU / 4.0;
        for (i, slice) in slices.iter().enumerate() {
            let sweep = slice.share as f32 * TAU;
            let color = palette[i % palette.len()];

            // Fan of thin triangles keeps every shape convex
            let mut angle = start;
            let end = start + sweep;
            while angle < end {
                let next = (angle + PIE_STEP).min(end);
                painter.add(Shape::convex_polygon(
                    vec![
                        center,
                        center + radius * egui::vec2(angle.cos(), angle.sin()),
                        center + radius * egui::vec2(next.cos(), next.sin()),
                    ],
                    color,
                    Stroke::NONE,
                ));
                angle = next;
            }
            start = end;
        }

        ui.add_space(6.0);
        for (i, slice) in slices.iter().enumerate() {
            ui.horizontal(|ui| {
                let (swatch, _) = ui.allocate_exact_size(egui::vec2(14.0, 14.0), Sense::hover());
                ui.painter()
                    .rect_filled(swatch, 3.0, palette[i % palette.len()]);
                ui.label(
                    RichText::new(format!("{}  {:.1}%", slice.label, slice.share * 100.0))
                        .size(13.0),
                );
            });
        }
    }
}
