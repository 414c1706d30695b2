//! Charts module - Chart rendering

mod plotter;
mod renderer;

pub use plotter::{ChartPlotter, CONNECTION_PALETTE, LOCAL_PALETTE};
pub use renderer::{RenderError, StaticChartRenderer};
