//! GUI module - User interface components

mod app;
mod control_panel;
mod dashboard_view;

pub use app::NotifyAnalyticsApp;
pub use control_panel::{ControlPanel, ControlPanelAction};
pub use dashboard_view::DashboardView;
