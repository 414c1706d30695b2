//! Stats module - dashboard aggregates

mod calculator;

pub use calculator::{CategoryCount, DashboardSummary, Proportion, StatsCalculator, SummaryOptions};
