//! Notification Records
//! Typed view over a cleaned notification table.

use super::cleaner::HOUR_COL;
use chrono::{DateTime, Utc};
use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Cleaned table has no '{0}' column")]
    MissingColumn(String),
    #[error("Column '{column}' row {row} has no valid timestamp")]
    InvalidTimestamp { column: String, row: usize },
    #[error("Column '{column}' row {row} holds an hour outside 0-23")]
    InvalidHour { column: String, row: usize },
}

/// One captured notification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationRecord {
    pub app_name: Option<String>,
    pub post_time: DateTime<Utc>,
    pub system_time: DateTime<Utc>,
    pub when: DateTime<Utc>,
    pub time_in_hours: u32,
    pub title: Option<String>,
    pub priority: Option<i64>,
    pub connection_type: Option<String>,
    pub is_local_only: Option<bool>,
    pub action_count: Option<i64>,
}

impl NotificationRecord {
    /// Read every row of a cleaned table.
    pub fn from_frame(df: &DataFrame) -> Result<Vec<Self>, RecordError> {
        let app_names = string_values(df, "appName")?;
        let post_times = timestamp_values(df, "postTime")?;
        let system_times = timestamp_values(df, "systemTime")?;
        let whens = timestamp_values(df, "when")?;
        let hours = hour_values(df, HOUR_COL)?;
        let titles = string_values(df, "title")?;
        let priorities = int_values(df, "priority")?;
        let connection_types = string_values(df, "connectionType")?;
        let local_flags = bool_values(df, "isLocalOnly")?;
        let action_counts = int_values(df, "actionCount")?;

        let records = (0..df.height())
            .map(|i| NotificationRecord {
                app_name: app_names[i].clone(),
                post_time: post_times[i],
                system_time: system_times[i],
                when: whens[i],
                time_in_hours: hours[i],
                title: titles[i].clone(),
                priority: priorities[i],
                connection_type: connection_types[i].clone(),
                is_local_only: local_flags[i],
                action_count: action_counts[i],
            })
            .collect();

        Ok(records)
    }
}

fn column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, RecordError> {
    df.column(name)
        .map_err(|_| RecordError::MissingColumn(name.to_string()))
}

fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>, RecordError> {
    let col = column(df, name)?.cast(&DataType::String)?;
    let values = col
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect();
    Ok(values)
}

fn int_values(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>, RecordError> {
    let col = column(df, name)?.cast(&DataType::Int64)?;
    Ok(col.i64()?.into_iter().collect())
}

/// Booleans may arrive typed, as text ("True", "false") or as 0/1.
fn bool_values(df: &DataFrame, name: &str) -> Result<Vec<Option<bool>>, RecordError> {
    let col = column(df, name)?.cast(&DataType::String)?;
    let values = col
        .str()?
        .into_iter()
        .map(|v| {
            v.and_then(|s| match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            })
        })
        .collect();
    Ok(values)
}

fn timestamp_values(df: &DataFrame, name: &str) -> Result<Vec<DateTime<Utc>>, RecordError> {
    let col = column(df, name)?.cast(&DataType::Int64)?;
    col.i64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.and_then(DateTime::<Utc>::from_timestamp_millis)
                .ok_or_else(|| RecordError::InvalidTimestamp {
                    column: name.to_string(),
                    row,
                })
        })
        .collect()
}

fn hour_values(df: &DataFrame, name: &str) -> Result<Vec<u32>, RecordError> {
    let col = column(df, name)?.cast(&DataType::Int64)?;
    col.i64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| match v {
            Some(h) if (0..24).contains(&h) => Ok(h as u32),
            _ => Err(RecordError::InvalidHour {
                column: name.to_string(),
                row,
            }),
        })
        .collect()
}
