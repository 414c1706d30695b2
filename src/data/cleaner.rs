//! Notification Cleaner Module
//! Drops irrelevant export columns, converts epoch-millisecond columns to
//! datetimes and derives the hour-of-day column.

use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

/// Columns of the NotificationLog export that the dashboard never uses.
pub const DROP_COLUMNS: [&str; 34] = [
    "offset",
    "version",
    "sdk",
    "sortKey",
    "textLines",
    "category",
    "style",
    "key",
    "textSummary",
    "textSub",
    "textInfo",
    "textBig",
    "titleBig",
    "tickerText",
    "ringerMode",
    "packageName",
    "defaults",
    "flags",
    "listenerHints",
    "color",
    "visibility",
    "people",
    "number",
    "nid",
    "matchesInterruptionFilter",
    "hasAppointment",
    "ledARGB",
    "ledOn",
    "ledOff",
    "isClearable",
    "tag",
    "interruptionFilter",
    "group",
    "isGroupSummary",
];

/// Epoch-millisecond columns converted to datetimes.
pub const TIMESTAMP_COLUMNS: [&str; 3] = ["postTime", "systemTime", "when"];

pub const POST_TIME_COL: &str = "postTime";
pub const HOUR_COL: &str = "Time_inHours";

#[derive(Error, Debug)]
pub enum CleanError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Missing expected columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("Column '{column}' row {row} is not a non-negative epoch-millisecond value")]
    InvalidTimestamp { column: String, row: usize },
    #[error("UTC offset of {0} minutes is out of range")]
    InvalidOffset(i32),
}

/// Cleans a raw notification table. The table is taken by value and the
/// cleaned table is returned; nothing is shared between calls.
pub struct NotificationCleaner {
    offset: FixedOffset,
}

impl Default for NotificationCleaner {
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }
}

impl NotificationCleaner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive hours in a fixed offset from UTC instead of UTC itself.
    pub fn with_utc_offset_minutes(minutes: i32) -> Result<Self, CleanError> {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(CleanError::InvalidOffset(minutes))?;
        Ok(Self { offset })
    }

    /// Offset used for the hour-of-day column.
    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Run every cleaning step in order.
    pub fn clean(&self, df: DataFrame) -> Result<DataFrame, CleanError> {
        let rows = df.height();
        let df = Self::drop_irrelevant(df)?;
        let df = Self::convert_timestamps(df)?;
        let df = self.derive_hour_of_day(df)?;
        info!(rows, columns = df.width(), "notification table cleaned");
        Ok(df)
    }

    /// Remove the drop list. Every listed column must be present.
    pub fn drop_irrelevant(df: DataFrame) -> Result<DataFrame, CleanError> {
        Self::require_columns(&df, &DROP_COLUMNS)?;

        let mut df = df;
        for name in DROP_COLUMNS {
            df = df.drop(name)?;
        }
        debug!(dropped = DROP_COLUMNS.len(), remaining = df.width(), "irrelevant columns dropped");
        Ok(df)
    }

    /// Replace each epoch-ms column with a millisecond Datetime column.
    pub fn convert_timestamps(df: DataFrame) -> Result<DataFrame, CleanError> {
        Self::require_columns(&df, &TIMESTAMP_COLUMNS)?;

        let mut df = df;
        for name in TIMESTAMP_COLUMNS {
            let millis = df.column(name)?.cast(&DataType::Int64)?;
            if let Some(row) = millis
                .i64()?
                .into_iter()
                .position(|v| !matches!(v, Some(ms) if ms >= 0))
            {
                return Err(CleanError::InvalidTimestamp {
                    column: name.to_string(),
                    row,
                });
            }

            let converted = millis.cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;
            df.with_column(converted)?;
        }
        Ok(df)
    }

    /// Add `Time_inHours`, the hour of day (0-23) of this table's `postTime`.
    pub fn derive_hour_of_day(&self, df: DataFrame) -> Result<DataFrame, CleanError> {
        Self::require_columns(&df, &[POST_TIME_COL])?;

        let millis = df.column(POST_TIME_COL)?.cast(&DataType::Int64)?;
        let hours: Vec<Option<i32>> = millis
            .i64()?
            .into_iter()
            .enumerate()
            .map(|(row, v)| {
                v.and_then(DateTime::<Utc>::from_timestamp_millis)
                    .map(|t| t.with_timezone(&self.offset).hour() as i32)
                    .ok_or_else(|| CleanError::InvalidTimestamp {
                        column: POST_TIME_COL.to_string(),
                        row,
                    })
                    .map(Some)
            })
            .collect::<Result<_, _>>()?;

        let mut df = df;
        df.with_column(Column::new(HOUR_COL.into(), hours))?;
        Ok(df)
    }

    fn require_columns(df: &DataFrame, names: &[&str]) -> Result<(), CleanError> {
        let present: Vec<&str> = df.get_column_names().iter().map(|s| s.as_str()).collect();
        let missing: Vec<String> = names
            .iter()
            .filter(|name| !present.contains(name))
            .map(|name| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(CleanError::MissingColumns(missing))
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A raw export frame with every drop-list column plus the retained ones.
    pub(crate) fn raw_frame(
        apps: &[&str],
        post_times: &[i64],
        priorities: &[i64],
    ) -> DataFrame {
        let n = apps.len();
        let mut columns: Vec<Column> = DROP_COLUMNS
            .iter()
            .map(|name| Column::new((*name).into(), vec![0i64; n]))
            .collect();

        columns.push(Column::new("appName".into(), apps.to_vec()));
        columns.push(Column::new("postTime".into(), post_times.to_vec()));
        columns.push(Column::new("systemTime".into(), post_times.to_vec()));
        columns.push(Column::new("when".into(), post_times.to_vec()));
        columns.push(Column::new(
            "title".into(),
            (0..n).map(|i| format!("title {}", i % 2)).collect::<Vec<_>>(),
        ));
        columns.push(Column::new("priority".into(), priorities.to_vec()));
        columns.push(Column::new("connectionType".into(), vec!["WIFI"; n]));
        columns.push(Column::new("isLocalOnly".into(), vec![false; n]));
        columns.push(Column::new("actionCount".into(), vec![1i64; n]));

        DataFrame::new(columns).unwrap()
    }

    #[test]
    fn clean_removes_exactly_the_drop_list() {
        let raw = raw_frame(&["A", "B"], &[0, 1000], &[0, 1]);
        let before: Vec<String> = raw
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let cleaned = NotificationCleaner::new().clean(raw).unwrap();
        let after: Vec<String> = cleaned
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        for name in DROP_COLUMNS {
            assert!(!after.iter().any(|c| c == name), "{} survived", name);
        }
        for name in before.iter().filter(|c| !DROP_COLUMNS.contains(&c.as_str())) {
            assert!(after.contains(name), "{} was dropped", name);
        }
        assert_eq!(after.len(), before.len() - DROP_COLUMNS.len() + 1);
        assert!(after.iter().any(|c| c == HOUR_COL));
    }

    #[test]
    fn missing_drop_columns_are_all_reported() {
        let raw = raw_frame(&["A"], &[0], &[0]);
        let raw = raw.drop("ledOn").unwrap().drop("tag").unwrap();

        match NotificationCleaner::new().clean(raw) {
            Err(CleanError::MissingColumns(missing)) => {
                assert_eq!(missing, vec!["ledOn".to_string(), "tag".to_string()]);
            }
            other => panic!("expected MissingColumns, got {:?}", other.map(|df| df.shape())),
        }
    }

    #[test]
    fn timestamps_become_datetimes() {
        let raw = raw_frame(&["A"], &[1_600_000_000_000], &[0]);
        let cleaned = NotificationCleaner::new().clean(raw).unwrap();

        for name in TIMESTAMP_COLUMNS {
            assert_eq!(
                cleaned.column(name).unwrap().dtype(),
                &DataType::Datetime(TimeUnit::Milliseconds, None)
            );
        }
    }

    #[test]
    fn hour_of_day_is_utc_hour_of_post_time() {
        // 2020-09-13T12:26:40Z and 1970-01-01T23:59:59.999Z
        let raw = raw_frame(&["A", "B", "C"], &[1_600_000_000_000, 86_399_999, 0], &[0, 0, 0]);
        let cleaned = NotificationCleaner::new().clean(raw).unwrap();

        let hours: Vec<Option<i32>> = cleaned
            .column(HOUR_COL)
            .unwrap()
            .i32()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(hours, vec![Some(12), Some(23), Some(0)]);
    }

    #[test]
    fn hour_of_day_honours_configured_offset() {
        let raw = raw_frame(&["A"], &[1_600_000_000_000], &[0]);
        let cleaner = NotificationCleaner::with_utc_offset_minutes(-5 * 60).unwrap();
        let cleaned = cleaner.clean(raw).unwrap();

        let hour = cleaned.column(HOUR_COL).unwrap().i32().unwrap().get(0);
        assert_eq!(hour, Some(7));
    }

    #[test]
    fn negative_epoch_is_rejected() {
        let raw = raw_frame(&["A", "B"], &[1000, -5], &[0, 0]);

        match NotificationCleaner::new().clean(raw) {
            Err(CleanError::InvalidTimestamp { column, row }) => {
                assert_eq!(column, "postTime");
                assert_eq!(row, 1);
            }
            other => panic!("expected InvalidTimestamp, got {:?}", other.map(|df| df.shape())),
        }
    }

    #[test]
    fn out_of_range_offset_is_rejected() {
        assert!(matches!(
            NotificationCleaner::with_utc_offset_minutes(48 * 60),
            Err(CleanError::InvalidOffset(_))
        ));
    }
}
