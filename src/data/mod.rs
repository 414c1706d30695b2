//! Data module - notification log loading, cleaning and typed records

mod cleaner;
mod loader;
mod record;

pub use cleaner::{CleanError, NotificationCleaner};
pub use loader::{DataLoader, DataSource, LoaderError, SourceFormat};
pub use record::{NotificationRecord, RecordError};

#[cfg(test)]
pub(crate) use cleaner::tests::raw_frame;
#[cfg(test)]
pub(crate) use loader::tests::workbook_bytes;
