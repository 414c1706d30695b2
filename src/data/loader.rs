//! Notification Log Loader Module
//! Reads an uploaded or bundled notification export into a Polars DataFrame.
//!
//! Uploads are parsed as CSV first; if that fails the same bytes are read as a
//! spreadsheet (xlsx / xls / ods). The bundled default file is CSV only.

use calamine::{open_workbook_auto_from_rs, Data, Range, Reader};
use polars::prelude::*;
use std::fmt;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Rows scanned by the CSV reader before fixing column types.
const INFER_SCHEMA_ROWS: usize = 10000;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to load CSV: {0}")]
    Csv(String),
    #[error("Failed to load spreadsheet: {0}")]
    Spreadsheet(String),
    #[error("Could not read {name} as CSV ({csv}) or as a spreadsheet ({spreadsheet})")]
    Unreadable {
        name: String,
        csv: String,
        spreadsheet: String,
    },
}

/// Where the notification table comes from.
#[derive(Debug, Clone)]
pub enum DataSource {
    /// A user supplied file, already read into memory.
    Upload { name: String, bytes: Vec<u8> },
    /// The bundled CSV used when nothing was uploaded.
    Default(PathBuf),
}

impl DataSource {
    /// Read a file from disk and treat it as an upload.
    pub fn from_path(path: &Path) -> Result<Self, LoaderError> {
        let bytes = fs::read(path).map_err(|source| LoaderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(DataSource::Upload { name, bytes })
    }

    pub fn name(&self) -> String {
        match self {
            DataSource::Upload { name, .. } => name.clone(),
            DataSource::Default(path) => path.display().to_string(),
        }
    }
}

/// Which reader produced the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Csv,
    Spreadsheet,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Csv => write!(f, "CSV"),
            SourceFormat::Spreadsheet => write!(f, "spreadsheet"),
        }
    }
}

/// Raw table as read from the source, before cleaning.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    pub frame: DataFrame,
    pub format: SourceFormat,
    pub source_name: String,
    /// CSV error swallowed when the spreadsheet fallback succeeded.
    pub csv_error: Option<String>,
}

/// Loads notification exports with Polars, falling back to calamine.
pub struct DataLoader;

impl DataLoader {
    /// Load a table from the given source.
    pub fn load(source: &DataSource) -> Result<LoadedTable, LoaderError> {
        match source {
            DataSource::Upload { name, bytes } => Self::load_upload(name, bytes),
            DataSource::Default(path) => {
                info!(path = %path.display(), "loading default notification data");
                let bytes = fs::read(path).map_err(|source| LoaderError::Io {
                    path: path.clone(),
                    source,
                })?;
                let frame = Self::read_csv_bytes(&bytes)?;
                Ok(LoadedTable {
                    frame,
                    format: SourceFormat::Csv,
                    source_name: path.display().to_string(),
                    csv_error: None,
                })
            }
        }
    }

    fn load_upload(name: &str, bytes: &[u8]) -> Result<LoadedTable, LoaderError> {
        info!(file = name, bytes = bytes.len(), "loading uploaded notification data");

        let csv_error = match Self::read_csv_bytes(bytes) {
            Ok(frame) => {
                return Ok(LoadedTable {
                    frame,
                    format: SourceFormat::Csv,
                    source_name: name.to_string(),
                    csv_error: None,
                })
            }
            Err(e) => e.to_string(),
        };

        warn!(file = name, error = %csv_error, "CSV parse failed, trying spreadsheet reader");

        match Self::read_spreadsheet_bytes(bytes) {
            Ok(frame) => Ok(LoadedTable {
                frame,
                format: SourceFormat::Spreadsheet,
                source_name: name.to_string(),
                csv_error: Some(csv_error),
            }),
            Err(e) => Err(LoaderError::Unreadable {
                name: name.to_string(),
                csv: csv_error,
                spreadsheet: e.to_string(),
            }),
        }
    }

    /// Parse CSV bytes. Input that is not UTF-8 text is rejected up front so
    /// binary files never come back as a one-column table.
    pub fn read_csv_bytes(bytes: &[u8]) -> Result<DataFrame, LoaderError> {
        if let Err(e) = std::str::from_utf8(bytes) {
            return Err(LoaderError::Csv(format!("input is not UTF-8 text: {}", e)));
        }

        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(INFER_SCHEMA_ROWS))
            .into_reader_with_file_handle(Cursor::new(bytes.to_vec()))
            .finish()
            .map_err(|e| LoaderError::Csv(e.to_string()))?;

        if df.width() == 0 {
            return Err(LoaderError::Csv("no columns found".to_string()));
        }

        debug!(rows = df.height(), columns = df.width(), "CSV parsed");
        Ok(df)
    }

    /// Parse the first worksheet of an xlsx / xls / ods workbook.
    pub fn read_spreadsheet_bytes(bytes: &[u8]) -> Result<DataFrame, LoaderError> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
            .map_err(|e| LoaderError::Spreadsheet(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| LoaderError::Spreadsheet("workbook has no sheets".to_string()))?
            .map_err(|e| LoaderError::Spreadsheet(e.to_string()))?;

        let df = Self::frame_from_range(&range)?;
        debug!(rows = df.height(), columns = df.width(), "spreadsheet parsed");
        Ok(df)
    }

    /// Convert a worksheet range into a DataFrame. The first row is the header.
    pub fn frame_from_range(range: &Range<Data>) -> Result<DataFrame, LoaderError> {
        let mut rows = range.rows();
        let header: Vec<String> = rows
            .next()
            .ok_or_else(|| LoaderError::Spreadsheet("worksheet is empty".to_string()))?
            .iter()
            .enumerate()
            .map(|(i, cell)| match cell {
                Data::Empty => format!("column_{}", i),
                other => other.to_string(),
            })
            .collect();

        let body: Vec<&[Data]> = rows.collect();

        let columns: Vec<Column> = header
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let cells: Vec<&Data> = body
                    .iter()
                    .map(|row| row.get(idx).unwrap_or(&Data::Empty))
                    .collect();
                Self::column_from_cells(name, &cells)
            })
            .collect();

        DataFrame::new(columns).map_err(|e| LoaderError::Spreadsheet(e.to_string()))
    }

    /// Build a typed column from spreadsheet cells: integers, floats,
    /// booleans, or strings when the cells disagree.
    fn column_from_cells(name: &str, cells: &[&Data]) -> Column {
        let filled = || cells.iter().filter(|c| !matches!(c, Data::Empty));

        let all_int = filled().all(|c| match c {
            Data::Int(_) => true,
            Data::Float(f) => f.fract() == 0.0 && f.abs() < i64::MAX as f64,
            _ => false,
        });
        let all_float = filled().all(|c| matches!(c, Data::Int(_) | Data::Float(_)));
        let all_bool = filled().all(|c| matches!(c, Data::Bool(_)));
        let any_filled = filled().next().is_some();

        if any_filled && all_int {
            let values: Vec<Option<i64>> = cells
                .iter()
                .map(|c| match c {
                    Data::Int(i) => Some(*i),
                    Data::Float(f) => Some(*f as i64),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), values)
        } else if any_filled && all_float {
            let values: Vec<Option<f64>> = cells
                .iter()
                .map(|c| match c {
                    Data::Int(i) => Some(*i as f64),
                    Data::Float(f) => Some(*f),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), values)
        } else if any_filled && all_bool {
            let values: Vec<Option<bool>> = cells
                .iter()
                .map(|c| match c {
                    Data::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect();
            Column::new(name.into(), values)
        } else {
            let values: Vec<Option<String>> = cells
                .iter()
                .map(|c| match c {
                    Data::Empty => None,
                    other => Some(other.to_string()),
                })
                .collect();
            Column::new(name.into(), values)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use ::zip::write::FileOptions;
    use ::zip::ZipWriter;

    /// Spreadsheet column letters: 0 -> A, 25 -> Z, 26 -> AA.
    fn column_letters(mut idx: usize) -> String {
        let mut letters = Vec::new();
        loop {
            letters.push(b'A' + (idx % 26) as u8);
            if idx < 26 {
                break;
            }
            idx = idx / 26 - 1;
        }
        letters.reverse();
        String::from_utf8(letters).unwrap()
    }

    fn xml_escape(text: &str) -> String {
        text.replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
    }

    fn cell_xml(reference: &str, value: &AnyValue) -> String {
        match value {
            AnyValue::Null => String::new(),
            AnyValue::Boolean(b) => format!(r#"<c r="{}" t="b"><v>{}</v></c>"#, reference, *b as u8),
            AnyValue::String(s) => format!(
                r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                reference,
                xml_escape(s)
            ),
            AnyValue::StringOwned(s) => format!(
                r#"<c r="{}" t="inlineStr"><is><t>{}</t></is></c>"#,
                reference,
                xml_escape(s.as_str())
            ),
            other => format!(r#"<c r="{}"><v>{}</v></c>"#, reference, other),
        }
    }

    /// A minimal single-sheet xlsx workbook holding `df`, header row first.
    pub(crate) fn workbook_bytes(df: &DataFrame) -> Vec<u8> {
        let mut rows = String::new();

        rows.push_str(r#"<row r="1">"#);
        for (c, name) in df.get_column_names().iter().enumerate() {
            let reference = format!("{}1", column_letters(c));
            rows.push_str(&cell_xml(&reference, &AnyValue::String(name.as_str())));
        }
        rows.push_str("</row>");

        for r in 0..df.height() {
            rows.push_str(&format!(r#"<row r="{}">"#, r + 2));
            for (c, column) in df.get_columns().iter().enumerate() {
                let reference = format!("{}{}", column_letters(c), r + 2);
                rows.push_str(&cell_xml(&reference, &column.get(r).unwrap()));
            }
            rows.push_str("</row>");
        }

        let parts = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#
                    .to_string(),
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>
</Relationships>"#
                    .to_string(),
            ),
            (
                "xl/workbook.xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
<sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#
                    .to_string(),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#
                    .to_string(),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
                    rows
                ),
            ),
        ];

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default();
        for (name, body) in parts {
            zip.start_file(name, options).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn column_letters_roll_over() {
        assert_eq!(column_letters(0), "A");
        assert_eq!(column_letters(25), "Z");
        assert_eq!(column_letters(26), "AA");
        assert_eq!(column_letters(42), "AQ");
    }

    #[test]
    fn xlsx_upload_falls_back_to_spreadsheet_reader() {
        let df = df!(
            "appName" => ["Mail", "Chat"],
            "postTime" => [1_600_000_000_000i64, 1_600_003_600_000],
            "isLocalOnly" => [true, false],
        )
        .unwrap();
        let source = DataSource::Upload {
            name: "log.xlsx".to_string(),
            bytes: workbook_bytes(&df),
        };

        let table = DataLoader::load(&source).unwrap();
        assert_eq!(table.format, SourceFormat::Spreadsheet);
        assert!(table.csv_error.is_some());
        assert_eq!(table.source_name, "log.xlsx");
        assert_eq!(table.frame.shape(), (2, 3));
        assert_eq!(table.frame.column("postTime").unwrap().dtype(), &DataType::Int64);
        assert_eq!(table.frame.column("isLocalOnly").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(
            table.frame.column("appName").unwrap().str().unwrap().get(1),
            Some("Chat")
        );
    }

    #[test]
    fn csv_upload_is_read_as_csv() {
        let source = DataSource::Upload {
            name: "log.csv".to_string(),
            bytes: b"appName,priority\nMail,1\nChat,0\n".to_vec(),
        };

        let table = DataLoader::load(&source).unwrap();
        assert_eq!(table.format, SourceFormat::Csv);
        assert_eq!(table.frame.height(), 2);
        assert_eq!(table.frame.width(), 2);
        assert!(table.csv_error.is_none());
    }

    #[test]
    fn binary_upload_fails_both_readers() {
        let source = DataSource::Upload {
            name: "garbage.bin".to_string(),
            bytes: vec![0xff, 0xfe, 0x00, 0x9c, 0x80, 0x81, 0x01, 0x02],
        };

        match DataLoader::load(&source) {
            Err(LoaderError::Unreadable { name, csv, .. }) => {
                assert_eq!(name, "garbage.bin");
                assert!(csv.contains("UTF-8"));
            }
            other => panic!("expected Unreadable, got {:?}", other.map(|t| t.frame.shape())),
        }
    }

    #[test]
    fn default_source_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "appName,postTime").unwrap();
        writeln!(file, "Mail,1600000000000").unwrap();

        let table = DataLoader::load(&DataSource::Default(file.path().to_path_buf())).unwrap();
        assert_eq!(table.format, SourceFormat::Csv);
        assert_eq!(table.frame.height(), 1);
    }

    #[test]
    fn missing_default_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notification_data.csv");

        let err = DataLoader::load(&DataSource::Default(path)).unwrap_err();
        assert!(matches!(err, LoaderError::Io { .. }));
    }

    #[test]
    fn from_path_keeps_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        fs::write(&path, "a,b\n1,2\n").unwrap();

        let source = DataSource::from_path(&path).unwrap();
        assert_eq!(source.name(), "export.csv");
    }

    #[test]
    fn worksheet_range_becomes_typed_frame() {
        let mut range: Range<Data> = Range::new((0, 0), (2, 3));
        range.set_value((0, 0), Data::String("appName".to_string()));
        range.set_value((0, 1), Data::String("postTime".to_string()));
        range.set_value((0, 2), Data::String("isLocalOnly".to_string()));
        range.set_value((0, 3), Data::String("score".to_string()));
        range.set_value((1, 0), Data::String("Mail".to_string()));
        range.set_value((1, 1), Data::Float(1600000000000.0));
        range.set_value((1, 2), Data::Bool(true));
        range.set_value((1, 3), Data::Float(0.5));
        range.set_value((2, 0), Data::String("Chat".to_string()));
        range.set_value((2, 1), Data::Int(1600000360000));
        range.set_value((2, 2), Data::Bool(false));
        range.set_value((2, 3), Data::Int(2));

        let df = DataLoader::frame_from_range(&range).unwrap();
        assert_eq!(df.shape(), (2, 4));
        assert_eq!(df.column("postTime").unwrap().dtype(), &DataType::Int64);
        assert_eq!(df.column("isLocalOnly").unwrap().dtype(), &DataType::Boolean);
        assert_eq!(df.column("score").unwrap().dtype(), &DataType::Float64);
        assert_eq!(df.column("appName").unwrap().dtype(), &DataType::String);
    }
}
