use std::fmt;

use chrono::NaiveDateTime;
use ci_core::{Error, Result};

use crate::location::SourceFormat;
use crate::timestamp::parse_timestamp;

/// Untyped table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// Missing or blank.
    Empty,
    /// Text as read (trimmed).
    Text(String),
    /// Native numeric cell.
    Number(f64),
    /// Native date/time cell.
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Cell from a text field; blank text becomes [`Cell::Empty`].
    pub fn from_text(s: &str) -> Self {
        let t = s.trim();
        if t.is_empty() { Cell::Empty } else { Cell::Text(t.to_string()) }
    }

    /// Whether the cell is blank.
    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Empty)
    }

    /// Interpret as a timestamp.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Cell::DateTime(dt) => Some(*dt),
            Cell::Text(s) => parse_timestamp(s),
            Cell::Empty | Cell::Number(_) => None,
        }
    }

    /// Interpret as a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => s.parse::<f64>().ok(),
            Cell::Empty | Cell::DateTime(_) => None,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            Cell::Number(v) => write!(f, "{v}"),
            Cell::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

/// Header row plus untyped data rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawTable {
    /// Column headers (trimmed).
    pub headers: Vec<String>,
    /// Data rows; may be ragged.
    pub rows: Vec<Vec<Cell>>,
}

/// Parse `bytes` according to `format`, sniffing it first when undecided.
pub fn read_table(bytes: Vec<u8>, format: SourceFormat) -> Result<RawTable> {
    let format = match format {
        SourceFormat::Detect => {
            let sniffed = SourceFormat::sniff(&bytes);
            tracing::debug!(format = ?sniffed, "detected source format");
            sniffed
        }
        given => given,
    };
    match format {
        SourceFormat::Csv { delimiter } => read_delimited(&bytes, delimiter),
        SourceFormat::Spreadsheet | SourceFormat::Detect => read_workbook(bytes),
    }
}

/// Parse delimited text with a header row.
pub fn read_delimited(bytes: &[u8], delimiter: u8) -> Result<RawTable> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers: Vec<String> = rdr
        .headers()
        .map_err(|e| Error::SchemaInvalid(format!("failed to read header row: {e}")))?
        .iter()
        .map(str::to_string)
        .collect();
    if headers.iter().all(String::is_empty) {
        return Err(Error::SchemaInvalid("missing header row".into()));
    }

    let mut rows = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        let rec = rec.map_err(|e| Error::SchemaInvalid(format!("row {}: {e}", i + 2)))?;
        rows.push(rec.iter().map(Cell::from_text).collect());
    }
    Ok(RawTable { headers, rows })
}

/// Parse the first sheet of a spreadsheet workbook (xlsx, xls, xlsb, ods).
#[cfg(feature = "spreadsheet")]
pub fn read_workbook(bytes: Vec<u8>) -> Result<RawTable> {
    use calamine::{Data, Reader, open_workbook_auto_from_rs};

    let mut wb = open_workbook_auto_from_rs(std::io::Cursor::new(bytes))
        .map_err(|e| Error::SchemaInvalid(format!("not a readable workbook: {e}")))?;
    let range = wb
        .worksheet_range_at(0)
        .ok_or_else(|| Error::SchemaInvalid("workbook has no sheets".into()))?
        .map_err(|e| Error::SchemaInvalid(format!("failed to read first sheet: {e}")))?;

    let cell = |d: &Data| -> Cell {
        match d {
            Data::Empty => Cell::Empty,
            Data::Int(v) => Cell::Number(*v as f64),
            Data::Float(v) => Cell::Number(*v),
            Data::String(s) => Cell::from_text(s),
            Data::DateTime(dt) => dt.as_datetime().map_or(Cell::Empty, Cell::DateTime),
            Data::DateTimeIso(s) => parse_timestamp(s).map_or(Cell::Empty, Cell::DateTime),
            other => Cell::from_text(&other.to_string()),
        }
    };

    let mut it = range.rows();
    let headers: Vec<String> = it
        .next()
        .ok_or_else(|| Error::SchemaInvalid("first sheet is empty".into()))?
        .iter()
        .map(|d| cell(d).to_string())
        .collect();
    let rows = it.map(|r| r.iter().map(cell).collect()).collect();
    Ok(RawTable { headers, rows })
}

/// Spreadsheet support is compiled out.
#[cfg(not(feature = "spreadsheet"))]
pub fn read_workbook(_bytes: Vec<u8>) -> Result<RawTable> {
    Err(Error::SchemaInvalid(
        "spreadsheet sources require the `spreadsheet` feature; use a CSV export".into(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undecided_format_reads_csv_body() {
        let body = b"date,control,conversions\n2024-01-01,1,10\n2024-01-02,2,12\n".to_vec();
        let t = read_table(body, SourceFormat::Detect).unwrap();
        assert_eq!(t.headers, vec!["date", "control", "conversions"]);
        assert_eq!(t.rows.len(), 2);
    }

    #[test]
    fn reads_csv_with_bom_and_padding() {
        let src = "\u{feff}date , control, conversions\n2024-01-01, 1 ,10\n2024-01-02,2,12\n";
        let t = read_delimited(src.as_bytes(), b',').unwrap();
        assert_eq!(t.headers, vec!["date", "control", "conversions"]);
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0][1].as_f64(), Some(1.0));
        assert!(t.rows[1][0].as_timestamp().is_some());
    }

    #[test]
    fn reads_tsv() {
        let t = read_delimited(b"d\tx\ty\n2024-01-01\t1\t2\n", b'\t').unwrap();
        assert_eq!(t.headers.len(), 3);
        assert_eq!(t.rows[0][2], Cell::Text("2".into()));
    }

    #[test]
    fn ragged_rows_are_kept() {
        let t = read_delimited(b"d,x,y\n2024-01-01,1\n", b',').unwrap();
        assert_eq!(t.rows[0].len(), 2);
    }

    #[test]
    fn empty_input_has_no_header() {
        assert_eq!(read_delimited(b"", b',').unwrap_err().kind(), "schema_invalid");
    }

    #[test]
    fn cell_conversions() {
        assert!(Cell::from_text("   ").is_empty());
        assert_eq!(Cell::Number(2.5).as_f64(), Some(2.5));
        assert_eq!(Cell::from_text("abc").as_f64(), None);
        assert_eq!(Cell::Number(45000.0).as_timestamp(), None);
        assert_eq!(Cell::from_text(" 7 ").to_string(), "7");
    }

    #[cfg(feature = "spreadsheet")]
    #[test]
    fn garbage_is_not_a_workbook() {
        let err = read_workbook(b"definitely not a zip".to_vec()).unwrap_err();
        assert_eq!(err.kind(), "schema_invalid");
    }
}
