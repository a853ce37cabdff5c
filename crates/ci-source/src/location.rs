use std::path::PathBuf;

use ci_core::{Error, Result};
use reqwest::Url;

const DRIVE_HOST: &str = "drive.google.com";
const DOCS_HOST: &str = "docs.google.com";

/// How the bytes behind a location are parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Delimited text with a header row.
    Csv {
        /// Field delimiter (`b','` or `b'\t'`).
        delimiter: u8,
    },
    /// Spreadsheet-native workbook (xlsx, xls, ods); first sheet is read.
    Spreadsheet,
    /// Unknown until the bytes are read; see [`SourceFormat::sniff`].
    Detect,
}

impl SourceFormat {
    /// Pick a concrete format from the leading bytes of a payload.
    ///
    /// Zip (xlsx, ods) and OLE2 (xls) containers are workbooks; anything
    /// else is read as comma-delimited text.
    pub fn sniff(bytes: &[u8]) -> SourceFormat {
        const ZIP: &[u8] = b"PK\x03\x04";
        const OLE2: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
        if bytes.starts_with(ZIP) || bytes.starts_with(OLE2) {
            SourceFormat::Spreadsheet
        } else {
            SourceFormat::Csv { delimiter: b',' }
        }
    }
}

/// A location normalized to something that can be read in one go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// File on the local filesystem.
    LocalFile {
        /// Path as given.
        path: PathBuf,
        /// Parse format.
        format: SourceFormat,
    },
    /// Directly fetchable `http(s)` endpoint.
    Remote {
        /// URL after provider-specific rewriting.
        url: String,
        /// Parse format.
        format: SourceFormat,
    },
}

impl Location {
    /// Parse format for this location.
    pub fn format(&self) -> SourceFormat {
        match self {
            Location::LocalFile { format, .. } | Location::Remote { format, .. } => *format,
        }
    }

    /// Path or URL that will be read.
    pub fn endpoint(&self) -> String {
        match self {
            Location::LocalFile { path, .. } => path.display().to_string(),
            Location::Remote { url, .. } => url.clone(),
        }
    }
}

/// Resolve a location string.
///
/// Recognized shapes:
/// - a path or URL ending in `.csv` / `.tsv` / `.txt` → delimited text;
/// - an export URL carrying `output=csv` or `format=csv` → delimited text;
/// - a Google Sheets editor link → rewritten to its CSV export;
/// - a Google Drive share link → rewritten to the direct-download form,
///   format decided from the downloaded bytes;
/// - anything else → spreadsheet-native workbook.
pub fn resolve_location(location: &str) -> Result<Location> {
    let s = location.trim();
    if s.is_empty() {
        return Err(Error::SourceUnavailable("empty source location".into()));
    }

    let lower = s.to_ascii_lowercase();
    if !(lower.starts_with("http://") || lower.starts_with("https://")) {
        let path = PathBuf::from(s);
        let format = format_for(&lower, false);
        return Ok(Location::LocalFile { path, format });
    }

    let url = Url::parse(s)
        .map_err(|e| Error::SourceUnavailable(format!("invalid source URL {s:?}: {e}")))?;

    if url.host_str() == Some(DRIVE_HOST) {
        if let Some(id) = drive_file_id(&url) {
            let direct = format!("https://{DRIVE_HOST}/uc?export=download&id={id}");
            tracing::debug!(from = %s, to = %direct, "rewrote drive share link");
            // Share links carry no file name; csv and xlsx uploads look alike.
            let format = match format_for(&lower, has_csv_output(&url)) {
                SourceFormat::Spreadsheet => SourceFormat::Detect,
                hinted => hinted,
            };
            return Ok(Location::Remote { url: direct, format });
        }
    }

    if url.host_str() == Some(DOCS_HOST) && !has_csv_output(&url) {
        if let Some(export) = sheets_csv_export(&url) {
            tracing::debug!(from = %s, to = %export, "rewrote sheets link to CSV export");
            return Ok(Location::Remote { url: export, format: SourceFormat::Csv { delimiter: b',' } });
        }
    }

    let format = format_for(url.path().to_ascii_lowercase().as_str(), has_csv_output(&url));
    Ok(Location::Remote { url: url.to_string(), format })
}

fn format_for(path_lower: &str, csv_output: bool) -> SourceFormat {
    if path_lower.ends_with(".tsv") {
        SourceFormat::Csv { delimiter: b'\t' }
    } else if csv_output || path_lower.ends_with(".csv") || path_lower.ends_with(".txt") {
        SourceFormat::Csv { delimiter: b',' }
    } else {
        SourceFormat::Spreadsheet
    }
}

fn has_csv_output(url: &Url) -> bool {
    url.query_pairs().any(|(k, v)| {
        (k == "output" || k == "format" || k == "exportFormat") && v.eq_ignore_ascii_case("csv")
    })
}

/// File id from `/file/d/<id>/...`, `/open?id=<id>` or `/uc?id=<id>`.
fn drive_file_id(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    if let Some(pos) = segments.iter().position(|s| *s == "d") {
        if let Some(id) = segments.get(pos + 1).filter(|id| !id.is_empty()) {
            return Some((*id).to_string());
        }
    }
    url.query_pairs().find(|(k, v)| k == "id" && !v.is_empty()).map(|(_, v)| v.into_owned())
}

/// `/spreadsheets/d/<id>/edit#gid=N` → `/spreadsheets/d/<id>/export?format=csv&gid=N`.
fn sheets_csv_export(url: &Url) -> Option<String> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    if segments.first() != Some(&"spreadsheets") || segments.get(1) != Some(&"d") {
        return None;
    }
    let id = segments.get(2).filter(|id| !id.is_empty())?;
    // Published (`/d/e/<id>/pub`) links carry their own output parameter.
    if *id == "e" {
        return None;
    }
    let gid = url
        .query_pairs()
        .find(|(k, _)| k == "gid")
        .map(|(_, v)| v.into_owned())
        .or_else(|| url.fragment().and_then(|f| f.strip_prefix("gid=")).map(str::to_string));
    let mut out = format!("https://{DOCS_HOST}/spreadsheets/d/{id}/export?format=csv");
    if let Some(gid) = gid {
        out.push_str("&gid=");
        out.push_str(&gid);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMMA: SourceFormat = SourceFormat::Csv { delimiter: b',' };

    #[test]
    fn local_csv_and_tsv() {
        let loc = resolve_location("data/campaign.CSV").unwrap();
        assert_eq!(loc, Location::LocalFile { path: "data/campaign.CSV".into(), format: COMMA });
        let loc = resolve_location("/tmp/x.tsv").unwrap();
        assert_eq!(loc.format(), SourceFormat::Csv { delimiter: b'\t' });
    }

    #[test]
    fn local_other_extension_is_spreadsheet() {
        let loc = resolve_location("report.xlsx").unwrap();
        assert_eq!(loc.format(), SourceFormat::Spreadsheet);
    }

    #[test]
    fn published_sheet_with_output_csv() {
        let u = "https://docs.google.com/spreadsheets/d/e/2PACX-abc/pub?gid=0&single=true&output=csv";
        let loc = resolve_location(u).unwrap();
        assert_eq!(loc.format(), COMMA);
        assert_eq!(loc.endpoint(), u);
    }

    #[test]
    fn sheets_editor_link_rewritten_to_export() {
        let loc =
            resolve_location("https://docs.google.com/spreadsheets/d/1AbC_d/edit#gid=42").unwrap();
        assert_eq!(
            loc,
            Location::Remote {
                url: "https://docs.google.com/spreadsheets/d/1AbC_d/export?format=csv&gid=42"
                    .into(),
                format: COMMA,
            }
        );
    }

    #[test]
    fn drive_share_link_rewritten() {
        let loc =
            resolve_location("https://drive.google.com/file/d/1XyZ-123/view?usp=sharing").unwrap();
        assert_eq!(
            loc,
            Location::Remote {
                url: "https://drive.google.com/uc?export=download&id=1XyZ-123".into(),
                format: SourceFormat::Detect,
            }
        );
        let loc = resolve_location("https://drive.google.com/open?id=QQ9").unwrap();
        assert_eq!(loc.endpoint(), "https://drive.google.com/uc?export=download&id=QQ9");
    }

    #[test]
    fn drive_link_with_csv_hint_skips_detection() {
        let loc = resolve_location("https://drive.google.com/uc?id=QQ9&output=csv").unwrap();
        assert_eq!(loc.format(), COMMA);
    }

    #[test]
    fn sniff_by_container_signature() {
        assert_eq!(SourceFormat::sniff(b"PK\x03\x04\x14\x00"), SourceFormat::Spreadsheet);
        assert_eq!(
            SourceFormat::sniff(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1]),
            SourceFormat::Spreadsheet
        );
        assert_eq!(SourceFormat::sniff(b"date,control,conversions\n"), COMMA);
        assert_eq!(SourceFormat::sniff(b""), COMMA);
    }

    #[test]
    fn remote_csv_by_extension() {
        let loc = resolve_location("https://example.com/exports/daily.csv?token=1").unwrap();
        assert_eq!(loc.format(), COMMA);
    }

    #[test]
    fn remote_without_hint_is_spreadsheet() {
        let loc = resolve_location("https://example.com/exports/daily").unwrap();
        assert_eq!(loc.format(), SourceFormat::Spreadsheet);
    }

    #[test]
    fn empty_and_malformed_locations() {
        assert_eq!(resolve_location("   ").unwrap_err().kind(), "source_unavailable");
        assert_eq!(resolve_location("http://").unwrap_err().kind(), "source_unavailable");
    }
}
