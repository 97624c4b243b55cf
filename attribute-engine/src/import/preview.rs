//! Import file preview
//!
//! Reads the header row and the first data rows of an import file. Delimited
//! text is parsed here with the `csv` crate; spreadsheet workbooks go through
//! an injected [`SpreadsheetDecoder`].
//!
//! Reading a preview never fails: anything unreadable degrades to an empty
//! preview and a warning.

use shared::error::{AppError, AppResult};
use shared::models::{ImportFileFormat, ImportPreview};
use thiserror::Error;

/// Default number of data rows shown
pub const PREVIEW_ROWS: usize = 5;

const UTF8_BOM: char = '\u{FEFF}';
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const DELIMITERS: [u8; 3] = [b',', b';', b'\t'];

/// Decodes spreadsheet workbooks (xlsx / xls) into rows of cell text
pub trait SpreadsheetDecoder: Send + Sync {
    /// Rows of the first worksheet, header row first, with at most
    /// `max_rows` rows after the header
    fn decode(&self, bytes: &[u8], max_rows: usize) -> AppResult<Vec<Vec<String>>>;
}

#[derive(Debug, Error)]
enum PreviewError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet decoder error: {0}")]
    Decoder(#[from] AppError),

    #[error("No spreadsheet decoder configured")]
    NoDecoder,

    #[error("Unsupported file format")]
    Unsupported,
}

/// Format from the file extension, falling back to the leading bytes
pub fn detect_format(file_name: &str, bytes: &[u8]) -> Option<ImportFileFormat> {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("csv" | "tsv" | "txt") => return Some(ImportFileFormat::Delimited),
        Some("xlsx" | "xlsm" | "xls") => return Some(ImportFileFormat::Spreadsheet),
        _ => {}
    }

    if bytes.starts_with(ZIP_MAGIC) || bytes.starts_with(OLE_MAGIC) {
        Some(ImportFileFormat::Spreadsheet)
    } else if std::str::from_utf8(bytes).is_ok() {
        Some(ImportFileFormat::Delimited)
    } else {
        None
    }
}

/// Header row plus at most `max_rows` data rows of `bytes`
pub fn read_preview(
    file_name: &str,
    bytes: &[u8],
    max_rows: usize,
    decoder: Option<&dyn SpreadsheetDecoder>,
) -> ImportPreview {
    let Some(format) = detect_format(file_name, bytes) else {
        tracing::warn!(file_name, error = %PreviewError::Unsupported, "Import preview unavailable");
        return ImportPreview::empty(file_name, ImportFileFormat::Delimited);
    };

    let rows = match format {
        ImportFileFormat::Delimited => read_delimited(file_name, bytes, max_rows),
        ImportFileFormat::Spreadsheet => match decoder {
            Some(decoder) => decoder.decode(bytes, max_rows).map_err(PreviewError::from),
            None => Err(PreviewError::NoDecoder),
        },
    };

    match rows {
        Ok(rows) => build_preview(file_name, format, rows, max_rows),
        Err(e) => {
            tracing::warn!(file_name, error = %e, "Failed to read import preview");
            ImportPreview::empty(file_name, format)
        }
    }
}

/// Delimiter occurring most often in the header line; ties keep the earlier one
fn detect_delimiter(file_name: &str, text: &str) -> u8 {
    if file_name.to_ascii_lowercase().ends_with(".tsv") {
        return b'\t';
    }
    let header = text.lines().find(|l| !l.trim().is_empty()).unwrap_or_default();
    let mut best = (DELIMITERS[0], 0usize);
    for delimiter in DELIMITERS {
        let count = header.bytes().filter(|b| *b == delimiter).count();
        if count > best.1 {
            best = (delimiter, count);
        }
    }
    best.0
}

fn read_delimited(
    file_name: &str,
    bytes: &[u8],
    max_rows: usize,
) -> Result<Vec<Vec<String>>, PreviewError> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_start_matches(UTF8_BOM);
    let delimiter = detect_delimiter(file_name, text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::with_capacity(max_rows + 1);
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
        if rows.len() > max_rows {
            break;
        }
    }
    Ok(rows)
}

/// Unique, non-blank headers; data rows padded to the header width
fn build_preview(
    file_name: &str,
    format: ImportFileFormat,
    rows: Vec<Vec<String>>,
    max_rows: usize,
) -> ImportPreview {
    let mut rows = rows
        .into_iter()
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()));
    let Some(raw_headers) = rows.next() else {
        tracing::warn!(file_name, "Import file has no header row");
        return ImportPreview::empty(file_name, format);
    };

    let headers = unique_headers(raw_headers);
    let rows: Vec<Vec<String>> = rows
        .take(max_rows)
        .map(|mut row| {
            if row.len() < headers.len() {
                row.resize(headers.len(), String::new());
            }
            row
        })
        .collect();

    tracing::debug!(file_name, columns = headers.len(), rows = rows.len(), "Import preview read");
    ImportPreview {
        file_name: file_name.to_string(),
        format,
        headers,
        rows,
    }
}

/// `["SKU", "", "SKU"]` -> `["SKU", "Column 2", "SKU (2)"]`
fn unique_headers(raw: Vec<String>) -> Vec<String> {
    let mut seen: Vec<String> = Vec::with_capacity(raw.len());
    for (idx, header) in raw.into_iter().enumerate() {
        let base = match header.trim() {
            "" => format!("Column {}", idx + 1),
            h => h.to_string(),
        };
        let mut candidate = base.clone();
        let mut n = 2;
        while seen.contains(&candidate) {
            candidate = format!("{base} ({n})");
            n += 1;
        }
        seen.push(candidate);
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedDecoder(Vec<Vec<&'static str>>);

    impl SpreadsheetDecoder for FixedDecoder {
        fn decode(&self, _bytes: &[u8], max_rows: usize) -> AppResult<Vec<Vec<String>>> {
            Ok(self
                .0
                .iter()
                .take(max_rows + 1)
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect())
        }
    }

    struct BrokenDecoder;

    impl SpreadsheetDecoder for BrokenDecoder {
        fn decode(&self, _bytes: &[u8], _max_rows: usize) -> AppResult<Vec<Vec<String>>> {
            Err(AppError::parse("corrupt workbook"))
        }
    }

    #[test]
    fn test_comma_file_first_rows_only() {
        let mut csv = String::from("Product SKU,Product Name,GTIN\n");
        for i in 1..=8 {
            csv.push_str(&format!("SKU-{i},Item {i},400000000000{i}\n"));
        }
        let preview = read_preview("products.csv", csv.as_bytes(), PREVIEW_ROWS, None);
        assert_eq!(preview.headers, vec!["Product SKU", "Product Name", "GTIN"]);
        assert_eq!(preview.rows.len(), 5);
        assert_eq!(preview.rows[4][0], "SKU-5");
        assert_eq!(preview.format, ImportFileFormat::Delimited);
    }

    #[test]
    fn test_semicolon_with_bom_and_quotes() {
        let csv = "\u{FEFF}Référence;Libellé;Prix\n\"A;1\";Chaise;12,50\n\n;;\nB2;Table\n";
        let preview = read_preview("export.csv", csv.as_bytes(), PREVIEW_ROWS, None);
        assert_eq!(preview.headers, vec!["Référence", "Libellé", "Prix"]);
        assert_eq!(preview.rows.len(), 2);
        assert_eq!(preview.rows[0], vec!["A;1", "Chaise", "12,50"]);
        assert_eq!(preview.rows[1], vec!["B2", "Table", ""]);
    }

    #[test]
    fn test_tab_delimited() {
        let tsv = "sku\tname\nA1\tChair\n";
        let preview = read_preview("data.txt", tsv.as_bytes(), PREVIEW_ROWS, None);
        assert_eq!(preview.headers, vec!["sku", "name"]);
        assert_eq!(preview.rows, vec![vec!["A1", "Chair"]]);
    }

    #[test]
    fn test_blank_and_duplicate_headers() {
        let preview = read_preview("x.csv", b"SKU,,SKU\n1,2,3\n", PREVIEW_ROWS, None);
        assert_eq!(preview.headers, vec!["SKU", "Column 2", "SKU (2)"]);
    }

    #[test]
    fn test_empty_file_degrades() {
        let preview = read_preview("empty.csv", b"", PREVIEW_ROWS, None);
        assert!(preview.headers.is_empty());
        assert!(preview.rows.is_empty());
    }

    #[test]
    fn test_spreadsheet_through_decoder() {
        let decoder = FixedDecoder(vec![
            vec!["SKU", "Name"],
            vec!["A1", "Chair"],
            vec!["A2", "Table"],
        ]);
        let preview = read_preview("catalog.xlsx", b"PK\x03\x04...", 1, Some(&decoder));
        assert_eq!(preview.format, ImportFileFormat::Spreadsheet);
        assert_eq!(preview.headers, vec!["SKU", "Name"]);
        assert_eq!(preview.rows.len(), 1);
    }

    #[test]
    fn test_spreadsheet_without_or_with_broken_decoder_degrades() {
        let preview = read_preview("catalog.xlsx", b"PK\x03\x04", PREVIEW_ROWS, None);
        assert_eq!(preview, ImportPreview::empty("catalog.xlsx", ImportFileFormat::Spreadsheet));

        let preview = read_preview("catalog.xls", OLE_MAGIC, PREVIEW_ROWS, Some(&BrokenDecoder));
        assert!(preview.headers.is_empty());
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(detect_format("A.CSV", b""), Some(ImportFileFormat::Delimited));
        assert_eq!(detect_format("upload", b"PK\x03\x04rest"), Some(ImportFileFormat::Spreadsheet));
        assert_eq!(detect_format("upload", OLE_MAGIC), Some(ImportFileFormat::Spreadsheet));
        assert_eq!(detect_format("upload", b"sku,name"), Some(ImportFileFormat::Delimited));
        assert_eq!(detect_format("upload.bin", &[0xFF, 0xFE, 0x00]), None);
    }
}
