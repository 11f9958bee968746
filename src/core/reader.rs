use crate::domain::model::RawRow;
use crate::utils::error::{ImportError, Result};
use std::collections::HashMap;

/// Returns the header row of a delimited-text file.
///
/// Fails with a parse error when the bytes cannot be decoded as CSV or the
/// file contains no rows at all. A header-only file is fine here; it simply
/// yields zero data rows later.
pub fn extract_headers(csv_bytes: &[u8]) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(strip_bom(csv_bytes));

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ImportError::parse(format!("cannot decode header row: {}", e)))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(ImportError::parse("file contains no rows"));
    }

    Ok(headers)
}

/// Decodes the whole file into headers plus data rows.
///
/// Rows are numbered from 1; the header row is row 0 and never appears in
/// the output. Short rows read missing cells as empty strings and cells
/// beyond the header width are dropped.
pub fn read_rows(csv_bytes: &[u8]) -> Result<(Vec<String>, Vec<RawRow>)> {
    let headers = extract_headers(csv_bytes)?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(strip_bom(csv_bytes));

    let mut rows = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let row_number = index + 1;
        let record = record.map_err(|e| {
            ImportError::parse(format!("cannot decode row {}: {}", row_number, e))
        })?;

        let mut values = HashMap::with_capacity(headers.len());
        for (column, header) in headers.iter().enumerate() {
            values.insert(header.clone(), record.get(column).unwrap_or("").to_string());
        }
        rows.push(RawRow { row_number, values });
    }

    tracing::debug!("decoded {} data rows under {} headers", rows.len(), headers.len());
    Ok((headers, rows))
}

// Spreadsheet exports often lead with a UTF-8 BOM; the csv crate would fold
// it into the first header name.
fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes)
}
