use crate::domain::model::InvalidRow;
use crate::utils::error::{ImportError, Result};

/// Renders the rejected rows as a CSV the user can fix up and re-upload:
/// the original columns in their original order, plus a trailing `Error`
/// column with the rejection reason. Quoting follows CSV rules, so embedded
/// commas, quotes, and newlines survive a round trip through the parser.
pub fn render_error_report(headers: &[String], invalid_rows: &[InvalidRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header_record: Vec<&str> = headers.iter().map(String::as_str).collect();
    header_record.push("Error");
    writer.write_record(&header_record)?;

    for row in invalid_rows {
        let mut record: Vec<&str> = headers
            .iter()
            .map(|header| row.row_data.get(header).map(String::as_str).unwrap_or(""))
            .collect();
        record.push(&row.error);
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ImportError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| ImportError::parse(format!("error report is not valid UTF-8: {}", e)))
}
