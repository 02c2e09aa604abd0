use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Reader};
use csv::ReaderBuilder;

use crate::error::AppError;
use crate::models::RawTable;

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];
const DELIMITERS: &[u8] = &[b',', b';', b'\t', b'|'];

fn extension(file_name: &str) -> String {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_lowercase()
}

/// Decodes an uploaded file into a rectangular grid of cell text.
pub fn read_table(file_name: &str, data: &[u8]) -> Result<RawTable, AppError> {
    let ext = extension(file_name);
    let table = if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
        read_workbook(data)?
    } else {
        read_delimited(data)?
    };
    Ok(pad_rows(table))
}

/// Most frequent candidate delimiter on the first non-blank line.
fn sniff_delimiter(text: &str) -> u8 {
    let first_line = text
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default();

    let mut best = b',';
    let mut max_count = 0;
    for &delim in DELIMITERS {
        let count = first_line.matches(delim as char).count();
        if count > max_count {
            max_count = count;
            best = delim;
        }
    }
    best
}

fn read_delimited(data: &[u8]) -> Result<RawTable, AppError> {
    let text = String::from_utf8_lossy(data);
    let text = text.strip_prefix('\u{feff}').unwrap_or(&text);
    let delimiter = sniff_delimiter(text);

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }
    Ok(rows)
}

fn read_workbook(data: &[u8]) -> Result<RawTable, AppError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data))?;

    let sheet_name = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| AppError::FileProcessingError("No sheets found in workbook".to_string()))?;

    let range = workbook.worksheet_range(&sheet_name)?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(|cell| cell.to_string()).collect())
        .collect())
}

fn pad_rows(mut table: RawTable) -> RawTable {
    let width = table.iter().map(Vec::len).max().unwrap_or(0);
    for row in &mut table {
        row.resize(width, String::new());
    }
    table
}
