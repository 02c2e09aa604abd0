use std::collections::HashSet;

use crate::models::{HeaderRow, RawTable};

use super::utils::unique_column_name;

/// How many leading rows are searched for the header.
pub const HEADER_LOOKAHEAD: usize = 8;

/// Index of the first row within `limit` rows that has a cell mentioning
/// "title", or `None` for an empty table. Defaults to row 0.
pub fn detect_header_row(table: &RawTable, limit: usize) -> Option<usize> {
    if table.is_empty() {
        return None;
    }

    let found = table.iter().take(limit).position(|row| {
        row.iter()
            .any(|cell| cell.trim().to_lowercase().contains("title"))
    });

    Some(found.unwrap_or(0))
}

/// A table split into its header and the non-blank data rows below it.
#[derive(Debug, Clone)]
pub struct SheetTable {
    pub header: HeaderRow,
    pub rows: Vec<Vec<String>>,
}

impl SheetTable {
    /// Splits `table` at the detected header. Returns `None` when the table is
    /// empty.
    pub fn from_raw(table: RawTable) -> Option<Self> {
        let header_idx = detect_header_row(&table, HEADER_LOOKAHEAD)?;
        tracing::debug!("Header row detected at index {}", header_idx);

        let mut rows = table.into_iter().skip(header_idx);
        let header_cells = rows.next().unwrap_or_default();

        let mut existing_names = HashSet::new();
        let names = header_cells
            .iter()
            .enumerate()
            .map(|(idx, cell)| unique_column_name(cell, idx, &mut existing_names))
            .collect();

        let rows = rows
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();

        Some(Self {
            header: HeaderRow::new(names),
            rows,
        })
    }

    /// Values of `column` for the first `limit` data rows.
    pub fn column_values(&self, column: &str, limit: usize) -> Vec<&str> {
        match self.header.position(column) {
            Some(idx) => self
                .rows
                .iter()
                .take(limit)
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
            None => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[&[&str]]) -> RawTable {
        rows.iter()
            .map(|row| row.iter().map(|c| c.to_string()).collect())
            .collect()
    }

    #[test]
    fn finds_title_row_below_decoys() {
        let raw = table(&[
            &["Supplier: Acme Kids", ""],
            &["Order sheet", "Spring"],
            &["", ""],
            &["Product Title", "MRP"],
            &["Romper", "499"],
        ]);
        assert_eq!(detect_header_row(&raw, HEADER_LOOKAHEAD), Some(3));
    }

    #[test]
    fn falls_back_to_first_row() {
        let raw = table(&[&["Name", "Price"], &["Romper", "499"]]);
        assert_eq!(detect_header_row(&raw, HEADER_LOOKAHEAD), Some(0));
    }

    #[test]
    fn ignores_title_beyond_lookahead() {
        let mut raw: RawTable = vec![vec!["x".to_string()]; 8];
        raw.push(vec!["Title".to_string()]);
        assert_eq!(detect_header_row(&raw, HEADER_LOOKAHEAD), Some(0));
    }

    #[test]
    fn empty_table_has_no_header() {
        assert_eq!(detect_header_row(&Vec::new(), HEADER_LOOKAHEAD), None);
        assert!(SheetTable::from_raw(Vec::new()).is_none());
    }

    #[test]
    fn from_raw_names_blank_headers_and_drops_blank_rows() {
        let raw = table(&[
            &["junk", ""],
            &["Title", ""],
            &["Romper", "x"],
            &["", "  "],
            &["Bib", ""],
        ]);
        let sheet = SheetTable::from_raw(raw).unwrap();
        assert_eq!(sheet.header.names(), &["Title", "Unnamed: 1"]);
        assert_eq!(sheet.rows.len(), 2);
        assert_eq!(sheet.column_values("Title", 10), vec!["Romper", "Bib"]);
    }
}
