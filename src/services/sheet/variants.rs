use crate::models::{SourceRecord, Variants, DEFAULT_VARIANT};

use super::utils::is_missing;

/// Size labels whose column carries a value for this record, or `["Default"]`.
pub fn extract_variants(record: &SourceRecord<'_>, size_columns: &[String]) -> Variants {
    let mut variants: Variants = size_columns
        .iter()
        .filter(|column| {
            let value = record.get(column);
            !is_missing(value) && value.trim() != "0"
        })
        .map(|column| column.trim().to_string())
        .collect();

    if variants.is_empty() {
        variants.push(DEFAULT_VARIANT.to_string());
    }
    variants
}
