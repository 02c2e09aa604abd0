use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

static SLUG_DISALLOWED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").unwrap());
static SLUG_WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static SLUG_DASHES: Lazy<Regex> = Lazy::new(|| Regex::new(r"-{2,}").unwrap());

/// True for blank cells and the literal `nan` left behind by spreadsheet exports.
pub fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan")
}

/// Trimmed cell text, or `None` when the cell is missing.
pub fn present(value: &str) -> Option<&str> {
    if is_missing(value) {
        None
    } else {
        Some(value.trim())
    }
}

/// Lowercases and drops everything outside `[a-z0-9]`.
pub fn normalize_header(name: &str) -> String {
    name.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        .collect()
}

/// Makes a header cell non-blank and unique within the row.
pub fn unique_column_name(name: &str, index: usize, existing_names: &mut HashSet<String>) -> String {
    let base_name = if name.trim().is_empty() {
        format!("Unnamed: {}", index)
    } else {
        name.to_string()
    };

    let mut cleaned = base_name.clone();
    let mut counter = 1;
    while !existing_names.insert(cleaned.clone()) {
        cleaned = format!("{}_{}", base_name, counter);
        counter += 1;
    }

    cleaned
}

/// URL handle for a product title.
pub fn slug(title: &str) -> String {
    let lowered = title.to_lowercase();
    let kept = SLUG_DISALLOWED.replace_all(&lowered, "");
    let dashed = SLUG_WHITESPACE.replace_all(kept.trim(), "-");
    let collapsed = SLUG_DASHES.replace_all(&dashed, "-");
    collapsed.trim_matches('-').to_string()
}

pub fn is_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|c| c.is_ascii_digit())
}
