use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{ColumnRoleMap, HeaderRow, Role};

use super::header::SheetTable;
use super::utils::{is_digits, normalize_header, present};

/// Sample size used when guessing a title column from the data.
const TITLE_SAMPLE_ROWS: usize = 10;

/// Header labels that name a size or age option directly.
const SIZE_VOCABULARY: &[&str] = &[
    "NB", "0-3M", "3-6M", "6-9M", "6-12M", "9-12M", "12-18M", "18-24M",
    "1-2Y", "2-3Y", "3-4Y", "4-5Y", "5-6Y", "6-7Y", "7-8Y",
    "XS", "S", "M", "L", "XL", "XXL", "XXXL", "Free Size", "One Size",
];

static SIZE_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b\d{1,2}\s*[-–—]\s*\d{1,2}\s*[my]$").unwrap());

/// Candidate header names per role, highest priority first.
pub fn role_candidates(role: Role) -> &'static [&'static str] {
    match role {
        Role::Title => &["Title", "Product Title", "Product Name", "Item Name", "Style Name"],
        Role::Brand => &["Brand", "Brand Name", "Vendor", "Manufacturer"],
        Role::ProductCategory => &["Product Category", "Category", "Category Name", "Department"],
        Role::Subcategory => &["Sub Category", "Subcategory", "Product Sub Category", "Product Type"],
        Role::SubSubcategory => &["Sub Sub Category", "Sub Subcategory", "Product Sub Sub Category"],
        Role::Season => &["Season", "Season Name"],
        Role::Campaign => &["Campaign", "Campaign Name", "Collection", "Occasion"],
        Role::SizesField => &["Sizes", "Size", "Available Sizes", "Size Range"],
        Role::Cost => &["Cost Price", "Cost", "Purchase Price", "Wholesale Price", "Landing Cost"],
        Role::Mrp => &["MRP", "Maximum Retail Price", "Compare At Price", "Retail Price", "List Price"],
        Role::SellingPrice => &["Selling Price", "Sale Price", "Offer Price", "Our Price", "Price"],
        Role::SizeChart => &["Size Chart", "Size Chart Link", "Size Guide"],
    }
}

/// Maps every role to a header name. Depends only on the header row.
pub fn resolve_roles(header: &HeaderRow) -> ColumnRoleMap {
    let mut lookup: HashMap<String, &str> = HashMap::new();
    for name in header.names() {
        lookup.insert(normalize_header(name), name);
    }

    let mut roles = ColumnRoleMap::default();
    let mut claimed: HashSet<String> = HashSet::new();

    for role in Role::ALL {
        if let Some(column) = exact_match(&lookup, role_candidates(role)) {
            claimed.insert(column.clone());
            roles.set(role, column);
        }
    }

    // Substring matches never take a column already held by a role or a size.
    claimed.extend(size_columns(header));
    for role in Role::ALL {
        if roles.is_resolved(role) {
            continue;
        }
        if let Some(column) = substring_match(header, &claimed, role_candidates(role)) {
            claimed.insert(column.clone());
            roles.set(role, column);
        }
    }
    roles
}

fn exact_match(lookup: &HashMap<String, &str>, candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|candidate| lookup.get(&normalize_header(candidate)))
        .map(|column| column.to_string())
}

fn substring_match(header: &HeaderRow, claimed: &HashSet<String>, candidates: &[&str]) -> Option<String> {
    for candidate in candidates {
        let needle: String = candidate
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_lowercase();
        if let Some(name) = header
            .names()
            .iter()
            .filter(|name| !claimed.contains(name.as_str()))
            .find(|name| name.to_lowercase().contains(&needle))
        {
            return Some(name.clone());
        }
    }

    None
}

/// Headers holding image URLs, in header order.
pub fn image_columns(header: &HeaderRow) -> Vec<String> {
    header
        .names()
        .iter()
        .filter(|name| name.to_lowercase().contains("image"))
        .cloned()
        .collect()
}

/// Headers acting as size options, in header order.
pub fn size_columns(header: &HeaderRow) -> Vec<String> {
    header
        .names()
        .iter()
        .filter(|name| {
            let trimmed = name.trim();
            SIZE_VOCABULARY.iter().any(|size| size.eq_ignore_ascii_case(trimmed))
                || SIZE_RANGE.is_match(trimmed)
        })
        .cloned()
        .collect()
}

/// First column whose leading values look like text, else the first column.
fn fallback_title(sheet: &SheetTable) -> Option<String> {
    let names = sheet.header.names();
    names
        .iter()
        .find(|name| {
            let filled: Vec<&str> = sheet
                .column_values(name, TITLE_SAMPLE_ROWS)
                .into_iter()
                .filter_map(present)
                .collect();
            !filled.is_empty() && !filled.iter().all(|value| is_digits(value))
        })
        .or_else(|| names.first())
        .cloned()
}

/// Everything the row assembler needs to know about a sheet's columns.
#[derive(Debug, Clone)]
pub struct ResolvedColumns {
    pub roles: ColumnRoleMap,
    pub size_columns: Vec<String>,
    pub image_columns: Vec<String>,
}

pub fn resolve_columns(sheet: &SheetTable) -> ResolvedColumns {
    let mut roles = resolve_roles(&sheet.header);
    if !roles.is_resolved(Role::Title) {
        if let Some(column) = fallback_title(sheet) {
            tracing::debug!("Title column not named, falling back to {}", column);
            roles.set(Role::Title, column);
        }
    }

    let resolved = ResolvedColumns {
        roles,
        size_columns: size_columns(&sheet.header),
        image_columns: image_columns(&sheet.header),
    };
    tracing::debug!(
        "Resolved roles {:?}, {} size columns, {} image columns",
        resolved.roles,
        resolved.size_columns.len(),
        resolved.image_columns.len()
    );
    resolved
}
