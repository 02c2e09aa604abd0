use std::collections::HashSet;

use crate::models::{OutputRow, Role, SourceRecord, DEFAULT_VARIANT};

use super::columns::ResolvedColumns;
use super::price::derive_prices;
use super::tags::synthesize_tags;
use super::utils::{normalize_header, present, slug};
use super::variants::extract_variants;

const SEO_DESCRIPTION_CHARS: usize = 320;

/// Columns gathered into the product description, highest priority first.
const DESCRIPTION_COLUMNS: &[&str] = &[
    "Description",
    "Product Description",
    "Specification",
    "Specifications",
    "Product Specification",
    "Product Details",
    "Details",
    "Features",
    "Key Features",
    "Material",
    "Fabric",
    "Composition",
    "Care Instructions",
    "Wash Care",
];

fn build_description(record: &SourceRecord<'_>, columns: &ResolvedColumns) -> String {
    let mut used = HashSet::new();
    let mut parts: Vec<String> = Vec::new();

    for candidate in DESCRIPTION_COLUMNS {
        let wanted = normalize_header(candidate);
        let matched = record
            .header()
            .names()
            .iter()
            .find(|name| normalize_header(name) == wanted);

        if let Some(name) = matched {
            if !used.insert(name.as_str()) {
                continue;
            }
            if let Some(value) = present(record.get(name)) {
                parts.push(value.to_string());
            }
        }
    }

    if let Some(chart) = present(record.role(&columns.roles, Role::SizeChart)) {
        parts.push(format!("Size Chart: {}", chart));
    }

    parts.join("\n\n")
}

/// Expands one source record into its variant rows followed by one row per
/// extra image. Records without a usable title produce nothing.
pub fn assemble_record(record: &SourceRecord<'_>, columns: &ResolvedColumns) -> Vec<OutputRow> {
    let roles = &columns.roles;
    let title = match present(record.role(roles, Role::Title)) {
        Some(title) => title,
        None => return Vec::new(),
    };

    let handle = slug(title);
    let description = build_description(record, columns);
    let seo_description: String = description.chars().take(SEO_DESCRIPTION_CHARS).collect();
    let variants = extract_variants(record, &columns.size_columns);
    let tags = synthesize_tags(record, roles, &variants).joined();
    let prices = derive_prices(
        record.role(roles, Role::SellingPrice),
        record.role(roles, Role::Mrp),
        record.role(roles, Role::Cost),
    );
    let images: Vec<&str> = columns
        .image_columns
        .iter()
        .filter_map(|column| present(record.get(column)))
        .collect();

    let mut rows = Vec::with_capacity(variants.len() + images.len().saturating_sub(1));

    for (idx, variant) in variants.iter().enumerate() {
        let mut row = OutputRow::new();
        row.set("Title", title);
        row.set("URL handle", handle.as_str());
        row.set("Description", description.as_str());
        row.set("Vendor", present(record.role(roles, Role::Brand)).unwrap_or(""));
        row.set("Type", present(record.role(roles, Role::ProductCategory)).unwrap_or(""));
        row.set("Tags", tags.as_str());
        row.set("Published on online store", "TRUE");
        row.set("Status", "Active");
        row.set("Price", prices.price.as_str());
        row.set("Compare-at price", prices.compare_at.as_str());
        row.set("Cost per item", prices.cost.as_str());
        row.set("Charge tax", "TRUE");
        row.set("Requires shipping", "TRUE");
        row.set("Fulfillment service", "manual");
        row.set("Gift card", "FALSE");
        row.set("SEO title", title);
        row.set("SEO description", seo_description.as_str());

        if idx == 0 {
            if let Some(image) = images.first() {
                row.set("Product image URL", *image);
                row.set("Image position", "1");
                row.set("Image alt text", title);
            }
            if variant != DEFAULT_VARIANT {
                row.set("Option1 name", "Size");
                row.set("Option1 value", variant.as_str());
            }
        }

        rows.push(row);
    }

    for (position, image) in images.iter().enumerate().skip(1) {
        let mut row = OutputRow::new();
        row.set("URL handle", handle.as_str());
        row.set("Product image URL", *image);
        row.set("Image position", (position + 1).to_string());
        rows.push(row);
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HeaderRow;
    use crate::services::sheet::columns::resolve_columns;
    use crate::services::sheet::header::SheetTable;

    fn sheet(names: &[&str], rows: &[&[&str]]) -> SheetTable {
        SheetTable {
            header: HeaderRow::new(names.iter().map(|n| n.to_string()).collect()),
            rows: rows
                .iter()
                .map(|row| row.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    fn assemble_all(sheet: &SheetTable) -> Vec<Vec<OutputRow>> {
        let columns = resolve_columns(sheet);
        sheet
            .rows
            .iter()
            .map(|cells| assemble_record(&SourceRecord::new(&sheet.header, cells), &columns))
            .collect()
    }

    const NAMES: &[&str] = &["Title", "Brand", "S", "M", "L", "Image 1", "Image 2", "Image 3", "Selling Price", "MRP"];

    #[test]
    fn row_count_is_variants_plus_extra_images() {
        let s = sheet(
            NAMES,
            &[
                &["Tee", "Acme", "1", "2", "0", "a.jpg", "b.jpg", "c.jpg", "500", "799"],
                &["Cap", "Acme", "", "", "", "", "", "", "", ""],
                &["Sock", "Acme", "", "", "1", "a.jpg", "", "", "", ""],
                &["Bag", "Acme", "", "", "", "a.jpg", "b.jpg", "", "", ""],
            ],
        );
        let counts: Vec<usize> = assemble_all(&s).iter().map(Vec::len).collect();
        assert_eq!(counts, vec![2 + 2, 1, 1, 1 + 1]);
    }

    #[test]
    fn blank_or_nan_title_yields_nothing() {
        let s = sheet(NAMES, &[&["nan", "Acme", "1", "", "", "", "", "", "", ""], &["  ", "", "", "", "", "", "", "", "", ""]]);
        assert!(assemble_all(&s).iter().all(Vec::is_empty));
    }

    #[test]
    fn only_first_row_carries_image_and_option() {
        let s = sheet(NAMES, &[&["Kids' Tee!", "Acme", "1", "1", "", "a.jpg", "b.jpg", "", "₹1,000", "1,499.00"]]);
        let rows = assemble_all(&s).remove(0);
        assert_eq!(rows.len(), 3);

        let first = &rows[0];
        assert_eq!(first.get("URL handle"), "kids-tee");
        assert_eq!(first.get("Product image URL"), "a.jpg");
        assert_eq!(first.get("Image position"), "1");
        assert_eq!(first.get("Option1 name"), "Size");
        assert_eq!(first.get("Option1 value"), "S");
        assert_eq!(first.get("Price"), "999");
        assert_eq!(first.get("Compare-at price"), "1499");
        assert_eq!(first.get("Vendor"), "Acme");
        assert_eq!(first.get("Tags"), "Acme");
        assert_eq!(first.get("Status"), "Active");
        assert_eq!(first.get("Gift card"), "FALSE");

        let second = &rows[1];
        assert_eq!(second.get("Title"), "Kids' Tee!");
        assert_eq!(second.get("Price"), "999");
        assert_eq!(second.get("Product image URL"), "");
        assert_eq!(second.get("Option1 value"), "");

        let image_row = &rows[2];
        assert_eq!(image_row.get("URL handle"), "kids-tee");
        assert_eq!(image_row.get("Product image URL"), "b.jpg");
        assert_eq!(image_row.get("Image position"), "2");
        assert_eq!(image_row.values().iter().filter(|v| !v.is_empty()).count(), 3);
    }

    #[test]
    fn default_variant_has_no_option_fields() {
        let s = sheet(NAMES, &[&["Cap", "", "", "", "", "", "", "", "", ""]]);
        let rows = assemble_all(&s).remove(0);
        assert_eq!(rows[0].get("Option1 name"), "");
        assert_eq!(rows[0].get("Option1 value"), "");
        assert_eq!(rows[0].get("Image position"), "");
    }

    #[test]
    fn price_falls_back_to_cost_when_only_mrp_mentions_price() {
        let s = sheet(&["Title", "Retail Price", "Cost"], &[&["Tee", "1000", "400"]]);
        let rows = assemble_all(&s).remove(0);
        assert_eq!(rows[0].get("Price"), "399");
        assert_eq!(rows[0].get("Compare-at price"), "1000");
        assert_eq!(rows[0].get("Cost per item"), "400");
    }

    #[test]
    fn size_chart_link_stays_out_of_tags() {
        let s = sheet(&["Title", "Brand", "Size Chart"], &[&["Tee", "Acme", "https://x/chart.png"]]);
        let rows = assemble_all(&s).remove(0);
        assert_eq!(rows[0].get("Tags"), "Acme");
    }

    #[test]
    fn description_joins_spec_columns_and_truncates_seo() {
        let long = "x".repeat(400);
        let s = sheet(
            &["Title", "Fabric", "product description", "Size Chart"],
            &[&["Tee", "Cotton", long.as_str(), "chart.png"]],
        );
        let rows = assemble_all(&s).remove(0);
        let description = rows[0].get("Description");
        assert_eq!(description, format!("{}\n\nCotton\n\nSize Chart: chart.png", long));
        assert_eq!(rows[0].get("SEO description"), "x".repeat(320));
    }
}
