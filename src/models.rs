use std::collections::HashMap;

use once_cell::sync::Lazy;
use smallvec::SmallVec;

/// Column layout of the Shopify product import file. Every output row carries
/// exactly these keys in exactly this order.
pub const TEMPLATE_SCHEMA: [&str; 67] = [
    "Title",
    "URL handle",
    "Description",
    "Vendor",
    "Product category",
    "Type",
    "Tags",
    "Published on online store",
    "Status",
    "SKU",
    "Barcode",
    "Option1 name",
    "Option1 value",
    "Option1 Linked To",
    "Option2 name",
    "Option2 value",
    "Option2 Linked To",
    "Option3 name",
    "Option3 value",
    "Option3 Linked To",
    "Price",
    "Compare-at price",
    "Cost per item",
    "Charge tax",
    "Tax code",
    "Unit price total measure",
    "Unit price total measure unit",
    "Unit price base measure",
    "Unit price base measure unit",
    "Inventory tracker",
    "Inventory quantity",
    "Continue selling when out of stock",
    "Weight value (grams)",
    "Weight unit for display",
    "Requires shipping",
    "Fulfillment service",
    "Product image URL",
    "Image position",
    "Image alt text",
    "Variant image URL",
    "Gift card",
    "SEO title",
    "SEO description",
    "Google Shopping / Google product category",
    "Google Shopping / Gender",
    "Google Shopping / Age group",
    "Google Shopping / Manufacturer part number (MPN)",
    "Google Shopping / Ad group name",
    "Google Shopping / Ads labels",
    "Google Shopping / Condition",
    "Google Shopping / Custom product",
    "Google Shopping / Custom label 0",
    "Google Shopping / Custom label 1",
    "Google Shopping / Custom label 2",
    "Google Shopping / Custom label 3",
    "Google Shopping / Custom label 4",
    "Age group (product.metafields.shopify.age-group)",
    "Color (product.metafields.shopify.color-pattern)",
    "Fabric (product.metafields.shopify.fabric)",
    "Clothing features (product.metafields.shopify.clothing-features)",
    "Fit (product.metafields.shopify.fit)",
    "Neckline (product.metafields.shopify.neckline)",
    "Size (product.metafields.shopify.size)",
    "Sleeve length type (product.metafields.shopify.sleeve-length-type)",
    "Target gender (product.metafields.shopify.target-gender)",
    "Complementary products (product.metafields.shopify--discovery--product_recommendation.complementary_products)",
    "Related products (product.metafields.shopify--discovery--product_recommendation.related_products)",
];

static TEMPLATE_POSITIONS: Lazy<HashMap<&'static str, usize>> = Lazy::new(|| {
    TEMPLATE_SCHEMA
        .iter()
        .enumerate()
        .map(|(idx, key)| (*key, idx))
        .collect()
});

/// Rectangular grid of cell text, as decoded from an uploaded file.
pub type RawTable = Vec<Vec<String>>;

/// Size/option labels derived for one record.
pub type Variants = SmallVec<[String; 8]>;

pub const DEFAULT_VARIANT: &str = "Default";

/// Column names of the detected header row, made non-blank and unique.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRow {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl HeaderRow {
    pub fn new(names: Vec<String>) -> Self {
        let positions = names
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.clone(), idx))
            .collect();
        Self { names, positions }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.positions.get(name).copied()
    }
}

/// One data row below the header, addressed by column name.
#[derive(Debug, Clone, Copy)]
pub struct SourceRecord<'a> {
    header: &'a HeaderRow,
    cells: &'a [String],
}

impl<'a> SourceRecord<'a> {
    pub fn new(header: &'a HeaderRow, cells: &'a [String]) -> Self {
        Self { header, cells }
    }

    /// Raw cell text for `column`, or `""` when the column or cell is absent.
    pub fn get(&self, column: &str) -> &'a str {
        self.header
            .position(column)
            .and_then(|idx| self.cells.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn role(&self, roles: &ColumnRoleMap, role: Role) -> &'a str {
        roles.get(role).map(|column| self.get(column)).unwrap_or("")
    }

    pub fn header(&self) -> &'a HeaderRow {
        self.header
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Title,
    Brand,
    ProductCategory,
    Subcategory,
    SubSubcategory,
    Season,
    Campaign,
    SizesField,
    Cost,
    Mrp,
    SellingPrice,
    SizeChart,
}

impl Role {
    pub const ALL: [Role; 12] = [
        Role::Title,
        Role::Brand,
        Role::ProductCategory,
        Role::Subcategory,
        Role::SubSubcategory,
        Role::Season,
        Role::Campaign,
        Role::SizesField,
        Role::Cost,
        Role::Mrp,
        Role::SellingPrice,
        Role::SizeChart,
    ];
}

/// Resolved column name per semantic role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnRoleMap {
    columns: HashMap<Role, String>,
}

impl ColumnRoleMap {
    pub fn get(&self, role: Role) -> Option<&str> {
        self.columns.get(&role).map(String::as_str)
    }

    pub fn set(&mut self, role: Role, column: impl Into<String>) {
        self.columns.insert(role, column.into());
    }

    pub fn is_resolved(&self, role: Role) -> bool {
        self.columns.contains_key(&role)
    }
}

/// A single row of the output file, pre-filled with empty strings for every
/// template key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputRow {
    values: Vec<String>,
}

impl Default for OutputRow {
    fn default() -> Self {
        Self {
            values: vec![String::new(); TEMPLATE_SCHEMA.len()],
        }
    }
}

impl OutputRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a template field. Keys outside the template are ignored.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        match TEMPLATE_POSITIONS.get(key) {
            Some(&idx) => self.values[idx] = value.into(),
            None => tracing::warn!("Ignoring unknown template field: {}", key),
        }
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> &str {
        TEMPLATE_POSITIONS
            .get(key)
            .map(|&idx| self.values[idx].as_str())
            .unwrap_or("")
    }

    /// Field values in template order.
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

pub type Catalog = Vec<OutputRow>;

/// An uploaded file as handed over by the file-selection surface.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub data: bytes::Bytes,
}

/// Result of converting one uploaded file.
#[derive(Debug)]
pub enum FileOutcome {
    Converted { file_name: String, catalog: Catalog },
    Failed { file_name: String, message: String },
}

impl FileOutcome {
    pub fn file_name(&self) -> &str {
        match self {
            FileOutcome::Converted { file_name, .. } | FileOutcome::Failed { file_name, .. } => {
                file_name
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FileOutcome::Converted { .. })
    }
}

/// Outcomes for a whole upload, in submission order.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn processed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.processed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_row_starts_with_every_template_key_blank() {
        let row = OutputRow::new();
        assert_eq!(row.values().len(), 67);
        assert!(row.values().iter().all(String::is_empty));
    }

    #[test]
    fn output_row_set_places_value_at_template_position() {
        let mut row = OutputRow::new();
        row.set("Price", "99");
        row.set("Not A Column", "x");
        let idx = TEMPLATE_SCHEMA.iter().position(|k| *k == "Price").unwrap();
        assert_eq!(row.values()[idx], "99");
        assert_eq!(row.get("Price"), "99");
        assert_eq!(row.values().iter().filter(|v| !v.is_empty()).count(), 1);
    }

    #[test]
    fn template_keys_are_unique() {
        assert_eq!(TEMPLATE_POSITIONS.len(), TEMPLATE_SCHEMA.len());
    }

    #[test]
    fn source_record_returns_empty_for_missing_cells() {
        let header = HeaderRow::new(vec!["Title".into(), "Brand".into()]);
        let cells = vec!["Shirt".to_string()];
        let record = SourceRecord::new(&header, &cells);
        assert_eq!(record.get("Title"), "Shirt");
        assert_eq!(record.get("Brand"), "");
        assert_eq!(record.get("Nope"), "");
    }
}
