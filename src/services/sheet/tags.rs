use std::collections::HashSet;

use crate::models::{ColumnRoleMap, Role, SourceRecord};

use super::utils::present;

/// Tags in first-seen order with duplicates dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagList {
    tags: Vec<String>,
    seen: HashSet<String>,
}

impl TagList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `tag` unless it is already present. Returns whether it was added.
    pub fn push(&mut self, tag: impl Into<String>) -> bool {
        let tag = tag.into();
        if self.seen.contains(&tag) {
            return false;
        }
        self.seen.insert(tag.clone());
        self.tags.push(tag);
        true
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.seen.contains(tag)
    }

    pub fn joined(&self) -> String {
        self.tags.join(", ")
    }
}

const BOY: &str = "Boy";
const GIRL: &str = "Girl";
const UNISEX: &str = "Unisex";
const NEWBORN: &str = "Newborn";

/// Roles whose raw values become tags, in tag order.
const VALUE_ROLES: [Role; 7] = [
    Role::Brand,
    Role::ProductCategory,
    Role::Subcategory,
    Role::SubSubcategory,
    Role::Season,
    Role::Campaign,
    Role::SizesField,
];

struct AgeBracket {
    tag: &'static str,
    patterns: &'static [&'static str],
}

const BOY_BRACKETS: [AgeBracket; 8] = [
    AgeBracket { tag: "Boys Newborn", patterns: &["nb", "newborn", "0-1m", "0m"] },
    AgeBracket { tag: "Boys 0-3 Months", patterns: &["0-3m", "0-3mths", "1-3m", "2-4m"] },
    AgeBracket { tag: "Boys 3-6 Months", patterns: &["3-6m", "2-4m", "4-6m", "3-6mths"] },
    AgeBracket { tag: "Boys 6-12 Months", patterns: &["6-9m", "9-12m", "6-12m", "6m", "9m"] },
    AgeBracket { tag: "Boys 12-24 Months", patterns: &["12-18m", "18-24m", "12-24m", "1-2y", "1y"] },
    AgeBracket { tag: "Boys 2-3 Years", patterns: &["2-3y", "24-36m", "2y"] },
    AgeBracket { tag: "Boys 3-5 Years", patterns: &["3-4y", "4-5y", "3-5y", "3y", "4y"] },
    AgeBracket { tag: "Boys 5 Years+", patterns: &["5-6y", "6-7y", "7-8y", "8-9y", "9-10y", "5y", "6y", "7y", "8y"] },
];

const GIRL_BRACKETS: [AgeBracket; 8] = [
    AgeBracket { tag: "Girls Newborn", patterns: &["nb", "newborn", "0-1m", "0m", "0-0m"] },
    AgeBracket { tag: "Girls 0-3 Months", patterns: &["0-3m", "0-3mths", "1-3m", "2-4m"] },
    AgeBracket { tag: "Girls 3-6 Months", patterns: &["3-6m", "2-4m", "4-6m", "3-6mths"] },
    AgeBracket { tag: "Girls 6-12 Months", patterns: &["6-9m", "9-12m", "6-12m", "6-12mths"] },
    AgeBracket { tag: "Girls 12-24 Months", patterns: &["12-18m", "18-24m", "12-24m", "1-2y"] },
    AgeBracket { tag: "Girls 2-3 Years", patterns: &["2-3y", "24-36m", "2y"] },
    AgeBracket { tag: "Girls 3-5 Years", patterns: &["3-4y", "4-5y", "3-5y", "4y"] },
    AgeBracket { tag: "Girls 5 Years+", patterns: &["5-6y", "6-7y", "7-8y", "5-7y", "5y", "6y"] },
];

fn flag_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '*' && *c != '+' && !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}

/// Canonical tags a flag column stands for, if any.
fn flag_tags(key: &str) -> &'static [&'static str] {
    match key {
        "boy" | "boys" => &[BOY],
        "girl" | "girls" => &[GIRL],
        "unisex" => &[UNISEX],
        "nb" | "newborn" => &[NEWBORN],
        _ if key.contains("girls") && key.contains("unisex") => &[GIRL, UNISEX],
        _ if key.contains("boys") && key.contains("unisex") => &[BOY, UNISEX],
        _ => &[],
    }
}

fn is_flag_set(value: &str) -> bool {
    present(value)
        .and_then(|v| v.parse::<f64>().ok())
        .map_or(false, |v| v == 1.0)
}

/// Lowercase with every space removed and all dash variants folded to `-`.
pub fn normalize_variant(variant: &str) -> String {
    variant
        .split_whitespace()
        .collect::<String>()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            '–' | '—' | '‐' | '‑' | '‒' | '−' => '-',
            other => other,
        })
        .collect()
}

fn bracket_matches(bracket: &AgeBracket, variants: &[String]) -> bool {
    variants.iter().any(|variant| {
        bracket
            .patterns
            .iter()
            .any(|pattern| variant == pattern || (pattern.len() >= 3 && variant.contains(pattern)))
    })
}

fn push_age_brackets(tags: &mut TagList, brackets: &[AgeBracket], variants: &[String]) {
    for bracket in brackets {
        if bracket_matches(bracket, variants) {
            tags.push(bracket.tag);
        }
    }
}

/// Builds the tag list for one record.
pub fn synthesize_tags(record: &SourceRecord<'_>, roles: &ColumnRoleMap, variants: &[String]) -> TagList {
    let mut tags = TagList::new();

    for role in VALUE_ROLES {
        if let Some(value) = present(record.role(roles, role)) {
            tags.push(value);
        }
    }

    for name in record.header().names() {
        let canonical = flag_tags(&flag_key(name));
        if !canonical.is_empty() && is_flag_set(record.get(name)) {
            for tag in canonical {
                tags.push(*tag);
            }
        }
    }

    let normalized: Vec<String> = variants.iter().map(|v| normalize_variant(v)).collect();
    if tags.contains(BOY) {
        push_age_brackets(&mut tags, &BOY_BRACKETS, &normalized);
    }
    if tags.contains(GIRL) {
        push_age_brackets(&mut tags, &GIRL_BRACKETS, &normalized);
    }

    tags
}
