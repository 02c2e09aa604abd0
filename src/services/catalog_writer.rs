use std::collections::HashSet;
use std::io::{Cursor, Write};
use std::path::Path;

use chrono::NaiveDate;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::AppError;
use crate::models::{BatchReport, FileOutcome, OutputRow, TEMPLATE_SCHEMA};

pub const CONVERTED_SUFFIX: &str = " - Converted - Shopify.csv";

/// Serializes a catalog as CSV with the template header row first.
pub fn write_catalog(catalog: &[OutputRow]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(TEMPLATE_SCHEMA)?;
    for row in catalog {
        writer.write_record(row.values())?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("Failed to flush CSV writer: {}", e)))
}

/// Last path segment of a client-supplied name, split on `/` and `\`.
fn base_name(file_name: &str) -> &str {
    file_name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(file_name)
}

fn file_stem(file_name: &str) -> String {
    let file_name = base_name(file_name);
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| file_name.to_string())
}

/// Archive entry name and body for one file's outcome.
pub fn archive_entry(outcome: &FileOutcome) -> Result<(String, Vec<u8>), AppError> {
    match outcome {
        FileOutcome::Converted { file_name, catalog } => Ok((
            format!("{}{}", file_stem(file_name), CONVERTED_SUFFIX),
            write_catalog(catalog)?,
        )),
        FileOutcome::Failed { file_name, message } => Ok((
            format!("ERROR_{}.txt", base_name(file_name)),
            format!("Error processing file '{}':\n{}\n", file_name, message).into_bytes(),
        )),
    }
}

/// Appends ` (2)`, ` (3)`, ... before the extension until `name` is unused.
fn unique_entry_name(name: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.clone()) {
        return name;
    }

    let (base, ext) = match name.rfind('.') {
        Some(idx) => name.split_at(idx),
        None => (name.as_str(), ""),
    };
    let mut counter = 2;
    loop {
        let candidate = format!("{} ({}){}", base, counter, ext);
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Packs every outcome of the batch into one zip archive, one entry per file.
pub fn build_archive(report: &BatchReport) -> Result<Vec<u8>, AppError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut taken = HashSet::new();

    for outcome in &report.outcomes {
        let (name, body) = archive_entry(outcome)?;
        let name = unique_entry_name(name, &mut taken);
        tracing::debug!("Adding {} ({} bytes) for {}", name, body.len(), outcome.file_name());
        zip.start_file(name, entry_options())?;
        zip.write_all(&body)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

/// Download name for the archive, e.g. `Kidswear_processed_2024-05-01.zip`.
pub fn archive_name(category: &str, date: NaiveDate) -> String {
    let category: String = category
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    let category = if category.is_empty() { "catalog".to_string() } else { category };
    format!("{}_processed_{}.zip", category, date.format("%Y-%m-%d"))
}
