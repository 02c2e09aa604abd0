use std::time::Instant;

use futures::future::join_all;
use rayon::prelude::*;

use crate::error::AppError;
use crate::models::{BatchReport, Catalog, FileOutcome, SourceRecord, UploadedFile};
use crate::services::sheet::{assemble_record, read_table, resolve_columns, SheetTable};

/// Runs the whole transformation for one uploaded file.
pub fn convert_file(file_name: &str, data: &[u8]) -> Result<Catalog, AppError> {
    let start = Instant::now();
    tracing::info!("Converting {} ({}KB)", file_name, data.len() / 1024);

    let table = read_table(file_name, data)?;
    let sheet = match SheetTable::from_raw(table) {
        Some(sheet) => sheet,
        None => {
            tracing::warn!("{} is empty, producing an empty catalog", file_name);
            return Ok(Catalog::new());
        }
    };

    let columns = resolve_columns(&sheet);
    let catalog: Catalog = sheet
        .rows
        .par_iter()
        .flat_map_iter(|cells| assemble_record(&SourceRecord::new(&sheet.header, cells), &columns))
        .collect();

    tracing::info!(
        "Converted {}: {} records into {} rows in {:?}",
        file_name,
        sheet.rows.len(),
        catalog.len(),
        start.elapsed()
    );
    Ok(catalog)
}

/// Converts every file on its own blocking task. A failing or panicking
/// task only affects its own file's outcome.
pub async fn convert_batch(files: Vec<UploadedFile>) -> BatchReport {
    let start = Instant::now();
    tracing::info!("Starting batch of {} files", files.len());

    let (names, tasks): (Vec<String>, Vec<_>) = files
        .into_iter()
        .map(|file| {
            let name = file.name.clone();
            let task = tokio::task::spawn_blocking(move || convert_file(&file.name, &file.data));
            (name, task)
        })
        .unzip();

    let results = join_all(tasks).await;

    let outcomes: Vec<FileOutcome> = names
        .into_iter()
        .zip(results)
        .map(|(file_name, result)| match result {
            Ok(Ok(catalog)) => FileOutcome::Converted { file_name, catalog },
            Ok(Err(e)) => {
                tracing::warn!("Failed to convert {}: {}", file_name, e);
                FileOutcome::Failed { file_name, message: e.to_string() }
            }
            Err(e) => {
                tracing::error!("Conversion task for {} did not finish: {}", file_name, e);
                FileOutcome::Failed {
                    file_name,
                    message: format!("Conversion task aborted: {}", e),
                }
            }
        })
        .collect();

    let report = BatchReport { outcomes };
    tracing::info!(
        "Batch finished in {:?}: {} converted, {} failed",
        start.elapsed(),
        report.processed(),
        report.failed()
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::catalog_writer::build_archive;
    use std::io::{Cursor, Read};

    const SUPPLIER_CSV: &str = "\
Supplier,Acme Kids,,,,,,
Season notes,Spring drop,,,,,,
,,,,,,,
Product Title,Brand,Boy,0-3M,2-4M,Image 1,Image 2,Selling Price
Romper,Acme,1,5,2,r1.jpg,r2.jpg,\"₹1,299.00\"
nan,Acme,1,5,,,,100
Bib,Acme,0,,,,,
";

    fn upload(name: &str, data: &[u8]) -> UploadedFile {
        UploadedFile { name: name.to_string(), data: bytes::Bytes::copy_from_slice(data) }
    }

    #[test]
    fn converts_supplier_sheet_end_to_end() {
        let catalog = convert_file("acme.csv", SUPPLIER_CSV.as_bytes()).unwrap();
        // Romper: two sizes plus one extra image; nan skipped; Bib: default only.
        assert_eq!(catalog.len(), 4);

        let romper = &catalog[0];
        assert_eq!(romper.get("URL handle"), "romper");
        assert_eq!(romper.get("Option1 value"), "0-3M");
        assert_eq!(romper.get("Price"), "1299");
        assert_eq!(
            romper.get("Tags"),
            "Acme, Boy, Boys 0-3 Months, Boys 3-6 Months"
        );
        assert_eq!(catalog[2].get("Image position"), "2");
        assert_eq!(catalog[3].get("Title"), "Bib");
        assert_eq!(catalog[3].get("Tags"), "Acme");
    }

    #[test]
    fn empty_file_is_an_empty_catalog() {
        assert!(convert_file("empty.csv", b"").unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_file_does_not_block_siblings() {
        let report = convert_batch(vec![
            upload("acme.csv", SUPPLIER_CSV.as_bytes()),
            upload("broken.xlsx", b"not a workbook"),
        ])
        .await;

        assert_eq!(report.processed(), 1);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.outcomes[1].file_name(), "broken.xlsx");

        let mut archive = zip::ZipArchive::new(Cursor::new(build_archive(&report).unwrap())).unwrap();
        assert_eq!(archive.len(), 2);
        assert!(archive.by_name("acme - Converted - Shopify.csv").is_ok());

        let mut error_text = String::new();
        archive
            .by_name("ERROR_broken.xlsx.txt")
            .unwrap()
            .read_to_string(&mut error_text)
            .unwrap();
        assert!(error_text.contains("broken.xlsx"));
    }

    #[test]
    fn batch_runs_on_a_plain_runtime() {
        let report = tokio_test::block_on(convert_batch(vec![upload("a.csv", b"Title\nTee\n")]));
        match &report.outcomes[0] {
            FileOutcome::Converted { catalog, .. } => assert_eq!(catalog.len(), 1),
            FileOutcome::Failed { message, .. } => panic!("unexpected failure: {}", message),
        }
    }
}
