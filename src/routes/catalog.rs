use axum::{
    extract::{DefaultBodyLimit, Multipart},
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use tower_http::cors::{CorsLayer, Any};

use crate::{
    config::Config,
    error::AppError,
    models::UploadedFile,
    services::{catalog_writer, converter},
};

const DEFAULT_CATEGORY: &str = "catalog";

pub fn routes(config: &Config) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([
            header::CONTENT_DISPOSITION,
            HeaderName::from_static("x-files-processed"),
            HeaderName::from_static("x-files-failed"),
        ])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/catalog/convert", post(convert_catalog))
        .layer(DefaultBodyLimit::max(config.max_upload_size))
        .layer(cors)
}

/// Uploaded files plus the optional category used to name the archive.
struct ConvertRequest {
    files: Vec<UploadedFile>,
    category: Option<String>,
}

async fn read_request(mut multipart: Multipart) -> Result<ConvertRequest, AppError> {
    let mut files = Vec::new();
    let mut category = None;

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        if field_name == "category" {
            category = Some(field.text().await?);
            continue;
        }

        match field.file_name().map(str::to_string) {
            Some(file_name) if !file_name.is_empty() => {
                let data = field.bytes().await?;
                tracing::info!("Received {} ({} bytes)", file_name, data.len());
                files.push(UploadedFile { name: file_name, data });
            }
            _ => tracing::debug!("Ignoring multipart field without a file: {}", field_name),
        }
    }

    Ok(ConvertRequest { files, category })
}

async fn convert_catalog(multipart: Multipart) -> Result<Response, AppError> {
    let start = std::time::Instant::now();
    let request = read_request(multipart).await?;

    if request.files.is_empty() {
        return Err(AppError::InvalidInput("No files provided".to_string()));
    }

    let category = request
        .category
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

    let report = converter::convert_batch(request.files).await;
    let archive = catalog_writer::build_archive(&report).map_err(|e| {
        tracing::error!("Failed to assemble archive: {}", e);
        e
    })?;
    let archive_name = catalog_writer::archive_name(&category, chrono::Local::now().date_naive());

    tracing::info!(
        "Built {} ({}KB) for {} files in {:?}",
        archive_name,
        archive.len() / 1024,
        report.outcomes.len(),
        start.elapsed()
    );

    let headers = [
        (header::CONTENT_TYPE, "application/zip".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", archive_name),
        ),
        (HeaderName::from_static("x-files-processed"), report.processed().to_string()),
        (HeaderName::from_static("x-files-failed"), report.failed().to_string()),
    ];

    Ok((StatusCode::OK, headers, archive).into_response())
}
