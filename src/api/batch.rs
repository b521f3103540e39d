//! Batch import endpoints

use axum::{extract::State, Json};
use axum_extra::extract::Multipart;

use crate::{
    error::{AppError, AppResult},
    models::batch::ImportSummary,
};

/// Import books from an uploaded CSV file
///
/// Expects a multipart form with a `file` field holding the CSV payload.
/// Rows are matched by ISBN: new ISBNs insert a book, known ISBNs update
/// it. Bad rows are reported in the summary and do not stop the import.
#[utoipa::path(
    post,
    path = "/books/import",
    tag = "books",
    request_body(content = String, description = "CSV payload in a 'file' form field", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import summary", body = ImportSummary),
        (status = 400, description = "Missing or unreadable file")
    )
)]
pub async fn import_books(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ImportSummary>> {
    let mut payload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {}", e)))?
    {
        if field.name() == Some("file") {
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;
            payload = Some(data);
            break;
        }
    }

    let data =
        payload.ok_or_else(|| AppError::BadRequest("Missing 'file' field".to_string()))?;

    let summary = state.services.batch.import_books(&data).await?;
    Ok(Json(summary))
}
