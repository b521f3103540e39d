//! Metrics endpoints

use axum::{
    body::{Body, Bytes},
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppResult;

/// Aggregate metrics snapshot
#[derive(Serialize, ToSchema)]
pub struct MetricsSnapshot {
    /// Total number of books in the catalog
    pub total_books: i64,
    /// Total copies across all books
    pub total_copies: i64,
    /// Copies currently on the shelf
    pub copies_available: i64,
    /// Total number of registered users
    pub total_users: i64,
    /// Loans not yet returned
    pub active_loans: i64,
    /// Loans already returned
    pub returned_loans: i64,
    /// Active loans past their due date
    pub overdue_loans: i64,
    /// Most borrowed books, busiest first
    pub top_borrowed: Vec<TopBorrowedBook>,
}

/// Borrow count for a single book
#[derive(Serialize, ToSchema)]
pub struct TopBorrowedBook {
    /// Book title
    pub title: String,
    /// Number of loans, including returned ones
    pub count: i64,
}

/// Shape of a CSV export
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExportGranularity {
    /// One row per aggregate counter
    Summary,
    /// Borrow counts per book
    PerBook,
    /// Loans and returns per day
    Day,
    /// Loans and returns per ISO week
    Week,
    /// Loans and returns per month
    Month,
    /// Loans and returns per year
    Year,
}

impl ExportGranularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportGranularity::Summary => "summary",
            ExportGranularity::PerBook => "per_book",
            ExportGranularity::Day => "day",
            ExportGranularity::Week => "week",
            ExportGranularity::Month => "month",
            ExportGranularity::Year => "year",
        }
    }
}

/// Query parameters for the CSV export
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ExportQuery {
    /// Export shape (default: summary)
    #[serde(default)]
    pub granularity: Option<ExportGranularity>,
}

/// CSV payload assembled by the stats service, encoded row by row when sent
#[derive(Debug)]
pub struct CsvExport {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Get aggregate library metrics
#[utoipa::path(
    get,
    path = "/stats",
    tag = "stats",
    responses(
        (status = 200, description = "Current metrics snapshot", body = MetricsSnapshot)
    )
)]
pub async fn get_metrics(
    State(state): State<crate::AppState>,
) -> AppResult<Json<MetricsSnapshot>> {
    let snapshot = state.services.stats.get_metrics().await?;
    Ok(Json(snapshot))
}

/// Download metrics as a CSV file
#[utoipa::path(
    get,
    path = "/stats/export",
    tag = "stats",
    params(ExportQuery),
    responses(
        (status = 200, description = "CSV export", body = String, content_type = "text/csv")
    )
)]
pub async fn export_metrics(
    State(state): State<crate::AppState>,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let granularity = query.granularity.unwrap_or(ExportGranularity::Summary);
    let export = state.services.stats.export_csv(granularity).await?;

    // Rows are encoded one at a time as the body streams out
    let records = std::iter::once(export.header).chain(export.rows);
    let body = Body::from_stream(tokio_stream::iter(records.map(encode_record)));

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"analytics_{}.csv\"",
                granularity.as_str()
            ),
        ),
    ];

    Ok((headers, body).into_response())
}

fn encode_record(fields: Vec<String>) -> Result<Bytes, std::io::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(&fields)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    let buf = writer.into_inner().map_err(|e| e.into_error())?;
    Ok(Bytes::from(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_plain_fields() {
        let line = encode_record(vec!["total_books".to_string(), "42".to_string()]).unwrap();
        assert_eq!(&line[..], b"total_books,42\n");
    }

    #[test]
    fn quotes_fields_with_commas() {
        let line = encode_record(vec![
            "Hull, Zero Three".to_string(),
            "7".to_string(),
        ])
        .unwrap();
        assert_eq!(&line[..], b"\"Hull, Zero Three\",7\n");
    }
}
